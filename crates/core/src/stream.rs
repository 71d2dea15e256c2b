//! Wire types for the nutrition streaming WebSocket.

use serde::{Deserialize, Serialize};

use crate::nutrition::NutritionPreferences;

/// Inbound frame: ask for an analysis of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub barcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<NutritionPreferences>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMessageKind {
    StreamChunk,
    StreamComplete,
    Error,
}

/// Outbound frame.
///
/// Clients append `stream_chunk` content as it arrives and replace it with the
/// `stream_complete` content once the analysis finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type")]
    pub kind: StreamMessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl StreamMessage {
    pub fn chunk(content: impl Into<String>, section: Option<String>) -> Self {
        Self {
            kind: StreamMessageKind::StreamChunk,
            content: content.into(),
            data: None,
            section,
        }
    }

    pub fn complete(content: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            kind: StreamMessageKind::StreamComplete,
            content: content.into(),
            data,
            section: None,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: StreamMessageKind::Error,
            content: content.into(),
            data: None,
            section: None,
        }
    }
}
