//! Per-connection nutrition streaming.
//!
//! Each inbound text frame is a [`StreamRequest`]. The analysis runs on its
//! own task so the receive loop keeps reading (and notices a close) while
//! chunks are being forwarded. A newer request replaces the one in flight.

use amobagan_core::barcode::Barcode;
use amobagan_core::error::CoreError;
use amobagan_core::nutrition::NutritionPreferences;
use amobagan_core::stream::{StreamMessage, StreamRequest};
use axum::extract::ws::Message;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::handlers::products::ProductController;
use crate::ws::manager::WsSender;

/// Analysis state for one WebSocket connection.
///
/// Dropping the session aborts the analysis in flight.
pub struct StreamSession {
    conn_id: String,
    controller: ProductController,
    sender: WsSender,
    in_flight: Option<JoinHandle<()>>,
}

impl StreamSession {
    pub fn new(conn_id: String, controller: ProductController, sender: WsSender) -> Self {
        Self {
            conn_id,
            controller,
            sender,
            in_flight: None,
        }
    }

    /// Handle one inbound text frame.
    pub fn handle_text(&mut self, text: &str) {
        let request: StreamRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(conn_id = %self.conn_id, error = %e, "Malformed stream request");
                send(&self.sender, StreamMessage::error(format!("Invalid request: {e}")));
                return;
            }
        };

        let barcode = request.barcode.trim();
        if barcode.is_empty() {
            send(&self.sender, StreamMessage::error("Please provide a barcode"));
            return;
        }

        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                tracing::debug!(conn_id = %self.conn_id, "Cancelling superseded analysis");
            }
            previous.abort();
        }

        let barcode = Barcode::new(barcode);
        tracing::info!(conn_id = %self.conn_id, %barcode, "Streaming analysis started");

        self.in_flight = Some(tokio::spawn(run_analysis(
            self.controller.clone(),
            self.sender.clone(),
            barcode,
            request.preferences,
        )));
    }

    /// Whether an analysis task is still running.
    pub fn is_streaming(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

/// Stream one analysis to `sender`, reporting any failure as an `error`
/// message.
pub async fn run_analysis(
    controller: ProductController,
    sender: WsSender,
    barcode: Barcode,
    preferences: Option<NutritionPreferences>,
) {
    if let Err(e) = stream_analysis(&controller, &sender, &barcode, preferences.as_ref()).await {
        tracing::warn!(%barcode, error = %e, "Streaming analysis failed");
        send(&sender, StreamMessage::error(client_message(&e, &barcode)));
    }
}

async fn stream_analysis(
    controller: &ProductController,
    sender: &WsSender,
    barcode: &Barcode,
    preferences: Option<&NutritionPreferences>,
) -> Result<(), CoreError> {
    let (product, mut chunks) = controller.analysis_stream(barcode, preferences).await?;

    let mut full = String::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        full.push_str(&chunk.content);
        if !send(sender, StreamMessage::chunk(chunk.content, chunk.section)) {
            // Client went away; nothing left to stream to.
            return Ok(());
        }
    }

    let data = serde_json::json!({
        "barcode": barcode,
        "product_name": product.name,
        "personalized": preferences.is_some(),
    });
    send(sender, StreamMessage::complete(full, Some(data)));
    tracing::info!(%barcode, "Streaming analysis complete");
    Ok(())
}

/// User-facing text for a failed analysis. Internal details stay in the logs.
fn client_message(err: &CoreError, barcode: &Barcode) -> String {
    match err {
        CoreError::NotFound { .. } => format!("Product {barcode} not found"),
        CoreError::Validation(msg) => msg.clone(),
        CoreError::Upstream(_) => "Nutrition analysis is temporarily unavailable".to_string(),
        CoreError::Unauthorized(_) | CoreError::Internal(_) => "Analysis failed".to_string(),
    }
}

/// Queue a message for the connection. Returns `false` once the connection
/// is gone.
fn send(sender: &WsSender, message: StreamMessage) -> bool {
    match serde_json::to_string(&message) {
        Ok(json) => sender.send(Message::Text(json.into())).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize stream message");
            false
        }
    }
}
