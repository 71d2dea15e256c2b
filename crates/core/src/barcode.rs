//! Opaque product identifier taken from the URL path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A product barcode.
///
/// The value is never parsed, trimmed, or normalized: whatever the client put
/// in the path segment is what collaborators receive. EAN-13, UPC-A and
/// store-internal codes are all just strings here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode(String);

impl Barcode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Barcode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Barcode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
