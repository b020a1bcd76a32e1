//! Request body inspection and model substitution
//!
//! Chat payloads can be large, so the body is never fully parsed: each
//! top-level field is kept as raw JSON and only the `model` field is
//! replaced. Field order and the bytes of untouched fields survive the
//! round trip.

use indexmap::IndexMap;
use serde_json::value::RawValue;

/// A minimally parsed JSON request body.
pub struct ProxyRequest {
    fields: IndexMap<String, Box<RawValue>>,
}

impl ProxyRequest {
    /// Parse the inbound body. Fails when it is not a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(ProxyRequest {
            fields: serde_json::from_slice(body)?,
        })
    }

    /// The `model` field, when present and a JSON string.
    pub fn model(&self) -> Option<String> {
        let raw = self.fields.get("model")?;
        serde_json::from_str(raw.get()).ok()
    }

    /// The `stream` flag; false when absent or not a boolean.
    pub fn stream(&self) -> bool {
        self.fields
            .get("stream")
            .and_then(|raw| serde_json::from_str(raw.get()).ok())
            .unwrap_or(false)
    }

    /// Replace the `model` field, keeping its position in the document.
    pub fn set_model(&mut self, model: &str) -> Result<(), serde_json::Error> {
        let raw = RawValue::from_string(serde_json::to_string(model)?)?;
        self.fields.insert("model".to_string(), raw);
        Ok(())
    }

    /// Serialize the document back to bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.fields)
    }
}
