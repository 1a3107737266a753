use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Normalized outcome of one `send` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    /// True if the response status was 2xx.
    pub ok: bool,
    pub status: u16,
    /// Parsed JSON body, `{}` when empty, `{"raw": ...}` when not JSON.
    pub body: Value,
}

impl SendResult {
    pub fn from_parts(status: u16, text: &str) -> Self {
        Self {
            ok: (200..300).contains(&status),
            status,
            body: normalize_body(text),
        }
    }

    /// Decodes the body as a successful submission, if it has that shape.
    pub fn feedback(&self) -> Option<FeedbackResponse> {
        FeedbackResponse::deserialize(&self.body).ok()
    }
}

/// Body of a successful feedback submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub analysis_status: String,
}

pub(crate) fn normalize_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "response body is not valid JSON, keeping raw text");
            json!({ "raw": text })
        }
    }
}
