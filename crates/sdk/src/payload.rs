use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoopEngineError;

/// Feedback data sent to the ingest API.
///
/// An open JSON object; `message` is the conventional field. The client adds
/// `project_id` to its own copy before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackPayload(Map<String, Value>);

impl FeedbackPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self::new().with_field("message", message.into())
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for FeedbackPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for FeedbackPayload {
    type Error = LoopEngineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(LoopEngineError::InvalidPayload(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Per-call options for `send`.
///
/// Coordinates are only sent when both are present and finite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SendOptions {
    pub geo_lat: Option<f64>,
    pub geo_lon: Option<f64>,
}

impl SendOptions {
    pub fn geo(lat: f64, lon: f64) -> Self {
        Self {
            geo_lat: Some(lat),
            geo_lon: Some(lon),
        }
    }

    /// The coordinate pair to transmit, if any. No range check.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.geo_lat, self.geo_lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Builds the outgoing body: a copy of `payload` with `project_id` forced to
/// the configured id and geo fields added under the all-or-nothing rule.
pub(crate) fn build_body(
    payload: &FeedbackPayload,
    project_id: &str,
    options: &SendOptions,
) -> Map<String, Value> {
    let mut body = payload.0.clone();
    body.insert("project_id".to_owned(), Value::from(project_id));

    if let Some((lat, lon)) = options.coordinates() {
        body.insert("geo_lat".to_owned(), Value::from(lat));
        body.insert("geo_lon".to_owned(), Value::from(lon));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_id_is_injected() {
        let payload = FeedbackPayload::with_message("hi");
        let body = build_body(&payload, "proj_test", &SendOptions::default());
        assert_eq!(body["project_id"], json!("proj_test"));
        assert_eq!(body["message"], json!("hi"));
    }

    #[test]
    fn caller_project_id_is_overwritten() {
        let payload = FeedbackPayload::with_message("hi").with_field("project_id", "proj_other");
        let body = build_body(&payload, "proj_test", &SendOptions::default());
        assert_eq!(body["project_id"], json!("proj_test"));
        assert_eq!(payload.get("project_id"), Some(&json!("proj_other")));
    }

    #[test]
    fn both_coordinates_are_added() {
        let payload = FeedbackPayload::with_message("test");
        let body = build_body(&payload, "p", &SendOptions::geo(34.05, -118.25));
        assert_eq!(body["geo_lat"], json!(34.05));
        assert_eq!(body["geo_lon"], json!(-118.25));
    }

    #[test]
    fn single_coordinate_is_dropped() {
        let options = SendOptions {
            geo_lat: Some(34.05),
            geo_lon: None,
        };
        let body = build_body(&FeedbackPayload::new(), "p", &options);
        assert!(!body.contains_key("geo_lat"));
        assert!(!body.contains_key("geo_lon"));
    }

    #[test]
    fn non_finite_coordinates_are_dropped() {
        for (lat, lon) in [
            (f64::NAN, -118.25),
            (34.05, f64::INFINITY),
            (f64::NEG_INFINITY, 0.0),
        ] {
            let body = build_body(&FeedbackPayload::new(), "p", &SendOptions::geo(lat, lon));
            assert!(!body.contains_key("geo_lat"));
            assert!(!body.contains_key("geo_lon"));
        }
    }

    #[test]
    fn out_of_range_coordinates_are_kept() {
        let body = build_body(&FeedbackPayload::new(), "p", &SendOptions::geo(123.0, 500.0));
        assert_eq!(body["geo_lat"], json!(123.0));
        assert_eq!(body["geo_lon"], json!(500.0));
    }

    #[test]
    fn payload_from_non_object_is_rejected() {
        let err = FeedbackPayload::try_from(json!(["a"])).unwrap_err();
        assert!(matches!(err, LoopEngineError::InvalidPayload(_)));
    }

    #[test]
    fn payload_from_object_keeps_fields() {
        let payload = FeedbackPayload::try_from(json!({"message": "m", "rating": 5})).unwrap();
        assert_eq!(payload.message(), Some("m"));
        assert_eq!(payload.get("rating"), Some(&json!(5)));
    }
}
