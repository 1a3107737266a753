use serde::Serialize;

use crate::error::Result;
use crate::signing::digest;

/// A request body serialized for transmission.
///
/// `data` is the exact byte sequence sent on the wire and `digest` is the
/// SHA-256 hex of those same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub data: String,
    pub digest: String,
}

/// Serializes `body` to JSON once and digests the result.
pub fn encode_json<T: Serialize + ?Sized>(body: &T) -> Result<EncodedBody> {
    let data = serde_json::to_string(body)?;
    let digest = digest(data.as_bytes());
    Ok(EncodedBody { data, digest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sha2::{Digest, Sha256};

    #[test]
    fn data_parses_back_to_input() {
        let body = json!({"message": "hi", "project_id": "proj_1"});
        let encoded = encode_json(&body).unwrap();

        let decoded: serde_json::Value = serde_json::from_str(&encoded.data).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn digest_covers_transmitted_bytes() {
        let body = json!({"key": "value"});
        let encoded = encode_json(&body).unwrap();

        assert_eq!(encoded.digest, hex::encode(Sha256::digest(encoded.data.as_bytes())));
    }

    #[test]
    fn deterministic_encoding() {
        let body = json!({"b": 2, "a": 1});
        let enc1 = encode_json(&body).unwrap();
        let enc2 = encode_json(&body).unwrap();
        assert_eq!(enc1, enc2);
    }
}
