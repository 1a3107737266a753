use sha2::{Digest, Sha256};

/// SHA-256 of the raw body bytes as lowercase hex (64 chars).
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Builds the string that gets signed: `METHOD\nPATH\nTIMESTAMP\nBODY_DIGEST_HEX`.
///
/// Field order is fixed. None of the fields may contain a newline, so the
/// boundaries are unambiguous.
pub fn canonicalize(method: &str, path: &str, timestamp: &str, body_digest_hex: &str) -> String {
    [method, path, timestamp, body_digest_hex].join("\n")
}
