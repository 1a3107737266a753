use std::fmt;
use std::str::FromStr;

use crate::error::LoopEngineError;

/// Value of the `X-Signature` header: `<scheme>=<signature>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub scheme: String,
    pub signature: String,
}

impl SignatureHeader {
    pub fn new(scheme: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            signature: signature.into(),
        }
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.scheme, self.signature)
    }
}

impl FromStr for SignatureHeader {
    type Err = LoopEngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (scheme, signature) = value
            .split_once('=')
            .ok_or_else(|| LoopEngineError::Signing(format!("missing scheme prefix in {value:?}")))?;

        if scheme.is_empty() {
            return Err(LoopEngineError::Signing("empty signature scheme".into()));
        }
        let url_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if signature.is_empty() || !signature.chars().all(url_safe) {
            return Err(LoopEngineError::Signing(format!(
                "signature is not base64url without padding: {signature:?}"
            )));
        }

        Ok(Self::new(scheme, signature))
    }
}
