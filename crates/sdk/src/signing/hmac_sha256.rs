use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::signer::RequestSigner;
use crate::error::{LoopEngineError, Result};

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| LoopEngineError::Signing(format!("failed to create HMAC: {e}")))
}

/// HMAC-SHA256 of `canonical` keyed by `secret`, as base64url without padding.
pub fn sign(secret: &str, canonical: &str) -> Result<String> {
    let mut mac = keyed_mac(secret)?;
    mac.update(canonical.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Checks a base64url signature against `canonical` in constant time.
///
/// Returns `Ok(false)` for signatures that are not valid base64url.
pub fn verify(secret: &str, canonical: &str, signature: &str) -> Result<bool> {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(signature) else {
        return Ok(false);
    };
    let mut mac = keyed_mac(secret)?;
    mac.update(canonical.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Signs canonical strings with a per-project secret.
///
/// The secret never leaves this struct; `Debug` output redacts it.
#[derive(Clone)]
pub struct HmacSha256Signer {
    secret: String,
}

impl HmacSha256Signer {
    pub const SCHEME: &'static str = "v1";

    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl fmt::Debug for HmacSha256Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSha256Signer")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner for HmacSha256Signer {
    fn sign(&self, canonical: &str) -> Result<String> {
        sign(&self.secret, canonical)
    }

    fn scheme(&self) -> &str {
        Self::SCHEME
    }
}
