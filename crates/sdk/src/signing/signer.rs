use crate::error::Result;

/// Trait for signing canonical request strings.
///
/// Implementations are sync; signing is CPU-bound.
pub trait RequestSigner: Send + Sync {
    /// Sign a canonical string. Returns the transport-ready encoded signature.
    fn sign(&self, canonical: &str) -> Result<String>;

    /// Scheme identifier placed in front of the signature (e.g. "v1").
    fn scheme(&self) -> &str;
}
