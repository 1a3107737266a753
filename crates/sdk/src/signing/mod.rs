mod signer;
mod canonical;
mod hmac_sha256;
mod header;

pub use signer::RequestSigner;
pub use canonical::{canonicalize, digest};
pub use hmac_sha256::{HmacSha256Signer, sign, verify};
pub use header::SignatureHeader;
