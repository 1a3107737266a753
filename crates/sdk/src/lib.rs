//! Client for the LoopEngine feedback ingest API.
//!
//! Each `send` builds the body once, signs `POST\n/feedback\n<ts>\n<sha256>`
//! with HMAC-SHA256 under the project secret and issues a single POST.
//!
//! ```ignore
//! use loopengine_sdk::{Credentials, FeedbackPayload, LoopEngine};
//!
//! let client = LoopEngine::new(Credentials::new(project_key, project_secret, project_id)?)?;
//! let result = client.send(&FeedbackPayload::with_message("Hello")).await?;
//! ```

pub mod client;
pub mod encoding;
pub mod error;
pub mod payload;
pub mod response;
pub mod signing;
pub mod transport;

pub use client::{Credentials, LoopEngine, LoopEngineBuilder, SignedRequest, DEFAULT_BASE_URL, FEEDBACK_PATH};
pub use error::{LoopEngineError, Result};
pub use payload::{FeedbackPayload, SendOptions};
pub use response::{FeedbackResponse, SendResult};
pub use signing::{HmacSha256Signer, RequestSigner, SignatureHeader, canonicalize, digest, sign, verify};
pub use transport::{OutgoingRequest, RawResponse, ReqwestTransport, Transport};
