use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use crate::encoding::{EncodedBody, encode_json};
use crate::error::{LoopEngineError, Result};
use crate::payload::{FeedbackPayload, SendOptions, build_body};
use crate::response::SendResult;
use crate::signing::{HmacSha256Signer, RequestSigner, SignatureHeader, canonicalize};
use crate::transport::{OutgoingRequest, ReqwestTransport, Transport};

pub const DEFAULT_BASE_URL: &str = "https://api.loopengine.dev";
pub const FEEDBACK_PATH: &str = "/feedback";
const FEEDBACK_METHOD: &str = "POST";

/// Project credentials from the LoopEngine dashboard.
///
/// `project_key` is sent in the clear; `project_secret` is only ever used as
/// the HMAC key and is redacted from `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    project_key: String,
    project_secret: String,
    project_id: String,
}

impl Credentials {
    pub fn new(
        project_key: impl Into<String>,
        project_secret: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            project_key: project_key.into(),
            project_secret: project_secret.into(),
            project_id: project_id.into(),
        };

        HeaderValue::from_str(&credentials.project_key).map_err(|_| {
            LoopEngineError::InvalidConfig("project_key is not a valid header value".into())
        })?;

        Ok(credentials)
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_key", &self.project_key)
            .field("project_secret", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Everything needed to issue one feedback POST, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub timestamp: String,
    pub body: EncodedBody,
    pub signature: SignatureHeader,
}

/// Client for the LoopEngine ingest API.
///
/// Holds only immutable credentials, so one instance can serve concurrent
/// `send` calls.
///
/// ```ignore
/// let client = LoopEngine::new(Credentials::new("pk_live_...", "psk_live_...", "proj_...")?)?;
/// let result = client.send(&FeedbackPayload::with_message("User reported a bug")).await?;
/// if result.ok {
///     println!("{}", result.body);
/// }
/// ```
#[derive(Debug)]
pub struct LoopEngine<T = ReqwestTransport> {
    credentials: Credentials,
    signer: HmacSha256Signer,
    feedback_url: String,
    transport: T,
}

impl LoopEngine {
    /// Client for the production endpoint using the default transport.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> LoopEngineBuilder {
        LoopEngineBuilder {
            credentials,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl<T: Transport> LoopEngine<T> {
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn feedback_url(&self) -> &str {
        &self.feedback_url
    }

    /// Builds and signs the request body for `timestamp` (Unix seconds).
    ///
    /// The returned body bytes are the ones that were digested, so they must
    /// be transmitted as-is.
    pub fn prepare(
        &self,
        payload: &FeedbackPayload,
        options: &SendOptions,
        timestamp: u64,
    ) -> Result<SignedRequest> {
        let body = build_body(payload, &self.credentials.project_id, options);
        let body = encode_json(&body)?;

        let timestamp = timestamp.to_string();
        let canonical = canonicalize(FEEDBACK_METHOD, FEEDBACK_PATH, &timestamp, &body.digest);
        let signature = SignatureHeader::new(self.signer.scheme(), self.signer.sign(&canonical)?);

        Ok(SignedRequest {
            timestamp,
            body,
            signature,
        })
    }

    pub async fn send(&self, payload: &FeedbackPayload) -> Result<SendResult> {
        self.send_with(payload, &SendOptions::default()).await
    }

    /// Sends one signed feedback POST and normalizes the response.
    ///
    /// Transport failures are returned as errors; any HTTP status, including
    /// 4xx and 5xx, is a normal `SendResult`.
    pub async fn send_with(
        &self,
        payload: &FeedbackPayload,
        options: &SendOptions,
    ) -> Result<SendResult> {
        let signed = self.prepare(payload, options, unix_timestamp())?;

        debug!(
            url = %self.feedback_url,
            timestamp = %signed.timestamp,
            body_len = signed.body.data.len(),
            "Sending feedback"
        );

        let request = OutgoingRequest {
            url: self.feedback_url.clone(),
            headers: vec![
                ("Content-Type", "application/json".to_owned()),
                ("X-Project-Key", self.credentials.project_key.clone()),
                ("X-Timestamp", signed.timestamp),
                ("X-Signature", signed.signature.to_string()),
            ],
            body: signed.body.data,
        };

        let response = self.transport.post(request).await?;
        debug!(status = response.status, "Feedback request completed");

        Ok(SendResult::from_parts(response.status, &response.body))
    }
}

pub struct LoopEngineBuilder {
    credentials: Credentials,
    base_url: String,
}

impl LoopEngineBuilder {
    /// Overrides the API origin (e.g. a staging host). Trailing `/` is ignored.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> Result<LoopEngine> {
        let transport = ReqwestTransport::new()?;
        self.build_with_transport(transport)
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<LoopEngine<T>> {
        let base_url = self.base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LoopEngineError::InvalidConfig(format!(
                "base URL must be http(s): {base_url:?}"
            )));
        }

        Ok(LoopEngine {
            signer: HmacSha256Signer::new(self.credentials.project_secret.clone()),
            feedback_url: format!("{base_url}{FEEDBACK_PATH}"),
            credentials: self.credentials,
            transport,
        })
    }
}

fn unix_timestamp() -> u64 {
    seconds_since_epoch(SystemTime::now())
}

fn seconds_since_epoch(now: SystemTime) -> u64 {
    match now.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs(),
        Err(e) => {
            warn!(error = %e, "system clock is before the Unix epoch, signing with timestamp 0");
            0
        }
    }
}
