//! People-detection service client.
//!
//! # Architecture
//!
//! - [`DetectionService`] - object-safe seam the capture cycle talks to
//! - [`HttpDetectionClient`] - `POST {base_url}/detect` over reqwest
//!
//! One call is one request: there is no retry, no backoff, and no streaming.
//! A request that produces no response within the configured timeout is a
//! terminal [`DetectError::Transport`] for that cycle.
//!
//! # Error Handling
//!
//! | Error | Cause | [`FailureKind`] |
//! |-------|-------|-----------------|
//! | `InvalidBaseUrl` | base URL does not parse | `TransportFailure` |
//! | `Client` | HTTP client could not be built | `TransportFailure` |
//! | `Transport` | connect error, timeout, reset | `TransportFailure` |
//! | `Status` | non-2xx response | `TransportFailure` |
//! | `Malformed` | 2xx with missing/invalid fields | `MalformedResponse` |

mod wire;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use studyspot_types::{CaptureResult, FailureKind};

use wire::{DetectRequest, error_message, parse_detect_response};

/// Detection future type alias.
pub type DetectFut<'a> = Pin<Box<dyn Future<Output = Result<CaptureResult, DetectError>> + Send + 'a>>;

pub const DETECT_PATH: &str = "detect";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid detection base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("detection request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("detection service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed detection response: {0}")]
    Malformed(String),
}

impl DetectError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Malformed(_) => FailureKind::MalformedResponse,
            Self::InvalidBaseUrl { .. }
            | Self::Client(_)
            | Self::Transport(_)
            | Self::Status { .. } => FailureKind::TransportFailure,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// The external image-analysis endpoint.
pub trait DetectionService: Send + Sync {
    /// Send one JPEG frame and return the count plus annotated image.
    fn detect<'a>(&'a self, jpeg: &'a [u8]) -> DetectFut<'a>;
}

fn base_client_builder() -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json"),
    );

    reqwest::Client::builder()
        .user_agent(concat!("studyspot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Resolve `{base_url}/detect`, keeping any path prefix on the base.
pub fn detect_endpoint(base_url: &str) -> Result<Url, DetectError> {
    let invalid = |source| DetectError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    };

    let mut base = Url::parse(base_url.trim()).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(DETECT_PATH).map_err(invalid)
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[derive(Debug, Clone)]
pub struct HttpDetectionClient {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpDetectionClient {
    /// Build a client for `base_url` with a total per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DetectError> {
        let endpoint = detect_endpoint(base_url)?;
        let client = base_client_builder()
            .timeout(timeout)
            .build()
            .map_err(DetectError::Client)?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, jpeg: &[u8]) -> Result<CaptureResult, DetectError> {
        let request = DetectRequest::from_jpeg(jpeg);
        tracing::debug!(
            endpoint = %self.endpoint,
            jpeg_bytes = jpeg.len(),
            payload_bytes = request.image.len(),
            "Sending detection request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = read_capped_error_body(response).await;
            let body = error_message(&raw).unwrap_or(raw);
            return Err(DetectError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        parse_detect_response(&body).map_err(DetectError::Malformed)
    }
}

impl DetectionService for HttpDetectionClient {
    fn detect<'a>(&'a self, jpeg: &'a [u8]) -> DetectFut<'a> {
        Box::pin(self.send(jpeg))
    }
}
