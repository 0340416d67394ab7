//! Capture cycle state and results.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure text ever shown to the user, whatever went wrong.
pub const FAILED_TO_PROCESS_MESSAGE: &str = "Failed to process image. Please try again.";

pub const DEFAULT_AUTO_REFRESH_INTERVAL_MS: u64 = 30_000;

// ============================================================================
// Cycle numbering
// ============================================================================

/// Sequence number attached to every accepted trigger.
///
/// Strictly increasing per controller. Completions carrying anything other
/// than the latest issued number are stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureSeq(u64);

impl CaptureSeq {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CaptureSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Results
// ============================================================================

/// JPEG bytes returned by the detection service, guaranteed non-empty.
///
/// Backed by an `Arc` so the same image can sit in both the cycle state and
/// the last-result slot without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct AnnotatedImage(Arc<[u8]>);

#[derive(Debug, Error)]
#[error("annotated image must not be empty")]
pub struct EmptyImageError;

impl AnnotatedImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, EmptyImageError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            Err(EmptyImageError)
        } else {
            Ok(Self(Arc::from(bytes)))
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Image payloads are large; never dump them into logs.
impl fmt::Debug for AnnotatedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnnotatedImage")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// Outcome of one successful detection round-trip.
///
/// Constructed whole or not at all; there is no way to update one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    people_count: u32,
    annotated_image: AnnotatedImage,
}

impl CaptureResult {
    #[must_use]
    pub fn new(people_count: u32, annotated_image: AnnotatedImage) -> Self {
        Self {
            people_count,
            annotated_image,
        }
    }

    #[must_use]
    pub const fn people_count(&self) -> u32 {
        self.people_count
    }

    #[must_use]
    pub fn annotated_image(&self) -> &AnnotatedImage {
        &self.annotated_image
    }
}

// ============================================================================
// Failures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    PermissionDenied,
    CameraUnavailable,
    /// Network unreachable, non-2xx status, or timeout.
    TransportFailure,
    /// Response arrived but lacked the expected fields.
    MalformedResponse,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::CameraUnavailable => "camera-unavailable",
            Self::TransportFailure => "transport-failure",
            Self::MalformedResponse => "malformed-response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed cycle.
///
/// `detail` is diagnostic text for logs. The UI only ever shows
/// [`CaptureFailure::message`], which is the same for every kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFailure {
    kind: FailureKind,
    detail: String,
}

impl CaptureFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        FAILED_TO_PROCESS_MESSAGE
    }
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

// ============================================================================
// Cycle state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    InFlight {
        seq: CaptureSeq,
    },
    Succeeded(CaptureResult),
    Failed(CaptureFailure),
}

impl CycleState {
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }

    #[must_use]
    pub fn failure(&self) -> Option<&CaptureFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// User-facing error text, present only in the `Failed` state.
    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.failure().map(CaptureFailure::message)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InFlight { .. } => "in-flight",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

// ============================================================================
// Permission
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

// ============================================================================
// Auto-refresh
// ============================================================================

/// Periodic re-trigger settings.
///
/// ```toml
/// [auto_refresh]
/// enabled = true
/// interval_ms = 30000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRefreshConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl Default for AutoRefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: DEFAULT_AUTO_REFRESH_INTERVAL_MS,
        }
    }
}

impl AutoRefreshConfig {
    /// Timer period. A zero interval is clamped to 1ms (a zero-period timer
    /// would spin).
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}
