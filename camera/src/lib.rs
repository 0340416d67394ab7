//! Camera access for Studyspot.
//!
//! # Architecture
//!
//! [`CameraDevice`] is the seam between the capture cycle and whatever produces
//! frames. It has two capabilities:
//!
//! - [`CameraDevice::request_permission`] - ask once whether frames may be taken
//! - [`CameraDevice::capture_still`] - take one still frame, returned as JPEG
//!   bytes encoded at the requested [`JpegQuality`]
//!
//! Futures are boxed so the trait stays object-safe; the engine holds cameras
//! as `Arc<dyn CameraDevice>`.
//!
//! Implementations:
//!
//! - [`ReplayCamera`] - replays a still image or a directory of frames
//! - [`NoCamera`] - placeholder when no source is configured; always denied

mod encode;
mod replay;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use studyspot_types::{FailureKind, PermissionState};

pub use encode::encode_jpeg;
pub use replay::ReplayCamera;

/// Capture future type alias.
pub type CameraFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, CameraError>> + Send + 'a>>;

/// Permission request future type alias.
pub type PermissionFut<'a> = Pin<Box<dyn Future<Output = PermissionState> + Send + 'a>>;

pub const DEFAULT_JPEG_QUALITY: JpegQuality = JpegQuality(0.5);

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl CameraError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Failure classification surfaced to the capture cycle.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::PermissionDenied => FailureKind::PermissionDenied,
            Self::Unavailable { .. } | Self::Encode(_) => FailureKind::CameraUnavailable,
        }
    }
}

/// Lossy compression factor in `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JpegQuality(f32);

impl JpegQuality {
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        (value.is_finite() && value > 0.0 && value <= 1.0).then_some(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }

    /// The 1..=100 scale used by JPEG encoders.
    #[must_use]
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        DEFAULT_JPEG_QUALITY
    }
}

/// Platform camera hardware, or anything standing in for it.
pub trait CameraDevice: Send + Sync {
    /// Human-readable description for logs and the status bar.
    fn describe(&self) -> String;

    fn request_permission(&self) -> PermissionFut<'_>;

    /// Take one still frame and return it JPEG-encoded.
    fn capture_still(&self, quality: JpegQuality) -> CameraFut<'_, Vec<u8>>;
}

/// Stand-in used when no camera source is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

impl CameraDevice for NoCamera {
    fn describe(&self) -> String {
        "no camera configured".to_string()
    }

    fn request_permission(&self) -> PermissionFut<'_> {
        Box::pin(async { PermissionState::Denied })
    }

    fn capture_still(&self, _quality: JpegQuality) -> CameraFut<'_, Vec<u8>> {
        Box::pin(async { Err(CameraError::unavailable("no camera configured")) })
    }
}
