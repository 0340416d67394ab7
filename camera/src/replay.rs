//! File-backed camera that replays still images as captured frames.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use studyspot_types::PermissionState;

use crate::{CameraDevice, CameraError, CameraFut, JpegQuality, PermissionFut, encode_jpeg};

const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Replays frames from disk.
///
/// `source` is either a single image (every capture returns it) or a
/// directory, in which case captures cycle through its `jpg`/`jpeg`/`png`
/// files in file-name order. The directory is re-listed on every capture so
/// frames dropped in by another process are picked up.
#[derive(Debug)]
pub struct ReplayCamera {
    source: PathBuf,
    cursor: AtomicUsize,
}

impl ReplayCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn frames(&self) -> io::Result<Vec<PathBuf>> {
        if !fs::metadata(&self.source)?.is_dir() {
            return Ok(vec![self.source.clone()]);
        }

        let mut frames: Vec<PathBuf> = fs::read_dir(&self.source)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_frame_path(path))
            .collect();
        frames.sort();
        Ok(frames)
    }

    fn next_frame(&self) -> Result<PathBuf, CameraError> {
        let frames = self.frames().map_err(map_io_error)?;
        if frames.is_empty() {
            return Err(CameraError::unavailable(format!(
                "no frames in {}",
                self.source.display()
            )));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % frames.len();
        Ok(frames[index].clone())
    }

    fn probe(&self) -> io::Result<()> {
        if fs::metadata(&self.source)?.is_dir() {
            fs::read_dir(&self.source).map(|_| ())
        } else {
            fs::File::open(&self.source).map(|_| ())
        }
    }
}

fn is_frame_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn map_io_error(err: io::Error) -> CameraError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
        _ => CameraError::unavailable(err.to_string()),
    }
}

fn capture_blocking(path: &Path, quality: JpegQuality) -> Result<Vec<u8>, CameraError> {
    let bytes = fs::read(path).map_err(map_io_error)?;
    let frame = image::load_from_memory(&bytes).map_err(|e| {
        CameraError::unavailable(format!("unreadable frame {}: {e}", path.display()))
    })?;
    encode_jpeg(&frame, quality)
}

impl CameraDevice for ReplayCamera {
    fn describe(&self) -> String {
        format!("replay: {}", self.source.display())
    }

    fn request_permission(&self) -> PermissionFut<'_> {
        Box::pin(async move {
            match self.probe() {
                Ok(()) => PermissionState::Granted,
                Err(err) => {
                    warn!(source = %self.source.display(), %err, "Camera source not accessible");
                    PermissionState::Denied
                }
            }
        })
    }

    fn capture_still(&self, quality: JpegQuality) -> CameraFut<'_, Vec<u8>> {
        Box::pin(async move {
            let path = self.next_frame()?;
            debug!(frame = %path.display(), quality = quality.get(), "Capturing still frame");
            tokio::task::spawn_blocking(move || capture_blocking(&path, quality))
                .await
                .map_err(|e| CameraError::unavailable(format!("capture task failed: {e}")))?
        })
    }
}
