//! JSON shapes exchanged with `POST {base_url}/detect`.
//!
//! | Direction | Body |
//! |-----------|------|
//! | request   | `{ "image": "<base64 JPEG>" }` |
//! | response  | `{ "people_count": 3, "processed_image": "<base64 JPEG>" }` |
//! | error     | `{ "error": "Failed to decode image" }` with a 4xx/5xx status |

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use studyspot_types::{AnnotatedImage, CaptureResult};

#[derive(Debug, Serialize)]
pub(crate) struct DetectRequest {
    pub(crate) image: String,
}

impl DetectRequest {
    pub(crate) fn from_jpeg(jpeg: &[u8]) -> Self {
        Self {
            image: STANDARD.encode(jpeg),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    people_count: u32,
    processed_image: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Parse a 2xx body into a result, or describe why it is malformed.
pub(crate) fn parse_detect_response(body: &[u8]) -> Result<CaptureResult, String> {
    let response: DetectResponse =
        serde_json::from_slice(body).map_err(|e| format!("invalid response body: {e}"))?;

    let image = STANDARD
        .decode(response.processed_image.trim())
        .map_err(|e| format!("processed_image is not base64: {e}"))?;
    let image = AnnotatedImage::new(image).map_err(|e| e.to_string())?;

    Ok(CaptureResult::new(response.people_count, image))
}

/// Extract the service's `error` message from a failure body, if it sent one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error)
        .filter(|msg| !msg.trim().is_empty())
}
