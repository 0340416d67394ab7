use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::{CameraError, JpegQuality};

/// Re-encode a decoded frame as baseline JPEG.
///
/// Alpha is dropped; JPEG has no alpha channel.
pub fn encode_jpeg(frame: &DynamicImage, quality: JpegQuality) -> Result<Vec<u8>, CameraError> {
    let rgb = frame.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(CameraError::Encode("frame has no pixels".to_string()));
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.percent())
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CameraError::Encode(e.to_string()))?;
    Ok(out)
}
