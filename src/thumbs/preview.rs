//! Preview rendering via the `image` crate.
//!
//! Previews are bounded to [`THUMB_SIZE`](super::THUMB_SIZE) square pixels,
//! re-encoded as JPEG and returned as a base64 data-URL suitable for direct
//! embedding in an `<img>` tag.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;

use super::{ThumbError, THUMB_SIZE};

/// Render the preview data-URL for an image file.
///
/// Decode or encode failures propagate as [`ThumbError::Preview`]; no
/// placeholder preview is substituted.
pub fn render_data_url(path: &Path) -> Result<String, ThumbError> {
    let img = image::open(path).map_err(|e| ThumbError::Preview {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Only shrink: images already inside the bounding box keep their size.
    let thumb = if img.width() > THUMB_SIZE || img.height() > THUMB_SIZE {
        img.thumbnail(THUMB_SIZE, THUMB_SIZE)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = thumb.into_rgb8();
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|e| ThumbError::Preview {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
}
