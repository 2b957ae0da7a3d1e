//! Loading reference and frame images from disk.

use crate::error::{Result, VeoGenError};
use crate::video::types::Image;
use std::path::Path;

/// MIME type assumed for unrecognized extensions.
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// Image formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Derives a MIME type from the path's extension, falling back to PNG.
pub fn mime_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .map(|format| format.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// Reads an image file fully into memory.
pub fn load_image(path: impl AsRef<Path>) -> Result<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| VeoGenError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let mime_type = mime_type_for(path);
    tracing::debug!(path = %path.display(), mime_type, size = bytes.len(), "loaded image");
    Ok(Image::new(bytes, mime_type))
}
