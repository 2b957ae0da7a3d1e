//! Core types for video generation.

use serde::{Deserialize, Serialize};

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the ratio as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[serde(rename = "720p")]
    Hd,
    /// 1920x1080.
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    /// Returns the resolution as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "720p",
            Self::FullHd => "1080p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for generating people in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonGeneration {
    /// Adults only.
    AllowAdult,
    /// Adults and children.
    AllowAll,
    /// No people.
    DontAllow,
}

impl PersonGeneration {
    /// Returns the policy as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowAdult => "allow_adult",
            Self::AllowAll => "allow_all",
            Self::DontAllow => "dont_allow",
        }
    }
}

/// An image loaded into memory, ready to embed in a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Image {
    /// Creates an image from raw bytes and a MIME type.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type (e.g., "image/png").
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

// Image payloads can be megabytes; keep Debug output readable.
impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// How a reference image should bias the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// A visual asset (character, object) to include.
    Asset,
    /// An aesthetic to imitate.
    Style,
}

impl ReferenceKind {
    /// Returns the reference type as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Style => "style",
        }
    }
}

/// A reference image with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// The image data.
    pub image: Image,
    /// Asset or style.
    pub kind: ReferenceKind,
}

/// A fully resolved generation request.
///
/// Family-restricted fields (`last_frame`, `enhance_prompt`, `generate_audio`,
/// `fps`, `resolution`, `seed`) are `None` whenever the model does not accept
/// them, so they never reach the wire.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully-qualified model identifier.
    pub model: String,
    /// Text prompt.
    pub prompt: String,
    /// First frame for image-to-video.
    pub source_image: Option<Image>,
    /// Last frame.
    pub last_frame: Option<Image>,
    /// Duration in seconds, already normalized.
    pub duration_secs: u32,
    /// Aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Resolution.
    pub resolution: Option<Resolution>,
    /// What to avoid in the video.
    pub negative_prompt: Option<String>,
    /// Seed for reproducibility.
    pub seed: Option<u32>,
    /// Person generation policy.
    pub person_generation: Option<PersonGeneration>,
    /// Asset references followed by style references.
    pub reference_images: Vec<ReferenceImage>,
    /// Number of videos to generate (at least 1).
    pub video_count: u32,
    /// Let the service rewrite the prompt.
    pub enhance_prompt: Option<bool>,
    /// Generate an audio track.
    pub generate_audio: Option<bool>,
    /// Frames per second.
    pub fps: Option<u32>,
}

/// Where the bytes of one generated video live.
#[derive(Clone, PartialEq, Eq)]
pub enum VideoPayload {
    /// Video bytes returned inline.
    Inline(Vec<u8>),
    /// Video must be downloaded from this URI.
    Remote(String),
    /// Neither bytes nor URI were returned.
    Missing,
}

impl std::fmt::Debug for VideoPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline(bytes) => write!(f, "Inline({} bytes)", bytes.len()),
            Self::Remote(uri) => f.debug_tuple("Remote").field(uri).finish(),
            Self::Missing => f.write_str("Missing"),
        }
    }
}

/// One item produced by a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    /// Where to get the video from.
    pub payload: VideoPayload,
}

impl GeneratedVideo {
    /// Builds an item from optional inline bytes and optional URI.
    ///
    /// Inline bytes win when both are present.
    pub fn from_parts(bytes: Option<Vec<u8>>, uri: Option<String>) -> Self {
        let payload = match (bytes, uri) {
            (Some(bytes), _) if !bytes.is_empty() => VideoPayload::Inline(bytes),
            (_, Some(uri)) if !uri.is_empty() => VideoPayload::Remote(uri),
            _ => VideoPayload::Missing,
        };
        Self { payload }
    }
}

/// Result payload of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// Produced videos, in server order.
    pub videos: Vec<GeneratedVideo>,
    /// Number of videos removed by safety filters.
    pub filtered_count: u32,
}

/// Server-side handle for an asynchronous generation job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    /// Operation name used to re-fetch its status.
    pub name: String,
    /// Whether the job reached a terminal state.
    pub done: bool,
    /// Result payload, present once done.
    pub result: Option<OperationResult>,
    /// Error message, if the job failed.
    pub error: Option<String>,
}

impl Operation {
    /// Creates a pending operation handle.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_prefers_inline_bytes() {
        let video = GeneratedVideo::from_parts(Some(vec![1, 2]), Some("https://x".into()));
        assert_eq!(video.payload, VideoPayload::Inline(vec![1, 2]));
    }

    #[test]
    fn test_payload_falls_back_to_uri() {
        let video = GeneratedVideo::from_parts(None, Some("https://x/v.mp4".into()));
        assert_eq!(video.payload, VideoPayload::Remote("https://x/v.mp4".into()));
    }

    #[test]
    fn test_payload_missing_when_both_absent_or_empty() {
        assert_eq!(
            GeneratedVideo::from_parts(None, None).payload,
            VideoPayload::Missing
        );
        assert_eq!(
            GeneratedVideo::from_parts(Some(Vec::new()), Some(String::new())).payload,
            VideoPayload::Missing
        );
    }

    #[test]
    fn test_enum_wire_strings() {
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(Resolution::FullHd.as_str(), "1080p");
        assert_eq!(PersonGeneration::DontAllow.as_str(), "dont_allow");
        assert_eq!(ReferenceKind::Style.as_str(), "style");
        assert_eq!(
            serde_json::to_value(PersonGeneration::AllowAdult).unwrap(),
            "allow_adult"
        );
    }

    #[test]
    fn test_image_debug_hides_bytes() {
        let image = Image::new(vec![0; 1024], "image/png");
        assert_eq!(
            format!("{image:?}"),
            r#"Image { mime_type: "image/png", len: 1024 }"#
        );
    }
}
