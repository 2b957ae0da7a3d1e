//! Turning user options into a [`GenerationRequest`].

use crate::error::{Result, VeoGenError};
use crate::video::duration::{normalize_duration, DEFAULT_DURATION_SECS};
use crate::video::image::load_image;
use crate::video::model::{resolve_model, ModelFamily, RestrictedField, DEFAULT_MODEL_ALIAS};
use crate::video::types::{
    AspectRatio, GenerationRequest, PersonGeneration, ReferenceImage, ReferenceKind, Resolution,
};
use std::path::PathBuf;

/// Options as supplied by the caller, before any resolution.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Alias or fully-qualified model id.
    pub model: String,
    /// Text prompt.
    pub prompt: String,
    /// Requested duration in seconds.
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
    /// First frame image path.
    pub source_image: Option<PathBuf>,
    /// Last frame image path.
    pub last_frame: Option<PathBuf>,
    /// Asset reference image paths.
    pub element_references: Vec<PathBuf>,
    /// Style reference image paths.
    pub style_references: Vec<PathBuf>,
    /// Number of videos.
    pub video_count: u32,
    /// Prompt enhancement toggle.
    pub enhance_prompt: Option<bool>,
    /// Audio track toggle.
    pub generate_audio: Option<bool>,
    /// Frames per second.
    pub fps: Option<u32>,
}

impl RequestOptions {
    /// Creates options with the given prompt and defaults for everything else.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL_ALIAS.to_string(),
            prompt: prompt.into(),
            duration_secs: DEFAULT_DURATION_SECS,
            aspect_ratio: AspectRatio::default(),
            resolution: None,
            negative_prompt: None,
            seed: None,
            person_generation: None,
            source_image: None,
            last_frame: None,
            element_references: Vec::new(),
            style_references: Vec::new(),
            video_count: 1,
            enhance_prompt: None,
            generate_audio: None,
            fps: None,
        }
    }

    /// Sets the model alias or id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the requested duration.
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the resolution.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the person generation policy.
    pub fn with_person_generation(mut self, policy: PersonGeneration) -> Self {
        self.person_generation = Some(policy);
        self
    }

    /// Sets a first frame for image-to-video.
    pub fn with_source_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_image = Some(path.into());
        self
    }

    /// Sets a last frame.
    pub fn with_last_frame(mut self, path: impl Into<PathBuf>) -> Self {
        self.last_frame = Some(path.into());
        self
    }

    /// Adds an asset reference image.
    pub fn with_element_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.element_references.push(path.into());
        self
    }

    /// Adds a style reference image.
    pub fn with_style_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.style_references.push(path.into());
        self
    }

    /// Sets the number of videos.
    pub fn with_video_count(mut self, count: u32) -> Self {
        self.video_count = count;
        self
    }

    /// Sets the prompt enhancement toggle.
    pub fn with_enhance_prompt(mut self, enhance: bool) -> Self {
        self.enhance_prompt = Some(enhance);
        self
    }

    /// Turns prompt enhancement on when the resolved model accepts it and the
    /// caller left it unset.
    pub fn with_default_enhance_prompt(mut self) -> Self {
        let caps = ModelFamily::of(&resolve_model(&self.model)).capabilities();
        if self.enhance_prompt.is_none() && caps.supports(RestrictedField::EnhancePrompt) {
            self.enhance_prompt = Some(true);
        }
        self
    }

    /// Sets the audio toggle.
    pub fn with_generate_audio(mut self, audio: bool) -> Self {
        self.generate_audio = Some(audio);
        self
    }

    /// Sets frames per second.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }
}

/// Non-fatal issue found while building a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestWarning {
    /// The duration was snapped to a permitted value.
    DurationAdjusted {
        /// What the caller asked for.
        requested: u32,
        /// What will be sent.
        used: u32,
    },
    /// A supplied field is not accepted by the model and was dropped.
    UnsupportedField {
        /// The dropped field.
        field: RestrictedField,
        /// The resolved model.
        model: String,
    },
}

impl std::fmt::Display for RequestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DurationAdjusted { requested, used } => write!(
                f,
                "duration {requested}s is not supported by this model, using {used}s"
            ),
            Self::UnsupportedField { field, model } => {
                write!(f, "{model} does not support {field}, ignoring it")
            }
        }
    }
}

/// A request together with the warnings produced while building it.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// The request to submit.
    pub request: GenerationRequest,
    /// Warnings to show the user.
    pub warnings: Vec<RequestWarning>,
}

/// Resolves the model, normalizes the duration, loads images and drops
/// fields the model family does not accept.
pub fn build_request(options: &RequestOptions) -> Result<BuiltRequest> {
    if options.video_count == 0 {
        return Err(VeoGenError::InvalidRequest(
            "video count must be at least 1".into(),
        ));
    }

    let model = resolve_model(&options.model);
    let family = ModelFamily::of(&model);
    let caps = family.capabilities();
    let mut warnings = Vec::new();

    let duration = normalize_duration(options.duration_secs, caps.durations);
    if let Some(requested) = duration.adjusted_from {
        warnings.push(RequestWarning::DurationAdjusted {
            requested,
            used: duration.secs,
        });
    }

    // Keeps a restricted value only if the family accepts it.
    let mut gate = |field: RestrictedField, supplied: bool| -> bool {
        if !supplied {
            return false;
        }
        if caps.supports(field) {
            return true;
        }
        tracing::debug!(%model, %field, "dropping field unsupported by model family");
        warnings.push(RequestWarning::UnsupportedField {
            field,
            model: model.clone(),
        });
        false
    };

    let keep_last_frame = gate(RestrictedField::LastFrame, options.last_frame.is_some());
    let resolution = options
        .resolution
        .filter(|_| gate(RestrictedField::Resolution, true));
    let seed = options.seed.filter(|_| gate(RestrictedField::Seed, true));
    let enhance_prompt = options
        .enhance_prompt
        .filter(|_| gate(RestrictedField::EnhancePrompt, true));
    let generate_audio = options
        .generate_audio
        .filter(|_| gate(RestrictedField::GenerateAudio, true));
    let fps = options.fps.filter(|_| gate(RestrictedField::Fps, true));

    let source_image = options.source_image.as_ref().map(load_image).transpose()?;
    let last_frame = match &options.last_frame {
        Some(path) if keep_last_frame => Some(load_image(path)?),
        _ => None,
    };

    let reference_images = options
        .element_references
        .iter()
        .map(|path| (path, ReferenceKind::Asset))
        .chain(
            options
                .style_references
                .iter()
                .map(|path| (path, ReferenceKind::Style)),
        )
        .map(|(path, kind)| {
            Ok(ReferenceImage {
                image: load_image(path)?,
                kind,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let request = GenerationRequest {
        model,
        prompt: options.prompt.clone(),
        source_image,
        last_frame,
        duration_secs: duration.secs,
        aspect_ratio: options.aspect_ratio,
        resolution,
        negative_prompt: options.negative_prompt.clone(),
        seed,
        person_generation: options.person_generation,
        reference_images,
        video_count: options.video_count,
        enhance_prompt,
        generate_audio,
        fps,
    };

    Ok(BuiltRequest { request, warnings })
}
