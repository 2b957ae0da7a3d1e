//! Model aliases and per-family request capabilities.

/// Alias used when the caller does not pick a model.
pub const DEFAULT_MODEL_ALIAS: &str = "fast";

/// Short aliases and the canonical model each resolves to.
pub const MODEL_ALIASES: &[(&str, &str)] = &[
    ("fast", "veo-3.1-fast-generate-preview"),
    ("3.1-fast", "veo-3.1-fast-generate-preview"),
    ("veo-3.1-fast", "veo-3.1-fast-generate-preview"),
    ("quality", "veo-3.1-generate-preview"),
    ("3.1", "veo-3.1-generate-preview"),
    ("veo-3.1", "veo-3.1-generate-preview"),
    ("3", "veo-3.0-generate-001"),
    ("veo-3", "veo-3.0-generate-001"),
    ("3-fast", "veo-3.0-fast-generate-001"),
    ("veo-3-fast", "veo-3.0-fast-generate-001"),
    ("2", "veo-2.0-generate-001"),
    ("veo-2", "veo-2.0-generate-001"),
];

/// Resolves an alias to a fully-qualified model id.
///
/// Lookup is case-insensitive. Anything not in [`MODEL_ALIASES`] is returned
/// unchanged and left for the service to validate.
pub fn resolve_model(name: &str) -> String {
    let trimmed = name.trim();
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, model)| (*model).to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Optional request fields that only some model families accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictedField {
    /// Last frame image.
    LastFrame,
    /// Prompt enhancement toggle.
    EnhancePrompt,
    /// Audio track toggle.
    GenerateAudio,
    /// Frames per second.
    Fps,
    /// Output resolution.
    Resolution,
    /// Random seed.
    Seed,
}

impl RestrictedField {
    /// Returns the field name as it appears on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::LastFrame => "lastFrame",
            Self::EnhancePrompt => "enhancePrompt",
            Self::GenerateAudio => "generateAudio",
            Self::Fps => "fps",
            Self::Resolution => "resolution",
            Self::Seed => "seed",
        }
    }
}

impl std::fmt::Display for RestrictedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A group of models sharing which optional fields they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// `veo-2*`
    Veo2,
    /// `veo-3.0*`
    Veo3,
    /// `veo-3.1*`
    Veo31,
    /// Any model not recognized above.
    Other,
}

/// What a model family accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Permitted durations in seconds, ascending.
    pub durations: &'static [u32],
    /// Restricted fields this family accepts.
    pub fields: &'static [RestrictedField],
}

impl Capabilities {
    /// Returns true if the family accepts `field`.
    pub fn supports(&self, field: RestrictedField) -> bool {
        self.fields.contains(&field)
    }
}

const VEO2: Capabilities = Capabilities {
    durations: &[5, 6, 7, 8],
    fields: &[
        RestrictedField::LastFrame,
        RestrictedField::EnhancePrompt,
        RestrictedField::Fps,
        RestrictedField::Seed,
    ],
};

const VEO3: Capabilities = Capabilities {
    durations: &[4, 6, 8],
    fields: &[
        RestrictedField::GenerateAudio,
        RestrictedField::Resolution,
        RestrictedField::Seed,
    ],
};

const VEO31: Capabilities = Capabilities {
    durations: &[4, 6, 8],
    fields: &[
        RestrictedField::LastFrame,
        RestrictedField::GenerateAudio,
        RestrictedField::Resolution,
        RestrictedField::Seed,
    ],
};

const OTHER: Capabilities = Capabilities {
    durations: &[4, 6, 8],
    fields: &[],
};

impl ModelFamily {
    /// Classifies a fully-qualified model id.
    pub fn of(model: &str) -> Self {
        let id = model.trim().to_ascii_lowercase();
        let id = id.strip_prefix("models/").unwrap_or(&id);
        if id.starts_with("veo-3.1") {
            Self::Veo31
        } else if id.starts_with("veo-3.0") || id == "veo-3" {
            Self::Veo3
        } else if id.starts_with("veo-2") {
            Self::Veo2
        } else {
            Self::Other
        }
    }

    /// Returns the capability table entry for this family.
    pub fn capabilities(&self) -> &'static Capabilities {
        match self {
            Self::Veo2 => &VEO2,
            Self::Veo3 => &VEO3,
            Self::Veo31 => &VEO31,
            Self::Other => &OTHER,
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Veo2 => write!(f, "veo-2"),
            Self::Veo3 => write!(f, "veo-3"),
            Self::Veo31 => write!(f, "veo-3.1"),
            Self::Other => write!(f, "other"),
        }
    }
}
