//! Snapping requested durations to what a model family accepts.

/// Duration used when the caller does not ask for one.
pub const DEFAULT_DURATION_SECS: u32 = 8;

/// Outcome of normalizing a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDuration {
    /// Duration to send.
    pub secs: u32,
    /// The requested value, when it differed from `secs`.
    pub adjusted_from: Option<u32>,
}

impl NormalizedDuration {
    /// Human-readable notice for an adjusted duration.
    pub fn notice(&self) -> Option<String> {
        self.adjusted_from.map(|requested| {
            format!(
                "duration {requested}s is not supported by this model, using {}s",
                self.secs
            )
        })
    }
}

/// Returns the permitted value closest to `requested`.
///
/// Ties go to the lower value. `permitted` must be sorted ascending and
/// non-empty; an empty set leaves the request as is.
pub fn normalize_duration(requested: u32, permitted: &[u32]) -> NormalizedDuration {
    // min_by_key keeps the first minimum, so ascending order breaks ties low.
    let Some(&secs) = permitted
        .iter()
        .min_by_key(|&&candidate| candidate.abs_diff(requested))
    else {
        return NormalizedDuration {
            secs: requested,
            adjusted_from: None,
        };
    };

    let normalized = NormalizedDuration {
        secs,
        adjusted_from: (secs != requested).then_some(requested),
    };
    if let Some(notice) = normalized.notice() {
        tracing::debug!(requested, normalized = secs, "{notice}");
    }
    normalized
}
