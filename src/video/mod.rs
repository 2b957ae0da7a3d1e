//! Video generation module.

pub mod duration;
pub mod generate;
pub mod image;
pub mod model;
pub mod output;
pub mod poller;
mod provider;
pub mod providers;
pub mod request;
mod types;

pub use generate::{generate, GenerationOutcome};
pub use output::{resolve_results, OutputPlan, ResolveReport, SkippedItem};
pub use poller::{Backoff, OperationPoller, OperationState, PollPolicy};
pub use provider::{OperationClient, VideoFetcher};
pub use request::{build_request, BuiltRequest, RequestOptions, RequestWarning};
pub use types::{
    AspectRatio, GeneratedVideo, GenerationRequest, Image, Operation, OperationResult,
    PersonGeneration, ReferenceImage, ReferenceKind, Resolution, VideoPayload,
};
