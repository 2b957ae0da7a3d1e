#![warn(missing_docs)]
//! Veogen - generate videos with Veo through the Gemini API.
//!
//! A request is built from flat options, submitted as a long-running
//! operation, polled until done, and every produced video is written to disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use veogen::{generate, PollPolicy, RequestOptions, VeoClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> veogen::Result<()> {
//!     let client = VeoClient::builder().build()?;
//!     let options = RequestOptions::new("Ocean waves crashing on a rocky shore")
//!         .with_model("fast")
//!         .with_duration(6);
//!     let outcome = generate(
//!         &client,
//!         &options,
//!         "waves.mp4",
//!         PollPolicy::default(),
//!         |warning| eprintln!("warning: {warning}"),
//!         |_| {},
//!     )
//!     .await?;
//!     println!("saved {:?}", outcome.saved());
//!     Ok(())
//! }
//! ```
//!
//! # Pieces
//!
//! - [`video::model`]: alias resolution and per-family capabilities
//! - [`video::duration`]: snapping durations to permitted values
//! - [`video::image`]: loading frame and reference images
//! - [`video::request`]: building the [`GenerationRequest`]
//! - [`video::poller`]: submit and poll until done
//! - [`video::output`]: naming and writing the results
//!
//! # Known gaps
//!
//! By default polling never times out and a failed status fetch ends the
//! run. Use [`PollPolicy`] to bound it. A download that fails part way
//! leaves a truncated file.

pub mod config;
mod error;
pub mod video;

pub use error::{Result, VeoGenError};

pub use video::model::{resolve_model, ModelFamily, DEFAULT_MODEL_ALIAS, MODEL_ALIASES};
pub use video::providers::{RemoteModel, VeoClient, VeoClientBuilder};
pub use video::{
    build_request, generate, AspectRatio, Backoff, GenerationOutcome, GenerationRequest,
    OperationClient, OutputPlan, PersonGeneration, PollPolicy, RequestOptions, RequestWarning,
    Resolution, VideoFetcher,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, VeoGenError};
    pub use crate::video::{
        generate, GenerationOutcome, OperationClient, PollPolicy, RequestOptions, VideoFetcher,
    };
    pub use crate::video::providers::VeoClient;
}
