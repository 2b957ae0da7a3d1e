//! Remote capabilities the generation pipeline depends on.

use crate::error::Result;
use crate::video::types::{GenerationRequest, Operation};
use async_trait::async_trait;
use std::path::Path;

/// Submits generation requests and re-fetches operation status.
#[async_trait]
pub trait OperationClient: Send + Sync {
    /// Submits a request, returning the initial operation handle.
    ///
    /// Rejections surface as [`crate::VeoGenError::Submission`].
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation>;

    /// Fetches the current state of an operation.
    async fn fetch(&self, operation: &Operation) -> Result<Operation>;
}

/// Downloads a remote video to a local file.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Streams `uri` into `path`, returning the number of bytes written.
    async fn fetch_to_file(&self, uri: &str, path: &Path) -> Result<u64>;
}
