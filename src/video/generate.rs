//! End-to-end generation: build, submit, poll, save.

use crate::error::Result;
use crate::video::output::{resolve_results, OutputPlan, ResolveReport};
use crate::video::poller::{OperationPoller, PollPolicy};
use crate::video::provider::{OperationClient, VideoFetcher};
use crate::video::request::{build_request, RequestOptions, RequestWarning};
use std::path::PathBuf;
use std::time::Instant;

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Resolved model id.
    pub model: String,
    /// Duration actually requested, in seconds.
    pub duration_secs: u32,
    /// Name of the remote operation.
    pub operation: String,
    /// Warnings raised while building the request.
    pub warnings: Vec<RequestWarning>,
    /// Files written and items skipped.
    pub report: ResolveReport,
    /// Wall-clock time from submission to the last file written.
    pub elapsed_ms: u64,
}

impl GenerationOutcome {
    /// Files written, in item order.
    pub fn saved(&self) -> &[PathBuf] {
        &self.report.saved
    }
}

/// Runs one generation job.
///
/// `on_warning` sees each build warning before submission; `on_poll` is
/// called after every status fetch.
pub async fn generate<C>(
    client: &C,
    options: &RequestOptions,
    output: impl Into<PathBuf>,
    policy: PollPolicy,
    mut on_warning: impl FnMut(&RequestWarning),
    on_poll: impl FnMut(u32) + Send,
) -> Result<GenerationOutcome>
where
    C: OperationClient + VideoFetcher,
{
    let built = build_request(options)?;
    for warning in &built.warnings {
        on_warning(warning);
    }
    let request = built.request;
    let plan = OutputPlan::new(output, request.video_count);

    let start = Instant::now();
    let operation = OperationPoller::new(client)
        .policy(policy)
        .on_poll(on_poll)
        .run(&request)
        .await?;
    let operation_name = operation.name.clone();

    let report = resolve_results(operation, &plan, client).await?;

    Ok(GenerationOutcome {
        model: request.model,
        duration_secs: request.duration_secs,
        operation: operation_name,
        warnings: built.warnings,
        report,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
