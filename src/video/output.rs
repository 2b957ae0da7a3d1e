//! Output path planning and persisting finished results.

use crate::error::{Result, VeoGenError};
use crate::video::provider::VideoFetcher;
use crate::video::types::{Operation, VideoPayload};
use std::path::{Path, PathBuf};

/// Extension used when the caller's path has none.
pub const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// Where each result item is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    base: PathBuf,
    requested: u32,
}

impl OutputPlan {
    /// Plans outputs for `requested` videos around a single user path.
    pub fn new(path: impl Into<PathBuf>, requested: u32) -> Self {
        Self {
            base: path.into(),
            requested,
        }
    }

    /// Path for item `index` (0-based, in result order).
    ///
    /// One requested video uses the path as given, adding `.mp4` only when
    /// it has no extension. Several are written to `<stem>-<n><ext>` with
    /// `n` starting at 1.
    pub fn path_for(&self, index: usize) -> PathBuf {
        if self.requested <= 1 {
            return if self.base.extension().is_some() {
                self.base.clone()
            } else {
                self.base.with_extension(DEFAULT_VIDEO_EXTENSION)
            };
        }

        let stem = self
            .base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .base
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_VIDEO_EXTENSION.to_string());
        let name = format!("{stem}-{}.{ext}", index + 1);
        match self.base.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// A result item that could not be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    /// 1-based item number.
    pub number: usize,
    /// Why it was skipped.
    pub reason: String,
}

impl std::fmt::Display for SkippedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no video data in response for video {}: {}", self.number, self.reason)
    }
}

/// Outcome of resolving a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Files written, in item order.
    pub saved: Vec<PathBuf>,
    /// Items skipped because they carried no data.
    pub skipped: Vec<SkippedItem>,
}

/// Writes every video of a finished operation to its planned path.
///
/// Fails with [`VeoGenError::NoResults`] when the operation carries no items,
/// or when every item had to be skipped. Items with neither bytes nor a URI
/// are skipped individually.
pub async fn resolve_results<F: VideoFetcher + ?Sized>(
    operation: Operation,
    plan: &OutputPlan,
    fetcher: &F,
) -> Result<ResolveReport> {
    if let Some(message) = operation.error {
        return Err(VeoGenError::Generation(message));
    }

    let result = operation.result.unwrap_or_default();
    if result.videos.is_empty() {
        if result.filtered_count > 0 {
            return Err(VeoGenError::ContentBlocked(format!(
                "{} video(s) removed by safety filters",
                result.filtered_count
            )));
        }
        return Err(VeoGenError::NoResults);
    }

    let mut report = ResolveReport::default();
    for (index, video) in result.videos.into_iter().enumerate() {
        let path = plan.path_for(index);
        match video.payload {
            VideoPayload::Inline(bytes) => {
                ensure_parent(&path).await?;
                tokio::fs::write(&path, &bytes).await?;
                tracing::info!(path = %path.display(), size = bytes.len(), "saved inline video");
            }
            VideoPayload::Remote(uri) => {
                ensure_parent(&path).await?;
                let size = fetcher.fetch_to_file(&uri, &path).await?;
                tracing::info!(path = %path.display(), size, "downloaded video");
            }
            VideoPayload::Missing => {
                let skipped = SkippedItem {
                    number: index + 1,
                    reason: "neither inline bytes nor a download URI".into(),
                };
                tracing::warn!(item = skipped.number, "{skipped}");
                report.skipped.push(skipped);
                continue;
            }
        }
        report.saved.push(path);
    }

    if report.saved.is_empty() {
        return Err(VeoGenError::NoResults);
    }
    Ok(report)
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
