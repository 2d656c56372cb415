//! Resolution applier.
//!
//! [`resolve_conflicts`] asks the model for a merged version of every
//! conflicted file and writes each reply verbatim to a `<file>.resolved`
//! sidecar. [`apply_resolutions`] is the separate, explicit step that
//! promotes sidecars over their originals.
//!
//! Failures are isolated per file: one file's completion or I/O error is
//! recorded in the report and never stops its siblings.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::hunk::extract_conflict_hunks;
use super::prompt::build_file_prompt;
use super::scanner::{try_list_conflicted_files, SIDECAR_SUFFIX};
use crate::config::ResolveConfig;
use crate::errors::ResolveError;
use crate::llm::{ChatCompletion, CompletionOptions};

/// Knobs for one resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Model override for this run.
    pub model: Option<String>,
    /// Reply token cap for a resolved file.
    pub max_tokens: u32,
    /// Files resolved at the same time; values below 1 act as 1.
    pub concurrency: usize,
    /// Leave an existing `.resolved` sidecar untouched and report it as an
    /// artifact instead of asking the model again.
    pub keep_existing: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from(&ResolveConfig::default())
    }
}

impl From<&ResolveConfig> for ResolveOptions {
    fn from(config: &ResolveConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            concurrency: config.concurrency,
            keep_existing: false,
        }
    }
}

/// Outcome of [`resolve_conflicts`].
#[derive(Debug, Default)]
pub struct ResolutionReport {
    /// Files the scanner reported, in scanner order.
    pub conflicted: Vec<PathBuf>,
    /// Sidecars written or kept, in scanner order.
    pub artifacts: Vec<PathBuf>,
    /// Sidecars that already existed and were kept, in scanner order.
    pub kept: Vec<PathBuf>,
    /// Files that carried markers but no well-formed hunk.
    pub skipped: Vec<PathBuf>,
    /// Per-file failures, in scanner order.
    pub failures: Vec<ResolveError>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`apply_resolutions`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Originals overwritten with their sidecar's content.
    pub applied: Vec<PathBuf>,
    pub failures: Vec<ResolveError>,
}

enum FileOutcome {
    Written(PathBuf),
    Kept(PathBuf),
    Skipped(PathBuf),
    Failed(ResolveError),
}

/// `file.txt` -> `file.txt.resolved`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// The original a sidecar belongs to, or `None` if `sidecar` lacks the suffix.
pub fn original_path(sidecar: &Path) -> Option<PathBuf> {
    let s = sidecar.to_str()?;
    let original = s.strip_suffix(SIDECAR_SUFFIX)?;
    if original.is_empty() || original.ends_with(std::path::MAIN_SEPARATOR) {
        return None;
    }
    Some(PathBuf::from(original))
}

/// Produce a sidecar for every conflicted file under `root`.
///
/// Fails as a whole only when `root` is not a working tree or the search
/// cannot run.
#[instrument(skip(root, client, options), fields(root = %root.display()))]
pub async fn resolve_conflicts(
    root: &Path,
    client: Arc<dyn ChatCompletion>,
    options: &ResolveOptions,
) -> Result<ResolutionReport, ResolveError> {
    let conflicted = try_list_conflicted_files(root).await?;
    let mut report = ResolutionReport {
        conflicted: conflicted.clone(),
        ..ResolutionReport::default()
    };
    if conflicted.is_empty() {
        info!("no conflicted files");
        return Ok(report);
    }

    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let options = Arc::new(options.clone());
    let mut handles = Vec::with_capacity(conflicted.len());

    for path in conflicted {
        let permits = Arc::clone(&permits);
        let client = Arc::clone(&client);
        let options = Arc::clone(&options);
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            resolve_file(&task_path, client.as_ref(), &options).await
        });
        handles.push((path, handle));
    }

    for (path, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => FileOutcome::Failed(ResolveError::IoFailure {
                path,
                source: std::io::Error::other(join_err.to_string()),
            }),
        };
        match outcome {
            FileOutcome::Written(sidecar) => report.artifacts.push(sidecar),
            FileOutcome::Kept(sidecar) => {
                report.kept.push(sidecar.clone());
                report.artifacts.push(sidecar);
            }
            FileOutcome::Skipped(path) => report.skipped.push(path),
            FileOutcome::Failed(err) => {
                warn!(error = %err, "file resolution failed");
                report.failures.push(err);
            }
        }
    }

    info!(
        artifacts = report.artifacts.len(),
        kept = report.kept.len(),
        skipped = report.skipped.len(),
        failures = report.failures.len(),
        "conflict resolution finished"
    );
    Ok(report)
}

async fn resolve_file(
    path: &Path,
    client: &dyn ChatCompletion,
    options: &ResolveOptions,
) -> FileOutcome {
    let sidecar = sidecar_path(path);
    if options.keep_existing && tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
        debug!(path = %sidecar.display(), "keeping existing sidecar");
        return FileOutcome::Kept(sidecar);
    }

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(source) => {
            return FileOutcome::Failed(ResolveError::IoFailure {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let hunks = extract_conflict_hunks(&contents);
    if hunks.is_empty() {
        debug!(path = %path.display(), "no well-formed hunks, skipping");
        return FileOutcome::Skipped(path.to_path_buf());
    }

    let prompt = build_file_prompt(path, &hunks, &contents);
    let completion = CompletionOptions::default()
        .with_model(options.model.clone())
        .with_max_tokens(options.max_tokens);

    let reply = match client.complete(&prompt, &completion).await {
        Ok(reply) => reply,
        Err(source) => {
            return FileOutcome::Failed(ResolveError::CompletionFailure {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if let Err(source) = tokio::fs::write(&sidecar, reply.as_bytes()).await {
        return FileOutcome::Failed(ResolveError::IoFailure {
            path: sidecar,
            source,
        });
    }
    debug!(path = %path.display(), hunks = hunks.len(), "wrote sidecar");
    FileOutcome::Written(sidecar)
}

/// Overwrite each original with its sidecar's content, then remove the
/// sidecar. Every artifact is attempted.
#[instrument(skip(artifacts), fields(count = artifacts.len()))]
pub async fn apply_resolutions(artifacts: &[PathBuf]) -> ApplyReport {
    let mut report = ApplyReport::default();
    for sidecar in artifacts {
        match apply_one(sidecar).await {
            Ok(original) => {
                debug!(path = %original.display(), "applied resolution");
                report.applied.push(original);
            }
            Err(err) => {
                warn!(error = %err, "could not apply resolution");
                report.failures.push(err);
            }
        }
    }
    info!(
        applied = report.applied.len(),
        failures = report.failures.len(),
        "applied resolutions"
    );
    report
}

async fn apply_one(sidecar: &Path) -> Result<PathBuf, ResolveError> {
    let io_failure = |path: &Path, source: std::io::Error| ResolveError::IoFailure {
        path: path.to_path_buf(),
        source,
    };

    let original = original_path(sidecar).ok_or_else(|| {
        io_failure(
            sidecar,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a '{}' sidecar", SIDECAR_SUFFIX),
            ),
        )
    })?;

    let merged = tokio::fs::read(sidecar)
        .await
        .map_err(|e| io_failure(sidecar, e))?;
    tokio::fs::write(&original, &merged)
        .await
        .map_err(|e| io_failure(&original, e))?;
    tokio::fs::remove_file(sidecar)
        .await
        .map_err(|e| io_failure(sidecar, e))?;
    Ok(original)
}
