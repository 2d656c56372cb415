//! `gitscribe resolve`: draft `*.resolved` proposals for conflicted files.
//!
//! With `--apply`, sidecars already on disk are kept as reviewed and only
//! files without one are sent to the model; every sidecar is then promoted
//! over its original.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

use gitscribe_core::conflict::{
    apply_resolutions, ensure_repository, resolve_conflicts, try_list_conflicted_files,
    ResolveOptions,
};
use gitscribe_core::{AppConfig, ChatCompletion};

use super::llm_client;
use crate::style;

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveOutcome {
    NoConflicts,
    Resolved {
        generated: usize,
        kept: usize,
        applied: usize,
    },
}

pub async fn run(
    config: &AppConfig,
    path: &Path,
    apply: bool,
    model: Option<String>,
) -> Result<()> {
    let mut options = ResolveOptions::from(&config.resolve);
    if model.is_some() {
        options.model = model;
    }
    options.keep_existing = apply;

    let outcome = resolve_in(path, apply, &options, || {
        let client: Arc<dyn ChatCompletion> = Arc::new(llm_client(config)?);
        Ok(client)
    })
    .await?;
    if let ResolveOutcome::Resolved {
        generated,
        kept,
        applied,
    } = outcome
    {
        debug!(generated, kept, applied, "resolve finished");
    }
    Ok(())
}

/// Scan, resolve, report, and optionally apply. The client is only built
/// once conflicts are known to exist.
pub(crate) async fn resolve_in<F>(
    path: &Path,
    apply: bool,
    options: &ResolveOptions,
    make_client: F,
) -> Result<ResolveOutcome>
where
    F: FnOnce() -> Result<Arc<dyn ChatCompletion>>,
{
    ensure_repository(path).await?;

    let conflicted = try_list_conflicted_files(path).await?;
    if conflicted.is_empty() {
        println!("No unresolved conflicts detected.");
        return Ok(ResolveOutcome::NoConflicts);
    }
    println!("Found {} file(s) with conflict markers.", conflicted.len());

    let client = make_client()?;

    let spinner = style::spinner("Asking the model for resolutions...");
    let resolved = resolve_conflicts(path, client, options).await;
    spinner.finish_and_clear();
    let report = resolved.context("conflict resolution failed")?;

    if report.artifacts.is_empty() && report.failures.is_empty() {
        bail!("No conflicts parsed: files contain markers but no complete conflict hunk");
    }

    let generated = report.artifacts.len() - report.kept.len();
    if generated > 0 {
        println!(
            "{}",
            style::success(&format!("Generated {} *.resolved file(s)", generated))
        );
    }
    if !report.kept.is_empty() {
        println!(
            "{}",
            style::success(&format!(
                "Kept {} existing *.resolved file(s)",
                report.kept.len()
            ))
        );
    }
    for artifact in &report.artifacts {
        println!("  {}", artifact.display());
    }
    for skipped in &report.skipped {
        println!(
            "{}",
            style::dim(&format!("  skipped {} (no complete hunk)", skipped.display()))
        );
    }
    for failure in &report.failures {
        eprintln!("{}", style::error(&failure.to_string()));
    }

    let mut failed = report.failures.len();
    let mut applied = 0;
    if apply && !report.artifacts.is_empty() {
        let promoted = apply_resolutions(&report.artifacts).await;
        for path in &promoted.applied {
            println!("{}", style::success(&format!("Applied {}", path.display())));
        }
        for failure in &promoted.failures {
            eprintln!("{}", style::error(&failure.to_string()));
        }
        applied = promoted.applied.len();
        failed += promoted.failures.len();
    } else if !report.artifacts.is_empty() {
        println!(
            "{}",
            style::dim("Review or edit the proposals, then rerun with --apply to overwrite the originals.")
        );
    }

    if failed > 0 {
        bail!("{} file(s) could not be resolved", failed);
    }
    Ok(ResolveOutcome::Resolved {
        generated,
        kept: report.kept.len(),
        applied,
    })
}
