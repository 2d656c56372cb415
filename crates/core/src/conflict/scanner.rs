//! Conflict scanner: which files in a working tree still carry markers.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::errors::ResolveError;
use crate::git::GitCli;

/// The start-of-conflict marker git writes, including its trailing space.
pub const CONFLICT_MARKER: &str = "<<<<<<< ";

/// Suffix appended to a conflicted file's name for its proposed resolution.
pub const SIDECAR_SUFFIX: &str = ".resolved";

/// Fail with [`ResolveError::NotARepository`] unless `root` is inside a git
/// working tree.
pub async fn ensure_repository(root: &Path) -> Result<(), ResolveError> {
    match GitCli::new(root).is_work_tree().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ResolveError::NotARepository(root.to_path_buf())),
        Err(e) => Err(ResolveError::Search(e)),
    }
}

/// Files under `root` containing [`CONFLICT_MARKER`], sorted, joined onto
/// `root`.
///
/// Binary files and `*.resolved` sidecars are never reported. Zero matches
/// is `Ok(vec![])`; a non-repository or a failing search is an error.
#[instrument(skip(root), fields(root = %root.display()))]
pub async fn try_list_conflicted_files(root: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    ensure_repository(root).await?;

    let mut files: Vec<PathBuf> = GitCli::new(root)
        .grep_files(CONFLICT_MARKER)
        .await
        .map_err(ResolveError::Search)?
        .into_iter()
        .filter(|rel| !rel.ends_with(SIDECAR_SUFFIX))
        .map(|rel| root.join(rel))
        .collect();
    files.sort();

    debug!(count = files.len(), "conflicted files found");
    Ok(files)
}

/// Like [`try_list_conflicted_files`], but every failure, including "not a
/// repository", reads as "nothing to resolve".
pub async fn list_conflicted_files(root: &Path) -> Vec<PathBuf> {
    match try_list_conflicted_files(root).await {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "conflict scan failed, treating as no conflicts");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_repository_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "<<<<<<< HEAD\n").unwrap();

        assert!(list_conflicted_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_lists_nothing() {
        let missing = Path::new("/nonexistent/gitscribe/scan");
        assert!(list_conflicted_files(missing).await.is_empty());
        assert!(matches!(
            ensure_repository(missing).await,
            Err(ResolveError::NotARepository(_))
        ));
    }
}
