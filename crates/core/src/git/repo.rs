//! Repository inspection via `git2`.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::errors::GitError;

/// Root of the working tree containing `path`.
pub fn discover(path: &Path) -> Result<PathBuf, GitError> {
    let repo = open(path)?;
    let root = repo
        .workdir()
        .ok_or_else(|| GitError::NotARepository(path.display().to_string()))?
        .to_path_buf();
    debug!(root = %root.display(), "discovered repository");
    Ok(root)
}

/// Name of the checked-out branch.
///
/// Works before the first commit. A detached HEAD yields the abbreviated
/// commit hash instead.
pub fn current_branch(path: &Path) -> Result<String, GitError> {
    let repo = open(path)?;
    let head = repo.find_reference("HEAD")?;

    if let Some(target) = head.symbolic_target() {
        let name = target.strip_prefix("refs/heads/").unwrap_or(target);
        return Ok(name.to_string());
    }

    let oid = head
        .target()
        .ok_or_else(|| GitError::NotARepository(path.display().to_string()))?;
    let short = repo.find_object(oid, None)?.short_id()?;
    Ok(short.as_str().unwrap_or_default().to_string())
}

/// URL of the named remote.
pub fn remote_url(path: &Path, name: &str) -> Result<String, GitError> {
    let repo = open(path)?;
    let remote = repo
        .find_remote(name)
        .map_err(|_| GitError::RemoteNotFound(name.to_string()))?;
    remote
        .url()
        .map(str::to_string)
        .ok_or_else(|| GitError::RemoteNotFound(name.to_string()))
}

fn open(path: &Path) -> Result<Repository, GitError> {
    Repository::discover(path).map_err(|_| GitError::NotARepository(path.display().to_string()))
}
