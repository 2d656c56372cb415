//! Mapping Git remote URLs to GitHub `owner/repo` slugs.
//!
//! Accepts the forms `git remote -v` commonly shows:
//!
//! - `git@github.com:owner/repo.git` (scp-like SSH)
//! - `ssh://git@github.com/owner/repo.git`
//! - `https://github.com/owner/repo(.git)`, with or without credentials
//!
//! Enterprise hosts work the same way; only the last two path segments are
//! used.

use regex_lite::Regex;

use crate::errors::GitError;

const URL_FORM: &str =
    r"^(?:https?|ssh|git)://(?:[^@/]+@)?[^/]+/(?:[^/]+/)*([\w.-]+)/([\w.-]+?)(?:\.git)?/?$";
const SCP_FORM: &str = r"^(?:[\w.-]+@)?[\w.-]+:/?([\w.-]+)/([\w.-]+?)(?:\.git)?/?$";

/// Parse a remote URL into `owner/repo`.
pub fn parse_repo_slug(url: &str) -> Result<String, GitError> {
    let url = url.trim();
    let url_form = compile(URL_FORM)?;
    let scp_form = compile(SCP_FORM)?;
    let caps = url_form
        .captures(url)
        .or_else(|| scp_form.captures(url))
        .ok_or_else(|| GitError::UnrecognizedRemote(url.to_string()))?;

    match (caps.get(1), caps.get(2)) {
        (Some(owner), Some(repo)) => Ok(format!("{}/{}", owner.as_str(), repo.as_str())),
        _ => Err(GitError::UnrecognizedRemote(url.to_string())),
    }
}

fn compile(pattern: &str) -> Result<Regex, GitError> {
    Regex::new(pattern).map_err(|e| GitError::UnrecognizedRemote(e.to_string()))
}
