//! Push the current branch and open a pull request for it.

use std::path::Path;

use tracing::{info, instrument};

use crate::errors::{CoreError, GitError, GitHubError};
use crate::git::{parse_repo_slug, repo, GitCli, GitHubClient, NewPullRequest};

/// What to open.
#[derive(Debug, Clone)]
pub struct PullRequestRequest {
    pub title: String,
    pub body: String,
    pub base: String,
    /// Branch to propose. When `None` the current branch is pushed with
    /// upstream tracking and used.
    pub head: Option<String>,
    pub draft: bool,
}

/// Open a pull request from the repository at `path` and return its URL.
#[instrument(skip(client, request), fields(path = %path.display(), draft = request.draft))]
pub async fn open_pull_request(
    path: &Path,
    client: &GitHubClient,
    request: PullRequestRequest,
) -> Result<String, CoreError> {
    let git = GitCli::new(path);
    if !git.is_work_tree().await? {
        return Err(GitError::NotARepository(path.display().to_string()).into());
    }

    let head = match request.head {
        Some(head) => head,
        None => {
            let branch = repo::current_branch(path)?;
            git.push_branch(&branch).await?;
            branch
        }
    };

    let slug = parse_repo_slug(&repo::remote_url(path, "origin")?)?;
    let new_pr = NewPullRequest::new(request.title, request.body, head, request.base)
        .draft(request.draft);
    let pr = client.create_pull_request(&slug, &new_pr).await?;

    let url = pr
        .html_url
        .ok_or_else(|| GitHubError::ParseError("response is missing 'html_url'".into()))?;
    info!(%url, number = pr.number, "pull request opened");
    Ok(url)
}
