//! Git plumbing: the `git` binary, `git2` inspection, and the GitHub API.

pub mod cli;
pub mod github;
pub mod remote_url;
pub mod repo;

pub use cli::{CommitInfo, GitCli};
pub use github::{GitHubClient, NewPullRequest, PullRequest};
pub use remote_url::parse_repo_slug;
