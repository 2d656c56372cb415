//! One-paragraph summaries of recent history.

use tracing::instrument;

use crate::errors::GenerateError;
use crate::git::{CommitInfo, GitCli};
use crate::llm::{ChatCompletion, CompletionOptions};

fn build_prompt(commits: &[CommitInfo]) -> String {
    let listing = commits
        .iter()
        .map(|c| format!("- {} {} ({}, {})", c.abbrev, c.subject, c.author, c.date))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Summarize the following commits in one short paragraph for a stand-up \
         or release note. Focus on user-visible changes. Reply with the paragraph only.\n\n{}",
        listing
    )
}

pub async fn summary_from_commits(
    commits: &[CommitInfo],
    llm: &dyn ChatCompletion,
) -> Result<String, GenerateError> {
    if commits.is_empty() {
        return Err(GenerateError::NoCommits);
    }
    let reply = llm
        .complete(&build_prompt(commits), &CompletionOptions::default())
        .await?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(GenerateError::EmptyReply);
    }
    Ok(reply.to_string())
}

/// Summarize the last `n` commits on the current branch.
#[instrument(skip(git, llm), fields(workdir = %git.workdir().display()))]
pub async fn summarize_commits(
    git: &GitCli,
    llm: &dyn ChatCompletion,
    n: usize,
) -> Result<String, GenerateError> {
    let commits = git.last_commits(n).await?;
    summary_from_commits(&commits, llm).await
}
