//! LLM-drafted text from repository history.
//!
//! Each generator is split into a git-facing entry point and a pure step
//! that takes already-collected input, so the model side can be exercised
//! with a stub [`ChatCompletion`](crate::llm::ChatCompletion).

pub mod commit_message;
pub mod pr_description;
pub mod stats;
pub mod summary;

pub use commit_message::{commit_message_from_diff, generate_commit_message, CommitMessage};
pub use pr_description::{generate_pr_description, pr_description_from, PrDescription};
pub use stats::{collect_stats, parse_numstat, parse_window, RepoStats};
pub use summary::{summarize_commits, summary_from_commits};

/// Upper bound on diff text sent to the model.
pub const MAX_DIFF_CHARS: usize = 16_000;

/// Split a reply into its first non-empty line and the trimmed remainder.
pub(crate) fn split_reply(reply: &str) -> Option<(String, String)> {
    let reply = reply.trim();
    let mut lines = reply.lines();
    let first = lines.by_ref().map(str::trim).find(|l| !l.is_empty())?;
    let rest: Vec<&str> = lines.collect();
    Some((first.to_string(), rest.join("\n").trim().to_string()))
}

/// At most `max` characters of `s`, cut on a char boundary, with a marker
/// when something was dropped.
pub(crate) fn truncate_for_prompt(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}\n... [truncated]", &s[..cut]),
    }
}
