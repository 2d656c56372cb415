//! Subcommand implementations.

pub mod config;
pub mod pr;
pub mod resolve;
pub mod stats;
pub mod summarize;
pub mod sync;

use std::path::Path;

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;

use gitscribe_core::git::GitCli;
use gitscribe_core::{AppConfig, LlmClient};

/// A [`GitCli`] for `path`, or an error if it is not inside a work tree.
pub(crate) async fn require_repo(path: &Path) -> Result<GitCli> {
    let git = GitCli::new(path);
    if !git.is_work_tree().await? {
        bail!("Not inside a Git repository: {}", path.display());
    }
    Ok(git)
}

/// The configured chat-completion client. Fails early when no key is set.
pub(crate) fn llm_client(config: &AppConfig) -> Result<LlmClient> {
    config.require_api_key()?;
    LlmClient::new(&config.llm).context("failed to create LLM client")
}

/// Ask a yes/no question, defaulting to yes. `assume_yes` skips the prompt.
pub(crate) fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .context("failed to read confirmation")
}
