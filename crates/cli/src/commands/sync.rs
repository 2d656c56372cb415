//! `gitscribe sync`: stage, commit with a drafted message, push.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use gitscribe_core::errors::GenerateError;
use gitscribe_core::generate::generate_commit_message;
use gitscribe_core::git::repo;
use gitscribe_core::AppConfig;

use super::{confirm, llm_client, require_repo};
use crate::style;

pub async fn run(config: &AppConfig, path: &Path, yes: bool) -> Result<()> {
    let git = require_repo(path).await?;
    let llm = llm_client(config)?;

    git.add_all().await.context("failed to stage changes")?;

    let spinner = style::spinner("Drafting commit message...");
    let drafted = generate_commit_message(&git, &llm).await;
    spinner.finish_and_clear();

    let message = match drafted {
        Ok(message) => message,
        Err(GenerateError::NothingStaged) => {
            println!("Nothing to commit.");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to draft commit message"),
    };

    println!("{}", style::header(&message.subject));
    if !message.body.is_empty() {
        println!();
        println!("{}", message.body);
    }
    println!();

    if !confirm("Commit and push with this message?", yes)? {
        println!("{}", style::dim("Cancelled, nothing committed."));
        return Ok(());
    }

    git.commit(&message.subject, &message.body)
        .await
        .context("git commit failed")?;
    let branch = repo::current_branch(path)?;
    info!(%branch, "pushing");

    let spinner = style::spinner(format!("Pushing {}...", branch));
    let pushed = git.push_branch(&branch).await;
    spinner.finish_and_clear();
    pushed.with_context(|| format!("failed to push '{}'", branch))?;

    println!("{}", style::success(&format!("Committed and pushed to {}", branch)));
    Ok(())
}
