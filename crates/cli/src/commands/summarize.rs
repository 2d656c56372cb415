//! `gitscribe summarize`.

use std::path::Path;

use anyhow::{Context, Result};

use gitscribe_core::generate::summarize_commits;
use gitscribe_core::AppConfig;

use super::{llm_client, require_repo};
use crate::style;

pub async fn run(config: &AppConfig, path: &Path, count: usize) -> Result<()> {
    let git = require_repo(path).await?;
    let llm = llm_client(config)?;

    let spinner = style::spinner(format!("Summarizing the last {} commit(s)...", count));
    let summary = summarize_commits(&git, &llm, count).await;
    spinner.finish_and_clear();

    let summary = summary.context("failed to summarize commits")?;
    println!("{}", style::header("Summary"));
    println!("{}", summary);
    Ok(())
}
