//! `gitscribe prcreate` / `gitscribe prdraft`.

use std::path::Path;

use anyhow::{Context, Result};

use gitscribe_core::generate::generate_pr_description;
use gitscribe_core::git::GitHubClient;
use gitscribe_core::{open_pull_request, AppConfig, PullRequestRequest};

use super::{confirm, llm_client, require_repo};
use crate::style;

pub async fn run(
    config: &AppConfig,
    path: &Path,
    base: Option<String>,
    yes: bool,
    draft: bool,
) -> Result<()> {
    let git = require_repo(path).await?;
    let base = base.unwrap_or_else(|| config.github.default_base.clone());
    let token = config.require_github_token()?;
    let llm = llm_client(config)?;

    let spinner = style::spinner(format!("Drafting pull request against {}...", base));
    let drafted = generate_pr_description(&git, &llm, &base).await;
    spinner.finish_and_clear();
    let description = drafted.context("failed to draft pull request description")?;

    println!("{}", style::header(&description.title));
    println!();
    println!("{}", description.body);
    println!();

    let prompt = if draft {
        "Open this as a draft pull request?"
    } else {
        "Open this pull request?"
    };
    if !confirm(prompt, yes)? {
        println!("{}", style::dim("Cancelled, no pull request opened."));
        return Ok(());
    }

    let client = GitHubClient::new(&config.github.api_url, token)?;
    let request = PullRequestRequest {
        title: description.title,
        body: description.body,
        base,
        head: None,
        draft,
    };

    let spinner = style::spinner("Pushing and opening pull request...");
    let opened = open_pull_request(path, &client, request).await;
    spinner.finish_and_clear();
    let url = opened.context("failed to open pull request")?;

    let label = if draft {
        "Draft pull request created"
    } else {
        "Pull request created"
    };
    println!("{}", style::success(&format!("{}: {}", label, url)));
    Ok(())
}
