//! `gitscribe stats`.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use gitscribe_core::generate::{collect_stats, RepoStats};

use super::require_repo;
use crate::style;

pub async fn run(path: &Path, last: &str) -> Result<()> {
    let git = require_repo(path).await?;
    let stats = collect_stats(&git, last)
        .await
        .context("failed to collect statistics")?;

    println!("{}", style::header(&format!("Activity over the last {}", last)));
    println!("{}", render_table(&stats));
    Ok(())
}

fn render_table(stats: &RepoStats) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Commits".to_string(), stats.commits.to_string()]);
    table.add_row(vec!["Files changed".to_string(), stats.files.to_string()]);
    table.add_row(vec!["Lines added".to_string(), format!("+{}", stats.additions)]);
    table.add_row(vec!["Lines removed".to_string(), format!("-{}", stats.deletions)]);
    table
}
