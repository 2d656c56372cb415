//! Commit and line-change statistics over a recent time window.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::GenerateError;
use crate::git::GitCli;

/// Totals for a window. Binary files are excluded from every count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStats {
    pub commits: usize,
    /// Distinct paths touched.
    pub files: usize,
    pub additions: u64,
    pub deletions: u64,
}

/// Convert a window like `7d` into a git approxidate (`7.days.ago`).
///
/// Units: `h` hours, `d` days, `w` weeks, `m` months, `y` years.
pub fn parse_window(last: &str) -> Result<String, GenerateError> {
    let invalid = || GenerateError::InvalidWindow(last.to_string());
    let last = last.trim();
    let split = last
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (amount, unit) = last.split_at(split);
    let amount: u32 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }
    let unit = match unit.to_ascii_lowercase().as_str() {
        "h" => "hours",
        "d" => "days",
        "w" => "weeks",
        "m" => "months",
        "y" => "years",
        _ => return Err(invalid()),
    };
    Ok(format!("{}.{}.ago", amount, unit))
}

/// Fold `git log --numstat` rows into `(files, additions, deletions)`.
///
/// Rows whose counts are `-` (binary) or otherwise non-numeric are ignored.
pub fn parse_numstat(numstat: &str) -> (usize, u64, u64) {
    let mut paths = BTreeSet::new();
    let mut additions = 0u64;
    let mut deletions = 0u64;

    for line in numstat.lines() {
        let mut cols = line.trim_start().splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (cols.next(), cols.next(), cols.next())
        else {
            continue;
        };
        let (Ok(added), Ok(deleted)) = (added.parse::<u64>(), deleted.parse::<u64>()) else {
            continue;
        };
        additions += added;
        deletions += deleted;
        paths.insert(path.trim().to_string());
    }

    (paths.len(), additions, deletions)
}

/// Gather [`RepoStats`] for commits newer than the window `last`.
#[instrument(skip(git), fields(workdir = %git.workdir().display()))]
pub async fn collect_stats(git: &GitCli, last: &str) -> Result<RepoStats, GenerateError> {
    let since = parse_window(last)?;
    let commits = git.log_hashes_since(&since).await?.len();
    if commits == 0 {
        return Ok(RepoStats::default());
    }
    let (files, additions, deletions) = parse_numstat(&git.numstat_since(&since).await?);
    let stats = RepoStats {
        commits,
        files,
        additions,
        deletions,
    };
    debug!(?stats, "collected stats");
    Ok(stats)
}
