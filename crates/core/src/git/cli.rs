//! Asynchronous wrapper around the `git` binary.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

const FIELD_SEP: char = '\u{1f}';

/// Metadata for one commit as reported by `git log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub abbrev: String,
    pub author: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub subject: String,
}

/// Runs `git` subcommands inside one working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Whether the working directory is inside a git work tree.
    ///
    /// A missing directory or a failing `rev-parse` is `Ok(false)`; only a
    /// missing `git` binary is an error.
    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    pub async fn is_work_tree(&self) -> Result<bool, GitError> {
        if !self.workdir.is_dir() {
            debug!("workdir does not exist");
            return Ok(false);
        }
        match self.run_git(&["rev-parse", "--is-inside-work-tree"]).await {
            Ok(out) => Ok(out.trim() == "true"),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List files containing the literal `needle`, relative to the workdir.
    ///
    /// Binary files are skipped and untracked files that are not ignored are
    /// searched too. Exit status 1 (no match) yields an empty list.
    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    pub async fn grep_files(&self, needle: &str) -> Result<Vec<String>, GitError> {
        let output = self
            .run_git_raw(&[
                "grep",
                "-l",
                "-z",
                "-I",
                "--untracked",
                "--fixed-strings",
                "-e",
                needle,
                "--",
                ".",
            ])
            .await?;

        match output.status.code() {
            Some(0) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let files: Vec<String> = stdout
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                debug!(count = files.len(), "git grep matched files");
                Ok(files)
            }
            Some(1) => {
                debug!("git grep found no matches");
                Ok(Vec::new())
            }
            code => Err(command_failed(code, &output.stderr)),
        }
    }

    /// Unified diff of staged changes. Empty when nothing is staged.
    pub async fn staged_diff(&self) -> Result<String, GitError> {
        self.run_git(&["diff", "--staged"]).await
    }

    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    pub async fn add_all(&self) -> Result<(), GitError> {
        self.run_git(&["add", "--all"]).await?;
        debug!("staged all changes");
        Ok(())
    }

    /// Commit the index with a subject and an optional body paragraph.
    #[instrument(skip(self, body), fields(workdir = %self.workdir.display()))]
    pub async fn commit(&self, subject: &str, body: &str) -> Result<(), GitError> {
        let mut args = vec!["commit", "-m", subject];
        if !body.trim().is_empty() {
            args.push("-m");
            args.push(body);
        }
        self.run_git(&args).await?;
        info!("created commit");
        Ok(())
    }

    /// Push `branch` to `origin`, setting it as the upstream.
    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    pub async fn push_branch(&self, branch: &str) -> Result<(), GitError> {
        self.run_git(&["push", "-u", "origin", branch]).await?;
        info!(branch, "pushed branch");
        Ok(())
    }

    /// `git diff --stat base...HEAD`.
    pub async fn branch_diff_stat(&self, base: &str) -> Result<String, GitError> {
        let range = format!("{}...HEAD", base);
        self.run_git(&["diff", "--stat", &range]).await
    }

    /// Subjects of the commits on HEAD that are not on `base`, newest first.
    pub async fn commit_subjects(&self, base: &str) -> Result<Vec<String>, GitError> {
        let range = format!("{}..HEAD", base);
        let out = self.run_git(&["log", "--pretty=%s", &range]).await?;
        Ok(non_empty_lines(&out))
    }

    /// The last `n` commits on the current branch, newest first.
    pub async fn last_commits(&self, n: usize) -> Result<Vec<CommitInfo>, GitError> {
        let count = format!("-n{}", n);
        let out = self
            .run_git(&[
                "log",
                &count,
                "--date=short",
                "--pretty=%H%x1f%h%x1f%an%x1f%ad%x1f%s",
            ])
            .await?;
        Ok(out.lines().filter_map(parse_commit_line).collect())
    }

    /// Abbreviated hashes of commits newer than the approxidate `since`.
    pub async fn log_hashes_since(&self, since: &str) -> Result<Vec<String>, GitError> {
        let since = format!("--since={}", since);
        let out = self.run_git(&["log", &since, "--pretty=%h"]).await?;
        Ok(non_empty_lines(&out))
    }

    /// Raw `--numstat` rows for commits newer than `since`.
    pub async fn numstat_since(&self, since: &str) -> Result<String, GitError> {
        let since = format!("--since={}", since);
        self.run_git(&["log", &since, "--numstat", "--pretty=format:"])
            .await
    }

    /// Run `git` and return stdout, failing on a non-zero exit.
    async fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run_git_raw(args).await?;
        if !output.status.success() {
            return Err(command_failed(output.status.code(), &output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_git_raw(&self, args: &[&str]) -> Result<Output, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(cmd = ?format!("git {}", args.join(" ")), "running git command");
        cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::BinaryNotFound("git".into())
            } else {
                GitError::IoError(e)
            }
        })
    }
}

fn command_failed(code: Option<i32>, stderr: &[u8]) -> GitError {
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    let exit_code = code.unwrap_or(-1);
    warn!(exit_code, %stderr, "git command failed");
    GitError::CommandFailed { exit_code, stderr }
}

fn non_empty_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let mut fields = line.split(FIELD_SEP);
    Some(CommitInfo {
        hash: fields.next()?.to_string(),
        abbrev: fields.next()?.to_string(),
        author: fields.next()?.to_string(),
        date: fields.next()?.to_string(),
        subject: fields.next()?.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commit_line() {
        let line = "aaaa\u{1f}a1b2\u{1f}Alice\u{1f}2025-06-15\u{1f}feat: add stats ";
        let info = parse_commit_line(line).unwrap();
        assert_eq!(info.hash, "aaaa");
        assert_eq!(info.abbrev, "a1b2");
        assert_eq!(info.author, "Alice");
        assert_eq!(info.date, "2025-06-15");
        assert_eq!(info.subject, "feat: add stats");
    }

    #[test]
    fn test_parse_commit_line_short_row_is_skipped() {
        assert!(parse_commit_line("only\u{1f}two").is_none());
    }

    #[test]
    fn test_non_empty_lines() {
        assert_eq!(non_empty_lines("a\n\n  b \n"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_workdir_is_not_a_work_tree() {
        let cli = GitCli::new("/nonexistent/gitscribe/workdir");
        assert!(!cli.is_work_tree().await.unwrap());
    }
}
