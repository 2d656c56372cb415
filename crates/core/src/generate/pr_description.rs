//! Pull request title and body drafting.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{split_reply, truncate_for_prompt, MAX_DIFF_CHARS};
use crate::errors::GenerateError;
use crate::git::GitCli;
use crate::llm::{ChatCompletion, CompletionOptions};

const SYSTEM: &str = "You write clear, reviewer-friendly GitHub pull request descriptions.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrDescription {
    pub title: String,
    pub body: String,
}

fn build_prompt(diff_stat: &str, subjects: &[String]) -> String {
    let commits = if subjects.is_empty() {
        "(none)".to_string()
    } else {
        subjects
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Draft a pull request for the branch summarized below.\n\
         First line: a short title, no trailing period.\n\
         Then one blank line and a Markdown body of bullet points describing the \
         changes and anything reviewers should check.\n\
         Reply with the title and body only.\n\n\
         ## Commits\n{}\n\n\
         ## Diff stat\n```\n{}\n```",
        commits,
        truncate_for_prompt(diff_stat.trim_end(), MAX_DIFF_CHARS)
    )
}

/// Draft a PR description from a diff stat and the branch's commit subjects.
pub async fn pr_description_from(
    base: &str,
    diff_stat: &str,
    subjects: &[String],
    llm: &dyn ChatCompletion,
) -> Result<PrDescription, GenerateError> {
    if diff_stat.trim().is_empty() {
        return Err(GenerateError::NoChanges {
            base: base.to_string(),
        });
    }
    let options = CompletionOptions::default().with_system(SYSTEM);
    let reply = llm
        .complete(&build_prompt(diff_stat, subjects), &options)
        .await?;
    let (title, body) = split_reply(&reply).ok_or(GenerateError::EmptyReply)?;
    let title = title.trim_start_matches('#').trim().to_string();
    debug!(%title, "drafted pull request description");
    Ok(PrDescription { title, body })
}

/// Draft a PR description for HEAD against `base`.
#[instrument(skip(git, llm), fields(workdir = %git.workdir().display()))]
pub async fn generate_pr_description(
    git: &GitCli,
    llm: &dyn ChatCompletion,
    base: &str,
) -> Result<PrDescription, GenerateError> {
    let diff_stat = git.branch_diff_stat(base).await?;
    if diff_stat.trim().is_empty() {
        return Err(GenerateError::NoChanges {
            base: base.to_string(),
        });
    }
    let subjects = git.commit_subjects(base).await?;
    pr_description_from(base, &diff_stat, &subjects, llm).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use async_trait::async_trait;

    const FAKE_DIFF: &str = " foo.py | 2 +-\n bar.py | 1 +\n 2 files changed, 2 insertions(+), 1 deletion(-)\n";

    struct Fixed(&'static str);

    #[async_trait]
    impl ChatCompletion for Fixed {
        async fn complete(&self, prompt: &str, _: &CompletionOptions) -> Result<String, LlmError> {
            assert!(prompt.contains("- feat: add new api"));
            assert!(prompt.contains("2 files changed"));
            Ok(self.0.to_string())
        }
    }

    fn subjects() -> Vec<String> {
        vec![
            "feat: add new api".into(),
            "fix: handle edge case".into(),
            "docs: update readme".into(),
        ]
    }

    #[tokio::test]
    async fn test_pr_description_success() {
        let llm = Fixed(
            "add comprehensive api and docs\n\n\
             * Introduces the new endpoint with full validation.\n\
             * Fixes an edge case in error handling.",
        );
        let pr = pr_description_from("main", FAKE_DIFF, &subjects(), &llm)
            .await
            .unwrap();
        assert!(pr.title.starts_with("add comprehensive api"));
        assert!(pr.body.contains("* Introduces the new endpoint"));
    }

    #[tokio::test]
    async fn test_markdown_heading_is_stripped_from_title() {
        let llm = Fixed("## Add api\n\n* body");
        let pr = pr_description_from("main", FAKE_DIFF, &subjects(), &llm)
            .await
            .unwrap();
        assert_eq!(pr.title, "Add api");
    }

    #[tokio::test]
    async fn test_no_changes() {
        let result = pr_description_from("main", "", &[], &Fixed("unused")).await;
        assert!(matches!(result, Err(GenerateError::NoChanges { ref base }) if base == "main"));
    }

    #[test]
    fn test_prompt_without_commits() {
        let prompt = build_prompt(FAKE_DIFF, &[]);
        assert!(prompt.contains("## Commits\n(none)"));
    }
}
