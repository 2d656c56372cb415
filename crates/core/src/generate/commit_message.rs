//! Commit message drafting from the staged diff.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{split_reply, truncate_for_prompt, MAX_DIFF_CHARS};
use crate::errors::GenerateError;
use crate::git::GitCli;
use crate::llm::{ChatCompletion, CompletionOptions};

const SYSTEM: &str = "You write concise, high-quality Git commit messages.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    pub subject: String,
    pub body: String,
}

fn build_prompt(diff: &str) -> String {
    format!(
        "Write a commit message for the staged changes below.\n\
         Use the Conventional Commits style for the subject line \
         (e.g. `feat(parser): support CRLF input`), imperative mood, at most 72 characters.\n\
         Leave one blank line, then a short body explaining what changed and why.\n\
         Reply with the commit message only.\n\n\
         ```diff\n{}\n```",
        truncate_for_prompt(diff.trim_end(), MAX_DIFF_CHARS)
    )
}

/// Draft a commit message for `diff`.
pub async fn commit_message_from_diff(
    diff: &str,
    llm: &dyn ChatCompletion,
) -> Result<CommitMessage, GenerateError> {
    if diff.trim().is_empty() {
        return Err(GenerateError::NothingStaged);
    }
    let options = CompletionOptions::default().with_system(SYSTEM);
    let reply = llm.complete(&build_prompt(diff), &options).await?;
    let (subject, body) = split_reply(&reply).ok_or(GenerateError::EmptyReply)?;
    debug!(%subject, "drafted commit message");
    Ok(CommitMessage { subject, body })
}

/// Draft a commit message for whatever is currently staged.
#[instrument(skip(git, llm), fields(workdir = %git.workdir().display()))]
pub async fn generate_commit_message(
    git: &GitCli,
    llm: &dyn ChatCompletion,
) -> Result<CommitMessage, GenerateError> {
    let diff = git.staged_diff().await?;
    commit_message_from_diff(&diff, llm).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use async_trait::async_trait;

    const FAKE_DIFF: &str = "\
diff --git a/foo.py b/foo.py
--- a/foo.py
+++ b/foo.py
@@
-print(\"hello\")
+print(\"hello world\")
";

    struct Reply(Result<&'static str, ()>);

    #[async_trait]
    impl ChatCompletion for Reply {
        async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError> {
            assert!(prompt.contains("hello world"));
            assert!(options.system.is_some());
            self.0
                .map(str::to_string)
                .map_err(|_| LlmError::Network("down".into()))
        }
    }

    #[tokio::test]
    async fn test_commit_message_success() {
        let llm = Reply(Ok("feat(foo): improve greeting\n\n\
                            Expand the greeting in foo.py from a single word to a full phrase."));
        let msg = commit_message_from_diff(FAKE_DIFF, &llm).await.unwrap();
        assert_eq!(msg.subject, "feat(foo): improve greeting");
        assert!(msg.body.starts_with("Expand the greeting"));
    }

    #[tokio::test]
    async fn test_empty_diff_is_nothing_staged() {
        let llm = Reply(Ok("unused"));
        let result = commit_message_from_diff("  \n", &llm).await;
        assert!(matches!(result, Err(GenerateError::NothingStaged)));
    }

    #[tokio::test]
    async fn test_blank_reply_is_empty_reply() {
        let llm = Reply(Ok("\n  \n"));
        let result = commit_message_from_diff(FAKE_DIFF, &llm).await;
        assert!(matches!(result, Err(GenerateError::EmptyReply)));
    }

    #[tokio::test]
    async fn test_llm_failure_is_wrapped() {
        let llm = Reply(Err(()));
        let result = commit_message_from_diff(FAKE_DIFF, &llm).await;
        assert!(matches!(result, Err(GenerateError::Llm(LlmError::Network(_)))));
    }
}
