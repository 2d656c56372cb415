//! Error types for the gitscribe core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git operations (the `git` binary and `git2`).
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// The path is not inside a Git working tree.
    #[error("not a git repository: '{0}'")]
    NotARepository(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// The named remote is not configured.
    #[error("git remote '{0}' is not configured")]
    RemoteNotFound(String),

    /// A remote URL could not be mapped to an `owner/repo` slug.
    #[error("cannot parse GitHub remote URL: {0}")]
    UnrecognizedRemote(String),

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Chat completion errors
// ---------------------------------------------------------------------------

/// Errors from the chat-completion service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key was configured.
    #[error("LLM API key not configured (set {0})")]
    MissingApiKey(String),

    /// Network / connectivity issue.
    #[error("LLM network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    /// The API key was rejected.
    #[error("LLM authentication failed (HTTP {0})")]
    Authentication(u16),

    /// Too many requests.
    #[error("LLM rate limit exceeded")]
    RateLimited,

    /// The API returned a non-success status code.
    #[error("LLM API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The reply did not contain a message.
    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required secret is not available.
    #[error("required secret for '{field}' is not set (export {var} or set it in the config file)")]
    SecretMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// The platform config directory could not be determined.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Conflict resolution errors
// ---------------------------------------------------------------------------

/// Errors from the merge-conflict resolution pipeline.
///
/// Malformed hunks are never errors; they are skipped by the parser.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The target path is not a version-controlled working tree.
    #[error("not a git working tree: '{}'", .0.display())]
    NotARepository(PathBuf),

    /// The repository-wide marker search itself failed.
    #[error("conflict search failed: {0}")]
    Search(#[source] GitError),

    /// The chat-completion call failed for one file.
    #[error("completion failed for '{}': {source}", path.display())]
    CompletionFailure {
        path: PathBuf,
        #[source]
        source: LlmError,
    },

    /// Reading a conflicted file or writing/promoting a sidecar failed.
    #[error("I/O failure on '{}': {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// The file this failure is about, if it concerns a single file.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::CompletionFailure { path, .. } | Self::IoFailure { path, .. } => Some(path),
            Self::NotARepository(_) | Self::Search(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Generator errors
// ---------------------------------------------------------------------------

/// Errors from the commit-message, PR-description, and summary generators.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// `git diff --staged` was empty.
    #[error("nothing is staged; stage changes before generating a commit message")]
    NothingStaged,

    /// The branch has no diff against its base.
    #[error("no changes between '{base}' and HEAD")]
    NoChanges { base: String },

    /// There are no commits to summarize.
    #[error("no commits to summarize")]
    NoCommits,

    /// The model replied with nothing usable.
    #[error("the model returned an empty reply")]
    EmptyReply,

    /// A stats window such as `7d` could not be understood.
    #[error("invalid time window '{0}' (expected e.g. 12h, 7d, 2w, 3m, 1y)")]
    InvalidWindow(String),

    /// Underlying git failure.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Underlying chat-completion failure.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = GitError::NotARepository("/tmp/repo".into());
        assert_eq!(err.to_string(), "not a git repository: '/tmp/repo'");

        let err = GitHubError::RateLimited {
            reset_at: "1700000000".into(),
        };
        assert!(err.to_string().contains("rate limit"));

        let err = ConfigError::SecretMissing {
            var: "GROQ_API_KEY".into(),
            field: "llm.api_key_env".into(),
        };
        assert!(err.to_string().contains("GROQ_API_KEY"));

        let err = ResolveError::CompletionFailure {
            path: PathBuf::from("src/lib.rs"),
            source: LlmError::RateLimited,
        };
        assert_eq!(
            err.to_string(),
            "completion failed for 'src/lib.rs': LLM rate limit exceeded"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Network("reset".into()).is_transient());
        assert!(LlmError::Timeout(30).is_transient());
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Api {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!LlmError::Api {
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!LlmError::Authentication(401).is_transient());
        assert!(!LlmError::MissingApiKey("GROQ_API_KEY".into()).is_transient());
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let core_err: CoreError = GenerateError::NothingStaged.into();
        assert!(matches!(core_err, CoreError::Generate(_)));

        let core_err: CoreError = ResolveError::NotARepository("/x".into()).into();
        assert!(matches!(core_err, CoreError::Resolve(_)));
    }

    #[test]
    fn test_resolve_error_path() {
        let err = ResolveError::IoFailure {
            path: PathBuf::from("a.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.path(), Some(std::path::Path::new("a.txt")));
        assert!(ResolveError::NotARepository("/x".into()).path().is_none());
    }
}
