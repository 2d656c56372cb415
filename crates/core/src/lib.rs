//! gitscribe core library.
//!
//! This crate provides the building blocks behind the `gitscribe` CLI:
//! configuration, git plumbing, the chat-completion client, GitHub pull
//! requests, LLM-drafted commit messages and summaries, and the
//! merge-conflict resolution pipeline.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod generate;
pub mod git;
pub mod llm;
pub mod pull_request;

// Re-exports for convenience.
pub use config::AppConfig;
pub use errors::CoreError;
pub use llm::{ChatCompletion, CompletionOptions, LlmClient};
pub use pull_request::{open_pull_request, PullRequestRequest};
