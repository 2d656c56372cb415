//! Merge-conflict extraction and resolution.
//!
//! The pipeline runs in four steps:
//! 1. **Scanning** -- find files in a working tree that still carry markers.
//! 2. **Parsing** -- extract each `<<<<<<<` / `=======` / `>>>>>>>` hunk.
//! 3. **Prompting** -- render hunks into a model request.
//! 4. **Applying** -- write the model's reply to a `.resolved` sidecar, and
//!    on request promote sidecars over the originals.

use std::path::PathBuf;

pub mod hunk;
pub mod prompt;
pub mod resolver;
pub mod scanner;

pub use hunk::{extract_conflict_hunks, ConflictHunk};
pub use prompt::{build_file_prompt, build_resolution_prompt, render_prompt, PROMPT_HEADER};
pub use resolver::{
    apply_resolutions, original_path, resolve_conflicts, sidecar_path, ApplyReport,
    ResolutionReport, ResolveOptions,
};
pub use scanner::{
    ensure_repository, list_conflicted_files, try_list_conflicted_files, CONFLICT_MARKER,
    SIDECAR_SUFFIX,
};

/// A file known to contain conflicts, with its hunks in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictedFile {
    pub path: PathBuf,
    pub hunks: Vec<ConflictHunk>,
}
