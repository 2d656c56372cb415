//! Prompt construction for conflict resolution.

use std::path::Path;

use tracing::debug;

use super::hunk::{extract_conflict_hunks, ConflictHunk};
use super::scanner::list_conflicted_files;
use super::ConflictedFile;

/// Instructional header opening every resolution prompt.
pub const PROMPT_HEADER: &str = "\
You are an expert Git merge-conflict resolver. For each conflict below,
produce the best merged version **only as final code**, no explanations.
";

const SECTION_JOINER: &str = "\n\n";

/// Render one hunk. `index` is 1-based within its file.
pub fn render_hunk(index: usize, hunk: &ConflictHunk) -> String {
    format!(
        "### Conflict {index}\n\
         *Ours*: `{ours_label}` vs *Theirs*: `{theirs_label}`\n\
         ```diff\n\
         <<<<<<< ours\n\
         {ours}\n\
         =======\n\
         {theirs}\n\
         >>>>>>> theirs\n\
         ```",
        index = index,
        ours_label = hunk.ours_label,
        theirs_label = hunk.theirs_label,
        ours = hunk.ours_text,
        theirs = hunk.theirs_text,
    )
}

fn file_heading(path: &Path) -> String {
    format!("\n## File: `{}`", path.display())
}

fn push_file_sections(parts: &mut Vec<String>, path: &Path, hunks: &[ConflictHunk]) {
    parts.push(file_heading(path));
    parts.extend(
        hunks
            .iter()
            .enumerate()
            .map(|(i, hunk)| render_hunk(i + 1, hunk)),
    );
}

/// Render the combined prompt for several files, or `None` when no file has
/// a hunk.
pub fn render_prompt(files: &[ConflictedFile]) -> Option<String> {
    let mut parts = vec![PROMPT_HEADER.to_string()];
    for file in files.iter().filter(|f| !f.hunks.is_empty()) {
        push_file_sections(&mut parts, &file.path, &file.hunks);
    }
    if parts.len() == 1 {
        return None;
    }
    Some(parts.join(SECTION_JOINER).trim().to_string())
}

/// Scan `root`, parse every conflicted file, and render one prompt.
///
/// `None` when the scan finds nothing or no file yields a hunk. Unreadable
/// files are skipped.
pub async fn build_resolution_prompt(root: &Path) -> Option<String> {
    let paths = list_conflicted_files(root).await;
    if paths.is_empty() {
        return None;
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let hunks = extract_conflict_hunks(&text);
        files.push(ConflictedFile { path, hunks });
    }
    render_prompt(&files)
}

/// Prompt asking for the complete resolved contents of one file.
pub fn build_file_prompt(path: &Path, hunks: &[ConflictHunk], contents: &str) -> String {
    let mut parts = vec![PROMPT_HEADER.to_string()];
    push_file_sections(&mut parts, path, hunks);
    parts.push(format!(
        "## Current contents of `{}`\n```\n{}\n```",
        path.display(),
        contents.trim_end_matches(&['\r', '\n'][..])
    ));
    parts.push(
        "Reply with the complete resolved file, every conflict merged and no conflict \
         markers left. Output only the file contents."
            .to_string(),
    );
    parts.join(SECTION_JOINER).trim().to_string()
}
