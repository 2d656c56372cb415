//! Conflict hunk extraction.
//!
//! A line-oriented state machine walks the file once:
//!
//! ```text
//! Scanning --start--> InOurs --separator--> InTheirs --end--> Scanning
//!                       |                      ^
//!                       +--base--> InBase -----+ (separator)
//! ```
//!
//! A start marker seen in any state opens a fresh hunk and abandons the
//! pending one, an end marker inside the ours side abandons the hunk, and a
//! hunk still open at end of input is dropped. Nothing here returns an error.
//! The `|||||||` base section written by `merge.conflictStyle=diff3` is
//! excluded from the ours text.

use std::ops::Range;

use serde::{Deserialize, Serialize};

const START: &str = "<<<<<<<";
const BASE: &str = "|||||||";
const SEPARATOR: &str = "=======";
const END: &str = ">>>>>>>";

/// One unresolved three-way merge region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictHunk {
    /// Label after the start marker, trimmed.
    pub ours_label: String,
    /// Label after the end marker, trimmed.
    pub theirs_label: String,
    /// Text between the start marker and the separator, one trailing newline
    /// removed.
    pub ours_text: String,
    /// Text between the separator and the end marker, one trailing newline
    /// removed.
    pub theirs_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker<'a> {
    Start(&'a str),
    Base,
    Separator,
    End(&'a str),
    Content,
}

enum State<'a> {
    Scanning,
    InOurs {
        label: &'a str,
        body: usize,
    },
    InBase {
        label: &'a str,
        ours: Range<usize>,
    },
    InTheirs {
        label: &'a str,
        ours: Range<usize>,
        body: usize,
    },
}

/// Extract every well-formed conflict hunk from `text`, in document order.
pub fn extract_conflict_hunks(text: &str) -> Vec<ConflictHunk> {
    let mut hunks = Vec::new();
    let mut state = State::Scanning;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        state = match (state, classify(strip_eol(line))) {
            (_, Marker::Start(label)) => State::InOurs {
                label,
                body: offset,
            },
            (State::InOurs { label, body }, Marker::Base) => State::InBase {
                label,
                ours: body..line_start,
            },
            (State::InOurs { label, body }, Marker::Separator) => State::InTheirs {
                label,
                ours: body..line_start,
                body: offset,
            },
            (State::InOurs { .. }, Marker::End(_)) => State::Scanning,
            (State::InBase { label, ours }, Marker::Separator) => State::InTheirs {
                label,
                ours,
                body: offset,
            },
            (State::InTheirs { label, ours, body }, Marker::End(theirs_label)) => {
                hunks.push(ConflictHunk {
                    ours_label: label.to_string(),
                    theirs_label: theirs_label.to_string(),
                    ours_text: trim_one_newline(&text[ours]).to_string(),
                    theirs_text: trim_one_newline(&text[body..line_start]).to_string(),
                });
                State::Scanning
            }
            (state, _) => state,
        };
    }

    hunks
}

fn classify(line: &str) -> Marker<'_> {
    if line == SEPARATOR {
        return Marker::Separator;
    }
    if let Some(label) = marker_label(line, START) {
        return Marker::Start(label);
    }
    if let Some(label) = marker_label(line, END) {
        return Marker::End(label);
    }
    if marker_label(line, BASE).is_some() {
        return Marker::Base;
    }
    Marker::Content
}

/// The trimmed label when `line` is `marker` alone or followed by
/// whitespace. `<<<<<<<<` is not a marker.
fn marker_label<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn trim_one_newline(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}
