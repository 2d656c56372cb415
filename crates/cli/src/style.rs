//! Shared styling utilities for terminal output.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create an error-styled string (red with cross).
pub fn error(msg: &str) -> String {
    let style = Style::new().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold).
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// "set" in green or "NOT SET" in red.
pub fn presence(is_set: bool) -> String {
    if is_set {
        Style::new().green().apply_to("set").to_string()
    } else {
        Style::new().red().apply_to("NOT SET").to_string()
    }
}

/// Spinner shown while waiting on the model or the network.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
