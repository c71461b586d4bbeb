// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Terminal status lines
//!
//! Every command reports progress with the same glyphs.

use colored::{ColoredString, Colorize};

/// Outcome shown in front of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
}

impl Status {
    pub fn glyph(self) -> ColoredString {
        match self {
            Status::Success => "✓".green(),
            Status::Error => "✗".red(),
            Status::Warning => "⚠".yellow(),
        }
    }
}

/// Format an indented status line
pub fn status_line(status: Status, msg: &str) -> String {
    format!("  {} {}", status.glyph(), msg)
}

pub fn print_success(msg: &str) {
    println!("{}", status_line(Status::Success, msg));
}

/// Errors go to stderr
pub fn print_error(msg: &str) {
    eprintln!("{}", status_line(Status::Error, msg));
}

/// Print a titled list; nothing is printed for an empty list
pub fn print_section(title: &str, status: Status, items: &[String]) {
    if items.is_empty() {
        return;
    }

    let title = match status {
        Status::Success => title.green().bold(),
        Status::Error => title.red().bold(),
        Status::Warning => title.yellow().bold(),
    };

    println!();
    println!("{}:", title);
    for item in items {
        println!("{}", status_line(status, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_plain() {
        colored::control::set_override(false);
        assert_eq!(status_line(Status::Success, "done"), "  ✓ done");
        assert_eq!(status_line(Status::Warning, "careful"), "  ⚠ careful");
        assert_eq!(status_line(Status::Error, "failed"), "  ✗ failed");
        colored::control::unset_override();
    }
}
