// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Command placeholders
//!
//! Component commands refer to their own inputs and outputs with
//! `{{inputs.name}}` and `{{outputs.name}}`. At compile time these become
//! the runtime placeholders understood by the execution backend.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// What a placeholder refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Input,
    Output,
}

/// A placeholder found in a command or argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub kind: PlaceholderKind,
    pub name: &'a str,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*(inputs|outputs)\.([A-Za-z_][A-Za-z0-9_-]*)\s*\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Collect all placeholders in a string
pub fn placeholders(s: &str) -> Vec<Placeholder<'_>> {
    pattern()
        .captures_iter(s)
        .filter_map(|caps| {
            let kind = match caps.get(1)?.as_str() {
                "inputs" => PlaceholderKind::Input,
                _ => PlaceholderKind::Output,
            };
            Some(Placeholder {
                kind,
                name: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Rewrite placeholders into backend runtime placeholders
pub fn render(s: &str) -> String {
    pattern()
        .replace_all(s, |caps: &Captures<'_>| match &caps[1] {
            "inputs" => format!("{{{{$.inputs.parameters['{}']}}}}", &caps[2]),
            _ => format!("{{{{$.outputs.parameters['{}'].output_file}}}}", &caps[2]),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_placeholders() {
        let found = placeholders("echo {{inputs.name}} > {{ outputs.Output }}");
        assert_eq!(
            found,
            vec![
                Placeholder { kind: PlaceholderKind::Input, name: "name" },
                Placeholder { kind: PlaceholderKind::Output, name: "Output" },
            ]
        );
    }

    #[test]
    fn test_render() {
        assert_eq!(
            render("--name={{inputs.name}}"),
            "--name={{$.inputs.parameters['name']}}"
        );
        assert_eq!(
            render("{{outputs.accuracy}}"),
            "{{$.outputs.parameters['accuracy'].output_file}}"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert!(placeholders("python3 -m train").is_empty());
        assert_eq!(render("{{ unrelated }}"), "{{ unrelated }}");
    }

    #[test]
    fn test_hyphenated_names() {
        let found = placeholders("{{inputs.my-text}} {{outputs.out-file}}");
        assert_eq!(
            found,
            vec![
                Placeholder { kind: PlaceholderKind::Input, name: "my-text" },
                Placeholder { kind: PlaceholderKind::Output, name: "out-file" },
            ]
        );
        assert_eq!(
            render("{{inputs.my-text}}"),
            "{{$.inputs.parameters['my-text']}}"
        );
    }
}
