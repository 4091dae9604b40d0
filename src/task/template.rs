// src/task/template.rs

//! `{name}` placeholder expansion.
//!
//! `${NAME}` is shell syntax and is left alone. Placeholders the lookup does
//! not know are kept verbatim and reported back to the caller.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\{([A-Za-z_][A-Za-z0-9_.\-]*)\}").expect("placeholder regex is valid")
});

/// Result of expanding one template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// Placeholder names that had no value.
    pub unresolved: Vec<String>,
}

pub fn expand<F>(template: &str, lookup: F) -> Expanded
where
    F: Fn(&str) -> Option<String>,
{
    let mut unresolved = Vec::new();

    let text = PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let whole = caps[0].to_string();
            if !caps[1].is_empty() {
                return whole;
            }
            let name = &caps[2];
            match lookup(name) {
                Some(value) => value,
                None => {
                    unresolved.push(name.to_string());
                    whole
                }
            }
        })
        .into_owned();

    Expanded { text, unresolved }
}
