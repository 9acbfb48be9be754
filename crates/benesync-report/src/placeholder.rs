//! `{{Column}}` placeholder substitution

use benesync_store::Record;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("valid regex"));

/// Replace every `{{name}}` in `body` with the field's trimmed value
///
/// The name is trimmed before lookup, so `{{ Name }}` and `{{Name}}` are the
/// same placeholder. Unknown names become the empty string.
#[must_use]
pub fn substitute_placeholders(body: &str, fields: &Record) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &Captures<'_>| {
            fields.get_or_empty(&caps[1]).to_trimmed_string()
        })
        .into_owned()
}

/// Distinct placeholder names in `body`, trimmed, in first-seen order
#[must_use]
pub fn placeholder_names(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(body) {
        let name = caps[1].trim();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
