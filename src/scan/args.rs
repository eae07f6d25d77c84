//! Scanner command line assembly
//!
//! User flags are appended after the mandatory arguments without any
//! validation or deduplication. Repeating a mandatory flag such as `-target`
//! is passed through as-is and the scanner's own parser decides which
//! occurrence wins. Tokens are split on whitespace only, so a single argument
//! containing spaces cannot be expressed.

use std::path::Path;

/// The fixed arguments every scan runs with
pub fn mandatory(binary: &Path, templates: &Path, target: &str, output: &Path) -> Vec<String> {
    vec![
        binary.display().to_string(),
        "-templates".to_string(),
        templates.display().to_string(),
        "-target".to_string(),
        target.to_string(),
        "-output".to_string(),
        output.display().to_string(),
        "-no-color".to_string(),
    ]
}

/// Append the whitespace separated `extra_flags` to `arguments`
pub fn build(mut arguments: Vec<String>, extra_flags: Option<&str>) -> Vec<String> {
    if let Some(flags) = extra_flags {
        arguments.extend(flags.split_whitespace().map(str::to_string));
    }
    arguments
}
