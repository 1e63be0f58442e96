//! Text helpers for message bodies.

use tracing::debug;

use crate::error::FormatError;
use crate::payload::to_tab_indented;

/// Line break understood by the Teams renderer.
pub const BREAK_STATEMENT: &str = "<br>";

const CODE_BLOCK_PREFIX: &str = "\n```\n";
const CODE_BLOCK_SUFFIX: &str = "```\n";
const CODE_SNIPPET_PREFIX: &str = "`";
const CODE_SNIPPET_SUFFIX: &str = "`";

// Windows first so "\r\n" does not become two breaks.
const EOL_SEQUENCES: [&str; 6] = ["\r\n", "\\r\\n", "\r", "\\r", "\n", "\\n"];

/// Replace Windows, Mac and Unix line endings, raw or escaped, with
/// [`BREAK_STATEMENT`].
#[must_use]
pub fn convert_eol_to_break(input: &str) -> String {
    EOL_SEQUENCES
        .iter()
        .fold(input.to_string(), |acc, eol| acc.replace(eol, BREAK_STATEMENT))
}

/// Format `input` as a fenced Markdown code block.
///
/// JSON input is re-indented; anything else is JSON-string encoded first.
///
/// # Errors
///
/// Returns [`FormatError::Empty`] for empty input.
pub fn format_as_code_block(input: &str) -> Result<String, FormatError> {
    format_as_code(input, CODE_BLOCK_PREFIX, CODE_BLOCK_SUFFIX)
}

/// Format `input` as an inline Markdown code snippet.
///
/// # Errors
///
/// Returns [`FormatError::Empty`] for empty input.
pub fn format_as_code_snippet(input: &str) -> Result<String, FormatError> {
    format_as_code(input, CODE_SNIPPET_PREFIX, CODE_SNIPPET_SUFFIX)
}

/// Like [`format_as_code_block`], returning `input` unchanged on failure.
#[must_use]
pub fn try_to_format_as_code_block(input: &str) -> String {
    format_as_code_block(input).unwrap_or_else(|err| {
        debug!(error = %err, "Code block formatting failed, using input as-is");
        input.to_string()
    })
}

/// Like [`format_as_code_snippet`], returning `input` unchanged on failure.
#[must_use]
pub fn try_to_format_as_code_snippet(input: &str) -> String {
    format_as_code_snippet(input).unwrap_or_else(|err| {
        debug!(error = %err, "Code snippet formatting failed, using input as-is");
        input.to_string()
    })
}

fn format_as_code(input: &str, prefix: &str, suffix: &str) -> Result<String, FormatError> {
    if input.is_empty() {
        return Err(FormatError::Empty);
    }

    let formatted = match serde_json::from_str::<serde_json::Value>(input) {
        Ok(value) => to_tab_indented(&value)?,
        Err(_) => serde_json::to_string(input)?,
    };

    Ok(format!("{prefix}{}{suffix}", formatted.trim_matches('"')))
}
