//! Tolerant JSON extraction for generative model output.
//!
//! Model responses are supposed to be raw JSON but arrive fenced in markdown,
//! wrapped in prose, with trailing commas or with separators missing. Rather
//! than a lenient grammar, the cascade below applies small textual repairs in
//! increasing order of invasiveness and re-validates every candidate with the
//! strict `serde_json` parser. The first candidate that parses wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const FENCE: &str = "```";

static ADJACENT_OBJECTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}\s*\{").expect("valid regex"));
static ARRAY_THEN_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\s*\{").expect("valid regex"));
static SCALAR_BEFORE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d|true|false|null)\s*\n\s*""#).expect("valid regex"));

/// Which step of the cascade produced the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairPass {
    /// Fence-stripped, trailing-comma-free text parsed as-is.
    Strict,
    /// The span from the first `{` to the last `}` parsed.
    BracketSlice,
    /// Parsed after inserting missing commas.
    MissingCommas,
    /// Comma insertion left several top-level values; parsed as an array of them.
    ConcatenatedValues,
}

/// Parses model output into a JSON value, repairing common defects.
///
/// # Errors
///
/// Returns the strict-parse error of the cleaned text when no repair pass
/// yields valid JSON.
pub fn parse_model_json(raw: &str) -> Result<Value, serde_json::Error> {
    parse_model_json_with_pass(raw).map(|(value, _)| value)
}

/// Like [`parse_model_json`], also reporting which repair pass succeeded.
///
/// # Errors
///
/// Returns the strict-parse error of the cleaned text when no repair pass
/// yields valid JSON.
pub fn parse_model_json_with_pass(raw: &str) -> Result<(Value, RepairPass), serde_json::Error> {
    let cleaned = strip_trailing_commas(strip_code_fence(raw.trim()).trim());

    let strict_err = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => return Ok((value, RepairPass::Strict)),
        Err(e) => e,
    };

    // Prose before the object can hold a stray quote that threw off the
    // string tracking above; the slice starts at `{`, so rescan it.
    if let Some(slice) = outer_object_slice(&cleaned) {
        if let Ok(value) = serde_json::from_str::<Value>(&strip_trailing_commas(slice)) {
            return Ok((value, RepairPass::BracketSlice));
        }
    }

    let repaired = insert_missing_commas(&cleaned);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        return Ok((value, RepairPass::MissingCommas));
    }

    if repaired != cleaned {
        if let Ok(value) = serde_json::from_str::<Value>(&format!("[{repaired}]")) {
            return Ok((value, RepairPass::ConcatenatedValues));
        }
    }

    Err(strict_err)
}

/// Strips a leading markdown fence (with its language-tag line) and the
/// last closing fence. Text that does not start with a fence is returned as-is.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    let body = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    match body.rfind(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

/// Removes commas that sit directly (modulo whitespace) before `}` or `]`.
///
/// Commas inside string literals are left untouched so that already-valid
/// JSON is never altered.
pub(crate) fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_comma: Option<usize> = None;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            '}' | ']' => {
                if let Some(idx) = pending_comma.take() {
                    out.remove(idx);
                }
                out.push(c);
            }
            _ => {
                pending_comma = None;
                if c == '"' {
                    in_string = true;
                }
                out.push(c);
            }
        }
    }

    out
}

/// Returns the span from the first `{` to the last `}`, if any.
fn outer_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Inserts commas between `}{` / `]{` pairs and after a line that ends in a
/// number or literal when the next line opens a quoted key.
pub(crate) fn insert_missing_commas(text: &str) -> String {
    let repaired = ADJACENT_OBJECTS_RE.replace_all(text, "},{");
    let repaired = ARRAY_THEN_OBJECT_RE.replace_all(&repaired, "],{");
    SCALAR_BEFORE_KEY_RE
        .replace_all(&repaired, "${1},\n\"")
        .into_owned()
}

#[cfg(test)]
#[path = "repair_test.rs"]
mod tests;
