//! Pull a JSON object out of free-form model output.
//!
//! Models wrap JSON in code fences and prose, and long answers get cut off
//! at the token limit.  [`extract_json`] handles both: it slices the outermost
//! object and, when that does not parse, cuts back to the last complete
//! record and closes whatever brackets are still open.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Field markers that end a complete record in the expected output.
///
/// When output is truncated, the repair cuts at the first `}` following the
/// last marker found.  Without a usable marker it cuts at the last `}`.
#[derive(Debug, Clone, Default)]
pub struct RepairHint {
    markers: Vec<String>,
}

impl RepairHint {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { markers: markers.into_iter().map(Into::into).collect() }
    }

    /// Offset of the first `}` after the last marker occurrence that has one.
    fn cut_point(&self, text: &str) -> Option<usize> {
        let mut positions: Vec<usize> = self
            .markers
            .iter()
            .flat_map(|m| text.rmatch_indices(m.as_str()).map(|(i, _)| i))
            .collect();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.into_iter().find_map(|pos| text[pos..].find('}').map(|i| pos + i))
    }
}

/// Remove ```` ```json ```` and ```` ``` ```` markers and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn extract_json(text: &str, hint: &RepairHint) -> Result<Value, AgentError> {
    let cleaned = strip_fences(text);
    let first = cleaned
        .find('{')
        .ok_or_else(|| AgentError::InvalidAiResponse("no JSON object in response".into()))?;

    if let Some(last) = cleaned.rfind('}').filter(|&last| last > first) {
        match serde_json::from_str(&cleaned[first..=last]) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(error = %e, "outer object does not parse, attempting repair"),
        }
    }

    let body = &cleaned[first..];
    let cut = hint.cut_point(body).or_else(|| body.rfind('}'));
    let prefix = match cut {
        Some(c) => &body[..=c],
        None => body,
    };

    let repaired = close_open_brackets(prefix)
        .ok_or_else(|| AgentError::InvalidAiResponse("response is not repairable JSON".into()))?;
    match serde_json::from_str(&repaired) {
        Ok(value) => {
            warn!(original_len = body.len(), repaired_len = repaired.len(), "repaired truncated AI response");
            Ok(value)
        }
        Err(e) => Err(AgentError::InvalidAiResponse(format!("response is not valid JSON: {e}"))),
    }
}

/// Append the closers for every bracket left open in `prefix`.
///
/// Brackets inside string literals are ignored.  An unterminated string is
/// closed, and a trailing comma before the synthesized tail is dropped.
/// Returns `None` when `prefix` closes a bracket it never opened.
fn close_open_brackets(prefix: &str) -> Option<String> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in prefix.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
            }
            _ => {}
        }
    }

    let mut out = prefix.to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    let trimmed_len = out.trim_end().trim_end_matches(',').trim_end().len();
    out.truncate(trimmed_len);
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    Some(out)
}
