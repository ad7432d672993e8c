//! Model output parsing into a [`Decision`].
//!
//! Models asked for "JSON only" still wrap it in prose, markdown fences, or
//! leave trailing commas. Text output is searched for a JSON object through
//! several strategies, and whatever object is found is coerced and clamped
//! by [`Decision::from_value`]. The numbers a model sends are never trusted
//! as-is.

use khulark_types::Decision;
use serde_json::Value;

use crate::error::WorkerError;
use crate::llm::ModelOutput;

/// Turn a model's answer into a clamped decision.
pub fn parse_decision(output: &ModelOutput) -> Result<Decision, WorkerError> {
    match output {
        ModelOutput::Object(map) => Decision::from_value(&Value::Object(map.clone()))
            .ok_or_else(|| WorkerError::Parse("structured output is not an object".to_owned())),
        ModelOutput::Text(text) => parse_text(text),
    }
}

/// Search free text for the first JSON object that parses.
///
/// Candidates, in order:
/// 1. The whole trimmed text
/// 2. The contents of a markdown code block
/// 3. Everything from the first `{` to the last `}`
/// 4. The first balanced `{...}` span
///
/// Each candidate is retried with trailing commas stripped.
fn parse_text(raw: &str) -> Result<Decision, WorkerError> {
    let trimmed = raw.trim();

    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        outermost_braces(trimmed),
        first_balanced_object(trimmed),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(parse_object)
        .ok_or_else(|| {
            WorkerError::Parse(format!(
                "no JSON object found in model output: {}",
                trimmed.chars().take(200).collect::<String>()
            ))
        })
}

fn parse_object(candidate: &str) -> Option<Decision> {
    let value = serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
        .or_else(|| {
            serde_json::from_str::<Value>(&strip_trailing_commas(candidate))
                .ok()
                .filter(Value::is_object)
        })?;
    Decision::from_value(&value)
}

/// Extract JSON from a markdown code block (` ```json ... ``` `).
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = fence.checked_add(3)?;
    let body_start = text
        .get(after_fence..)
        .and_then(|s| s.find('\n'))
        .and_then(|nl| after_fence.checked_add(nl))
        .and_then(|pos| pos.checked_add(1))
        .unwrap_or(after_fence);

    let remaining = text.get(body_start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// The span from the first `{` through the last `}`.
fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    text.get(start..=end)
}

/// The first `{...}` span whose braces balance, ignoring braces in strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let tail = text.get(start..)?;

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in tail.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth = depth.saturating_add(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return tail.get(..=offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c == ',' {
            let next = chars
                .iter()
                .skip(i.saturating_add(1))
                .find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}
