//! Structured reply extraction
//!
//! Model output is untrusted text. The first syntactically valid JSON object
//! in it supplies `answer` and `image_urls`; anything else falls back to the
//! raw text. Extraction never fails.

use serde_json::{Map, Value};

/// Reply recovered from model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedReply {
    pub answer: String,
    pub image_urls: Vec<String>,
    /// Whether a JSON object was found
    pub structured: bool,
}

impl ExtractedReply {
    fn raw(text: &str) -> Self {
        Self {
            answer: text.trim().to_string(),
            image_urls: Vec::new(),
            structured: false,
        }
    }
}

/// Pull the answer and image URLs out of `raw`.
///
/// A missing or non-string `answer` is replaced by the raw text.
/// Non-string entries of `image_urls` are dropped.
pub fn extract_reply(raw: &str) -> ExtractedReply {
    let Some(object) = first_json_object(raw) else {
        tracing::debug!(len = raw.len(), "No JSON object in model output, using raw text");
        return ExtractedReply::raw(raw);
    };

    let answer = object
        .get("answer")
        .and_then(Value::as_str)
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| raw.trim().to_string());

    let image_urls = match object.get("image_urls") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    ExtractedReply {
        answer,
        image_urls,
        structured: true,
    }
}

/// First balanced `{...}` span in `text` that parses as a JSON object.
///
/// Candidates are found by tracking brace depth outside string literals, so
/// braces inside strings and escaped quotes do not end a candidate early.
/// A candidate that fails to parse is skipped and scanning resumes at the
/// next opening brace. An unclosed brace ends the scan, since no later brace
/// can close either.
pub fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while let Some(offset) = bytes[start..].iter().position(|&b| b == b'{') {
        let open = start + offset;
        let Some(close) = matching_brace(bytes, open) else {
            break;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str(&text[open..=close]) {
            return Some(map);
        }
        start = open + 1;
    }

    None
}

/// Index of the brace closing the one at `open`, if the object is complete
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}
