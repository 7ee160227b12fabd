//! Pulling a JSON object out of free-text model output
//!
//! Models wrap their JSON in prose and code fences. Rather than a greedy
//! `\{.*\}` match (which spans from the first `{` to the last `}` in the
//! text), candidates are found with a brace-matching scan that understands
//! JSON strings and escapes, and each candidate is decoded in turn.

use crate::classifier::types::{Classification, ClassifierOutcome};
use serde_json::Value;

/// Candidate objects tried before giving up
const MAX_CANDIDATES: usize = 16;

/// Deeper nesting than this is not a classification object
const MAX_DEPTH: usize = 64;

/// Returns the balanced `{ ... }` span starting at byte offset `start`.
///
/// `start` must point at a `{`. Returns `None` when the object never closes
/// or nests deeper than `MAX_DEPTH`.
pub fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
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
            b'{' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return None;
                }
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    // '}' is ASCII, so start + offset + 1 is a char boundary
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Returns the first balanced object span in `text`
pub fn first_json_object(text: &str) -> Option<&str> {
    text.match_indices('{')
        .find_map(|(start, _)| balanced_object_at(text, start))
}

/// Parses a model response into a classification.
///
/// Balanced candidates are tried in order of appearance; the first one that
/// decodes and carries at least one score field wins.
pub fn parse_response(text: &str) -> ClassifierOutcome {
    let mut tried = 0;
    let mut search_from = 0;

    while tried < MAX_CANDIDATES {
        let Some(rel) = text[search_from..].find('{') else {
            break;
        };
        let start = search_from + rel;
        search_from = start + 1;
        tried += 1;

        let Some(candidate) = balanced_object_at(text, start) else {
            continue;
        };

        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                if let Some(classification) = Classification::from_json(&value) {
                    return ClassifierOutcome::Parsed(classification);
                }
                tracing::debug!("JSON object without score fields, trying next candidate");
            }
            Err(e) => tracing::debug!("Candidate object failed to decode: {}", e),
        }
    }

    ClassifierOutcome::Unparseable
}
