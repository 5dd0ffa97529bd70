// SPDX-License-Identifier: MIT

//! Parsing of the reviewing-stage agent's final message into a structured
//! verdict (spec.md §4.5, Open Question 1: how a review's natural-language
//! conclusion becomes a machine-actionable outcome).
//!
//! Two forms are accepted, checked in order:
//!
//! 1. A structured JSON envelope anywhere in the message:
//!    `{"verdict": "accept" | "request_changes" | "abandon", "feedback"?: "...", "reason"?: "..."}`
//! 2. A sentinel phrase at the start of a line (case-insensitive), when no
//!    valid envelope is present: `LGTM`, `REQUEST CHANGES: <feedback>`,
//!    `ABANDON: <reason>`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    Accept,
    RequestChanges { feedback: String },
    Abandon { reason: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    verdict: String,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl ReviewVerdict {
    /// Parse a review agent's final message. Returns `None` if neither a
    /// valid envelope nor a recognized sentinel phrase is found.
    pub fn parse(message: &str) -> Option<ReviewVerdict> {
        if let Some(v) = Self::parse_envelope(message) {
            return Some(v);
        }
        Self::parse_sentinel(message)
    }

    fn parse_envelope(message: &str) -> Option<ReviewVerdict> {
        // The envelope is the final JSON blob in the message, so scan
        // candidates from last to first: earlier `{...}` spans may be
        // scratch JSON the reviewer reasoned over before concluding.
        for candidate in json_object_candidates(message).into_iter().rev() {
            if let Ok(env) = serde_json::from_str::<Envelope>(candidate) {
                match env.verdict.as_str() {
                    "accept" => return Some(ReviewVerdict::Accept),
                    "request_changes" => {
                        return Some(ReviewVerdict::RequestChanges {
                            feedback: env.feedback.unwrap_or_default(),
                        })
                    }
                    "abandon" => {
                        return Some(ReviewVerdict::Abandon {
                            reason: env.reason.unwrap_or_default(),
                        })
                    }
                    _ => continue,
                }
            }
        }
        None
    }

    fn parse_sentinel(message: &str) -> Option<ReviewVerdict> {
        for line in message.lines() {
            let trimmed = line.trim();
            let upper = trimmed.to_uppercase();
            if upper == "LGTM" || upper.starts_with("LGTM ") || upper.starts_with("LGTM.") {
                return Some(ReviewVerdict::Accept);
            }
            if let Some(rest) = strip_prefix_ci(trimmed, "REQUEST CHANGES:") {
                return Some(ReviewVerdict::RequestChanges {
                    feedback: rest.trim().to_string(),
                });
            }
            if let Some(rest) = strip_prefix_ci(trimmed, "ABANDON:") {
                return Some(ReviewVerdict::Abandon {
                    reason: rest.trim().to_string(),
                });
            }
        }
        None
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Scan `text` for `{ ... }` spans that might be JSON objects, innermost
/// brace-balanced candidates first to last.
fn json_object_candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        out.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
