// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// Delta extractor
//
// Pulls the incremental text fragment out of one data-frame payload.
// Field order: the chat streaming delta first, then the legacy completion
// text field. A payload that fails structured parsing is forwarded
// verbatim: upstream format deviations degrade to best-effort
// passthrough, never to silent data loss. A payload that parses but
// carries no text (role-only delta, finish_reason frame) is meaningless
// and yields nothing.

use super::types::{Extracted, DONE_TOKEN};

/// Extract the text fragment carried by one frame payload.
pub fn extract(line: &str) -> Option<Extracted> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == DONE_TOKEN {
        return Some(Extracted::Done);
    }

    let json: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        // Not JSON: pass the raw line through unchanged.
        Err(_) => return Some(Extracted::Text(line.to_string())),
    };

    let choice = json.get("choices").and_then(|c| c.get(0));
    let text = choice
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            choice
                .and_then(|c| c.get("text"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        });

    text.map(|t| Extracted::Text(t.to_string()))
}

/// Single-pass extraction for a fully buffered upstream response.
///
/// Fallback chain: `choices[0].message.content` → `choices[0].text` →
/// `choices[0].delta.content`; with no choices at all, a top-level
/// `output`/`response` string; failing everything, the serialized payload
/// itself rather than nothing.
pub fn extract_full_text(data: &serde_json::Value) -> String {
    if let Some(choice) = data.get("choices").and_then(|c| c.get(0)) {
        return choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .or_else(|| choice.get("text").and_then(|v| v.as_str()))
            .or_else(|| {
                choice
                    .get("delta")
                    .and_then(|d| d.get("content"))
                    .and_then(|v| v.as_str())
            })
            .map(|s| s.to_string())
            .unwrap_or_default();
    }

    if let Some(s) = data.get("output").and_then(|v| v.as_str()) {
        return s.to_string();
    }
    if let Some(s) = data.get("response").and_then(|v| v.as_str()) {
        return s.to_string();
    }

    data.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
