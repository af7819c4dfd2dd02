// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// Pipeline tests for reassembly + extraction
//
// Covers:
//  1. A realistic upstream chat stream split at awkward byte boundaries
//  2. Chunk-boundary independence through the full extraction pipeline
//  3. No fragment emitted after the termination sentinel
//  4. Malformed frames interleaved with well-formed ones

use super::*;

/// Run raw bytes through reassembly + extraction, honoring the
/// termination sentinel, and collect the forwarded fragments.
fn relay_bytes(chunks: &[&[u8]]) -> (Vec<String>, bool) {
    let mut reassembler = LineReassembler::new();
    let mut texts = Vec::new();
    let mut done = false;

    'outer: for chunk in chunks {
        for frame in reassembler.feed(chunk) {
            match frame {
                UpstreamFrame::Noise => {}
                UpstreamFrame::Done => {
                    done = true;
                    break 'outer;
                }
                UpstreamFrame::Data(line) => match extract(&line) {
                    None => {}
                    Some(Extracted::Done) => {
                        done = true;
                        break 'outer;
                    }
                    Some(Extracted::Text(t)) => texts.push(t),
                },
            }
        }
    }
    (texts, done)
}

const CHAT_STREAM: &str = concat!(
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n",
    "\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n",
    "\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n",
    "\n",
    "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n",
    "\n",
    "data: [DONE]\n",
    "\n",
);

// ---------------------------------------------------------------------------
// Test 1: realistic stream, one read
// ---------------------------------------------------------------------------

#[test]
fn chat_stream_extracts_fragments_in_order() {
    let (texts, done) = relay_bytes(&[CHAT_STREAM.as_bytes()]);
    assert_eq!(texts, vec!["Hel", "lo"]);
    assert!(done);
}

// ---------------------------------------------------------------------------
// Test 2: chunk-boundary independence through the whole pipeline
// ---------------------------------------------------------------------------

#[test]
fn every_split_size_yields_identical_fragments() {
    let bytes = CHAT_STREAM.as_bytes();
    let expected = relay_bytes(&[bytes]);

    for size in 1..=64 {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        let result = relay_bytes(&chunks);
        assert_eq!(result, expected, "split size {size} diverged");
    }
}

// ---------------------------------------------------------------------------
// Test 3: nothing is processed after the termination sentinel
// ---------------------------------------------------------------------------

#[test]
fn fragments_after_done_are_ignored() {
    let stream = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"before\"}}]}\n",
        "data: [DONE]\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n",
    );
    let (texts, done) = relay_bytes(&[stream.as_bytes()]);
    assert_eq!(texts, vec!["before"]);
    assert!(done);
}

// ---------------------------------------------------------------------------
// Test 4: malformed frames degrade to passthrough between valid ones
// ---------------------------------------------------------------------------

#[test]
fn malformed_frames_interleave_as_passthrough() {
    let stream = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        "data: not json at all\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"fine\"}}]}\n",
        "data: [DONE]\n",
    );
    let (texts, done) = relay_bytes(&[stream.as_bytes()]);
    assert_eq!(texts, vec!["ok", "not json at all", "fine"]);
    assert!(done);
}

// ---------------------------------------------------------------------------
// Test 5: multi-byte text split across reads survives intact
// ---------------------------------------------------------------------------

#[test]
fn multibyte_fragment_split_mid_codepoint() {
    let stream = "data: {\"choices\":[{\"delta\":{\"content\":\"naïve ☃\"}}]}\ndata: [DONE]\n";
    let bytes = stream.as_bytes();

    for size in 1..=bytes.len() {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        let (texts, done) = relay_bytes(&chunks);
        assert_eq!(texts, vec!["naïve ☃"], "split size {size}");
        assert!(done);
    }
}
