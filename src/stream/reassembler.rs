// Frame reassembler
//
// Takes raw upstream bytes, which can split anywhere (mid-line, mid-event,
// even mid-UTF-8-codepoint) and reconstitutes complete protocol lines.
// The buffer is bytes, not text: splitting happens on `\n`, which cannot
// occur inside a multi-byte UTF-8 sequence, so partial codepoints simply
// stay buffered until the rest of their line arrives and each complete
// line decodes cleanly.
//
// Invariants:
// - The buffer always holds exactly the byte suffix with no unconsumed `\n`.
// - No line is emitted before it is fully received.
// - No byte is dropped, duplicated, or reordered.

use super::types::{UpstreamFrame, DONE_TOKEN};

/// Per-invocation line reassembly buffer. One per relay call, never shared.
#[derive(Debug, Default)]
pub struct LineReassembler {
    buf: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly received bytes and drain every complete line as a
    /// classified frame. The trailing fragment (no terminator yet) remains
    /// buffered as the seed for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<UpstreamFrame> {
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            frames.push(classify_line(&line));
        }
        frames
    }

    /// Flush a trailing unterminated fragment at end of stream.
    pub fn finish(&mut self) -> Option<UpstreamFrame> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(classify_line(&line))
    }
}

/// Classify one complete line: strip the optional `data:` field prefix,
/// then map blank → Noise, the termination token → Done, anything else →
/// a data frame carrying the payload.
fn classify_line(raw: &[u8]) -> UpstreamFrame {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();

    let payload = trimmed
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(trimmed);

    if payload.is_empty() {
        UpstreamFrame::Noise
    } else if payload == DONE_TOKEN {
        UpstreamFrame::Done
    } else {
        UpstreamFrame::Data(payload.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
