// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// Upstream stream handling
//
// Responsibilities:
// - Reassemble logical protocol lines from arbitrarily split byte reads
// - Classify each complete line: data frame, termination sentinel, noise
// - Extract the incremental text fragment carried by each data frame
// - Degrade malformed frames to verbatim passthrough, never data loss

mod extractor;
mod reassembler;
mod types;

pub use extractor::{extract, extract_full_text};
pub use reassembler::LineReassembler;
pub use types::{Extracted, UpstreamFrame};

#[cfg(test)]
mod tests;
