// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// Stream types
//
// Core types for upstream frame handling: the classified frame produced by
// the reassembler and the extraction result produced from a data frame.

/// The reserved payload signaling the upstream has no more data to send.
pub const DONE_TOKEN: &str = "[DONE]";

/// One logical line of the upstream streaming protocol, classified.
///
/// Created by the reassembler for each complete line found in the
/// accumulating buffer; consumed immediately; never retained.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamFrame {
    /// A data frame: the line payload after prefix stripping.
    Data(String),
    /// The termination sentinel. No frames after this are meaningful.
    Done,
    /// A blank line (after prefix stripping); dropped without forwarding.
    Noise,
}

/// The text extracted from a single data frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// An incremental text fragment to forward to the caller.
    Text(String),
    /// The termination token appeared as frame payload.
    Done,
}
