// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// Outward transcoder
//
// Owns the caller-facing event channel for one relay invocation. Events
// are serialized into the outward SSE wire format and written atomically:
// one event, one channel send, so a caller can never observe a
// half-written event. A terminal event (done, error) latches the sink
// closed; close is idempotent and emit-after-close is a no-op. A send to
// a disconnected caller latches the sink closed instead of faulting.

use bytes::Bytes;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One caller-facing event. Written in strict arrival order; `Done` and
/// `Error` are terminal; nothing follows them.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Chunk(String),
    Done,
    Error {
        message: String,
        details: Option<String>,
    },
}

impl OutboundEvent {
    /// Serialize into the outward SSE wire format.
    pub fn encode(&self) -> Bytes {
        match self {
            OutboundEvent::Chunk(text) => {
                let payload = serde_json::json!({ "chunk": text });
                Bytes::from(format!("data: {payload}\n\n"))
            }
            OutboundEvent::Done => {
                Bytes::from_static(b"event: done\ndata: {\"done\":true}\n\n")
            }
            OutboundEvent::Error { message, details } => {
                let payload = match details {
                    Some(d) => serde_json::json!({ "error": message, "details": d }),
                    None => serde_json::json!({ "error": message }),
                };
                Bytes::from(format!("data: {payload}\n\n"))
            }
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, OutboundEvent::Chunk(_))
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Producer half of the response stream for one relay invocation.
///
/// The consumer half (a `ReceiverStream`) becomes the HTTP response body.
/// Exclusively owned by the invocation that created it.
pub struct SseSink {
    tx: mpsc::Sender<Bytes>,
    closed: bool,
}

impl SseSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx, closed: false }
    }

    /// One-time connection setup: an immediate keep-alive comment so
    /// intermediaries flush headers instead of buffering the response.
    pub async fn start(&mut self) -> bool {
        self.send(Bytes::from_static(b": connected\n\n")).await
    }

    /// Write one event atomically. Returns false if the sink is closed or
    /// the caller has disconnected; terminal events latch the sink closed
    /// after being written.
    pub async fn emit(&mut self, event: OutboundEvent) -> bool {
        if self.closed {
            return false;
        }
        let terminal = event.is_terminal();
        let sent = self.send(event.encode()).await;
        if terminal {
            self.closed = true;
        }
        sent
    }

    /// Idempotent close. After this, `emit` is a no-op.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn send(&mut self, frame: Bytes) -> bool {
        if self.closed {
            return false;
        }
        // A failed send means the receiver is gone: the caller
        // disconnected. Latch closed; never fault.
        if self.tx.send(frame).await.is_err() {
            self.closed = true;
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
