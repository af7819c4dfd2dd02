// Relay core
//
// Wires one invocation end to end:
// - Request validation and content gate (before any network call)
// - Credential check
// - Forward to upstream (exactly one call, no retries)
// - Buffered path: single-pass text extraction -> JSON response
// - Live streaming path: read loop -> reassemble -> extract -> emit
// - Synthetic path: buffered call -> fixed-size chunk emission
//
// Errors raised before any bytes reach the caller become ordinary error
// responses; errors after streaming has begun become an in-band terminal
// event so the open connection is closed cleanly.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::chunker::chunk_text;
use crate::config::RelayConfig;
use crate::gate::ContentGate;
use crate::request::PromptRequest;
use crate::sse::{OutboundEvent, SseSink};
use crate::stream::{extract, extract_full_text, Extracted, LineReassembler, UpstreamFrame};
use crate::upstream::{
    CompletionRequest, UpstreamBody, UpstreamClient, UpstreamError,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures scoped to a single relay invocation. Nothing here crashes the
/// host process.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("missing prompt")]
    MissingPrompt,

    #[error("prompt contains disallowed content")]
    PolicyRejection,

    #[error("no upstream API credential configured")]
    MissingCredential,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            RelayError::MissingPrompt => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "Missing prompt" }),
            ),
            RelayError::PolicyRejection => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "Prompt contains disallowed content. \
                              This assistant only provides defensive, lawful guidance."
                }),
            ),
            RelayError::MissingCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "No LLM API key configured (OPENAI_API_KEY or LLM_API_KEY)."
                }),
            ),
            RelayError::Upstream(UpstreamError::Status { body, .. }) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Upstream LLM error", "details": body }),
            ),
            RelayError::Upstream(UpstreamError::Transport(msg)) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Upstream LLM error", "details": msg }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

/// One relay per process; every invocation it handles is independent.
pub struct Relay {
    config: Arc<RelayConfig>,
    gate: ContentGate,
    upstream: Arc<dyn UpstreamClient>,
}

impl Relay {
    pub fn new(config: Arc<RelayConfig>, upstream: Arc<dyn UpstreamClient>) -> Self {
        let gate = ContentGate::new(config.disallow.clone());
        Self {
            config,
            gate,
            upstream,
        }
    }

    /// Handle one inbound prompt submission end to end.
    pub async fn handle(&self, req: PromptRequest) -> Response {
        let request_id = Uuid::new_v4().to_string();

        if req.prompt.is_empty() {
            return RelayError::MissingPrompt.into_response();
        }

        if !self.gate.allow(&req.prompt) {
            // A policy outcome, not a fault.
            tracing::info!(request_id = %request_id, "prompt rejected by content gate");
            return RelayError::PolicyRejection.into_response();
        }

        if self.config.api_key.is_none() {
            tracing::error!(request_id = %request_id, "no upstream credential configured");
            return RelayError::MissingCredential.into_response();
        }

        // Live streaming only when both the caller asked and the upstream
        // supports it; otherwise a streamed caller gets synthetic chunking.
        let live = req.stream && self.config.upstream_streaming;
        let request = CompletionRequest {
            prompt: req.prompt,
            model: req
                .model
                .unwrap_or_else(|| self.config.default_model.clone()),
            temperature: req.temperature.unwrap_or(self.config.default_temperature),
            stream: live,
        };

        tracing::debug!(
            request_id = %request_id,
            model = %request.model,
            stream = req.stream,
            live,
            "relaying prompt"
        );

        if req.stream {
            if live {
                self.stream_live(request, request_id)
            } else {
                match self.stream_synthetic(request, &request_id).await {
                    Ok(resp) => resp,
                    Err(e) => e.into_response(),
                }
            }
        } else {
            match self.respond_buffered(request, &request_id).await {
                Ok(text) => {
                    (StatusCode::OK, Json(serde_json::json!({ "text": text }))).into_response()
                }
                Err(e) => e.into_response(),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Buffered path
    // -----------------------------------------------------------------------

    /// One buffered upstream call; returns the fully assembled response text.
    async fn respond_buffered(
        &self,
        request: CompletionRequest,
        request_id: &str,
    ) -> Result<String, RelayError> {
        let resp = self.upstream.send(request).await.map_err(|e| {
            tracing::warn!(request_id, error = %e, "upstream request failed");
            RelayError::from(e)
        })?;

        let bytes = match resp.body {
            UpstreamBody::Full(b) => b,
            UpstreamBody::Stream(mut s) => {
                let mut collected = Vec::new();
                while let Some(chunk) = s.next().await {
                    collected.extend_from_slice(&chunk?);
                }
                Bytes::from(collected)
            }
        };

        let text = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => extract_full_text(&value),
            // Non-JSON upstream body: forward it rather than lose it.
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        tracing::debug!(request_id, chars = text.chars().count(), "buffered response assembled");
        Ok(text)
    }

    // -----------------------------------------------------------------------
    // Live streaming path
    // -----------------------------------------------------------------------

    /// Open the caller-facing stream, then relay upstream frames into it.
    ///
    /// Headers go out before the upstream call, so every upstream failure
    /// from here on is reported in-band and the stream closed cleanly.
    fn stream_live(&self, request: CompletionRequest, request_id: String) -> Response {
        let (tx, rx) = mpsc::channel::<Bytes>(64);
        let upstream = self.upstream.clone();

        tokio::spawn(async move {
            let mut sink = SseSink::new(tx);
            if !sink.start().await {
                return;
            }

            let resp = match upstream.send(request).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        error = %e,
                        "upstream request failed; reporting in-band"
                    );
                    let details = upstream_error_details(&e);
                    sink.emit(OutboundEvent::Error {
                        message: "Upstream error".to_string(),
                        details: Some(details),
                    })
                    .await;
                    sink.close();
                    return;
                }
            };

            match resp.body {
                UpstreamBody::Stream(mut body) => {
                    let mut reassembler = LineReassembler::new();
                    while let Some(next) = body.next().await {
                        match next {
                            Ok(bytes) => {
                                if !forward_frames(reassembler.feed(&bytes), &mut sink).await {
                                    // Sentinel seen or caller gone. Returning
                                    // drops the upstream body, closing the
                                    // transport.
                                    return;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(
                                    request_id = %request_id,
                                    error = %e,
                                    "upstream transport error mid-stream"
                                );
                                sink.emit(OutboundEvent::Error {
                                    message: "Upstream error".to_string(),
                                    details: Some(e.to_string()),
                                })
                                .await;
                                sink.close();
                                return;
                            }
                        }
                    }

                    // Upstream ended without a sentinel: flush any trailing
                    // fragment, then finalize.
                    if let Some(frame) = reassembler.finish() {
                        if !forward_frames(vec![frame], &mut sink).await {
                            return;
                        }
                    }
                    sink.emit(OutboundEvent::Done).await;
                    sink.close();
                    tracing::debug!(request_id = %request_id, "stream finalized without sentinel");
                }
                UpstreamBody::Full(bytes) => {
                    // Upstream answered buffered despite the stream flag;
                    // relay the whole body through the same pipeline once.
                    let mut reassembler = LineReassembler::new();
                    let mut frames = reassembler.feed(&bytes);
                    frames.extend(reassembler.finish());
                    if forward_frames(frames, &mut sink).await {
                        sink.emit(OutboundEvent::Done).await;
                        sink.close();
                    }
                }
            }
        });

        sse_response(rx)
    }

    // -----------------------------------------------------------------------
    // Synthetic path
    // -----------------------------------------------------------------------

    /// Buffered upstream call, then simulated incremental delivery.
    ///
    /// The upstream completes before the stream opens, so upstream failures
    /// here are still ordinary error responses, not in-band events.
    async fn stream_synthetic(
        &self,
        request: CompletionRequest,
        request_id: &str,
    ) -> Result<Response, RelayError> {
        let text = self.respond_buffered(request, request_id).await?;
        let pieces = chunk_text(&text, self.config.chunk_size);
        let delay = Duration::from_millis(self.config.chunk_delay_ms);

        tracing::debug!(request_id, pieces = pieces.len(), "synthetic stream starting");

        let (tx, rx) = mpsc::channel::<Bytes>(64);
        tokio::spawn(async move {
            let mut sink = SseSink::new(tx);
            if !sink.start().await {
                return;
            }
            for piece in pieces {
                if !sink.emit(OutboundEvent::Chunk(piece)).await {
                    return;
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            sink.emit(OutboundEvent::Done).await;
            sink.close();
        });

        Ok(sse_response(rx))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Forward a batch of reassembled frames into the sink.
///
/// Returns false once the invocation is terminated: the sentinel was seen
/// (a done event has been emitted and the sink closed) or the caller has
/// disconnected. Nothing is processed past the sentinel even if more bytes
/// arrive.
async fn forward_frames(frames: Vec<UpstreamFrame>, sink: &mut SseSink) -> bool {
    for frame in frames {
        match frame {
            UpstreamFrame::Noise => {}
            UpstreamFrame::Done => {
                sink.emit(OutboundEvent::Done).await;
                sink.close();
                return false;
            }
            UpstreamFrame::Data(line) => match extract(&line) {
                None => {}
                Some(Extracted::Done) => {
                    sink.emit(OutboundEvent::Done).await;
                    sink.close();
                    return false;
                }
                Some(Extracted::Text(text)) => {
                    if !sink.emit(OutboundEvent::Chunk(text)).await {
                        return false;
                    }
                }
            },
        }
    }
    true
}

/// The detail string reported in-band for an upstream failure: the status
/// body verbatim when there is one, the transport error otherwise.
fn upstream_error_details(err: &UpstreamError) -> String {
    match err {
        UpstreamError::Status { body, .. } => body.clone(),
        UpstreamError::Transport(msg) => msg.clone(),
    }
}

/// Build the streaming response around the consumer half of the channel.
fn sse_response(rx: mpsc::Receiver<Bytes>) -> Response {
    let stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(stream))
        .unwrap()
        .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
