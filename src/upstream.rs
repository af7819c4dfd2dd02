// Upstream client
//
// Issues exactly one HTTP request per relay invocation to the configured
// chat-completions endpoint, in buffered or streaming mode. No retries:
// a partially consumed stream cannot be safely replayed, so a single
// failure is surfaced immediately. Non-success statuses carry the upstream
// body text back verbatim so the caller sees what the provider said.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream::Stream;
use futures_util::TryStreamExt;

use crate::config::RelayConfig;

// ---------------------------------------------------------------------------
// Transport types
// ---------------------------------------------------------------------------

/// One outbound completion request, already resolved against config
/// defaults (model and temperature are concrete, not optional).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub stream: bool,
}

/// The upstream response body: fully buffered, or a live byte stream.
pub enum UpstreamBody {
    Full(Bytes),
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>),
}

/// A successful upstream response.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

/// Errors that can occur while talking to the upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Trait: UpstreamClient (dependency injection point)
// ---------------------------------------------------------------------------

/// Abstraction over the HTTP client that carries prompts to the provider.
///
/// Implementations must be Send + Sync so they can be shared across request
/// handlers via `Arc`.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: CompletionRequest) -> Result<UpstreamResponse, UpstreamError>;
}

// ---------------------------------------------------------------------------
// Request body construction
// ---------------------------------------------------------------------------

/// Build the chat-completions JSON body: the configured system instruction
/// followed by the user prompt, plus sampling parameters and the stream flag.
pub fn completion_body(config: &RelayConfig, request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": config.system_prompt },
            { "role": "user", "content": request.prompt },
        ],
        "temperature": request.temperature,
        "max_tokens": config.max_tokens,
        "stream": request.stream,
    })
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

/// Production upstream client backed by `reqwest`.
pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl ReqwestUpstreamClient {
    pub fn new(client: reqwest::Client, config: Arc<RelayConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn send(&self, request: CompletionRequest) -> Result<UpstreamResponse, UpstreamError> {
        // The relay checks the credential before calling; this guards the
        // trait boundary for other callers.
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Transport("no API credential configured".to_string()))?;

        let body = completion_body(&self.config, &request);

        let mut req = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(key)
            .json(&body);

        // A total timeout is only safe on the buffered path; a timed-out
        // stream would drop text the caller has already seen part of.
        if !request.stream {
            if let Some(ms) = self.config.request_timeout_ms {
                req = req.timeout(std::time::Duration::from_millis(ms));
            }
        }

        let resp = req
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = StatusCode::from_u16(resp.status().as_u16())
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if request.stream {
            let stream = resp
                .bytes_stream()
                .map_err(|e| UpstreamError::Transport(e.to_string()));
            Ok(UpstreamResponse {
                status,
                body: UpstreamBody::Stream(Box::pin(stream)),
            })
        } else {
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            Ok(UpstreamResponse {
                status,
                body: UpstreamBody::Full(bytes),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
