// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Responsibilities:
// - POST /v1/relay (body-carried) and GET /v1/relay (query-carried,
//   for EventSource clients that cannot send a body)
// - Heartbeat endpoint
// - Injected relay core; handlers never touch a real HTTP client

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use crate::relay::Relay;
use crate::request::PromptRequest;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Heartbeat endpoint: GET /v1/heartbeat -> 200 OK
pub async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

async fn relay_post(State(state): State<AppState>, Json(req): Json<PromptRequest>) -> Response {
    state.relay.handle(req).await
}

async fn relay_get(State(state): State<AppState>, Query(req): Query<PromptRequest>) -> Response {
    state.relay.handle(req).await
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the axum router with the relay routes and the heartbeat endpoint.
pub fn build_router(relay: Arc<Relay>) -> Router {
    let state = AppState { relay };

    Router::new()
        .route("/v1/relay", get(relay_get).post(relay_post))
        .route("/v1/heartbeat", get(heartbeat))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, load_config, MapSource};
    use crate::upstream::{
        CompletionRequest, UpstreamBody, UpstreamClient, UpstreamError, UpstreamResponse,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use tower::ServiceExt; // for oneshot

    /// Upstream that always answers with a fixed buffered body.
    struct FixedUpstream {
        body: &'static str,
    }

    #[async_trait]
    impl UpstreamClient for FixedUpstream {
        async fn send(
            &self,
            _request: CompletionRequest,
        ) -> Result<UpstreamResponse, UpstreamError> {
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                body: UpstreamBody::Full(Bytes::from_static(self.body.as_bytes())),
            })
        }
    }

    fn test_app(upstream_body: &'static str) -> Router {
        let config =
            Arc::new(load_config(&MapSource::new().set(keys::API_KEY, "sk-test")).unwrap());
        let relay = Arc::new(Relay::new(
            config,
            Arc::new(FixedUpstream {
                body: upstream_body,
            }),
        ));
        build_router(relay)
    }

    async fn body_string(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    // -----------------------------------------------------------------------
    // Test 1: POST with a JSON body reaches the relay
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn post_body_prompt_relayed() {
        let app = test_app(r#"{"choices":[{"message":{"content":"hi there"}}]}"#);

        let req = Request::builder()
            .method("POST")
            .uri("/v1/relay")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"prompt":"hello"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["text"], "hi there");
    }

    // -----------------------------------------------------------------------
    // Test 2: GET with a query-carried prompt reaches the relay
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_query_prompt_relayed() {
        let app = test_app(r#"{"choices":[{"message":{"content":"from query"}}]}"#);

        let req = Request::builder()
            .method("GET")
            .uri("/v1/relay?prompt=hello")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["text"], "from query");
    }

    // -----------------------------------------------------------------------
    // Test 3: missing prompt -> 400 from validation, not deserialization
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_prompt_returns_400() {
        let app = test_app("{}");

        let req = Request::builder()
            .method("POST")
            .uri("/v1/relay")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(resp).await.contains("Missing prompt"));
    }

    // -----------------------------------------------------------------------
    // Test 4: disallowed prompt -> 400 with error body
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn disallowed_prompt_returns_400() {
        let app = test_app("{}");

        let req = Request::builder()
            .method("POST")
            .uri("/v1/relay")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"prompt":"exploit a router"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("disallowed"));
    }

    // -----------------------------------------------------------------------
    // Test 5: unknown path -> 404, disallowed method -> 405
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unknown_path_returns_404() {
        let app = test_app("{}");

        let req = Request::builder()
            .method("GET")
            .uri("/v1/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn disallowed_method_returns_405() {
        let app = test_app("{}");

        let req = Request::builder()
            .method("DELETE")
            .uri("/v1/relay")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    // -----------------------------------------------------------------------
    // Test 6: heartbeat returns 200
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn heartbeat_returns_200() {
        let app = test_app("{}");

        let req = Request::builder()
            .method("GET")
            .uri("/v1/heartbeat")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // -----------------------------------------------------------------------
    // Test 7: concurrent requests are independent
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_requests_handled() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingUpstream {
            count: AtomicUsize,
        }

        #[async_trait]
        impl UpstreamClient for CountingUpstream {
            async fn send(
                &self,
                _request: CompletionRequest,
            ) -> Result<UpstreamResponse, UpstreamError> {
                self.count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok(UpstreamResponse {
                    status: StatusCode::OK,
                    body: UpstreamBody::Full(Bytes::from_static(
                        br#"{"choices":[{"message":{"content":"ok"}}]}"#,
                    )),
                })
            }
        }

        let upstream = Arc::new(CountingUpstream {
            count: AtomicUsize::new(0),
        });
        let config =
            Arc::new(load_config(&MapSource::new().set(keys::API_KEY, "sk-test")).unwrap());
        let relay = Arc::new(Relay::new(config, upstream.clone()));

        let num_requests = 10;
        let mut handles = Vec::new();

        for i in 0..num_requests {
            let app = build_router(relay.clone());
            handles.push(tokio::spawn(async move {
                let req = Request::builder()
                    .method("POST")
                    .uri("/v1/relay")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(r#"{{"prompt":"request {i}"}}"#)))
                    .unwrap();
                let resp = app.oneshot(req).await.unwrap();
                resp.status()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }
        assert_eq!(upstream.count.load(Ordering::SeqCst), num_requests);
    }
}
