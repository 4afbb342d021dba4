//! HTTP API gateway for GraphTutor.
//!
//! Exposes the liveness probe and the chat WebSocket endpoint:
//! - `GET /health`  — fixed "ok" status plus version
//! - `GET /ws/chat` — one chat session per connection
//!
//! Built on Axum. Sessions are fully isolated from one another: the only
//! shared state is the read-only retrieval store and the completion client's
//! connection pool, both safe for concurrent use.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    response::{IntoResponse, Json},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use graphtutor_config::AppConfig;
use graphtutor_core::message::AssistantChunk;
use graphtutor_retrieval::{ContextBuilder, InMemoryStore};
use graphtutor_session::SessionPipeline;
use serde::Serialize;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Capacity of the per-connection outbound chunk buffer.
const OUTBOUND_BUFFER: usize = 64;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub pipeline: Arc<SessionPipeline>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.frontend_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/chat", get(ws_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured frontend origin.
fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    match frontend_origin.parse() {
        Ok(origin) => layer.allow_origin(AllowOrigin::exact(origin)),
        Err(_) => {
            warn!(origin = %frontend_origin, "Invalid frontend origin; CORS allows none");
            layer
        }
    }
}

/// Start the gateway HTTP server.
///
/// Builds the shared collaborators once — store, context builder, completion
/// client, pipeline — and serves sessions over them.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No DeepSeek API key configured — turns will end with a generation error");
    }

    let store: Option<Arc<dyn graphtutor_core::KnowledgeStore>> = if config.retrieval_enabled {
        Some(Arc::new(InMemoryStore::with_demo_entries()))
    } else {
        warn!("Retrieval disabled; context will use the degraded-mode fallback");
        None
    };

    let retrieval = Arc::new(ContextBuilder::new(store));
    let completion = Arc::new(graphtutor_completion::DeepSeekClient::new(
        config.api_key.clone(),
        config.api_base.clone(),
    ));
    let pipeline = Arc::new(
        SessionPipeline::new(retrieval, completion, config.model.clone())
            .with_top_k(config.top_k),
    );

    let state = Arc::new(GatewayState { config, pipeline });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /ws/chat` — upgrade to a chat session.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

/// Drive one WebSocket session until the client goes away.
///
/// The socket is split: a forwarder task owns the sink and serializes chunks
/// from a bounded queue, preserving emission order; this loop owns the read
/// side and feeds complete text frames to the pipeline, strictly one turn at
/// a time. A disconnect mid-turn drops the queue receiver, which cancels
/// chunk production and the upstream completion stream with it.
async fn handle_session(socket: WebSocket, state: SharedState) {
    let session_id = uuid::Uuid::new_v4();
    info!(session = %session_id, "WebSocket session established");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<AssistantChunk>(OUTBOUND_BUFFER);

    let forward = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            let frame = match serde_json::to_string(&chunk) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound chunk");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                return; // transport gone; rx drops and ends the turn
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue, // ignore binary, ping, pong
            Err(_) => break,
        };

        if state.pipeline.run_turn(&text, &tx).await.is_err() {
            break; // client disconnected mid-turn
        }
    }

    drop(tx);
    let _ = forward.await;
    info!(session = %session_id, "WebSocket session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use graphtutor_core::completion::{CompletionClient, FragmentReceiver};
    use graphtutor_core::error::CompletionError;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct StubCompletion;

    #[async_trait]
    impl CompletionClient for StubCompletion {
        async fn stream_chat(
            &self,
            _system_prompt: &str,
            _user_content: &str,
            _model: &str,
        ) -> Result<FragmentReceiver, CompletionError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    fn test_state() -> SharedState {
        let config = AppConfig::default();
        let retrieval = Arc::new(ContextBuilder::new(Some(Arc::new(
            InMemoryStore::with_demo_entries(),
        ))));
        let pipeline = Arc::new(SessionPipeline::new(
            retrieval,
            Arc::new(StubCompletion),
            config.model.clone(),
        ));
        Arc::new(GatewayState { config, pipeline })
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert!(parsed["version"].is_string());
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let app = build_router(test_state());

        // A plain GET without the upgrade headers is rejected, not routed away
        let req = Request::builder()
            .uri("/ws/chat")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[test]
    fn invalid_origin_does_not_panic() {
        let _ = cors_layer("not a valid origin\u{7f}");
    }
}
