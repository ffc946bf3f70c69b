//! HTTP transports
//!
//! Two endpoints, sharing the same JSON-RPC core as the stdio/TCP transports:
//!
//! - `POST /mcp`: streamable endpoint, one JSON-RPC request body in, one
//!   JSON-RPC response out (202 for notifications).
//! - `GET /sse` with `POST /messages?sessionId=`: event-stream endpoint. The
//!   stream opens with an `endpoint` event naming the companion POST URL;
//!   responses to posted requests are pushed onto the stream as `message`
//!   events.

use crate::error::Result;
use crate::server::McpServer;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-session outbound channel capacity
const SESSION_BUFFER: usize = 32;

type Sessions = Arc<RwLock<HashMap<String, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct HttpState {
    server: Arc<McpServer>,
    sessions: Sessions,
}

/// Build the router for the HTTP transports
fn router(state: HttpState) -> Router {
    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route("/sse", get(sse_endpoint))
        .route("/messages", post(messages_endpoint))
        .with_state(state)
}

/// Serve the HTTP transports on the given port
pub async fn serve(server: Arc<McpServer>, port: u16) -> Result<()> {
    let name = server.identity().name.clone();
    let state = HttpState {
        server,
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting {} on http://{} (/mcp, /sse)", name, addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Streamable endpoint: request in, response out
async fn mcp_endpoint(State(state): State<HttpState>, body: String) -> axum::response::Response {
    let response = state.server.handle_request(&body).await;
    if response.is_null() {
        // Notification: nothing to send back
        StatusCode::ACCEPTED.into_response()
    } else {
        Json(response).into_response()
    }
}

/// Event-stream endpoint: opens a session and streams responses
async fn sse_endpoint(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<String>(SESSION_BUFFER);
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), tx);
    debug!(target: "docbase::http", session = %session_id, "SSE session opened");

    let endpoint = format!("/messages?sessionId={}", session_id);
    let opening = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, Infallible>(Event::default().event("message").data(msg)));

    Sse::new(opening.chain(messages)).keep_alive(KeepAlive::default())
}

/// Companion POST for the event-stream endpoint
async fn messages_endpoint(
    State(state): State<HttpState>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> StatusCode {
    let Some(session_id) = params.get("sessionId") else {
        return StatusCode::BAD_REQUEST;
    };

    let sender = state.sessions.read().await.get(session_id).cloned();
    let Some(sender) = sender else {
        warn!(target: "docbase::http", session = %session_id, "Unknown SSE session");
        return StatusCode::NOT_FOUND;
    };

    let response = state.server.handle_request(&body).await;
    if response.is_null() {
        return StatusCode::ACCEPTED;
    }

    let payload = response.to_string();
    if sender.send(payload).await.is_err() {
        // Stream consumer went away; forget the session
        state.sessions.write().await.remove(session_id);
        return StatusCode::GONE;
    }

    StatusCode::ACCEPTED
}
