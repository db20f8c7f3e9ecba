//! Axum HTTP surface
//!
//! - `POST /api` relays one chat turn and streams protocol lines back
//! - `GET /` serves the chat page
//! - `GET /healthz` liveness probe

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::field::Empty;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::{ProtocolOptions, protocol_lines};
use crate::error::RelayError;
use crate::relay::{AssistantRelay, RelayRequest};
use crate::ui;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub relay: AssistantRelay,
    pub missing_keys: Arc<Vec<&'static str>>,
    pub protocol: ProtocolOptions,
}

impl AppState {
    pub fn new(relay: AssistantRelay, missing_keys: Vec<&'static str>) -> Self {
        Self {
            relay,
            missing_keys: Arc::new(missing_keys),
            protocol: ProtocolOptions::default(),
        }
    }

    pub fn with_protocol_options(mut self, protocol: ProtocolOptions) -> Self {
        self.protocol = protocol;
        self
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({ "error": self.user_message() });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/api", post(relay_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| RelayError::InternalError(format!("Listener has no address: {e}")))?;
    info!(%addr, "Listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RelayError::InternalError(format!("Server error: {e}")))
}

async fn relay_handler(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(request) = payload.map_err(|rej| RelayError::InvalidInput(rej.body_text()))?;
    let request_id = Uuid::new_v4();
    let span = info_span!("relay_request", %request_id, thread_id = Empty);

    // The guard is owned by this future until setup finishes, then by the body.
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let session = state
        .relay
        .open(request, cancel)
        .instrument(span.clone())
        .await?;
    span.record("thread_id", tracing::field::display(&session.thread_id));
    span.in_scope(|| info!("Streaming run"));

    let lines = protocol_lines(session.stream, state.protocol.clone(), Some(guard), span);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(lines),
    )
        .into_response())
}

async fn chat_page(State(state): State<AppState>) -> Html<String> {
    Html(ui::render_chat_page(&state.missing_keys))
}

async fn healthz() -> &'static str {
    "ok"
}
