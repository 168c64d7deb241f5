use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::bus::{EventBus, SessionEvent};
use crate::reveal::{RevealPlayer, RevealSchedule};
use crate::session::Engine;
use crate::share::{self, SharePlatform};

// -----------------------------------------------------------------------------
// Request / response bodies
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub initial_query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ComposerRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub platform: SharePlatform,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub url: String,
}

// -----------------------------------------------------------------------------
// Server state
// -----------------------------------------------------------------------------

pub struct WidgetState {
    pub engine: Engine,
    pub bus: Arc<EventBus>,
    pub page_url: String,
}

// -----------------------------------------------------------------------------
// Implementation
// -----------------------------------------------------------------------------

pub struct WidgetServer {
    engine: Engine,
    bus: Arc<EventBus>,
    page_url: String,
}

impl WidgetServer {
    pub fn new(engine: Engine, bus: Arc<EventBus>, page_url: String) -> Self {
        Self {
            engine,
            bus,
            page_url,
        }
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(WidgetState {
            engine: self.engine.clone(),
            bus: self.bus.clone(),
            page_url: self.page_url.clone(),
        });

        Router::new()
            .route("/widget", post(open_handler))
            .route(
                "/widget/:id",
                get(snapshot_handler).delete(close_handler),
            )
            .route("/widget/:id/submit", post(submit_handler))
            .route("/widget/:id/composer", post(composer_handler))
            .route("/widget/:id/share", post(share_handler))
            .route("/widget/:id/events", get(events_handler))
            .route("/widget/:id/reveal/:message_id", get(reveal_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }
}

async fn open_handler(
    State(state): State<Arc<WidgetState>>,
    Json(request): Json<OpenRequest>,
) -> impl IntoResponse {
    let session_id = state.engine.open(request.initial_query);
    Json(OpenResponse { session_id })
}

async fn snapshot_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.engine.snapshot(id) {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Accepted regardless of whether the query was taken: empty input and input
/// while an answer is in flight are dropped silently by design.
async fn submit_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Response {
    match state.engine.submit(id, &request.query) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn composer_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ComposerRequest>,
) -> Response {
    match state.engine.set_composer(id, request.text) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn share_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ShareRequest>,
) -> Response {
    if state.engine.snapshot(id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(ShareResponse {
        url: share::share_url(request.platform, &state.page_url),
    })
    .into_response()
}

async fn close_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.engine.close(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Session events (message appended, pending changed) as SSE, ending once
/// the session closes.
async fn events_handler(
    State(state): State<Arc<WidgetState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::BoxError>>>, StatusCode> {
    if state.engine.snapshot(id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    info!("New event stream for session {}", id);
    let mut rx = state.bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) if event.session_id() == id => {
                    let closed = matches!(event, SessionEvent::SessionClosed { .. });
                    match serde_json::to_string(&event) {
                        Ok(json) => yield Ok(Event::default().data(json)),
                        Err(e) => error!("Failed to serialize session event: {}", e),
                    }
                    if closed {
                        break;
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // A slow consumer misses events; the snapshot route recovers
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Replay the staged reveal of one bot message as SSE. The playback timers
/// die with this stream, and closing the widget cancels them through the
/// registered handle.
async fn reveal_handler(
    State(state): State<Arc<WidgetState>>,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::BoxError>>>, StatusCode> {
    let message = state
        .engine
        .message(id, message_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let answer = message.structured.ok_or(StatusCode::NOT_FOUND)?;

    let schedule = RevealSchedule::plan(&answer);
    info!(
        "Streaming reveal for message {} ({} events)",
        message_id,
        schedule.len()
    );
    let (mut player, handle) = RevealPlayer::new(schedule);
    state
        .engine
        .register_reveal(id, handle)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let stream = async_stream::stream! {
        while let Some(event) = player.next_event().await {
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok(Event::default().data(json)),
                Err(e) => error!("Failed to serialize reveal event: {}", e),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
