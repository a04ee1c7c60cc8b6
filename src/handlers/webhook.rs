//! Messenger webhook transport
//!
//! `GET /webhook` answers the subscription handshake, `POST /webhook`
//! queues a batch of events and acknowledges it before processing,
//! `GET /health` reports repository health.

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use crate::models::{InboundEvent, WebhookPayload};
use super::events::ConversationHandler;
use super::queue::EventQueue;

pub struct AppState {
    pub handler: Arc<ConversationHandler>,
    pub queue: EventQueue,
    pub verify_token: String,
}

impl AppState {
    /// Build the state and start the event queue; call inside the runtime
    pub fn new(handler: Arc<ConversationHandler>, verify_token: impl Into<String>) -> Self {
        let queue = EventQueue::spawn(handler.clone());
        Self {
            handler,
            queue,
            verify_token: verify_token.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_events))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    let subscribed = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.verify_token.as_str());

    match (subscribed, params.challenge) {
        (true, Some(challenge)) => {
            info!("Webhook verified");
            (StatusCode::OK, challenge)
        }
        _ => {
            warn!(mode = ?params.mode, "Webhook verification failed");
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
    }
}

async fn receive_events(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Undecodable webhook body");
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    if payload.object != "page" {
        warn!(object = %payload.object, "Webhook event for unsupported object");
        return (StatusCode::NOT_FOUND, "Not Found");
    }

    let events: Vec<InboundEvent> = payload
        .events()
        .into_iter()
        .filter_map(|decoded| match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(error = %e, "Skipping messaging item");
                None
            }
        })
        .collect();

    debug!(count = events.len(), "Webhook batch received");

    if let Err(e) = state.queue.enqueue(events) {
        warn!(error = %e, "Could not queue webhook batch");
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
    }

    (StatusCode::OK, "EVENT_RECEIVED")
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.handler.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "sessions": state.handler.sessions().len(),
                "version": crate::VERSION,
            })),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
