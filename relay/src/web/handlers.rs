//! Endpoint handlers.
//!
//! The webhook handler only:
//! 1. Normalizes the Twilio fields
//! 2. Spawns the forward call
//! 3. Returns the TwiML acknowledgment
//!
//! It never waits on the downstream application.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::forward::Forwarder;
use crate::message::{iso_timestamp, InboundMessage};
use crate::web::extract::WebhookFields;
use crate::web::twiml;
use crate::Config;

/// Routes listed in the 404 response.
pub const AVAILABLE_ROUTES: &[&str] = &["/health", "/twilio-webhook"];

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config, forwarder: Forwarder) -> Self {
        Self {
            config: Arc::new(config),
            forwarder,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub main_app_url: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: iso_timestamp(),
        main_app_url: state.config.main_app_url.clone(),
    })
}

// =============================================================================
// Twilio Webhook
// =============================================================================

/// Twilio incoming message webhook.
pub async fn twilio_webhook(
    State(state): State<AppState>,
    WebhookFields(fields): WebhookFields,
) -> Response {
    let message = InboundMessage::from_fields(&fields);

    info!(
        from = ?message.from,
        to = ?message.to,
        message_id = ?message.message_sid,
        num_media = message.num_media,
        media_urls_found = message.media_urls.len(),
        body_length = message.body.len(),
        "twilio_webhook_received"
    );

    // Detached: the acknowledgment below does not wait on the downstream app.
    state.forwarder.spawn_forward(message);

    twiml::ack()
}

// =============================================================================
// Fallback
// =============================================================================

/// Not-found response body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub path: String,
    pub available_routes: &'static [&'static str],
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    warn!(path = %uri.path(), "route_not_found");

    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not found",
            path: uri.path().to_string(),
            available_routes: AVAILABLE_ROUTES,
        }),
    )
}
