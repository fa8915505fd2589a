//! Web server module for the Twilio relay.
//!
//! This module provides a thin, fast web server that:
//! - Receives Twilio message webhooks
//! - Acknowledges them immediately with empty TwiML
//! - Forwards a normalized payload to the downstream app in the background
//!
//! Nothing the downstream app does can change what Twilio sees.

pub mod boundary;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod twiml;

use std::any::Any;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub use extract::{WebhookFields, WebhookRejection};
pub use handlers::{
    health, not_found, twilio_webhook, AppState, HealthResponse, NotFoundResponse,
    AVAILABLE_ROUTES,
};

/// Build the application router.
///
/// Debug logging is decided once here from the static config flag.
pub fn router(state: AppState) -> Router {
    let debug = state.config.debug;

    let mut app = Router::new()
        .route("/health", get(health).fallback(not_found))
        .route(
            "/twilio-webhook",
            post(twilio_webhook)
                .fallback(not_found)
                .layer(CatchPanicLayer::custom(boundary::webhook_error)),
        )
        .fallback(not_found)
        .with_state(state);

    if debug {
        app = app.layer(middleware::from_fn(logging::log_exchange));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| boundary::server_error(panic, debug),
        ))
}
