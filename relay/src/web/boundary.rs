//! Panic boundary responses.
//!
//! Two boundaries exist: the webhook route answers Twilio with the TwiML
//! error acknowledgment, everything else gets a JSON server error. Panic
//! messages are only exposed in debug mode.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::web::twiml;

const REDACTED_MESSAGE: &str = "Something went wrong";

/// Server error response body.
#[derive(Serialize)]
pub struct ServerErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// Convert a caught panic into a JSON 500 response.
pub fn server_error(panic: Box<dyn Any + Send + 'static>, debug: bool) -> Response {
    let detail = panic_message(panic.as_ref());
    error!(error = %detail, "unhandled_panic");

    let message = if debug {
        detail
    } else {
        REDACTED_MESSAGE.to_string()
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ServerErrorResponse {
            error: "Internal server error",
            message,
        }),
    )
        .into_response()
}

/// Convert a panic inside the webhook handler into the TwiML error ack.
pub fn webhook_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    error!(error = %panic_message(panic.as_ref()), "twilio_webhook_panic");
    twiml::error_ack()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
