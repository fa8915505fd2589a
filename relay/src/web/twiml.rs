//! TwiML acknowledgment documents.
//!
//! Twilio expects an XML `<Response>` document within its webhook timeout.
//! An empty response tells Twilio to take no further action.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Empty TwiML response.
pub const EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

/// Successful acknowledgment sent for every well-formed webhook.
pub fn ack() -> Response {
    twiml(StatusCode::OK)
}

/// Acknowledgment sent when the webhook fails before a response went out.
pub fn error_ack() -> Response {
    twiml(StatusCode::INTERNAL_SERVER_ERROR)
}

fn twiml(status: StatusCode) -> Response {
    (status, [(header::CONTENT_TYPE, "text/xml")], EMPTY_RESPONSE).into_response()
}
