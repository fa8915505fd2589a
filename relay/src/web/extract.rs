//! Request body extraction for Twilio webhooks.
//!
//! Twilio posts `application/x-www-form-urlencoded` bodies, but JSON bodies
//! are accepted too so the relay can be driven by other senders and tests.
//! Either way the fields are flattened into a string map.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::web::twiml;

/// Flattened webhook fields.
#[derive(Debug, Clone, Default)]
pub struct WebhookFields(pub HashMap<String, String>);

/// Failure to read or decode a webhook body.
///
/// Always answered with the TwiML error acknowledgment.
#[derive(Debug, Error)]
pub enum WebhookRejection {
    #[error("failed to read request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON body must be an object")]
    NotAnObject,
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        error!(error = %self, "twilio_webhook_rejected");
        twiml::error_ack()
    }
}

#[async_trait]
impl<S> FromRequest<S> for WebhookFields
where
    S: Send + Sync,
{
    type Rejection = WebhookRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let bytes = Bytes::from_request(req, state).await?;

        if is_json {
            parse_json(&bytes)
        } else {
            Ok(parse_form(&bytes))
        }
    }
}

/// Decode an urlencoded body. Repeated keys keep the last value.
pub fn parse_form(bytes: &[u8]) -> WebhookFields {
    WebhookFields(
        url::form_urlencoded::parse(bytes)
            .into_owned()
            .collect(),
    )
}

/// Decode a JSON object body into string fields.
///
/// `null` and `false` are treated as absent.
pub fn parse_json(bytes: &[u8]) -> Result<WebhookFields, WebhookRejection> {
    if bytes.is_empty() {
        return Ok(WebhookFields::default());
    }

    let object = match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => map,
        _ => return Err(WebhookRejection::NotAnObject),
    };

    let fields = object
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null | Value::Bool(false) => return None,
                Value::String(s) => s,
                Value::Bool(true) => "true".to_string(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect();

    Ok(WebhookFields(fields))
}
