//! Debug request/response logging.
//!
//! Installed only when `DEBUG` is set. Bodies are buffered so they can be
//! logged, then handed on unchanged. The logger never answers a request
//! itself: a body it cannot buffer is passed on as a body that fails the
//! same way, so the handler sees what it would have seen without logging.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Buffering cap. Matches axum's default request body limit.
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Longest body prefix written to the log.
const MAX_LOGGED_BODY: usize = 8 * 1024;

/// Log method, path, headers and bodies of every exchange.
pub async fn log_exchange(req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let body = match to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => {
            debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                headers = ?header_pairs(&parts.headers),
                body_length = bytes.len(),
                body = %body_preview(&bytes),
                "debug_request"
            );
            Body::from(bytes)
        }
        Err(e) => {
            warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                error = %e,
                "debug_request_body_unreadable"
            );
            failing_body(e)
        }
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            debug!(
                status_code = parts.status.as_u16(),
                headers = ?header_pairs(&parts.headers),
                body = %body_preview(&bytes),
                "debug_response"
            );
            Body::from(bytes)
        }
        Err(e) => {
            warn!(error = %e, "debug_response_body_unreadable");
            failing_body(e)
        }
    };

    Response::from_parts(parts, body)
}

/// A body whose first read yields `error`.
fn failing_body(error: axum::Error) -> Body {
    Body::from_stream(futures::stream::once(async move {
        Err::<Bytes, axum::Error>(error)
    }))
}

fn body_preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(MAX_LOGGED_BODY)]);
    if bytes.len() > MAX_LOGGED_BODY {
        format!("{}...", text)
    } else {
        text.into_owned()
    }
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
