//! Twilio Relay - thin webhook relay to a downstream application.
//!
//! Twilio requires a fast answer to its message webhooks, while the
//! downstream application may be slow or unavailable. The relay answers
//! Twilio immediately and forwards the message in the background.
//!
//! ## Architecture
//!
//! ```text
//! Twilio → POST /twilio-webhook → TwiML ack
//!                               ↘ spawned task → POST {MAIN_APP_URL}/api/twilio/webhook
//! ```

pub mod config;
pub mod forward;
pub mod message;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use forward::{ForwardError, Forwarder};
pub use message::{ForwardPayload, InboundMessage};
pub use web::{router, AppState};
