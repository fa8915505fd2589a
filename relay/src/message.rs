//! Message types for the relay.
//!
//! This module defines:
//! - `InboundMessage`: the fields Twilio sends with an incoming SMS/MMS
//! - `ForwardPayload`: the normalized JSON body sent to the downstream app

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

// =============================================================================
// Inbound (Twilio → relay)
// =============================================================================

/// An inbound Twilio message callback.
///
/// Built from the raw webhook fields. Field names on the wire use Twilio's
/// PascalCase (`From`, `To`, `Body`, `MessageSid`, `NumMedia`, `MediaUrlN`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone number
    pub from: Option<String>,
    /// Recipient (our Twilio number)
    pub to: Option<String>,
    /// Message text, empty for media-only messages
    pub body: String,
    /// Twilio message SID
    pub message_sid: Option<String>,
    /// Number of attachments Twilio reported
    pub num_media: usize,
    /// Attachment URLs in index order, absent entries skipped
    pub media_urls: Vec<String>,
}

impl InboundMessage {
    /// Build an inbound message from raw webhook fields.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let num_media = parse_media_count(fields.get("NumMedia").map(String::as_str));

        InboundMessage {
            from: fields.get("From").cloned(),
            to: fields.get("To").cloned(),
            body: fields.get("Body").cloned().unwrap_or_default(),
            message_sid: fields.get("MessageSid").cloned(),
            num_media,
            media_urls: collect_media_urls(fields, num_media),
        }
    }

    /// Project this message into the payload forwarded downstream.
    ///
    /// `receivedAt` is stamped at the time of the call.
    pub fn to_forward_payload(&self) -> ForwardPayload {
        ForwardPayload {
            from: self.from.clone(),
            to: self.to.clone(),
            body: self.body.clone(),
            media_urls: self.media_urls.clone(),
            message_id: self.message_sid.clone(),
            received_at: iso_timestamp(),
        }
    }
}

/// Parse Twilio's `NumMedia` field.
///
/// Absent, non-numeric and negative values all count as zero attachments.
pub fn parse_media_count(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Collect `MediaUrl0..MediaUrl{count-1}`, skipping missing or empty entries.
pub fn collect_media_urls(fields: &HashMap<String, String>, count: usize) -> Vec<String> {
    (0..count)
        .filter_map(|i| fields.get(&format!("MediaUrl{}", i)))
        .filter(|url| !url.is_empty())
        .cloned()
        .collect()
}

// =============================================================================
// Outbound (relay → downstream application)
// =============================================================================

/// Normalized message event sent to the downstream application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub body: String,
    pub media_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// ISO-8601 UTC timestamp, millisecond precision
    pub received_at: String,
}

/// Current time as an ISO-8601 UTC string, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_media_count() {
        assert_eq!(parse_media_count(Some("3")), 3);
        assert_eq!(parse_media_count(Some(" 2 ")), 2);
        assert_eq!(parse_media_count(Some("abc")), 0);
        assert_eq!(parse_media_count(Some("-1")), 0);
        assert_eq!(parse_media_count(Some("")), 0);
        assert_eq!(parse_media_count(None), 0);
    }

    #[test]
    fn test_missing_media_url_skipped() {
        let message = InboundMessage::from_fields(&fields(&[
            ("From", "+1A"),
            ("To", "+1B"),
            ("Body", "hi"),
            ("MessageSid", "SM1"),
            ("NumMedia", "2"),
            ("MediaUrl0", "http://x/1.jpg"),
        ]));

        assert_eq!(message.num_media, 2);
        assert_eq!(message.media_urls, vec!["http://x/1.jpg".to_string()]);
    }

    #[test]
    fn test_media_urls_keep_index_order() {
        let f = fields(&[
            ("MediaUrl2", "http://x/2.jpg"),
            ("MediaUrl0", "http://x/0.jpg"),
            ("MediaUrl1", ""),
            ("MediaUrl3", "http://x/3.jpg"),
        ]);

        assert_eq!(
            collect_media_urls(&f, 4),
            vec!["http://x/0.jpg".to_string(), "http://x/2.jpg".to_string(), "http://x/3.jpg".to_string()]
        );
    }

    #[test]
    fn test_media_urls_beyond_count_ignored() {
        let f = fields(&[("MediaUrl0", "http://x/0.jpg"), ("MediaUrl1", "http://x/1.jpg")]);
        assert_eq!(collect_media_urls(&f, 1), vec!["http://x/0.jpg".to_string()]);
        assert!(collect_media_urls(&f, 0).is_empty());
    }

    #[test]
    fn test_invalid_count_means_no_media() {
        let message = InboundMessage::from_fields(&fields(&[
            ("NumMedia", "lots"),
            ("MediaUrl0", "http://x/0.jpg"),
        ]));
        assert_eq!(message.num_media, 0);
        assert!(message.media_urls.is_empty());
    }

    #[test]
    fn test_body_defaults_to_empty() {
        let message = InboundMessage::from_fields(&fields(&[("From", "+1A")]));
        assert_eq!(message.body, "");
        assert_eq!(message.to, None);
    }

    #[test]
    fn test_forward_payload_json_shape() {
        let message = InboundMessage::from_fields(&fields(&[
            ("From", "+1A"),
            ("To", "+1B"),
            ("Body", "hi"),
            ("MessageSid", "SM1"),
            ("NumMedia", "1"),
            ("MediaUrl0", "http://x/1.jpg"),
        ]));

        let json = serde_json::to_value(message.to_forward_payload()).unwrap();

        assert_eq!(json["from"], "+1A");
        assert_eq!(json["to"], "+1B");
        assert_eq!(json["body"], "hi");
        assert_eq!(json["messageId"], "SM1");
        assert_eq!(json["mediaUrls"], serde_json::json!(["http://x/1.jpg"]));
        assert!(json["receivedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_forward_payload_omits_missing_ids() {
        let message = InboundMessage::from_fields(&fields(&[("Body", "hi")]));
        let json = serde_json::to_value(message.to_forward_payload()).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("from"));
        assert!(!object.contains_key("to"));
        assert!(!object.contains_key("messageId"));
        assert_eq!(json["mediaUrls"], serde_json::json!([]));
    }

    #[test]
    fn test_iso_timestamp_format() {
        let ts = iso_timestamp();
        // 2024-05-01T12:00:00.000Z
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[10..11], "T");
        assert!(ts.ends_with('Z'));
    }
}
