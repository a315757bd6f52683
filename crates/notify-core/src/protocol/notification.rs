//! Notification payload parser.
//!
//! Publishers on the bus send JSON documents.  Only documents shaped like
//!
//! ```json
//! {"notification": "Camera 3 motion detected"}
//! ```
//!
//! become a [`NotificationRequest`].  Any other key in the object is ignored.
//!
//! # Untrusted input
//!
//! Anyone who can publish to the broker can reach this parser, so every
//! failure is a typed [`ParseError`] and no input can make it panic.  The
//! decode happens in two explicit steps:
//!
//! 1. The bytes are decoded as a JSON object (`Map<String, Value>`).  Anything
//!    that is not valid JSON, or is valid JSON but not an object, is
//!    [`ParseError::Malformed`].
//! 2. The `"notification"` entry is matched against the [`Value`] variants.  Only
//!    `Value::String` is accepted; every other variant is reported by name.

use serde_json::{Map, Value};
use thiserror::Error;

/// The JSON key a payload must carry to be forwarded.
pub const NOTIFICATION_KEY: &str = "notification";

/// Reasons a bus payload is not a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload is not a well-formed JSON object.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The object has no `"notification"` key.
    #[error("payload has no \"notification\" field")]
    FieldMissing,

    /// The `"notification"` key holds something other than a string.
    #[error("\"notification\" field is {found}, expected a string")]
    WrongType {
        /// JSON kind that was found instead (`"number"`, `"array"`, ...).
        found: &'static str,
    },

    /// The `"notification"` string is empty.
    #[error("\"notification\" field is empty")]
    EmptyBody,
}

/// A validated request to push one notification.
///
/// The body is guaranteed non-empty and is exactly the text the publisher
/// sent; no trimming or other transformation is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    body: String,
}

impl NotificationRequest {
    /// Builds a request from `body`, rejecting an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyBody`] when `body` is empty.
    pub fn new(body: impl Into<String>) -> Result<Self, ParseError> {
        let body = body.into();
        if body.is_empty() {
            return Err(ParseError::EmptyBody);
        }
        Ok(Self { body })
    }

    /// The notification text.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Parses a raw bus payload into a [`NotificationRequest`].
///
/// # Errors
///
/// - [`ParseError::Malformed`] – not JSON, or JSON whose top level is not an object.
/// - [`ParseError::FieldMissing`] – no `"notification"` key.
/// - [`ParseError::WrongType`] – the key is present but not a string.
/// - [`ParseError::EmptyBody`] – the key holds an empty string.
///
/// # Example
///
/// ```rust
/// use notify_core::parse_notification;
///
/// let req = parse_notification(br#"{"notification": "Camera 3 motion detected"}"#).unwrap();
/// assert_eq!(req.body(), "Camera 3 motion detected");
/// ```
pub fn parse_notification(payload: &[u8]) -> Result<NotificationRequest, ParseError> {
    let document: Map<String, Value> =
        serde_json::from_slice(payload).map_err(|e| ParseError::Malformed(e.to_string()))?;

    match document.get(NOTIFICATION_KEY) {
        None => Err(ParseError::FieldMissing),
        Some(Value::String(text)) => NotificationRequest::new(text.as_str()),
        Some(other) => Err(ParseError::WrongType {
            found: json_kind(other),
        }),
    }
}

/// Human-readable name of a JSON value's kind, used in error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
