//! # notify-core
//!
//! Shared library for surveillance-notify containing the notification payload
//! parser, MQTT topic-filter validation, and the identity the bridge presents
//! to the broker.
//!
//! This crate has zero dependencies on async runtimes, network sockets, or the
//! push-delivery service.  Everything here is a pure function or a plain data
//! type, so it can be unit-tested without a broker.
//!
//! # Architecture overview (for beginners)
//!
//! surveillance-notify is a small bridge: cameras and motion detectors publish
//! JSON documents to an MQTT broker, and the bridge forwards the interesting
//! ones to a phone as push notifications.
//!
//! - **`protocol`** – What a bus message must look like.  A payload is accepted
//!   only when it is a JSON object carrying a non-empty string under the
//!   `"notification"` key.  Topic filters are checked here too, before they are
//!   ever sent to the broker.
//!
//! - **`domain`** – The transient inbound message and the client identity
//!   (`surveillance-notify-<hostname>`).

pub mod domain;
pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `notify_core::parse_notification` instead of the full module path.
pub use domain::identity::{ClientIdentity, CLIENT_ID_PREFIX};
pub use domain::message::InboundMessage;
pub use protocol::notification::{parse_notification, NotificationRequest, ParseError};
pub use protocol::topic::{validate_topic_filter, TopicError};
