//! Protocol module: the payload contract on the bus and topic-filter rules.

pub mod notification;
pub mod topic;

pub use notification::{parse_notification, NotificationRequest, ParseError};
pub use topic::{validate_topic_filter, TopicError};
