//! Inbound bus message.

/// One message delivered by the broker on a subscribed topic.
///
/// An `InboundMessage` lives only for the duration of one dispatch: it is
/// moved into the dispatch task, parsed, and dropped.  The payload is kept as
/// raw bytes because publishers are untrusted and may send anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Concrete topic the message was published on (never a wildcard).
    pub topic: String,
    /// Raw payload bytes, expected to be a JSON object.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a message from a topic and payload.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// The payload decoded as UTF-8 for logging, with invalid bytes replaced.
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
