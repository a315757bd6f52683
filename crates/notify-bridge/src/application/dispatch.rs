//! Per-message dispatch: parse a bus message and hand it to the push service.
//!
//! [`Dispatcher::on_message`] is the bridge's message handler.  The session
//! spawns one call per inbound message, so several calls may run at the same
//! time.  The dispatcher therefore holds only shared, read-only state (the
//! delivery client and the credentials) plus atomic counters.
//!
//! # Failure isolation
//!
//! Nothing that happens while handling one message can affect another message
//! or the subscription:
//!
//! - A payload that fails to parse is logged at debug level and dropped.
//! - A delivery failure is logged at error level and dropped (no retry).
//!
//! `on_message` returns a [`DispatchOutcome`] for observability and tests, but
//! never an `Err`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use notify_core::{parse_notification, InboundMessage, ParseError};

use crate::domain::Credentials;

// ── Delivery seam ─────────────────────────────────────────────────────────────

/// Errors a push-delivery attempt can end with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The app token or the user key is empty.
    #[error("push service credentials are missing")]
    MissingCredentials,

    /// The body exceeds the push service's length limit.
    #[error("notification body is {len} characters; the push service accepts at most {max}")]
    MessageTooLong { len: usize, max: usize },

    /// The push service answered but refused the request.
    #[error("push service rejected the request (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The request never got a usable answer (DNS, TLS, timeout, ...).
    #[error("push service request failed: {0}")]
    Transport(String),
}

/// Sends one notification to a push-delivery service.
///
/// The production implementation is
/// [`crate::infrastructure::pushover::PushoverClient`]; tests inject mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Delivers `body` to `recipient_token` on behalf of the app `app_token`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] describing why the notification was not
    /// accepted.
    async fn send(
        &self,
        body: &str,
        recipient_token: &str,
        app_token: &str,
    ) -> Result<(), DeliveryError>;
}

// ── Outcome and counters ──────────────────────────────────────────────────────

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The push service accepted the notification.
    Delivered,
    /// The payload was not a notification; nothing was sent.
    Rejected(ParseError),
    /// The payload was valid but delivery failed.
    Failed(DeliveryError),
}

/// Running totals across all dispatches.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    delivered: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchCounts {
    pub received: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl DispatchStats {
    /// Reads all counters.
    ///
    /// Each counter is read independently, so a snapshot taken while messages
    /// are in flight may have `received` ahead of the other three.
    pub fn snapshot(&self) -> DispatchCounts {
        DispatchCounts {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// The bridge's message handler.
///
/// Cheap to share: wrap it in an `Arc` and clone the `Arc` into each dispatch
/// task.
pub struct Dispatcher {
    delivery: Arc<dyn DeliveryClient>,
    credentials: Arc<Credentials>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Creates a dispatcher that delivers through `delivery` using `credentials`.
    pub fn new(delivery: Arc<dyn DeliveryClient>, credentials: Arc<Credentials>) -> Self {
        Self {
            delivery,
            credentials,
            stats: DispatchStats::default(),
        }
    }

    /// Handles one inbound message.
    ///
    /// 1. Logs the topic and payload at debug level.  Payloads carry
    ///    notification text, so they are never logged above debug.
    /// 2. Parses the payload.  A rejection is logged at debug level and the
    ///    message is dropped.
    /// 3. Sends the body to the user key using the app token.  A failure is
    ///    logged at error level and the message is dropped.
    pub async fn on_message(&self, message: InboundMessage) -> DispatchOutcome {
        DispatchStats::bump(&self.stats.received);
        debug!(topic = %message.topic, "message received");
        debug!(topic = %message.topic, payload = %message.payload_lossy(), "message payload");

        let request = match parse_notification(&message.payload) {
            Ok(request) => request,
            Err(e) => {
                debug!(topic = %message.topic, reason = %e, "discarding message that is not a notification");
                DispatchStats::bump(&self.stats.rejected);
                return DispatchOutcome::Rejected(e);
            }
        };

        debug!(topic = %message.topic, body = %request.body(), "sending notification");

        let result = self
            .delivery
            .send(
                request.body(),
                self.credentials.user_token(),
                self.credentials.app_token(),
            )
            .await;

        match result {
            Ok(()) => {
                info!(topic = %message.topic, "notification delivered");
                DispatchStats::bump(&self.stats.delivered);
                DispatchOutcome::Delivered
            }
            Err(e) => {
                error!(topic = %message.topic, error = %e, "notification delivery failed");
                DispatchStats::bump(&self.stats.failed);
                DispatchOutcome::Failed(e)
            }
        }
    }

    /// Running totals since the dispatcher was created.
    pub fn stats(&self) -> DispatchCounts {
        self.stats.snapshot()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
