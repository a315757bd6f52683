//! Bridge session: owns the bus connection, the subscription and the
//! reconnect policy, and routes every inbound message to the dispatcher.
//!
//! # State machine
//!
//! ```text
//!   Disconnected ──run()──▶ Connecting ──Connected──▶ Connected{subscribed: false}
//!                               ▲                          │ SubscribeAck(granted)
//!                               │ connection lost          ▼
//!                               └──────────────── Connected{subscribed: true}
//! ```
//!
//! - Every `Connected` event (first connect and every reconnect) issues exactly
//!   one subscribe request for the configured topic.  The bridge connects with
//!   a clean session, so the broker forgets subscriptions on disconnect.
//! - A refused or failed subscribe is retried with exponential backoff.  After
//!   `max_subscribe_attempts` consecutive failures the session gives up with
//!   [`SessionError::SubscribeFailed`].  The wait is a timer raced against
//!   the bus, so messages and keep-alives keep flowing while it runs.
//! - A connection error before the first successful connect is fatal
//!   ([`SessionError::Connect`]).  After that, errors move the session back to
//!   `Connecting`; it waits out the reconnect backoff and polls again, which
//!   makes the MQTT client reconnect.
//!
//! # Dispatch
//!
//! Each message is handed to [`Dispatcher::on_message`] on its own Tokio task.
//! A slow push-service call therefore delays only its own message; the session
//! keeps polling the bus (and answering keep-alives) in the meantime.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use notify_core::{ClientIdentity, InboundMessage};

use crate::application::dispatch::Dispatcher;
use crate::domain::BridgeConfig;

// ── Bus seam ──────────────────────────────────────────────────────────────────

/// Errors reported by a [`BusConnection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The network connection to the broker failed or was lost.
    #[error("broker connection error: {0}")]
    Connection(String),

    /// A request (such as subscribe) could not be handed to the client.
    #[error("broker request failed: {0}")]
    Request(String),
}

/// Something the broker connection reports to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The broker accepted the connection (MQTT CONNACK).
    Connected,
    /// The broker answered a subscribe request (MQTT SUBACK).
    SubscribeAck {
        /// `true` when the broker granted every requested filter.
        granted: bool,
    },
    /// A message arrived on a subscribed topic.
    Message(InboundMessage),
}

/// A publish/subscribe broker connection, as seen by the session.
///
/// The production implementation is [`crate::infrastructure::mqtt::MqttBus`].
#[async_trait]
pub trait BusConnection: Send {
    /// Waits for the next event.  Must be cancel safe: the session drops the
    /// future when a subscribe retry falls due.
    ///
    /// `Some(Err(_))` reports a connection problem; calling `next_event` again
    /// attempts to reconnect.  `None` means the connection has been torn down
    /// for good and the session should stop.
    async fn next_event(&mut self) -> Option<Result<BusEvent, BusError>>;

    /// Requests a subscription to `topic` at QoS 1 (at least once).
    ///
    /// The broker's answer arrives later as [`BusEvent::SubscribeAck`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Request`] if the request could not be queued.
    async fn subscribe(&mut self, topic: &str) -> Result<(), BusError>;
}

// ── Policy ────────────────────────────────────────────────────────────────────

/// Upper bound for the wait between subscribe retries.
const SUBSCRIBE_RETRY_MAX: Duration = Duration::from_secs(10);

/// Exponential backoff: `initial * 2^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    /// A backoff that never waits.  Useful in tests.
    pub const NONE: Backoff = Backoff {
        initial: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Timing and retry limits for a [`BridgeSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Wait between reconnect attempts after the connection drops.
    pub reconnect: Backoff,
    /// Wait between subscribe retries.
    pub subscribe_retry: Backoff,
    /// Consecutive subscribe failures tolerated before giving up.
    pub max_subscribe_attempts: u32,
}

impl SessionPolicy {
    /// Default policy with the subscribe limit taken from `config`.
    ///
    /// Reconnects back off from 1 s to 60 s.  Subscribe retries start at 1 s
    /// and never exceed 10 s or half the keep-alive, whichever is shorter.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let retry_cap = SUBSCRIBE_RETRY_MAX.min(config.keep_alive / 2);
        Self {
            reconnect: Backoff {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(60),
            },
            subscribe_retry: Backoff {
                initial: Duration::from_secs(1).min(retry_cap),
                max: retry_cap,
            },
            max_subscribe_attempts: config.subscribe_attempts.max(1),
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Where the session is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected {
        /// `true` once the broker has granted the subscription.
        subscribed: bool,
    },
}

/// Errors that end a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The very first connection attempt failed.
    #[error("could not connect to broker at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: BusError,
    },

    /// The subscription kept failing on a live connection.
    #[error("subscription to {topic} failed {attempts} times in a row: {reason}")]
    SubscribeFailed {
        topic: String,
        attempts: u32,
        reason: String,
    },
}

/// What woke the session up.
enum Wake {
    SubscribeRetryDue,
    Bus(Option<Result<BusEvent, BusError>>),
}

/// A live subscription against the broker.
pub struct BridgeSession<B: BusConnection> {
    bus: B,
    config: Arc<BridgeConfig>,
    identity: ClientIdentity,
    dispatcher: Arc<Dispatcher>,
    policy: SessionPolicy,
    state: SessionState,
    has_connected: bool,
    reconnect_attempts: u32,
    subscribe_failures: u32,
    subscribe_retry_at: Option<Instant>,
}

impl<B: BusConnection> BridgeSession<B> {
    /// Creates a session in the `Disconnected` state.
    pub fn new(
        bus: B,
        config: Arc<BridgeConfig>,
        identity: ClientIdentity,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let policy = SessionPolicy::from_config(&config);
        Self {
            bus,
            config,
            identity,
            dispatcher,
            policy,
            state: SessionState::Disconnected,
            has_connected: false,
            reconnect_attempts: 0,
            subscribe_failures: 0,
            subscribe_retry_at: None,
        }
    }

    /// Replaces the default timing and retry policy.
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session until the bus ends or a fatal error occurs.
    ///
    /// In production the MQTT bus never ends, so this only returns on error.
    /// Before returning, every in-flight dispatch task is awaited so no
    /// accepted message is abandoned half-way.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Connect`] if the first connection attempt fails.
    /// - [`SessionError::SubscribeFailed`] if subscribe retries run out.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Connecting;
        info!(
            url = %self.config.broker_url(),
            client_id = %self.identity,
            "connecting to broker"
        );

        let mut in_flight = JoinSet::new();
        let result = self.drive(&mut in_flight).await;

        while let Some(joined) = in_flight.join_next().await {
            report_task_result(joined);
        }
        self.state = SessionState::Disconnected;

        let counts = self.dispatcher.stats();
        info!(
            received = counts.received,
            delivered = counts.delivered,
            rejected = counts.rejected,
            failed = counts.failed,
            "bridge session ended"
        );

        result
    }

    async fn drive(&mut self, in_flight: &mut JoinSet<()>) -> Result<(), SessionError> {
        loop {
            while let Some(joined) = in_flight.try_join_next() {
                report_task_result(joined);
            }

            let retry_at = self.subscribe_retry_at;
            let wake = tokio::select! {
                biased;
                () = sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    Wake::SubscribeRetryDue
                }
                event = self.bus.next_event() => Wake::Bus(event),
            };

            let event = match wake {
                Wake::SubscribeRetryDue => {
                    self.subscribe_retry_at = None;
                    self.request_subscription().await?;
                    continue;
                }
                Wake::Bus(Some(event)) => event,
                Wake::Bus(None) => {
                    debug!("bus connection closed");
                    return Ok(());
                }
            };

            match event {
                Ok(BusEvent::Connected) => self.on_connected().await?,
                Ok(BusEvent::SubscribeAck { granted }) => self.on_subscribe_ack(granted).await?,
                Ok(BusEvent::Message(message)) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    in_flight.spawn(async move {
                        dispatcher.on_message(message).await;
                    });
                }
                Err(e) => self.on_connection_error(e).await?,
            }
        }
    }

    async fn on_connected(&mut self) -> Result<(), SessionError> {
        if self.has_connected {
            info!(url = %self.config.broker_url(), "reconnected to broker");
        } else {
            info!(url = %self.config.broker_url(), "connected to broker");
        }
        self.has_connected = true;
        self.reconnect_attempts = 0;
        self.subscribe_failures = 0;
        self.subscribe_retry_at = None;
        self.state = SessionState::Connected { subscribed: false };
        self.request_subscription().await
    }

    async fn on_subscribe_ack(&mut self, granted: bool) -> Result<(), SessionError> {
        if granted {
            info!(topic = %self.config.topic, "subscribed");
            self.subscribe_failures = 0;
            self.subscribe_retry_at = None;
            self.state = SessionState::Connected { subscribed: true };
            return Ok(());
        }

        let delay = self.record_subscribe_failure("broker refused the subscription")?;
        if delay.is_zero() {
            return self.request_subscription().await;
        }
        self.subscribe_retry_at = Some(Instant::now() + delay);
        Ok(())
    }

    /// Issues one subscribe request.  If the request cannot be queued, the
    /// failure is counted and a retry is scheduled.
    async fn request_subscription(&mut self) -> Result<(), SessionError> {
        loop {
            info!(topic = %self.config.topic, "subscribing");
            let Err(e) = self.bus.subscribe(&self.config.topic).await else {
                return Ok(());
            };
            let delay = self.record_subscribe_failure(&e.to_string())?;
            if !delay.is_zero() {
                self.subscribe_retry_at = Some(Instant::now() + delay);
                return Ok(());
            }
        }
    }

    /// Counts a subscribe failure.  Returns how long to wait before the next
    /// try, or gives up once the limit is reached.
    fn record_subscribe_failure(&mut self, reason: &str) -> Result<Duration, SessionError> {
        self.subscribe_failures += 1;
        if self.subscribe_failures >= self.policy.max_subscribe_attempts {
            error!(
                topic = %self.config.topic,
                attempts = self.subscribe_failures,
                reason,
                "giving up on subscription"
            );
            return Err(SessionError::SubscribeFailed {
                topic: self.config.topic.clone(),
                attempts: self.subscribe_failures,
                reason: reason.to_string(),
            });
        }

        let delay = self
            .policy
            .subscribe_retry
            .delay_for(self.subscribe_failures - 1);
        warn!(
            topic = %self.config.topic,
            attempt = self.subscribe_failures,
            reason,
            "subscription failed; retrying in {delay:?}"
        );
        Ok(delay)
    }

    async fn on_connection_error(&mut self, e: BusError) -> Result<(), SessionError> {
        if !self.has_connected {
            error!(url = %self.config.broker_url(), error = %e, "initial connection failed");
            return Err(SessionError::Connect {
                url: self.config.broker_url(),
                source: e,
            });
        }

        self.state = SessionState::Connecting;
        self.subscribe_retry_at = None;
        let delay = self.policy.reconnect.delay_for(self.reconnect_attempts);
        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
        warn!(
            error = %e,
            attempt = self.reconnect_attempts,
            "connection to broker lost; reconnecting in {delay:?}"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// Logs a dispatch task that panicked.  `on_message` does not panic, so this
/// only fires on a bug.
fn report_task_result(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("dispatch task panicked: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
