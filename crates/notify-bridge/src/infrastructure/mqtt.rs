//! MQTT broker connection (rumqttc).
//!
//! [`MqttBus`] adapts rumqttc's `AsyncClient` + `EventLoop` pair to the
//! session's [`BusConnection`] seam.
//!
//! # How rumqttc works (for beginners)
//!
//! rumqttc splits a connection into two halves:
//!
//! - `AsyncClient` queues requests (subscribe, publish, ...) into a channel.
//! - `EventLoop` owns the socket.  Nothing happens on the network until
//!   someone calls `poll()`: each call performs I/O and returns the next
//!   incoming or outgoing packet.
//!
//! When `poll()` returns an error the connection is gone.  Calling `poll()`
//! again opens a fresh connection, so reconnecting is simply "keep polling".
//! With a clean session the broker forgets the subscription on disconnect;
//! the session re-subscribes whenever it sees a new CONNACK.
//!
//! On a connection error rumqttc keeps unsent requests in
//! `EventLoop::pending` and replays them after reconnecting.  Subscribe
//! requests are dropped from that queue, since the session issues a fresh
//! one on every CONNACK.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS, Request, SubscribeReasonCode,
};
use tracing::{debug, trace};

use notify_core::{ClientIdentity, InboundMessage};

use crate::application::session::{BusConnection, BusError, BusEvent};
use crate::domain::BridgeConfig;

/// Capacity of the request channel between `AsyncClient` and `EventLoop`.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Shortest keep-alive the bridge will negotiate.
pub const MIN_KEEP_ALIVE: Duration = Duration::from_secs(5);

/// Largest packet accepted from the broker.  Bigger publishes are a framing
/// error in rumqttc and cost the connection, so this is kept well above any
/// notification document.
pub const MAX_INCOMING_PACKET: usize = 256 * 1024;

/// Largest packet sent to the broker.  The bridge only sends small control
/// packets.
const MAX_OUTGOING_PACKET: usize = 10 * 1024;

/// A broker connection driven by rumqttc.
pub struct MqttBus {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttBus {
    /// Prepares a connection to the broker named in `config`.
    ///
    /// No network I/O happens here; the first [`BusConnection::next_event`]
    /// call connects.
    pub fn new(config: &BridgeConfig, identity: &ClientIdentity) -> Self {
        let mut options = MqttOptions::new(identity.as_str(), config.bus_host.as_str(), config.bus_port);
        options.set_clean_session(true);
        options.set_keep_alive(config.keep_alive.max(MIN_KEEP_ALIVE));
        options.set_max_packet_size(MAX_INCOMING_PACKET, MAX_OUTGOING_PACKET);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        Self { client, eventloop }
    }
}

#[async_trait]
impl BusConnection for MqttBus {
    async fn next_event(&mut self) -> Option<Result<BusEvent, BusError>> {
        loop {
            match self.eventloop.poll().await {
                Ok(event) => {
                    if let Some(bus_event) = translate(event) {
                        return Some(bus_event);
                    }
                }
                Err(e) => {
                    drop_queued_subscribes(&mut self.eventloop.pending);
                    return Some(Err(BusError::Connection(e.to_string())));
                }
            }
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), BusError> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::Request(e.to_string()))
    }
}

/// Removes subscribe requests left over from a lost connection.
fn drop_queued_subscribes(pending: &mut VecDeque<Request>) {
    let before = pending.len();
    pending.retain(|request| !matches!(request, Request::Subscribe(_)));
    let dropped = before - pending.len();
    if dropped > 0 {
        debug!(dropped, "discarded stale subscribe requests");
    }
}

/// Maps a rumqttc event to a session event.  Packets the session does not
/// care about (pings, outgoing traffic, acks for our own requests) yield
/// `None`.
fn translate(event: Event) -> Option<Result<BusEvent, BusError>> {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) => {
            if ack.code == ConnectReturnCode::Success {
                Some(Ok(BusEvent::Connected))
            } else {
                Some(Err(BusError::Connection(format!(
                    "broker refused connection: {:?}",
                    ack.code
                ))))
            }
        }
        Event::Incoming(Packet::SubAck(ack)) => {
            let granted = !ack.return_codes.is_empty()
                && ack
                    .return_codes
                    .iter()
                    .all(|code| matches!(code, SubscribeReasonCode::Success(_)));
            Some(Ok(BusEvent::SubscribeAck { granted }))
        }
        Event::Incoming(Packet::Publish(publish)) => Some(Ok(BusEvent::Message(InboundMessage::new(
            publish.topic,
            publish.payload.to_vec(),
        )))),
        other => {
            trace!(?other, "ignoring mqtt event");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
