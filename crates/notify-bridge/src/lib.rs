//! notify-bridge library crate.
//!
//! This crate forwards surveillance notifications from an MQTT broker to
//! Pushover.  Cameras and motion detectors publish small JSON documents; the
//! bridge subscribes to their topic tree and turns every
//! `{"notification": "..."}` payload into a push notification.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Cameras / detectors (MQTT publish)
//!         ↓
//! [MQTT broker]
//!         ↓
//! [notify-bridge]
//!   ├── domain/            Pure types: BridgeConfig, LogTarget, Credentials
//!   ├── application/
//!   │     ├── session/     Connect, subscribe, reconnect; one task per message
//!   │     └── dispatch/    Parse the payload, call the delivery client
//!   └── infrastructure/
//!         ├── mqtt/        rumqttc adapter
//!         ├── pushover/    HTTPS client for the Pushover API
//!         ├── logging/     Reloadable tracing backends (stderr + file)
//!         ├── credentials/ TOML credentials file
//!         └── lifecycle/   Wiring, SIGHUP reload, Ctrl+C / SIGTERM shutdown
//!         ↓
//! [Pushover] → phone
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async code.
//! - `application` depends on `domain` and `notify-core`; it reaches the
//!   network only through the `BusConnection` and `DeliveryClient` traits.
//! - `infrastructure` depends on all other layers plus `rumqttc`, `reqwest`
//!   and `tracing-subscriber`.
//!
//! # For beginners: why the traits?
//!
//! The session and dispatcher never talk to a real broker or a real push
//! service directly.  They talk to a trait, and `main` plugs in the real
//! implementation.  Tests plug in scripted fakes instead, so the whole
//! reconnect and dispatch logic can be exercised without any network.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: session lifecycle and message dispatch.
pub mod application;

/// Infrastructure layer: MQTT, Pushover, logging, credentials, signals.
pub mod infrastructure;
