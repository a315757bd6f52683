//! Application layer for notify-bridge.
//!
//! The application layer orchestrates the business logic: it knows *what* to
//! do with a bus message, but delegates *how* to talk to the broker and the
//! push service to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Driving the connect / subscribe / reconnect lifecycle (`session`)
//! - Parsing each inbound message and handing valid ones to the push
//!   service (`dispatch`)
//! - Defining the seams (`BusConnection`, `DeliveryClient`) that the
//!   infrastructure layer implements and tests replace
//!
//! # What does NOT belong here?
//!
//! - MQTT packets and client options (that is `infrastructure::mqtt`)
//! - HTTP requests and response parsing (that is `infrastructure::pushover`)
//! - Signal handling and logging setup (that is `infrastructure::lifecycle`
//!   and `infrastructure::logging`)

pub mod dispatch;
pub mod session;

pub use dispatch::{
    DeliveryClient, DeliveryError, DispatchCounts, DispatchOutcome, DispatchStats, Dispatcher,
};
pub use session::{
    Backoff, BridgeSession, BusConnection, BusError, BusEvent, SessionError, SessionPolicy,
    SessionState,
};
