//! Domain entities for surveillance-notify.
//!
//! Plain data types shared by the bridge's application and infrastructure
//! layers.  Nothing in here performs network I/O; the one OS call is the host
//! name lookup in [`identity::ClientIdentity::detect`].

/// The identity this bridge presents to the broker.
pub mod identity;

/// A message as it arrives from the bus.
pub mod message;
