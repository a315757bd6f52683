//! Domain layer for notify-bridge.
//!
//! The domain layer contains plain configuration types with no dependencies
//! on I/O, networking, or the async runtime.
//!
//! # What belongs in the domain layer?
//!
//! - Runtime configuration (`BridgeConfig`, `LogTarget`)
//! - The Pushover secrets (`Credentials`)
//!
//! # What does NOT belong here?
//!
//! - Reading the credentials file (that is `infrastructure::credentials`)
//! - CLI parsing (that is done in `main.rs`)

pub mod config;

pub use config::{BridgeConfig, Credentials, LogTarget, LogTargetError};
