//! Infrastructure layer for notify-bridge.
//!
//! The infrastructure layer handles all I/O: the MQTT connection, HTTPS
//! requests to Pushover, log files, the credentials file and OS signals.
//!
//! # Responsibilities
//!
//! - Adapting rumqttc to the session's `BusConnection` seam (`mqtt`)
//! - Delivering notifications through the Pushover API (`pushover`)
//! - Installing and reloading the log backends (`logging`)
//! - Reading the credentials file (`credentials`)
//! - Wiring everything together and handling signals (`lifecycle`)
//!
//! # What does NOT belong here?
//!
//! - Payload parsing (that is `notify-core`)
//! - The subscribe / reconnect policy (that is the application layer)
//! - Command-line parsing (that is done in `main.rs`)

pub mod credentials;
pub mod lifecycle;
pub mod logging;
pub mod mqtt;
pub mod pushover;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use lifecycle::run;
pub use logging::{init_logging, LogHandle, LoggingSettings};
