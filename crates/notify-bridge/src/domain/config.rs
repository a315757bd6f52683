//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments and never mutated
//! afterwards, so it can be shared freely (behind an `Arc`) between the
//! session and the dispatch tasks.
//!
//! [`Credentials`] carries the two Pushover secrets.  It is kept separate from
//! `BridgeConfig` so that logging the config (which happens at debug level on
//! startup) can never leak a token.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default MQTT broker host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default MQTT broker port.
pub const DEFAULT_PORT: u16 = 1883;
/// Default subscription filter.
pub const DEFAULT_TOPIC: &str = "/surveillance/notification/#";
/// Default MQTT keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
/// Default number of consecutive subscribe failures tolerated before giving up.
pub const DEFAULT_SUBSCRIBE_ATTEMPTS: u32 = 5;

// ── Log target ────────────────────────────────────────────────────────────────

/// Where log output goes.
///
/// Standard error always receives output.  A `File` target adds the file as a
/// second destination rather than replacing stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Log to standard error only.
    Stderr,
    /// Log to standard error and append to this file.
    File(PathBuf),
}

/// Error returned when a log target string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("log target must be \"stderr\" or a file path, got an empty string")]
pub struct LogTargetError;

impl FromStr for LogTarget {
    type Err = LogTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(LogTargetError),
            "stderr" => Ok(Self::Stderr),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

// ── Bridge configuration ──────────────────────────────────────────────────────

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use notify_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.broker_url(), "tcp://localhost:1883");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Host name or IP address of the MQTT broker.
    pub bus_host: String,

    /// TCP port of the MQTT broker.
    pub bus_port: u16,

    /// Subscription filter, e.g. `/surveillance/notification/#`.
    pub topic: String,

    /// When `true`, debug-level records (including message payloads) are
    /// written to the log backends.
    pub verbose: bool,

    /// Log destination.
    pub log_target: LogTarget,

    /// MQTT keep-alive interval negotiated with the broker.
    pub keep_alive: Duration,

    /// Consecutive subscribe failures tolerated before the session gives up.
    pub subscribe_attempts: u32,
}

impl BridgeConfig {
    /// The broker address in `tcp://<host>:<port>` form, used in log output.
    pub fn broker_url(&self) -> String {
        format!("tcp://{}:{}", self.bus_host, self.bus_port)
    }
}

impl Default for BridgeConfig {
    /// | Field              | Default                          |
    /// |--------------------|----------------------------------|
    /// | bus_host           | `localhost`                      |
    /// | bus_port           | `1883`                           |
    /// | topic              | `/surveillance/notification/#`   |
    /// | verbose            | `false`                          |
    /// | log_target         | `stderr`                         |
    /// | keep_alive         | 30 seconds                       |
    /// | subscribe_attempts | 5                                |
    fn default() -> Self {
        Self {
            bus_host: DEFAULT_HOST.to_string(),
            bus_port: DEFAULT_PORT,
            topic: DEFAULT_TOPIC.to_string(),
            verbose: false,
            log_target: LogTarget::Stderr,
            keep_alive: DEFAULT_KEEP_ALIVE,
            subscribe_attempts: DEFAULT_SUBSCRIBE_ATTEMPTS,
        }
    }
}

// ── Credentials ───────────────────────────────────────────────────────────────

/// Pushover secrets: the application token and the user (recipient) key.
///
/// Read-only after construction.  The `Debug` implementation redacts both
/// values so a stray `{:?}` cannot leak them into the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_token: String,
    user_token: String,
}

impl Credentials {
    /// Creates a credentials pair.
    pub fn new(app_token: impl Into<String>, user_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            user_token: user_token.into(),
        }
    }

    /// The Pushover application token (identifies the sender).
    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    /// The Pushover user key (identifies the recipient).
    pub fn user_token(&self) -> &str {
        &self.user_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_token", &"<redacted>")
            .field("user_token", &"<redacted>")
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_is_localhost() {
        // Arrange / Act
        let cfg = BridgeConfig::default();
        // Assert
        assert_eq!(cfg.bus_host, "localhost");
    }

    #[test]
    fn test_default_port_is_1883() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.bus_port, 1883);
    }

    #[test]
    fn test_default_topic_is_surveillance_tree() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.topic, "/surveillance/notification/#");
    }

    #[test]
    fn test_default_logging_is_quiet_stderr() {
        let cfg = BridgeConfig::default();
        assert!(!cfg.verbose);
        assert_eq!(cfg.log_target, LogTarget::Stderr);
    }

    #[test]
    fn test_broker_url_uses_tcp_scheme() {
        let cfg = BridgeConfig {
            bus_host: "broker.lan".to_string(),
            bus_port: 8883,
            ..BridgeConfig::default()
        };
        assert_eq!(cfg.broker_url(), "tcp://broker.lan:8883");
    }

    #[test]
    fn test_log_target_parses_stderr() {
        assert_eq!("stderr".parse::<LogTarget>(), Ok(LogTarget::Stderr));
    }

    #[test]
    fn test_log_target_parses_path() {
        assert_eq!(
            "/var/log/surveillance-notify.log".parse::<LogTarget>(),
            Ok(LogTarget::File(PathBuf::from("/var/log/surveillance-notify.log")))
        );
    }

    #[test]
    fn test_log_target_rejects_empty_string() {
        assert_eq!("".parse::<LogTarget>(), Err(LogTargetError));
    }

    #[test]
    fn test_log_target_display_round_trips() {
        for raw in ["stderr", "notify.log"] {
            let target: LogTarget = raw.parse().unwrap();
            assert_eq!(target.to_string(), raw);
        }
    }

    #[test]
    fn test_credentials_debug_redacts_tokens() {
        // Arrange
        let creds = Credentials::new("app-secret-123", "user-secret-456");

        // Act
        let rendered = format!("{creds:?}");

        // Assert: neither secret appears in the debug output
        assert!(!rendered.contains("app-secret-123"));
        assert!(!rendered.contains("user-secret-456"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_credentials_accessors_return_tokens() {
        let creds = Credentials::new("a", "u");
        assert_eq!(creds.app_token(), "a");
        assert_eq!(creds.user_token(), "u");
    }
}
