//! Client identity presented to the MQTT broker.
//!
//! The broker uses the client id to tell subscribers apart.  Two processes
//! connecting with the same id kick each other off, so the id includes the
//! host name: one bridge per machine can run without clashing with the others.

use std::fmt;

/// Fixed prefix of every client id this bridge uses.
pub const CLIENT_ID_PREFIX: &str = "surveillance-notify-";

/// The broker client id, `surveillance-notify-<hostname>`.
///
/// Computed once at startup and stable for the life of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Builds an identity from an optional host name.
    ///
    /// A missing or blank host name yields the bare prefix.
    pub fn from_hostname(hostname: Option<&str>) -> Self {
        match hostname.map(str::trim) {
            Some(host) if !host.is_empty() => Self(format!("{CLIENT_ID_PREFIX}{host}")),
            _ => Self(CLIENT_ID_PREFIX.to_string()),
        }
    }

    /// Builds an identity from the local machine's host name.
    ///
    /// Host names that are not valid UTF-8 are treated as unavailable.
    pub fn detect() -> Self {
        let raw = gethostname::gethostname();
        Self::from_hostname(raw.to_str())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
