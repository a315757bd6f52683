//! Logging setup with a reloadable set of output backends.
//!
//! # Layout
//!
//! ```text
//! Registry
//!   ├── reload::Layer ── Vec of fmt layers (the "backends")
//!   │                     ├── stderr   (ANSI colours)
//!   │                     └── log file (plain text, append mode)  [optional]
//!   └── EnvFilter        (RUST_LOG, or the built-in default directives)
//! ```
//!
//! Standard error always receives output; a file target adds the file as a
//! second backend.  Each backend's writer is capped at INFO, or at DEBUG when
//! `verbose` is set, so message payloads (logged at debug) only reach the logs
//! in verbose mode.
//!
//! # Reloading
//!
//! [`LogHandle::reload`] builds a complete new backend set (reopening the log
//! file) and swaps it in through the `reload` handle in one step.  A record is
//! written either by the old set or by the new one, never by a mix.  This is
//! what SIGHUP triggers after logrotate has moved the file away.
//!
//! If the log file cannot be opened, the new set is stderr-only and the error
//! is logged there.  Logging never stops because of a bad file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{error, Level, Subscriber};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

use crate::domain::{BridgeConfig, LogTarget};

/// Directives used when `RUST_LOG` is unset or invalid: the bridge at debug
/// (the backends cap it further), chatty network crates at info.
pub const DEFAULT_DIRECTIVES: &str =
    "debug,rumqttc=info,hyper=info,hyper_util=info,reqwest=info,rustls=info";

/// The swappable part of the subscriber.
type Backends = Box<dyn Layer<Registry> + Send + Sync>;

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber was already installed.
    #[error("failed to install the log subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),

    /// The subscriber holding the reload layer no longer exists.
    #[error("failed to swap log backends: {0}")]
    Reload(#[from] reload::Error),
}

/// What the backends look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Write debug records (payloads included) to the backends.
    pub verbose: bool,
    /// Stderr only, or stderr plus a file.
    pub target: LogTarget,
}

impl LoggingSettings {
    /// The logging part of the bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            verbose: config.verbose,
            target: config.log_target.clone(),
        }
    }

    fn max_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// Something that can re-initialise logging.  Implemented by [`LogHandle`];
/// the reload listener depends only on this trait.
pub trait LogReloader: Send + Sync {
    /// Rebuilds and swaps the log backends.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::Reload`] if the swap itself failed.  A log
    /// file that cannot be reopened is not an error here: it is logged and
    /// output continues on stderr.
    fn reload(&self) -> Result<(), LoggingError>;
}

/// Handle to the installed backends.
pub struct LogHandle {
    handle: reload::Handle<Backends, Registry>,
    settings: LoggingSettings,
}

impl LogReloader for LogHandle {
    fn reload(&self) -> Result<(), LoggingError> {
        let (backends, file_error) = build_backends(&self.settings);
        self.handle.reload(backends)?;
        match file_error {
            Some(e) => error!(error = %e, "log file unavailable after reload; logging to stderr only"),
            None => tracing::info!(target = %self.settings.target, "log backends reloaded"),
        }
        Ok(())
    }
}

/// The filter used when `RUST_LOG` is unset or unparsable.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber.
///
/// Call once, early in `main`.  An unopenable log file is reported through the
/// freshly installed stderr backend and is not fatal.
///
/// # Errors
///
/// Returns [`LoggingError::Install`] if a global subscriber already exists.
pub fn init_logging(settings: LoggingSettings) -> Result<LogHandle, LoggingError> {
    let (handle, subscriber, file_error) = build(settings, default_filter());
    subscriber.try_init()?;
    if let Some(e) = file_error {
        error!(error = %e, "log file unavailable; logging to stderr only");
    }
    Ok(handle)
}

/// Builds a subscriber and its handle without installing it.
///
/// Tests pair this with `tracing::subscriber::with_default`.
pub fn build(
    settings: LoggingSettings,
    filter: EnvFilter,
) -> (LogHandle, impl Subscriber + Send + Sync, Option<LoggingError>) {
    let (backends, file_error) = build_backends(&settings);
    let (layer, handle) = reload::Layer::new(backends);
    let subscriber = Registry::default().with(layer).with(filter);
    (LogHandle { handle, settings }, subscriber, file_error)
}

/// Builds the backend set for `settings`.  If the file cannot be opened the
/// set is stderr-only and the error is returned alongside it.
fn build_backends(settings: &LoggingSettings) -> (Backends, Option<LoggingError>) {
    let level = settings.max_level();
    let mut layers: Vec<Backends> = vec![fmt::layer()
        .with_writer(std::io::stderr.with_max_level(level))
        .with_ansi(true)
        .boxed()];

    let mut file_error = None;
    if let LogTarget::File(path) = &settings.target {
        match open_log_file(path) {
            Ok(file) => layers.push(
                fmt::layer()
                    .with_writer(Mutex::new(file).with_max_level(level))
                    .with_ansi(false)
                    .boxed(),
            ),
            Err(e) => file_error = Some(e),
        }
    }

    let backends: Backends = Box::new(layers);
    (backends, file_error)
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tracing::{debug, info};

    use super::*;

    fn file_settings(path: &Path, verbose: bool) -> LoggingSettings {
        LoggingSettings {
            verbose,
            target: LogTarget::File(path.to_path_buf()),
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn test_settings_from_config() {
        let config = BridgeConfig {
            verbose: true,
            log_target: LogTarget::File(PathBuf::from("/tmp/notify.log")),
            ..BridgeConfig::default()
        };
        let settings = LoggingSettings::from_config(&config);
        assert!(settings.verbose);
        assert_eq!(settings.target, LogTarget::File(PathBuf::from("/tmp/notify.log")));
    }

    #[test]
    fn test_file_backend_receives_info_without_ansi() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.log");
        let (_handle, subscriber, file_error) =
            build(file_settings(&path, false), EnvFilter::new("debug"));
        assert!(file_error.is_none());

        // Act
        tracing::subscriber::with_default(subscriber, || info!("subscribed to cams"));

        // Assert
        let content = read(&path);
        assert!(content.contains("subscribed to cams"));
        assert!(!content.contains('\u{1b}'), "file output must not carry ANSI codes");
    }

    #[test]
    fn test_debug_records_need_verbose() {
        let dir = tempfile::tempdir().expect("tempdir");
        let quiet = dir.path().join("quiet.log");
        let loud = dir.path().join("loud.log");

        let (_h1, s1, _) = build(file_settings(&quiet, false), EnvFilter::new("debug"));
        tracing::subscriber::with_default(s1, || debug!("payload bytes"));
        let (_h2, s2, _) = build(file_settings(&loud, true), EnvFilter::new("debug"));
        tracing::subscriber::with_default(s2, || debug!("payload bytes"));

        assert!(!read(&quiet).contains("payload bytes"));
        assert!(read(&loud).contains("payload bytes"));
    }

    #[test]
    fn test_reload_reopens_rotated_file() {
        // Arrange: log once, then move the file away as logrotate would
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.log");
        let rotated = dir.path().join("bridge.log.1");
        let (handle, subscriber, _) = build(file_settings(&path, false), EnvFilter::new("info"));

        tracing::subscriber::with_default(subscriber, || {
            info!("before rotation");
            std::fs::rename(&path, &rotated).expect("rotate");

            // Act
            handle.reload().expect("reload");
            info!("after rotation");
        });

        // Assert
        assert!(read(&rotated).contains("before rotation"));
        assert!(!read(&rotated).contains("after rotation"));
        assert!(read(&path).contains("after rotation"));
    }

    #[test]
    fn test_unopenable_file_falls_back_to_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("bridge.log");

        let (handle, _subscriber, file_error) =
            build(file_settings(&path, false), EnvFilter::new("info"));

        assert!(matches!(file_error, Some(LoggingError::OpenFile { .. })));
        assert_eq!(handle.settings.target, LogTarget::File(path));
    }

    #[test]
    fn test_reload_after_subscriber_dropped_is_error() {
        let (handle, subscriber, _) = build(
            LoggingSettings {
                verbose: false,
                target: LogTarget::Stderr,
            },
            EnvFilter::new("info"),
        );
        drop(subscriber);

        assert!(matches!(handle.reload(), Err(LoggingError::Reload(_))));
    }
}
