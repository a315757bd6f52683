//! surveillance-notify: MQTT-to-Pushover notification bridge, entry point.
//!
//! Subscribes to a topic tree on an MQTT broker and forwards every
//! `{"notification": "..."}` payload published there as a Pushover push
//! notification.
//!
//! # Usage
//!
//! ```text
//! surveillance-notify [OPTIONS]
//!
//! Options:
//!   -h, --host <HOST>            MQTT broker host [default: localhost]
//!   -p, --port <PORT>            MQTT broker port [default: 1883]
//!   -t, --topic <TOPIC>          Topic filter [default: /surveillance/notification/#]
//!   -v, --verbose                Log debug records, including payloads
//!   -l, --log <TARGET>           "stderr" or a log file path [default: stderr]
//!   -c, --credentials <FILE>     TOML file holding app_token and user_token
//!       --app-token <TOKEN>      Pushover application token
//!       --user-token <KEY>       Pushover user key
//!       --keep-alive <SECS>      MQTT keep-alive [default: 30]
//!       --subscribe-attempts <N> Subscribe failures tolerated [default: 5]
//!       --help                   Print help
//! ```
//!
//! `-h` selects the broker host, so help is only available as `--help`.
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable              | Flag              |
//! |-----------------------|-------------------|
//! | `NOTIFY_MQTT_HOST`    | `--host`          |
//! | `NOTIFY_MQTT_PORT`    | `--port`          |
//! | `NOTIFY_MQTT_TOPIC`   | `--topic`         |
//! | `NOTIFY_LOG`          | `--log`           |
//! | `NOTIFY_CREDENTIALS`  | `--credentials`   |
//! | `PUSHOVER_APP_TOKEN`  | `--app-token`     |
//! | `PUSHOVER_USER_TOKEN` | `--user-token`    |
//! | `RUST_LOG`            | log filter directives |
//!
//! # Exit status
//!
//! 0 after Ctrl+C or SIGTERM.  Non-zero on a configuration error, when the
//! broker cannot be reached at startup, or when the subscription keeps being
//! refused.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use notify_bridge::domain::config::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SUBSCRIBE_ATTEMPTS, DEFAULT_TOPIC,
};
use notify_bridge::domain::{BridgeConfig, LogTarget};
use notify_bridge::infrastructure::credentials;
use notify_bridge::infrastructure::logging::LogReloader;
use notify_bridge::infrastructure::{init_logging, run, LoggingSettings};
use notify_core::validate_topic_filter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Forward surveillance notifications from MQTT to Pushover.
#[derive(Debug, Parser)]
#[command(
    name = "surveillance-notify",
    about = "Forward surveillance MQTT notifications to Pushover",
    version,
    disable_help_flag = true
)]
struct Cli {
    /// Host name or IP address of the MQTT broker.
    #[arg(short = 'h', long, default_value = DEFAULT_HOST, env = "NOTIFY_MQTT_HOST")]
    host: String,

    /// TCP port of the MQTT broker.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "NOTIFY_MQTT_PORT")]
    port: u16,

    /// Topic filter to subscribe to.  `+` and `#` wildcards are allowed.
    #[arg(short, long, default_value = DEFAULT_TOPIC, env = "NOTIFY_MQTT_TOPIC")]
    topic: String,

    /// Write debug records to the log, including message payloads.
    #[arg(short, long)]
    verbose: bool,

    /// Log destination: `stderr`, or a file path.
    ///
    /// A file receives a copy of everything written to stderr.  Send SIGHUP
    /// after rotating it to make the bridge reopen it.
    #[arg(short, long, default_value = "stderr", env = "NOTIFY_LOG")]
    log: String,

    /// TOML file with `app_token` and `user_token`.
    #[arg(short, long, env = "NOTIFY_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Pushover application token.  Overrides the credentials file.
    #[arg(long, env = "PUSHOVER_APP_TOKEN", hide_env_values = true)]
    app_token: Option<String>,

    /// Pushover user key.  Overrides the credentials file.
    #[arg(long, env = "PUSHOVER_USER_TOKEN", hide_env_values = true)]
    user_token: Option<String>,

    /// MQTT keep-alive interval in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(5..))]
    keep_alive: u64,

    /// Consecutive subscribe failures tolerated before exiting.
    #[arg(long, default_value_t = DEFAULT_SUBSCRIBE_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    subscribe_attempts: u32,

    /// Print help.
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--topic` is not a valid MQTT topic filter or
    /// `--log` is empty.
    fn to_bridge_config(&self) -> anyhow::Result<BridgeConfig> {
        validate_topic_filter(&self.topic)
            .with_context(|| format!("invalid topic filter: '{}'", self.topic))?;

        let log_target: LogTarget = self
            .log
            .parse()
            .with_context(|| format!("invalid log target: '{}'", self.log))?;

        Ok(BridgeConfig {
            bus_host: self.host.clone(),
            bus_port: self.port,
            topic: self.topic.clone(),
            verbose: self.verbose,
            log_target,
            keep_alive: Duration::from_secs(self.keep_alive),
            subscribe_attempts: self.subscribe_attempts,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parse the CLI and build the [`BridgeConfig`].
/// 2. Install logging (stderr, plus the log file if one was given).
/// 3. Resolve the Pushover credentials.
/// 4. Hand over to [`run`], which returns on a termination signal or a fatal
///    session error.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.to_bridge_config()?;

    let logging: Arc<dyn LogReloader> = Arc::new(
        init_logging(LoggingSettings::from_config(&config)).context("failed to set up logging")?,
    );
    debug!(?config, "configuration loaded");

    let credentials = credentials::resolve(
        cli.credentials.as_deref(),
        cli.app_token.clone(),
        cli.user_token.clone(),
    )
    .context("failed to load Pushover credentials")?;

    run(config, credentials, logging).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
