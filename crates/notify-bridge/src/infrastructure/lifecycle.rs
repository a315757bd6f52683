//! Process lifecycle: wiring, signals and shutdown.
//!
//! [`run`] builds the production components, starts the log-reload listener
//! and runs the bridge session until either
//!
//! - the session ends with an error (initial connect failure, subscription
//!   retries exhausted), which is returned so the process exits non-zero, or
//! - Ctrl+C / SIGTERM arrives, which ends the process cleanly.
//!
//! # Signals
//!
//! | Signal          | Effect                                          |
//! |-----------------|-------------------------------------------------|
//! | SIGHUP          | Re-initialise logging (reopen the log file)     |
//! | SIGINT, SIGTERM | Orderly shutdown, exit status 0                 |
//!
//! SIGHUP handling is only wired on Unix; elsewhere there is no log reload.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use notify_core::ClientIdentity;

use crate::application::dispatch::Dispatcher;
use crate::application::session::{BridgeSession, BusConnection};
use crate::domain::{BridgeConfig, Credentials};
use crate::infrastructure::logging::LogReloader;
use crate::infrastructure::mqtt::MqttBus;
use crate::infrastructure::pushover::{PushoverClient, PushoverConfig};

// ── Reload listener ───────────────────────────────────────────────────────────

/// A source of "reload the logs now" requests.
#[async_trait]
pub trait ReloadTrigger: Send {
    /// Waits for the next request.  Returns `false` once no more requests can
    /// arrive.
    async fn triggered(&mut self) -> bool;
}

#[cfg(unix)]
#[async_trait]
impl ReloadTrigger for signal::unix::Signal {
    async fn triggered(&mut self) -> bool {
        self.recv().await.is_some()
    }
}

/// A channel works as a trigger too: each `()` sent requests one reload.
#[async_trait]
impl ReloadTrigger for mpsc::Receiver<()> {
    async fn triggered(&mut self) -> bool {
        self.recv().await.is_some()
    }
}

/// Reloads logging once per trigger until the trigger ends.
///
/// A failed reload is logged and the listener keeps going.  Returns the
/// number of successful reloads.
pub async fn reload_on_signal(reloader: Arc<dyn LogReloader>, mut trigger: impl ReloadTrigger) -> u64 {
    let mut reloads = 0;
    while trigger.triggered().await {
        info!("reload requested; re-initialising logging");
        match reloader.reload() {
            Ok(()) => reloads += 1,
            Err(e) => error!(error = %e, "log reload failed"),
        }
    }
    reloads
}

/// Spawns the SIGHUP listener.  Returns `None` when SIGHUP is unavailable.
pub fn spawn_reload_listener(reloader: Arc<dyn LogReloader>) -> Option<JoinHandle<u64>> {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(hangup) => Some(tokio::spawn(reload_on_signal(reloader, hangup))),
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGHUP; log reload disabled");
                None
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = reloader;
        None
    }
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

/// Completes on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed, that signal is simply never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Runs `session` until it ends or `shutdown` completes.
///
/// # Errors
///
/// Returns the session's error, with context, if the session fails first.
pub async fn run_until<B, F>(session: &mut BridgeSession<B>, shutdown: F) -> anyhow::Result<()>
where
    B: BusConnection,
    F: Future<Output = ()>,
{
    tokio::select! {
        result = session.run() => result.context("bridge session failed"),
        () = shutdown => {
            info!("shutting down");
            Ok(())
        }
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Builds the bridge from `config` and `credentials` and runs it until a
/// termination signal or a fatal session error.
///
/// # Errors
///
/// - The HTTP client for the push service cannot be built.
/// - The session fails (see [`crate::application::SessionError`]).
pub async fn run(
    config: BridgeConfig,
    credentials: Credentials,
    logging: Arc<dyn LogReloader>,
) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let identity = ClientIdentity::detect();
    info!(
        client_id = %identity,
        url = %config.broker_url(),
        topic = %config.topic,
        "surveillance-notify starting"
    );

    let pushover =
        PushoverClient::new(PushoverConfig::default()).context("failed to build the Pushover client")?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pushover), Arc::new(credentials)));

    let bus = MqttBus::new(&config, &identity);
    let mut session = BridgeSession::new(bus, Arc::clone(&config), identity, dispatcher);

    let reload_task = spawn_reload_listener(logging);
    let outcome = run_until(&mut session, shutdown_signal()).await;
    if let Some(task) = reload_task {
        task.abort();
    }

    if let Err(e) = &outcome {
        error!("{e:#}");
    }
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────
