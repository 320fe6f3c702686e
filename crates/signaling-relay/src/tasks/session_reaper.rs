//! Session reaper background task.
//!
//! Periodically asks the relay actor to delete sessions that are empty and
//! older than the staleness threshold. Sweeps go through the actor mailbox,
//! so they are serialized with join and disconnect handling.
//!
//! # Graceful Shutdown
//!
//! The task exits when its cancellation token is triggered. A sweep that is
//! already in flight completes first.

use crate::actors::RelayActorHandle;
use crate::config::Config;
use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default sweep interval in seconds (1 hour).
pub const DEFAULT_REAPER_INTERVAL_SECONDS: u64 = 3600;

/// Default staleness threshold in seconds (24 hours).
pub const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Sweep interval in seconds.
    pub interval_seconds: u64,
    /// Minimum age of an empty session before it is removed.
    pub max_age_seconds: u64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_REAPER_INTERVAL_SECONDS,
            max_age_seconds: DEFAULT_SESSION_MAX_AGE_SECONDS,
        }
    }
}

impl From<&Config> for ReaperConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval_seconds: config.reaper_interval_seconds,
            max_age_seconds: config.session_max_age_seconds,
        }
    }
}

/// Start the session reaper.
///
/// The first sweep runs immediately, then once per interval. Returns when
/// the cancellation token is triggered.
#[instrument(skip_all, name = "relay.task.reaper")]
pub async fn start_session_reaper(
    relay: RelayActorHandle,
    config: ReaperConfig,
    cancel_token: CancellationToken,
) {
    info!(
        target: "relay.task.reaper",
        interval_seconds = config.interval_seconds,
        max_age_seconds = config.max_age_seconds,
        "Starting session reaper task"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_seconds.max(1)));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_sweep(&relay, &config).await;
            }
            () = cancel_token.cancelled() => {
                info!(
                    target: "relay.task.reaper",
                    "Session reaper received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(target: "relay.task.reaper", "Session reaper stopped");
}

/// Run a single sweep. Returns the number of sessions removed.
///
/// Failures are logged and reported as zero; the next tick retries.
pub async fn run_sweep(relay: &RelayActorHandle, config: &ReaperConfig) -> usize {
    let max_age = Duration::from_secs(config.max_age_seconds);

    match relay.reap_stale(Utc::now(), max_age).await {
        Ok(reaped) if reaped.is_empty() => {
            debug!(target: "relay.task.reaper", "No stale sessions");
            0
        }
        Ok(reaped) => {
            info!(
                target: "relay.task.reaper",
                count = reaped.len(),
                "Reaped stale sessions"
            );
            reaped.len()
        }
        Err(e) => {
            warn!(
                target: "relay.task.reaper",
                error = %e,
                "Session sweep failed"
            );
            0
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaperConfig::default();
        assert_eq!(config.interval_seconds, 3600);
        assert_eq!(config.max_age_seconds, 86_400);
    }

    #[tokio::test]
    async fn test_run_sweep_on_empty_relay() {
        let (relay, _task) = RelayActorHandle::spawn(CancellationToken::new());
        assert_eq!(run_sweep(&relay, &ReaperConfig::default()).await, 0);
    }

    #[tokio::test]
    async fn test_run_sweep_survives_dead_actor() {
        let (relay, task) = RelayActorHandle::spawn(CancellationToken::new());
        relay.cancel();
        task.await.unwrap();

        assert_eq!(run_sweep(&relay, &ReaperConfig::default()).await, 0);
    }
}
