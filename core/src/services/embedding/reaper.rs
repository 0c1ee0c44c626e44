//! Periodic task that recovers jobs stranded in `processing` by a dead
//! worker (spec §4.3). Runs the same skip-locked claim pattern as a normal
//! claim, so it never fights a live worker for a row.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::{job_store, Db};

#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    pub interval: Duration,
    pub stall_threshold_seconds: i64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            stall_threshold_seconds: 5 * 60,
        }
    }
}

pub struct Reaper {
    db: Db,
    config: ReaperConfig,
    token: CancellationToken,
}

impl Reaper {
    pub fn new(db: Db, config: ReaperConfig) -> Self {
        Self {
            db,
            config,
            token: CancellationToken::new(),
        }
    }

    /// Spawn the periodic reap loop.
    pub fn spawn(self) -> (JoinHandle<()>, CancellationToken) {
        let token = self.token.clone();
        let handle = tokio::spawn(async move { self.run().await });
        (handle, token)
    }

    async fn run(self) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = self.token.cancelled() => break,
            }

            match job_store::reap_stalled(self.db.pool(), self.config.stall_threshold_seconds).await {
                Ok(0) => {}
                Ok(reaped) => tracing::info!(reaped, "reaped stalled embedding jobs"),
                Err(err) => tracing::error!(error = %err, "reaper failed to scan for stalled jobs"),
            }
        }
    }
}
