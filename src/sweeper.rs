//! Background reactivation of expired temporary deactivations.
//!
//! One tokio task ticks on a fixed interval and runs
//! [`lifecycle::sweep`]. Ticks are awaited serially, so at most one sweep is
//! in flight; a failed sweep is logged and the next tick retries.

use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::users::lifecycle;

pub struct Sweeper {
    db: PgPool,
    interval: Duration,
}

impl Sweeper {
    pub fn new(db: PgPool, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Starts the sweep loop as a background tokio task.
    ///
    /// Returns a handle the process aborts at shutdown.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        info!(interval_secs = self.interval.as_secs(), "sweeper started");
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match lifecycle::sweep(&self.db, OffsetDateTime::now_utc()).await {
                    Ok(0) => debug!("sweep found nothing to reactivate"),
                    Ok(n) => info!(reactivated = n, "sweep reactivated users"),
                    Err(e) => error!(error = %e, "sweep failed"),
                }
            }
        })
    }
}
