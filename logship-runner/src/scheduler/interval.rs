//! Interval scheduler
//!
//! Runs one invocation per tick until shutdown is requested. Invocations
//! never overlap: a tick that fires while a run is in progress is delayed
//! until the run finishes, and shutdown is only observed between runs.

use std::future::Future;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info};

/// Fixed-interval driver for sync runs
pub struct RunScheduler {
    interval: Duration,
}

impl RunScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Runs `job` on every tick until `shutdown` resolves
    ///
    /// The first run starts immediately. Failures are the job's concern; the
    /// scheduler keeps ticking.
    ///
    /// # Returns
    /// The number of runs performed
    pub async fn run<J, Fut, S>(&self, mut job: J, shutdown: S) -> usize
    where
        J: FnMut() -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        info!("Starting run scheduler (interval: {:?})", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut runs = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} run(s)", runs);
                    break;
                }
                _ = ticker.tick() => {
                    debug!("Starting scheduled run");
                    job().await;
                    runs += 1;
                }
            }
        }

        runs
    }
}
