//! Expiry Sweeper Task
//!
//! Background task that periodically purges expired cache entries.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::SharedStore;

/// Something the sweeper can purge of expired entries.
pub trait Sweep: Send + Sync + 'static {
    /// Removes expired entries, returning how many were removed.
    fn sweep(&self) -> impl Future<Output = usize> + Send;
}

impl<V> Sweep for SharedStore<V>
where
    V: Send + Sync + 'static,
{
    async fn sweep(&self) -> usize {
        self.write().await.sweep_expired()
    }
}

/// Handle to a running expiry sweep.
///
/// The sweep is not started by the store itself; whoever builds the store
/// decides when to start it and stops it on shutdown. Dropping the handle
/// also ends the task at its next wake-up.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawns a task that sweeps `target` every `interval`.
    ///
    /// Sweeps run one after another in a single task, so two sweeps are never
    /// in flight at once. A store sweep holds the store's write lock for its
    /// whole find-and-delete pass.
    ///
    /// # Example
    /// ```ignore
    /// let store = CacheStore::<String>::new(30).into_shared();
    /// let sweeper = ExpirySweeper::start(store.clone(), Duration::from_secs(30));
    /// // Later, during shutdown:
    /// sweeper.stop().await;
    /// ```
    pub fn start<S: Sweep>(target: S, interval: Duration) -> Self {
        let period = interval.max(Duration::from_millis(1));
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(
                "Starting expiry sweeper with interval of {} ms",
                period.as_millis()
            );

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let removed = target.sweep().await;

                if removed > 0 {
                    info!("Expiry sweep: removed {} expired entries", removed);
                } else {
                    debug!("Expiry sweep: no expired entries found");
                }
            }

            info!("Expiry sweeper stopped");
        });

        Self { shutdown, handle }
    }

    /// Returns true until the sweep task has exited.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the task to stop and waits for it to exit.
    ///
    /// A sweep already in progress completes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            warn!("Expiry sweeper ended abnormally: {}", err);
        }
    }
}
