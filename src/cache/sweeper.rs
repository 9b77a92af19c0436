use std::sync::Weak;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::ArtifactCache;

/// Runs `sweep_expired` every `every` until cancelled or until the cache is
/// dropped.
pub(crate) fn spawn(
    cache: Weak<ArtifactCache>,
    every: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::debug!(interval_secs = every.as_secs(), "Starting artifact cache sweeper");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => {
                    tracing::debug!("Artifact cache sweeper shutting down");
                    return;
                }
            }

            let Some(cache) = cache.upgrade() else {
                return;
            };
            let removed = cache.sweep_expired();
            if removed > 0 {
                tracing::info!(removed, remaining = cache.count(), "Swept expired artifacts");
            }
        }
    });
}
