//! Poll scheduler: re-runs the pipeline against the feed on a fixed interval.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::service::NotificationService;

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Poll the feed once immediately, then every `period`, until `shutdown`
/// turns true or its sender is dropped.
///
/// A fetch still in flight when shutdown arrives is abandoned and its result
/// never applied. A failed fetch leaves the previous output in place and is
/// retried on the next tick.
pub async fn poll_scheduler_task(
    service: Arc<NotificationService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("Starting notification poll scheduler (interval: {period:?})");

    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = timer.tick() => {}
            _ = shutdown.changed() => break,
        }

        let raw = tokio::select! {
            result = service.fetch() => result,
            _ = shutdown.changed() => {
                tracing::debug!("Discarding in-flight notification poll");
                break;
            }
        };

        match raw {
            Ok(raw) => {
                let total = service.apply(raw).await;
                tracing::debug!(total, "Notifications refreshed");
            }
            Err(e) => {
                tracing::warn!("Notification poll failed, keeping previous list: {e}");
            }
        }
    }

    tracing::info!("Notification poll scheduler stopped");
}
