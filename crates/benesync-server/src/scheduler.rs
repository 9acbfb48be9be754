//! Periodic delivery trigger

use benesync_delivery::DeliveryWorkflow;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Trigger `workflow` every `period` until `shutdown` resolves
///
/// The first run starts immediately. A run that outlasts the period delays
/// the next tick instead of queueing a burst.
pub async fn run_schedule(
    workflow: DeliveryWorkflow,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(period_secs = period.as_secs_f64(), "delivery scheduler started");
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => workflow.trigger().await,
        }
    }
    tracing::info!("delivery scheduler stopped");
}
