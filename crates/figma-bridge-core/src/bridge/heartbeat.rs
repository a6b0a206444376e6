//! Periodic liveness ticks for the connected plugin.

use super::engine::EngineEvent;
use super::transport::ConnectionId;
use std::time::Duration;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Post a `HeartbeatTick` for `connection` every `period`, first one after a
/// full period. Stops when aborted or when the engine is gone.
pub(crate) fn spawn(
    period: Duration,
    connection: ConnectionId,
    mailbox: WeakUnboundedSender<EngineEvent>,
) -> AbortHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(mailbox) = mailbox.upgrade() else {
                break;
            };
            if mailbox.send(EngineEvent::HeartbeatTick { connection }).is_err() {
                break;
            }
        }
    });
    task.abort_handle()
}
