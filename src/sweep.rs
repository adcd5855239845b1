//! Background expiry sweep driver.
//!
//! The engine itself never schedules anything; expiry only happens when
//! someone calls [`LeasePool::sweep`]. This module provides the external
//! scheduler: a spawned task that sweeps on a fixed cadence. Overlapping
//! ticks serialize on the pool's write lock, and stopping the driver is
//! just aborting the task — the pool holds no handles of its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::lease::LeasePool;

/// Spawns the periodic sweep task.
///
/// Every `interval`, the task reclaims all leases whose deadline has
/// passed. Reclaimed entries are audited by the pool itself; the driver
/// only reports the count. Abort the returned handle to stop sweeping.
pub fn spawn_sweeper(pool: Arc<LeasePool>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reclaimed = pool.sweep(Utc::now()).await;
            if !reclaimed.is_empty() {
                debug!("Sweep reclaimed {} lease(s)", reclaimed.len());
            }
        }
    })
}
