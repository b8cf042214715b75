//! Background job: keep live connections open through intermediary
//! idle timeouts.
//!
//! One shared ticker for the whole process; each tick sends a heartbeat
//! frame to every registered connection and evicts the ones that no longer
//! accept frames. Heartbeats carry no business payload and no stored row.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::stream::EmitterRegistry;

/// Spawn the keep-alive ticker. Call this once at startup.
pub fn spawn(registry: Arc<EmitterRegistry>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // first tick fires immediately; skip it so an interval passes
        // before the first heartbeat
        ticker.tick().await;
        loop {
            ticker.tick().await;
            registry.send_keep_alive();
        }
    });
}
