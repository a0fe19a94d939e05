//! Background storage health monitor.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::db::QuoteRepository;

/// Ping `repository` every `interval` until `shutdown` fires.
///
/// A failed ping cancels `shutdown` so the rest of the process can wind
/// down, and the error is returned. A clean stop returns `Ok(())`.
pub async fn monitor_storage(
    repository: Arc<dyn QuoteRepository>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), crate::db::RepositoryError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; storage was just checked at startup.
    ticker.tick().await;

    info!("Storage health monitor started: interval={:?}", interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Storage health monitor stopped");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let ping_token = shutdown.child_token();
        match repository.ping(&ping_token).await {
            Ok(()) => debug!("Storage ping succeeded"),
            Err(err) if err.is_cancelled() => {
                info!("Storage health monitor stopped");
                return Ok(());
            }
            Err(err) => {
                error!("Storage ping failed, shutting down: {}", err);
                shutdown.cancel();
                return Err(err);
            }
        }
    }
}
