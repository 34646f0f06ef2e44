//! # Decay Reconciler
//!
//! Single consumer of the expiry channel. Each [`ExpiryNotice`] becomes a
//! reclaim request against the pool, which removes the order (if it is still
//! resident), counts the loss and backfills the freed home slot.
//!
//! The reconciler drains notices that are already queued before honouring
//! cancellation, so no expiry is silently dropped during shutdown.

use crate::clients::ShelfPoolClient;
use crate::decay::ExpiryNotice;
use crate::shelf_pool::PoolError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct DecayReconciler {
    expiries: mpsc::Receiver<ExpiryNotice>,
    pool: ShelfPoolClient,
    shutdown: CancellationToken,
}

impl DecayReconciler {
    pub fn new(
        expiries: mpsc::Receiver<ExpiryNotice>,
        pool: ShelfPoolClient,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            expiries,
            pool,
            shutdown,
        }
    }

    /// Processes notices until cancelled or until every decay process is gone.
    ///
    /// Returns the number of notices handled.
    pub async fn run(mut self) -> u64 {
        info!("Reconciler started");
        let mut handled = 0;

        loop {
            tokio::select! {
                biased;
                notice = self.expiries.recv() => {
                    let Some(notice) = notice else {
                        debug!("Expiry channel closed");
                        break;
                    };
                    handled += 1;
                    if let Err(e) = self.reconcile(notice).await {
                        warn!(error = %e, "Pool unavailable, reconciler stopping");
                        break;
                    }
                }
                _ = self.shutdown.cancelled() => {
                    debug!("Shutdown requested");
                    break;
                }
            }
        }

        info!(handled, "Reconciler stopped");
        handled
    }

    async fn reconcile(&self, notice: ExpiryNotice) -> Result<(), PoolError> {
        let order_id = notice.order_id.clone();
        let reclamation = self.pool.reclaim_expired(notice).await?;
        debug!(%order_id, ?reclamation, "Reconciled");
        Ok(())
    }
}
