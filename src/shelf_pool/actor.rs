use super::{PoolRequest, Reclamation, ShelfSet};
use crate::decay::DecaySpawner;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Single owner of the shelves.
///
/// Requests are processed sequentially from the mailbox, so placement,
/// retrieval and reclamation never interleave and `ShelfSet` needs no lock.
/// A successful placement also starts the incoming order's decay process.
pub struct ShelfPoolActor {
    receiver: mpsc::Receiver<PoolRequest>,
    shelves: ShelfSet,
    decay: DecaySpawner,
}

impl ShelfPoolActor {
    pub(super) fn new(
        receiver: mpsc::Receiver<PoolRequest>,
        shelves: ShelfSet,
        decay: DecaySpawner,
    ) -> Self {
        Self {
            receiver,
            shelves,
            decay,
        }
    }

    /// Runs the event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!("Shelf pool started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                PoolRequest::Place { order, respond_to } => {
                    let order_id = order.id().clone();
                    debug!(%order_id, temperature = %order.temperature(), "Place");
                    let result = self.shelves.place(order.clone());
                    match &result {
                        Ok(placement) => {
                            self.decay.spawn(order);
                            if let Some(displaced) = &placement.displaced {
                                info!(
                                    order_id = %displaced.order_id,
                                    overflow_index = displaced.overflow_index,
                                    "Displaced to overflow"
                                );
                            }
                            info!(
                                %order_id,
                                shelf = %placement.shelf,
                                index = placement.index,
                                size = self.shelves.resident_count(),
                                "Placed"
                            );
                        }
                        Err(e) => warn!(
                            %order_id,
                            error = %e,
                            rejected = self.shelves.rejected_for_space(),
                            "Place failed"
                        ),
                    }
                    let _ = respond_to.send(result);
                }
                PoolRequest::Retrieve { id, respond_to } => {
                    debug!(order_id = %id, "Retrieve");
                    let result = self.shelves.retrieve(&id);
                    match &result {
                        Ok(retrieval) => info!(
                            order_id = %id,
                            shelf = %retrieval.shelf,
                            promoted = ?retrieval.promoted.as_ref().map(ToString::to_string),
                            size = self.shelves.resident_count(),
                            "Retrieved"
                        ),
                        Err(e) => warn!(order_id = %id, error = %e, "Retrieve failed"),
                    }
                    let _ = respond_to.send(result);
                }
                PoolRequest::ReclaimExpired { notice, respond_to } => {
                    let reclamation = self.shelves.reclaim_expired(&notice);
                    match &reclamation {
                        Reclamation::Stale => {
                            debug!(order_id = %notice.order_id, "Expiry notice for absent order")
                        }
                        _ => info!(
                            order_id = %notice.order_id,
                            ?reclamation,
                            lost = self.shelves.lost_to_expiry(),
                            "Reclaimed"
                        ),
                    }
                    let _ = respond_to.send(Ok(reclamation));
                }
                PoolRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.shelves.snapshot()));
                }
            }
        }

        info!(
            size = self.shelves.resident_count(),
            lost = self.shelves.lost_to_expiry(),
            rejected = self.shelves.rejected_for_space(),
            "Shutdown"
        );
    }
}
