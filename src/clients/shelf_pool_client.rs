use crate::decay::ExpiryNotice;
use crate::model::{Order, OrderId, PoolSnapshot};
use crate::shelf_pool::{Placement, PoolError, PoolRequest, Reclamation, Retrieval};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Client for interacting with the [`ShelfPoolActor`](crate::shelf_pool::ShelfPoolActor).
///
/// Cheap to clone. The actor stops once every clone has been dropped.
#[derive(Clone)]
pub struct ShelfPoolClient {
    sender: mpsc::Sender<PoolRequest>,
}

impl ShelfPoolClient {
    pub fn new(sender: mpsc::Sender<PoolRequest>) -> Self {
        Self { sender }
    }

    /// Places a new order and starts its decay process.
    #[instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn place(&self, order: Arc<Order>) -> Result<Placement, PoolError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PoolRequest::Place { order, respond_to })
            .await
            .map_err(|_| PoolError::ActorClosed)?;
        response.await.map_err(|_| PoolError::ActorDropped)?
    }

    /// Removes an order for pickup.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, id: OrderId) -> Result<Retrieval, PoolError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PoolRequest::Retrieve { id, respond_to })
            .await
            .map_err(|_| PoolError::ActorClosed)?;
        response.await.map_err(|_| PoolError::ActorDropped)?
    }

    #[instrument(skip(self, notice), fields(order_id = %notice.order_id))]
    pub async fn reclaim_expired(&self, notice: ExpiryNotice) -> Result<Reclamation, PoolError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PoolRequest::ReclaimExpired { notice, respond_to })
            .await
            .map_err(|_| PoolError::ActorClosed)?;
        response.await.map_err(|_| PoolError::ActorDropped)?
    }

    pub async fn snapshot(&self) -> Result<PoolSnapshot, PoolError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PoolRequest::Snapshot { respond_to })
            .await
            .map_err(|_| PoolError::ActorClosed)?;
        response.await.map_err(|_| PoolError::ActorDropped)?
    }
}
