//! Requests understood by the [`ShelfPoolActor`](super::ShelfPoolActor).

use super::{Placement, PoolError, Reclamation, Retrieval};
use crate::decay::ExpiryNotice;
use crate::model::{Order, OrderId, PoolSnapshot};
use std::sync::Arc;
use tokio::sync::oneshot;

/// One-shot response channel used by the pool actor.
pub type Response<T> = oneshot::Sender<Result<T, PoolError>>;

/// Every operation the pool performs, one variant per client method.
///
/// The actor applies requests strictly in arrival order, so each variant is an
/// atomic step against the shelves.
#[derive(Debug)]
pub enum PoolRequest {
    Place {
        order: Arc<Order>,
        respond_to: Response<Placement>,
    },
    Retrieve {
        id: OrderId,
        respond_to: Response<Retrieval>,
    },
    ReclaimExpired {
        notice: ExpiryNotice,
        respond_to: Response<Reclamation>,
    },
    Snapshot {
        respond_to: Response<PoolSnapshot>,
    },
}
