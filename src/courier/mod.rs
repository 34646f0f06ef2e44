//! # Courier
//!
//! Simulated pickup agent. A pickup runs through
//! `Requesting -> Traveling -> Retrieving -> Delivered | Failed`; every
//! transition is logged with a `state` field.
//!
//! The travel leg runs as its own task on the facility's [`TaskTracker`] and
//! reports back over a oneshot, so the requester awaits a single terminal
//! outcome and the facility can wait for journeys still on the road.

pub mod error;

pub use error::*;

use crate::clients::ShelfPoolClient;
use crate::config::SimulationConfig;
use crate::model::{Order, OrderId, ShelfLabel};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierState {
    Requesting,
    Traveling,
    Retrieving,
    Delivered,
    Failed,
}

impl Display for CourierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            CourierState::Requesting => "requesting",
            CourierState::Traveling => "traveling",
            CourierState::Retrieving => "retrieving",
            CourierState::Delivered => "delivered",
            CourierState::Failed => "failed",
        };
        f.write_str(state)
    }
}

/// A completed pickup.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub order: Arc<Order>,
    /// Shelf the order was taken from.
    pub shelf: ShelfLabel,
    pub travel: Duration,
}

#[derive(Clone)]
pub struct Courier {
    pool: Option<ShelfPoolClient>,
    config: Option<Arc<SimulationConfig>>,
    tracker: TaskTracker,
}

impl Courier {
    pub fn new(
        pool: Option<ShelfPoolClient>,
        config: Option<Arc<SimulationConfig>>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            pool,
            config,
            tracker,
        }
    }

    /// Travels to the facility and retrieves `order_id`, waiting for the outcome.
    #[instrument(skip_all, fields(%order_id))]
    pub async fn request_pickup(&self, order_id: OrderId) -> Result<Delivery, CourierError> {
        debug!(state = %CourierState::Requesting, "Pickup requested");
        let Some(config) = &self.config else {
            warn!(state = %CourierState::Failed, "No simulation config");
            return Err(CourierError::NoSimulationConfig);
        };

        let travel = config.courier_travel_time();
        let (respond_to, outcome) = oneshot::channel();
        self.tracker.spawn(
            journey(order_id, travel, self.pool.clone(), respond_to).in_current_span(),
        );

        let result = outcome.await.unwrap_or(Err(CourierError::Abandoned));
        match &result {
            Ok(delivery) => info!(
                state = %CourierState::Delivered,
                shelf = %delivery.shelf,
                travel_ms = delivery.travel.as_millis() as u64,
                "Delivered"
            ),
            Err(e) => warn!(state = %CourierState::Failed, error = %e, "Pickup failed"),
        }
        result
    }

    /// Sends a courier for `order_id` without waiting for it.
    pub fn dispatch(&self, order_id: OrderId) {
        let courier = self.clone();
        self.tracker.spawn(async move {
            // Outcome already logged by request_pickup.
            let _ = courier.request_pickup(order_id).await;
        });
    }
}

async fn journey(
    order_id: OrderId,
    travel: Duration,
    pool: Option<ShelfPoolClient>,
    respond_to: oneshot::Sender<Result<Delivery, CourierError>>,
) {
    debug!(state = %CourierState::Traveling, travel_ms = travel.as_millis() as u64, "On the road");
    tokio::time::sleep(travel).await;
    debug!(state = %CourierState::Retrieving, "Arrived");
    let _ = respond_to.send(retrieve(order_id, travel, pool).await);
}

async fn retrieve(
    order_id: OrderId,
    travel: Duration,
    pool: Option<ShelfPoolClient>,
) -> Result<Delivery, CourierError> {
    let pool = pool.ok_or(CourierError::NoStorageFacility)?;
    let retrieval = pool.retrieve(order_id.clone()).await?;
    if retrieval.order.id() != &order_id {
        return Err(CourierError::OrderMismatch {
            requested: order_id,
            received: retrieval.order.id().clone(),
        });
    }
    Ok(Delivery {
        order: retrieval.order,
        shelf: retrieval.shelf,
        travel,
    })
}
