//! # Order Decay Process
//!
//! Every resident order runs one decay task that ages it tick by tick until it
//! is picked up or its health reaches zero. The task knows nothing about shelf
//! placement: the pool hands it a [`DecayValueFn`] and the order reads its
//! current decay rate on each tick, so a move to or from the overflow shelf
//! takes effect on the next tick.
//!
//! On expiry the task emits an [`ExpiryNotice`] for the
//! [`DecayReconciler`](crate::reconciler::DecayReconciler) and stops. After a
//! pickup it stops silently.

use crate::model::{DecayStep, Order, OrderId, Temperature};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

/// Capacity of the expiry notification channel.
pub const EXPIRY_CHANNEL_CAPACITY: usize = 10_000;

/// Decay value function: `(shelf_life, order_age, decay_rate) -> value`.
pub type DecayValueFn = fn(f64, f64, f64) -> f64;

/// Decay value used by every shelf: `(shelfLife - orderAge) - decayRate * orderAge`.
pub fn shelf_decay_value(shelf_life: f64, order_age: f64, decay_rate: f64) -> f64 {
    (shelf_life - order_age) - (decay_rate * order_age)
}

/// Emitted once by a decay process whose order's health dropped to zero or below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryNotice {
    pub order_id: OrderId,
    pub temperature: Temperature,
}

/// Ages `order` once per `tick` until it expires or is picked up.
#[instrument(skip_all, fields(order_id = %order.id()))]
pub async fn run_decay(
    order: Arc<Order>,
    tick: Duration,
    decay_value: DecayValueFn,
    expiries: mpsc::Sender<ExpiryNotice>,
) {
    loop {
        tokio::time::sleep(tick).await;
        match order.advance(decay_value) {
            DecayStep::Aging => {}
            DecayStep::PickedUp => {
                debug!(age = order.age(), "Picked up, decay stopped");
                return;
            }
            DecayStep::Expired => {
                info!(age = order.age(), health = order.health(), "Expired");
                let notice = ExpiryNotice {
                    order_id: order.id().clone(),
                    temperature: order.temperature(),
                };
                if expiries.send(notice).await.is_err() {
                    debug!("Reconciler stopped, expiry notice discarded");
                }
                return;
            }
        }
    }
}

/// Starts decay processes on the facility's task tracker.
#[derive(Clone)]
pub struct DecaySpawner {
    tracker: TaskTracker,
    tick: Duration,
    decay_value: DecayValueFn,
    expiries: mpsc::Sender<ExpiryNotice>,
}

impl DecaySpawner {
    pub fn new(
        tracker: TaskTracker,
        tick: Duration,
        decay_value: DecayValueFn,
        expiries: mpsc::Sender<ExpiryNotice>,
    ) -> Self {
        Self {
            tracker,
            tick,
            decay_value,
            expiries,
        }
    }

    pub fn spawn(&self, order: Arc<Order>) {
        self.tracker.spawn(run_decay(
            order,
            self.tick,
            self.decay_value,
            self.expiries.clone(),
        ));
    }
}
