//! A perishable order held by the facility.
//!
//! An `Order` is shared as `Arc<Order>` between the shelf pool (which owns its
//! slot) and its own decay process (which ages it). The immutable identity lives
//! in plain fields; everything that changes over the order's lifetime sits in
//! [`Vitals`] behind a short-lived lock that is never held across an `.await`.

use super::{OrderError, Temperature};
use crate::decay::DecayValueFn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload for submitting a new order, as received from the intake transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub name: String,
    pub decay_rate: f64,
    pub shelf_life: f64,
    #[serde(rename = "temp")]
    pub temperature: String,
}

impl OrderRequest {
    pub fn new(
        name: impl Into<String>,
        decay_rate: f64,
        shelf_life: f64,
        temperature: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            decay_rate,
            shelf_life,
            temperature: temperature.into(),
        }
    }
}

/// Mutable part of an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub current_decay_rate: f64,
    pub age: f64,
    pub health: f64,
    pub picked_up: bool,
}

/// Result of advancing an order by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayStep {
    /// Still healthy; keep ticking.
    Aging,
    /// Picked up before this tick; the decay process stops silently.
    PickedUp,
    /// Health reached zero or below on this tick.
    Expired,
}

/// How an order left the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    PickedUp,
    Expired,
    /// The facility stopped before the order was picked up or reclaimed.
    Abandoned,
}

/// Single-slot completion signal handed to the submitter.
///
/// Resolved exactly once by the shelf pool when the order leaves it.
#[derive(Debug)]
pub struct OrderCompletion {
    receiver: oneshot::Receiver<OrderOutcome>,
}

impl OrderCompletion {
    pub async fn wait(self) -> OrderOutcome {
        self.receiver.await.unwrap_or(OrderOutcome::Abandoned)
    }
}

#[derive(Debug)]
pub struct Order {
    id: OrderId,
    name: String,
    temperature: Temperature,
    shelf_life: f64,
    original_decay_rate: f64,
    vitals: Mutex<Vitals>,
    completion: Mutex<Option<oneshot::Sender<OrderOutcome>>>,
}

impl Order {
    /// Creates a new Order instance together with its completion signal.
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `temperature` - Temperature class, which selects the home shelf
    /// * `shelf_life` - Nominal total lifespan; initial health
    /// * `decay_rate` - Original decay rate, used on the home shelf
    pub fn new(
        name: impl Into<String>,
        temperature: Temperature,
        shelf_life: f64,
        decay_rate: f64,
    ) -> Result<(Self, OrderCompletion), OrderError> {
        if !shelf_life.is_finite() || shelf_life <= 0.0 {
            return Err(OrderError::InvalidShelfLife(shelf_life));
        }
        if !decay_rate.is_finite() || decay_rate < 0.0 {
            return Err(OrderError::InvalidDecayRate(decay_rate));
        }

        let (sender, receiver) = oneshot::channel();
        let order = Self {
            id: OrderId::new(),
            name: name.into(),
            temperature,
            shelf_life,
            original_decay_rate: decay_rate,
            vitals: Mutex::new(Vitals {
                current_decay_rate: decay_rate,
                age: 0.0,
                health: shelf_life,
                picked_up: false,
            }),
            completion: Mutex::new(Some(sender)),
        };
        Ok((order, OrderCompletion { receiver }))
    }

    /// Validates an intake payload and builds the order from it.
    pub fn from_request(request: OrderRequest) -> Result<(Self, OrderCompletion), OrderError> {
        let temperature = request.temperature.parse::<Temperature>()?;
        Self::new(request.name, temperature, request.shelf_life, request.decay_rate)
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temperature(&self) -> Temperature {
        self.temperature
    }

    pub fn shelf_life(&self) -> f64 {
        self.shelf_life
    }

    pub fn original_decay_rate(&self) -> f64 {
        self.original_decay_rate
    }

    /// Copy of the current vitals, taken under the lock.
    pub fn vitals(&self) -> Vitals {
        *self.vitals.lock()
    }

    pub fn current_decay_rate(&self) -> f64 {
        self.vitals.lock().current_decay_rate
    }

    pub fn age(&self) -> f64 {
        self.vitals.lock().age
    }

    pub fn health(&self) -> f64 {
        self.vitals.lock().health
    }

    pub fn is_picked_up(&self) -> bool {
        self.vitals.lock().picked_up
    }

    pub fn is_expired(&self) -> bool {
        self.vitals.lock().health <= 0.0
    }

    /// Health relative to shelf life: 1.0 when fresh, at or below 0.0 once expired.
    pub fn normalized_health(&self) -> f64 {
        self.health() / self.shelf_life
    }

    pub(crate) fn set_decay_rate(&self, rate: f64) {
        self.vitals.lock().current_decay_rate = rate;
    }

    /// Ages the order by one tick.
    ///
    /// The health loss for the tick is the drop in `decay_value` between the
    /// previous and the new age, evaluated at the rate active right now. Health
    /// therefore accumulates the effect of every rate the order has run at.
    pub fn advance(&self, decay_value: DecayValueFn) -> DecayStep {
        let mut vitals = self.vitals.lock();
        if vitals.picked_up {
            return DecayStep::PickedUp;
        }

        let previous_age = vitals.age;
        vitals.age += 1.0;
        let loss = decay_value(self.shelf_life, previous_age, vitals.current_decay_rate)
            - decay_value(self.shelf_life, vitals.age, vitals.current_decay_rate);
        vitals.health -= loss;

        if vitals.health <= 0.0 {
            DecayStep::Expired
        } else {
            DecayStep::Aging
        }
    }

    /// Marks the order picked up unless it already was or has expired.
    pub(crate) fn try_mark_picked_up(&self) -> bool {
        let mut vitals = self.vitals.lock();
        if vitals.picked_up || vitals.health <= 0.0 {
            return false;
        }
        vitals.picked_up = true;
        true
    }

    /// Resolves the completion signal. Later calls are no-ops.
    pub(crate) fn resolve(&self, outcome: OrderOutcome) {
        if let Some(sender) = self.completion.lock().take() {
            // The submitter may have dropped its receipt.
            let _ = sender.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::shelf_decay_value;

    #[test]
    fn test_from_request_validates_payload() {
        let bad_temp = OrderRequest::new("Pad See Ew", 0.5, 100.0, "lukewarm");
        assert_eq!(
            Order::from_request(bad_temp).unwrap_err(),
            OrderError::UnknownTemperature("lukewarm".to_string())
        );

        let bad_life = OrderRequest::new("Pad See Ew", 0.5, 0.0, "hot");
        assert_eq!(
            Order::from_request(bad_life).unwrap_err(),
            OrderError::InvalidShelfLife(0.0)
        );

        let bad_rate = OrderRequest::new("Pad See Ew", -1.0, 10.0, "hot");
        assert_eq!(
            Order::from_request(bad_rate).unwrap_err(),
            OrderError::InvalidDecayRate(-1.0)
        );

        let (order, _completion) =
            Order::from_request(OrderRequest::new("Pad See Ew", 0.5, 100.0, "HOT")).unwrap();
        assert_eq!(order.temperature(), Temperature::Hot);
        assert_eq!(order.health(), 100.0);
        assert_eq!(order.current_decay_rate(), 0.5);
        assert_eq!(order.normalized_health(), 1.0);
    }

    #[test]
    fn test_advance_matches_closed_form_at_constant_rate() {
        let (order, _completion) = Order::new("Kale Salad", Temperature::Cold, 100.0, 0.5).unwrap();
        for _ in 0..10 {
            assert_eq!(order.advance(shelf_decay_value), DecayStep::Aging);
        }
        // (100 - 10) - 0.5 * 10
        assert!((order.health() - 85.0).abs() < 1e-9);
        assert_eq!(order.age(), 10.0);
    }

    #[test]
    fn test_advance_accumulates_rate_changes() {
        let (order, _completion) = Order::new("Kale Salad", Temperature::Cold, 100.0, 1.0).unwrap();
        for _ in 0..5 {
            order.advance(shelf_decay_value);
        }
        // 5 ticks at rate 1: 100 - 5 * 2 = 90
        order.set_decay_rate(2.0);
        for _ in 0..5 {
            order.advance(shelf_decay_value);
        }
        // 5 ticks at rate 2: 90 - 5 * 3 = 75
        assert!((order.health() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_advance_reports_expiry_and_pickup() {
        let (order, _completion) = Order::new("Ice Cream", Temperature::Frozen, 1.0, 10.0).unwrap();
        assert_eq!(order.advance(shelf_decay_value), DecayStep::Expired);
        assert!(order.is_expired());
        assert!(!order.try_mark_picked_up(), "expired orders cannot be picked up");

        let (order, _completion) = Order::new("Ice Cream", Temperature::Frozen, 50.0, 1.0).unwrap();
        assert!(order.try_mark_picked_up());
        assert!(!order.try_mark_picked_up(), "second pickup must fail");
        assert_eq!(order.advance(shelf_decay_value), DecayStep::PickedUp);
        assert_eq!(order.age(), 0.0);
    }

    #[tokio::test]
    async fn test_completion_resolves_once() {
        let (order, completion) = Order::new("Burger", Temperature::Hot, 10.0, 1.0).unwrap();
        order.resolve(OrderOutcome::PickedUp);
        order.resolve(OrderOutcome::Expired);
        assert_eq!(completion.wait().await, OrderOutcome::PickedUp);

        let (order, completion) = Order::new("Burger", Temperature::Hot, 10.0, 1.0).unwrap();
        drop(order);
        assert_eq!(completion.wait().await, OrderOutcome::Abandoned);
    }
}
