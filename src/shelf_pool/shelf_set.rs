//! # Shelf Set
//!
//! The pool's slot arrays and the placement, eviction and promotion policy that
//! mutates them. `ShelfSet` is plain synchronous state: it is owned by exactly
//! one [`ShelfPoolActor`](super::ShelfPoolActor), which applies one request at a
//! time, so every method here runs as a single uninterrupted unit.
//!
//! ## Placement
//!
//! 1. Free slot on the home shelf: take it at the original decay rate.
//! 2. Home shelf full and no free overflow slot: reject with [`PoolError::NoSpace`].
//! 3. Home shelf full, overflow slot free: if the healthiest resident of the home
//!    shelf is strictly healthier than the incoming order, it moves to overflow
//!    (doubled rate) and the incoming order takes its slot. Otherwise (including
//!    equal health) the incoming order goes to overflow.
//!
//! ## Promotion
//!
//! Whenever a home slot is freed (pickup or expiry), the least healthy
//! non-expired overflow order of that temperature moves into it and its decay
//! rate returns to the original rate.

use super::PoolError;
use crate::config::ShelfCapacities;
use crate::decay::ExpiryNotice;
use crate::model::{
    FacilityComponent, Order, OrderId, OrderOutcome, OrderView, PoolSnapshot, ShelfLabel,
    Temperature,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One shelf: a label and a fixed number of optional slots.
#[derive(Debug)]
pub struct Shelf {
    label: ShelfLabel,
    slots: Vec<Option<Arc<Order>>>,
}

impl Shelf {
    fn new(label: ShelfLabel, capacity: usize) -> Self {
        Self {
            label,
            slots: vec![None; capacity],
        }
    }

    pub fn label(&self) -> ShelfLabel {
        self.label
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Order>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    fn find(&self, id: &OrderId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|order| order.id() == id))
    }

    fn residents(&self) -> impl Iterator<Item = (usize, &Arc<Order>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|order| (index, order)))
    }

    /// Resident with the most remaining health.
    fn healthiest(&self) -> Option<(usize, Arc<Order>, f64)> {
        self.residents()
            .map(|(index, order)| (index, order.clone(), order.health()))
            .max_by(|a, b| a.2.total_cmp(&b.2))
    }
}

/// Where a newly placed order ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub shelf: ShelfLabel,
    pub index: usize,
    /// Resident moved from the home shelf to overflow to make room.
    pub displaced: Option<Displacement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Displacement {
    pub order_id: OrderId,
    pub overflow_index: usize,
}

/// A successful pickup.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub order: Arc<Order>,
    pub shelf: ShelfLabel,
    pub index: usize,
    /// Overflow order promoted into the freed slot.
    pub promoted: Option<OrderId>,
}

/// What reconciling one expiry notice did to the pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Reclamation {
    /// Removed from its home shelf, possibly backfilled from overflow.
    Home {
        shelf: ShelfLabel,
        index: usize,
        promoted: Option<OrderId>,
    },
    /// Removed from the overflow shelf.
    Overflow { index: usize },
    /// The order was no longer resident (a pickup won the race).
    Stale,
}

#[derive(Debug)]
pub struct ShelfSet {
    shelves: BTreeMap<ShelfLabel, Shelf>,
    lost_to_expiry: u64,
    rejected_for_space: u64,
    observer: Option<mpsc::Sender<FacilityComponent>>,
}

impl ShelfSet {
    pub fn new(capacities: ShelfCapacities) -> Self {
        let shelves = ShelfLabel::ALL
            .into_iter()
            .map(|label| (label, Shelf::new(label, capacities.for_shelf(label))))
            .collect();
        Self {
            shelves,
            lost_to_expiry: 0,
            rejected_for_space: 0,
            observer: None,
        }
    }

    /// Publishes a change signal on `observer` after every slot write or clear.
    pub fn with_observer(mut self, observer: mpsc::Sender<FacilityComponent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn shelf(&self, label: ShelfLabel) -> &Shelf {
        &self.shelves[&label]
    }

    pub fn lost_to_expiry(&self) -> u64 {
        self.lost_to_expiry
    }

    pub fn rejected_for_space(&self) -> u64 {
        self.rejected_for_space
    }

    pub fn resident_count(&self) -> usize {
        self.shelves.values().map(Shelf::occupied).sum()
    }

    /// Shelf and slot index currently holding `id`.
    pub fn locate(&self, id: &OrderId) -> Option<(ShelfLabel, usize)> {
        self.shelves
            .values()
            .find_map(|shelf| shelf.find(id).map(|index| (shelf.label, index)))
    }

    /// Admits a new order. See the module docs for the policy.
    pub fn place(&mut self, order: Arc<Order>) -> Result<Placement, PoolError> {
        let home = order.temperature().home_shelf();

        if let Some(index) = self.shelf(home).first_empty() {
            self.put(home, index, order);
            return Ok(Placement {
                shelf: home,
                index,
                displaced: None,
            });
        }

        let candidate = self.shelf(home).healthiest();
        let Some(overflow_index) = self.shelf(ShelfLabel::Overflow).first_empty() else {
            self.rejected_for_space += 1;
            return Err(PoolError::NoSpace);
        };

        match candidate {
            Some((index, resident, health)) if health > order.health() => {
                self.clear(home, index);
                self.put(ShelfLabel::Overflow, overflow_index, resident.clone());
                self.put(home, index, order);
                Ok(Placement {
                    shelf: home,
                    index,
                    displaced: Some(Displacement {
                        order_id: resident.id().clone(),
                        overflow_index,
                    }),
                })
            }
            _ => {
                self.put(ShelfLabel::Overflow, overflow_index, order);
                Ok(Placement {
                    shelf: ShelfLabel::Overflow,
                    index: overflow_index,
                    displaced: None,
                })
            }
        }
    }

    /// Removes a still-healthy order for pickup and backfills its home slot.
    pub fn retrieve(&mut self, id: &OrderId) -> Result<Retrieval, PoolError> {
        let (shelf, index) = self
            .locate(id)
            .ok_or_else(|| PoolError::OrderNotFound(id.clone()))?;
        let order = self
            .clear_if(shelf, index, |order| order.try_mark_picked_up())
            .ok_or_else(|| PoolError::OrderExpired(id.clone()))?;

        let promoted = if shelf.is_overflow() {
            None
        } else {
            self.promote_into(shelf, index, order.temperature())
        };
        order.resolve(OrderOutcome::PickedUp);

        Ok(Retrieval {
            order,
            shelf,
            index,
            promoted,
        })
    }

    /// Removes an expired order named by `notice`, if it is still resident.
    pub fn reclaim_expired(&mut self, notice: &ExpiryNotice) -> Reclamation {
        let home = notice.temperature.home_shelf();

        if let Some(index) = self.shelf(home).find(&notice.order_id) {
            self.expire(home, index);
            let promoted = self.promote_into(home, index, notice.temperature);
            return Reclamation::Home {
                shelf: home,
                index,
                promoted,
            };
        }

        if let Some(index) = self.shelf(ShelfLabel::Overflow).find(&notice.order_id) {
            self.expire(ShelfLabel::Overflow, index);
            return Reclamation::Overflow { index };
        }

        Reclamation::Stale
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let shelves = self
            .shelves
            .values()
            .map(|shelf| {
                let views = shelf
                    .residents()
                    .map(|(_, order)| OrderView::from(order.as_ref()))
                    .collect();
                (shelf.label, views)
            })
            .collect();
        PoolSnapshot {
            shelves,
            lost_to_expiry: self.lost_to_expiry,
            rejected_for_space: self.rejected_for_space,
        }
    }

    /// Moves the least healthy live overflow order of `temperature` into `home[index]`.
    fn promote_into(
        &mut self,
        home: ShelfLabel,
        index: usize,
        temperature: Temperature,
    ) -> Option<OrderId> {
        let (overflow_index, order) = self
            .shelf(ShelfLabel::Overflow)
            .residents()
            .filter(|(_, order)| order.temperature() == temperature)
            .map(|(i, order)| (i, order.clone(), order.health()))
            .filter(|(_, _, health)| *health > 0.0)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, order, _)| (i, order))?;

        self.clear(ShelfLabel::Overflow, overflow_index);
        let id = order.id().clone();
        self.put(home, index, order);
        Some(id)
    }

    fn expire(&mut self, label: ShelfLabel, index: usize) {
        if let Some(order) = self.clear(label, index) {
            self.lost_to_expiry += 1;
            order.resolve(OrderOutcome::Expired);
        }
    }

    fn put(&mut self, label: ShelfLabel, index: usize, order: Arc<Order>) {
        order.set_decay_rate(label.decay_rate_for(order.original_decay_rate()));
        if let Some(shelf) = self.shelves.get_mut(&label) {
            shelf.slots[index] = Some(order);
        }
        self.notify();
    }

    fn clear(&mut self, label: ShelfLabel, index: usize) -> Option<Arc<Order>> {
        self.clear_if(label, index, |_| true)
    }

    fn clear_if(
        &mut self,
        label: ShelfLabel,
        index: usize,
        accept: impl FnOnce(&Order) -> bool,
    ) -> Option<Arc<Order>> {
        let slot = self.shelves.get_mut(&label)?.slots.get_mut(index)?;
        if !accept(slot.as_deref()?) {
            return None;
        }
        let order = slot.take();
        self.notify();
        order
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            // A full mailbox already holds a pending signal for observers.
            let _ = observer.try_send(FacilityComponent::ShelfPool);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::shelf_decay_value;
    use std::collections::HashSet;

    fn order(temperature: Temperature, shelf_life: f64, decay_rate: f64) -> Arc<Order> {
        let (order, _completion) =
            Order::new("Test Order", temperature, shelf_life, decay_rate).unwrap();
        Arc::new(order)
    }

    fn aged(temperature: Temperature, ticks: u32) -> Arc<Order> {
        let order = order(temperature, 100.0, 1.0);
        for _ in 0..ticks {
            order.advance(shelf_decay_value);
        }
        order
    }

    fn assert_unique_residents(set: &ShelfSet) {
        let snapshot = set.snapshot();
        let mut seen = HashSet::new();
        for view in snapshot.shelves.values().flatten() {
            assert!(seen.insert(view.id.clone()), "order {} resident twice", view.id);
        }
    }

    #[test]
    fn test_place_on_home_shelf_at_original_rate() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        let cold = order(Temperature::Cold, 50.0, 0.25);

        let placement = set.place(cold.clone()).unwrap();
        assert_eq!(placement.shelf, ShelfLabel::Cold);
        assert_eq!(placement.index, 0);
        assert_eq!(cold.current_decay_rate(), 0.25);
        assert_eq!(set.locate(cold.id()), Some((ShelfLabel::Cold, 0)));
    }

    #[test]
    fn test_forty_hot_orders_fill_home_and_overflow() {
        let mut set = ShelfSet::new(ShelfCapacities::new(15, 15, 15, 20));
        let mut placed = 0;
        let mut rejected = 0;
        for _ in 0..40 {
            match set.place(order(Temperature::Hot, 100.0, 0.1)) {
                Ok(_) => placed += 1,
                Err(PoolError::NoSpace) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(placed, 35);
        assert_eq!(rejected, 5);
        assert_eq!(set.rejected_for_space(), 5);
        assert_eq!(set.shelf(ShelfLabel::Hot).occupied(), 15);
        assert_eq!(set.shelf(ShelfLabel::Overflow).occupied(), 20);
        assert_unique_residents(&set);
    }

    #[test]
    fn test_no_space_leaves_slots_untouched() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 1));
        set.place(order(Temperature::Hot, 100.0, 0.1)).unwrap();
        set.place(order(Temperature::Hot, 100.0, 0.1)).unwrap();
        let before = set.snapshot();

        assert_eq!(set.place(order(Temperature::Hot, 200.0, 0.1)), Err(PoolError::NoSpace));
        let after = set.snapshot();
        assert_eq!(after.shelves, before.shelves);
        assert_eq!(after.rejected_for_space, before.rejected_for_space + 1);
    }

    #[test]
    fn test_overflow_placement_doubles_rate() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 2));
        set.place(order(Temperature::Frozen, 100.0, 0.5)).unwrap();
        let second = order(Temperature::Frozen, 100.0, 0.5);

        let placement = set.place(second.clone()).unwrap();
        assert_eq!(placement.shelf, ShelfLabel::Overflow);
        assert_eq!(second.current_decay_rate(), 1.0);
        assert_eq!(second.original_decay_rate(), 0.5);
    }

    #[test]
    fn test_healthiest_resident_is_displaced_to_overflow() {
        let mut set = ShelfSet::new(ShelfCapacities::new(3, 1, 1, 2));
        let oldest = aged(Temperature::Hot, 30);
        let middle = aged(Temperature::Hot, 20);
        let youngest = aged(Temperature::Hot, 10);
        for resident in [&oldest, &middle, &youngest] {
            set.place(resident.clone()).unwrap();
        }
        let youngest_slot = set.locate(youngest.id()).unwrap();

        let stale = aged(Temperature::Hot, 35);
        let placement = set.place(stale.clone()).unwrap();

        assert_eq!((placement.shelf, placement.index), youngest_slot);
        assert_eq!(
            placement.displaced,
            Some(Displacement {
                order_id: youngest.id().clone(),
                overflow_index: 0,
            })
        );
        assert_eq!(set.locate(youngest.id()), Some((ShelfLabel::Overflow, 0)));
        assert_eq!(youngest.current_decay_rate(), 2.0);
        assert_eq!(stale.current_decay_rate(), 1.0);
        assert_eq!(set.locate(oldest.id()).map(|(l, _)| l), Some(ShelfLabel::Hot));
        assert_unique_residents(&set);
    }

    #[test]
    fn test_equal_health_keeps_resident_in_place() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 1));
        let resident = order(Temperature::Cold, 100.0, 1.0);
        set.place(resident.clone()).unwrap();

        let incoming = order(Temperature::Cold, 100.0, 1.0);
        let placement = set.place(incoming.clone()).unwrap();

        assert_eq!(placement.shelf, ShelfLabel::Overflow);
        assert_eq!(placement.displaced, None);
        assert_eq!(set.locate(resident.id()), Some((ShelfLabel::Cold, 0)));
        assert_eq!(resident.current_decay_rate(), 1.0);
        assert_eq!(incoming.current_decay_rate(), 2.0);
    }

    #[test]
    fn test_healthier_incoming_goes_to_overflow() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 1));
        let resident = aged(Temperature::Hot, 30);
        set.place(resident.clone()).unwrap();

        let incoming = order(Temperature::Hot, 100.0, 1.0);
        let placement = set.place(incoming).unwrap();
        assert_eq!(placement.shelf, ShelfLabel::Overflow);
        assert_eq!(set.locate(resident.id()), Some((ShelfLabel::Hot, 0)));
    }

    #[test]
    fn test_zero_capacity_home_shelf_uses_overflow() {
        let mut set = ShelfSet::new(ShelfCapacities::new(0, 1, 1, 1));
        let placement = set.place(order(Temperature::Hot, 10.0, 1.0)).unwrap();
        assert_eq!(placement.shelf, ShelfLabel::Overflow);
    }

    #[test]
    fn test_retrieve_promotes_least_healthy_overflow_order() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 0, 1, 3));
        let resident = aged(Temperature::Hot, 30);
        set.place(resident.clone()).unwrap();

        let fresher = aged(Temperature::Hot, 5);
        let staler = aged(Temperature::Hot, 25);
        let cold = aged(Temperature::Cold, 40);
        for overflow in [&fresher, &staler, &cold] {
            assert_eq!(set.place(overflow.clone()).unwrap().shelf, ShelfLabel::Overflow);
        }

        let retrieval = set.retrieve(resident.id()).unwrap();
        assert_eq!(retrieval.shelf, ShelfLabel::Hot);
        assert_eq!(retrieval.promoted.as_ref(), Some(staler.id()));
        assert!(resident.is_picked_up());
        assert_eq!(set.locate(staler.id()), Some((ShelfLabel::Hot, 0)));
        assert_eq!(staler.current_decay_rate(), 1.0);
        assert_eq!(set.locate(cold.id()).map(|(l, _)| l), Some(ShelfLabel::Overflow));
        assert_eq!(set.locate(resident.id()), None);
    }

    #[test]
    fn test_retrieve_twice_fails_with_not_found() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        let burger = order(Temperature::Hot, 100.0, 1.0);
        set.place(burger.clone()).unwrap();

        assert!(set.retrieve(burger.id()).is_ok());
        assert_eq!(
            set.retrieve(burger.id()).unwrap_err(),
            PoolError::OrderNotFound(burger.id().clone())
        );
    }

    #[test]
    fn test_late_expiry_notice_after_pickup_is_stale() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        let taco = order(Temperature::Hot, 50.0, 1.0);
        set.place(taco.clone()).unwrap();

        set.retrieve(taco.id()).unwrap();
        let notice = ExpiryNotice {
            order_id: taco.id().clone(),
            temperature: Temperature::Hot,
        };
        assert_eq!(set.reclaim_expired(&notice), Reclamation::Stale);
        assert_eq!(set.lost_to_expiry(), 0);
        assert_eq!(set.resident_count(), 0);
    }

    #[test]
    fn test_retrieve_expired_order_is_left_for_reconciler() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        let melted = order(Temperature::Frozen, 1.0, 10.0);
        set.place(melted.clone()).unwrap();
        melted.advance(shelf_decay_value);

        assert_eq!(
            set.retrieve(melted.id()).unwrap_err(),
            PoolError::OrderExpired(melted.id().clone())
        );
        assert!(!melted.is_picked_up());
        assert_eq!(set.locate(melted.id()), Some((ShelfLabel::Frozen, 0)));
    }

    #[test]
    fn test_reclaim_from_home_promotes_and_counts() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 2));
        let dying = order(Temperature::Hot, 1.0, 10.0);
        set.place(dying.clone()).unwrap();
        dying.advance(shelf_decay_value);
        let waiting = order(Temperature::Hot, 0.5, 0.0);
        assert_eq!(set.place(waiting.clone()).unwrap().shelf, ShelfLabel::Overflow);

        let notice = ExpiryNotice {
            order_id: dying.id().clone(),
            temperature: Temperature::Hot,
        };
        assert_eq!(
            set.reclaim_expired(&notice),
            Reclamation::Home {
                shelf: ShelfLabel::Hot,
                index: 0,
                promoted: Some(waiting.id().clone()),
            }
        );
        assert_eq!(set.lost_to_expiry(), 1);
        assert_eq!(set.locate(waiting.id()), Some((ShelfLabel::Hot, 0)));
        assert_eq!(waiting.current_decay_rate(), 0.0);

        assert_eq!(set.reclaim_expired(&notice), Reclamation::Stale);
        assert_eq!(set.lost_to_expiry(), 1);
    }

    #[test]
    fn test_reclaim_from_overflow() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 1));
        set.place(order(Temperature::Cold, 1.0, 1.0)).unwrap();
        let overflowed = order(Temperature::Cold, 1.0, 10.0);
        set.place(overflowed.clone()).unwrap();

        let notice = ExpiryNotice {
            order_id: overflowed.id().clone(),
            temperature: Temperature::Cold,
        };
        assert_eq!(set.reclaim_expired(&notice), Reclamation::Overflow { index: 0 });
        assert_eq!(set.lost_to_expiry(), 1);
        assert_eq!(set.resident_count(), 1);
    }

    #[test]
    fn test_promotion_skips_expired_overflow_orders() {
        let mut set = ShelfSet::new(ShelfCapacities::new(1, 1, 1, 1));
        let resident = order(Temperature::Hot, 1.0, 1.0);
        set.place(resident.clone()).unwrap();
        let expired = order(Temperature::Hot, 1.0, 10.0);
        set.place(expired.clone()).unwrap();
        expired.advance(shelf_decay_value);

        let retrieval = set.retrieve(resident.id()).unwrap();
        assert_eq!(retrieval.promoted, None);
        assert_eq!(set.locate(expired.id()), Some((ShelfLabel::Overflow, 0)));
    }

    #[tokio::test]
    async fn test_completion_resolves_on_removal() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        let (picked, picked_done) = Order::new("Taco", Temperature::Hot, 10.0, 1.0).unwrap();
        let picked = Arc::new(picked);
        let (melted, melted_done) = Order::new("Gelato", Temperature::Frozen, 1.0, 10.0).unwrap();
        let melted = Arc::new(melted);
        set.place(picked.clone()).unwrap();
        set.place(melted.clone()).unwrap();

        set.retrieve(picked.id()).unwrap();
        melted.advance(shelf_decay_value);
        set.reclaim_expired(&ExpiryNotice {
            order_id: melted.id().clone(),
            temperature: Temperature::Frozen,
        });

        assert_eq!(picked_done.wait().await, OrderOutcome::PickedUp);
        assert_eq!(melted_done.wait().await, OrderOutcome::Expired);
    }

    #[test]
    fn test_observer_is_signalled_without_blocking() {
        let (sender, mut receiver) = mpsc::channel(1);
        let mut set = ShelfSet::new(ShelfCapacities::default()).with_observer(sender);

        set.place(order(Temperature::Hot, 10.0, 1.0)).unwrap();
        set.place(order(Temperature::Hot, 10.0, 1.0)).unwrap();

        assert_eq!(receiver.try_recv(), Ok(FacilityComponent::ShelfPool));
        assert!(receiver.try_recv().is_err(), "full mailbox drops extra signals");
    }

    #[test]
    fn test_snapshot_serializes_every_shelf() {
        let mut set = ShelfSet::new(ShelfCapacities::default());
        set.place(order(Temperature::Hot, 10.0, 1.0)).unwrap();

        let json = serde_json::to_value(set.snapshot()).unwrap();
        for label in ["hot", "cold", "frozen", "overflow"] {
            assert!(json[label].is_array(), "missing shelf {label}");
        }
        assert_eq!(json["hot"][0]["normalizedHealth"], 1.0);
        assert_eq!(json["hot"][0]["temperatureClass"], "hot");
        assert_eq!(json["hot"][0]["pickedUp"], false);
        assert_eq!(json["lostToExpiry"], 0);
        assert_eq!(json["rejectedForSpace"], 0);
    }
}
