//! Read-only view of the pool handed to observers.

use super::{Order, OrderId, ShelfLabel, Temperature};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Tag published to observers when a facility component changed state.
///
/// Observers react by pulling a fresh [`PoolSnapshot`]; the tag itself carries no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityComponent {
    ShelfPool,
}

impl Display for FacilityComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacilityComponent::ShelfPool => f.write_str("shelf_pool"),
        }
    }
}

/// One resident order as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub name: String,
    pub normalized_health: f64,
    pub temperature_class: Temperature,
    pub picked_up: bool,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let vitals = order.vitals();
        Self {
            id: order.id().clone(),
            name: order.name().to_string(),
            normalized_health: vitals.health / order.shelf_life(),
            temperature_class: order.temperature(),
            picked_up: vitals.picked_up,
        }
    }
}

/// Full snapshot of the pool: every shelf's residents plus the loss counters.
///
/// Serializes as `{ "hot": [...], "cold": [...], "frozen": [...], "overflow": [...],
/// "lostToExpiry": n, "rejectedForSpace": n }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    #[serde(flatten)]
    pub shelves: BTreeMap<ShelfLabel, Vec<OrderView>>,
    pub lost_to_expiry: u64,
    pub rejected_for_space: u64,
}

impl PoolSnapshot {
    pub fn shelf(&self, label: ShelfLabel) -> &[OrderView] {
        self.shelves.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resident_count(&self) -> usize {
        self.shelves.values().map(Vec::len).sum()
    }

    /// Shelf currently holding `id`, if any.
    pub fn locate(&self, id: &OrderId) -> Option<ShelfLabel> {
        self.shelves
            .iter()
            .find(|(_, views)| views.iter().any(|view| &view.id == id))
            .map(|(label, _)| *label)
    }
}
