//! The shelf pool: fixed-capacity shelves behind a single actor.

mod actor;
pub mod error;
pub mod message;
pub mod mock;
pub mod shelf_set;

pub use actor::ShelfPoolActor;
pub use error::*;
pub use message::*;
pub use shelf_set::*;

use crate::clients::ShelfPoolClient;
use crate::config::ShelfCapacities;
use crate::decay::DecaySpawner;
use crate::model::FacilityComponent;
use tokio::sync::mpsc;

/// Mailbox size of the pool actor.
pub const POOL_MAILBOX_SIZE: usize = 32;

/// Creates a new shelf pool actor and its client.
///
/// `observer`, when given, receives a [`FacilityComponent::ShelfPool`] signal
/// after every slot change.
pub fn new(
    capacities: ShelfCapacities,
    decay: DecaySpawner,
    observer: Option<mpsc::Sender<FacilityComponent>>,
) -> (ShelfPoolActor, ShelfPoolClient) {
    let (sender, receiver) = mpsc::channel(POOL_MAILBOX_SIZE);
    let mut shelves = ShelfSet::new(capacities);
    if let Some(observer) = observer {
        shelves = shelves.with_observer(observer);
    }
    let actor = ShelfPoolActor::new(receiver, shelves, decay);
    (actor, ShelfPoolClient::new(sender))
}
