//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter driven by
//! `RUST_LOG`, defaulting to `info`. Module paths are hidden (`with_target(false)`);
//! structured fields such as `order_id`, `shelf`, `index` and `state` carry the
//! context instead.
//!
//! ```bash
//! # Placements, pickups, expiries and shutdown
//! RUST_LOG=info cargo run
//!
//! # Every pool request, decay stop and courier transition
//! RUST_LOG=debug cargo run
//!
//! # Only courier activity
//! RUST_LOG=holding_facility::courier=debug cargo run
//! ```
//!
//! A typical run at `info`:
//!
//! ```text
//! INFO Shelf pool started
//! INFO Reconciler started
//! INFO place: Placed order_id=5b0c… shelf=hot index=0 size=1
//! INFO run_decay: Expired order_id=9e41… age=1 health=-10
//! INFO Reclaimed order_id=9e41… reclamation=Home { shelf: Frozen, index: 0, promoted: None } lost=1
//! INFO request_pickup: Delivered order_id=5b0c… state=delivered shelf=hot travel_ms=4000
//! ```
//!
//! Calling `setup_tracing` twice panics, as `init` does; call it once from `main`.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
