#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Holding Facility
//!
//! > **A simulated holding area for perishable orders.**
//!
//! Orders arrive with a temperature class, a shelf life and a decay rate. The
//! facility stores each one on a fixed-capacity shelf, ages it tick by tick,
//! discards it when its health runs out and hands it to a courier when one
//! arrives first.
//!
//! ## 🏗️ Design
//!
//! ### Single-owner shelves
//! All shelves belong to one [`ShelfPoolActor`](shelf_pool::ShelfPoolActor). Placement,
//! retrieval, promotion and reclamation are requests on its mailbox and run one
//! at a time, so an order can never occupy two slots and a slot never holds two
//! orders. No lock spans the whole pool.
//!
//! ### Many small tasks
//! Every stored order has its own decay process; every courier has its own
//! journey. They share the order through an `Arc<Order>` whose mutable vitals sit
//! behind a short `parking_lot` lock. Expiry and pickup race by design: both go
//! through the actor, and whichever arrives second finds the slot empty.
//!
//! ### Explicit completion
//! Submitting an order returns an [`OrderReceipt`](lifecycle::OrderReceipt). Awaiting it
//! yields exactly one [`OrderOutcome`](model::OrderOutcome), resolved by the pool when
//! the order leaves the shelves.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`])
//! Orders, temperature classes, shelf labels and the serializable snapshot.
//!
//! ### 2. The Shelves ([`shelf_pool`], [`clients`])
//! The placement and promotion policy, the actor that owns it and the
//! [`ShelfPoolClient`](clients::ShelfPoolClient) everything else talks through.
//! [`shelf_pool::mock`] scripts the pool for tests.
//!
//! ### 3. Time ([`decay`], [`reconciler`])
//! Per-order decay processes and the reconciler that reclaims expired orders.
//!
//! ### 4. Movement ([`pipeline`], [`courier`])
//! The intake chain that ends in storage, and the couriers that pick orders up.
//!
//! ### 5. The Orchestrator ([`lifecycle`], [`config`])
//! [`Facility`](lifecycle::Facility) wires everything together and shuts it down;
//! [`SimulationConfig`](config::SimulationConfig) and
//! [`ShelfCapacities`](config::ShelfCapacities) carry the settings.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Built-in sample orders, info logs
//! RUST_LOG=info cargo run
//!
//! # Your own orders, faster clock
//! HOLDING_TICK_MS=100 cargo run -- orders.json
//!
//! cargo test
//! ```

pub mod clients;
pub mod config;
pub mod courier;
pub mod decay;
pub mod lifecycle;
pub mod model;
pub mod pipeline;
pub mod reconciler;
pub mod shelf_pool;
