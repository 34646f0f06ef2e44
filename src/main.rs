//! # Holding Facility Demo
//!
//! Submits a batch of orders to a [`Facility`], logs a JSON snapshot whenever the
//! shelves change, then drains and prints the final state.
//!
//! ```bash
//! # Built-in sample orders
//! RUST_LOG=info cargo run
//!
//! # Orders from a JSON array of {name, decayRate, shelfLife, temp}
//! HOLDING_TICK_MS=200 HOLDING_SUBMIT_INTERVAL_MS=50 cargo run -- orders.json
//! ```

use holding_facility::config::{ShelfCapacities, SimulationConfig};
use holding_facility::lifecycle::{setup_tracing, Facility};
use holding_facility::model::OrderRequest;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

const SAMPLE_ORDERS: &str = r#"[
    { "name": "Banana Split", "temp": "frozen", "shelfLife": 20, "decayRate": 0.63 },
    { "name": "McFlury", "temp": "frozen", "shelfLife": 375, "decayRate": 0.4 },
    { "name": "Acai Bowl", "temp": "cold", "shelfLife": 249, "decayRate": 0.3 },
    { "name": "Yogurt", "temp": "cold", "shelfLife": 263, "decayRate": 0.37 },
    { "name": "Chocolate Gelato", "temp": "frozen", "shelfLife": 300, "decayRate": 0.61 },
    { "name": "Cobb Salad", "temp": "cold", "shelfLife": 269, "decayRate": 0.19 },
    { "name": "Cheese Pizza", "temp": "hot", "shelfLife": 300, "decayRate": 0.45 },
    { "name": "Kale Salad", "temp": "cold", "shelfLife": 4, "decayRate": 0.9 },
    { "name": "Pad See Ew", "temp": "hot", "shelfLife": 210, "decayRate": 0.72 },
    { "name": "Tuna Melt", "temp": "lukewarm", "shelfLife": 120, "decayRate": 0.3 },
    { "name": "Hot Dog", "temp": "hot", "shelfLife": 1, "decayRate": 10 },
    { "name": "Beef Stew", "temp": "hot", "shelfLife": 190, "decayRate": 0.62 }
]"#;

fn load_orders() -> Result<Vec<OrderRequest>, String> {
    let raw = match std::env::args().nth(1) {
        Some(path) => {
            info!(%path, "Reading orders");
            std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?
        }
        None => SAMPLE_ORDERS.to_string(),
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid orders file: {e}"))
}

fn submit_interval() -> Duration {
    let millis = std::env::var("HOLDING_SUBMIT_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(250);
    Duration::from_millis(millis)
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let orders = load_orders()?;
    let facility = Facility::builder()
        .config(SimulationConfig::from_env())
        .capacities(ShelfCapacities::from_env())
        .build()
        .map_err(|e| e.to_string())?;
    info!(orders = orders.len(), "Starting simulation");

    let mut events = facility.subscribe();
    let mut ticker = tokio::time::interval(submit_interval());
    let mut pending = orders.into_iter();
    let mut outcomes = Vec::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(request) = pending.next() else { break };
                let name = request.name.clone();
                match facility.submit(request).await {
                    Ok(receipt) => {
                        info!(%name, order_id = %receipt.id, shelf = %receipt.placement.shelf, "Accepted");
                        let id = receipt.id.clone();
                        outcomes.push(tokio::spawn(async move {
                            let outcome = receipt.wait().await;
                            info!(%name, order_id = %id, ?outcome, "Order finished");
                        }));
                    }
                    Err(e) => warn!(%name, reason = %e, "Rejected"),
                }
            }
            event = events.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => match facility.snapshot().await {
                    Ok(snapshot) => info!(
                        snapshot = %serde_json::to_string(&snapshot).unwrap_or_default(),
                        "Shelves changed"
                    ),
                    Err(e) => warn!(error = %e, "Snapshot failed"),
                },
                Err(RecvError::Closed) => break,
            }
        }
    }

    let rejected_at_intake = facility.rejected_at_intake();
    let final_snapshot = facility.drain().await.map_err(|e| e.to_string())?;

    for outcome in outcomes {
        if let Err(e) = outcome.await {
            error!("Outcome task failed: {:?}", e);
        }
    }

    info!(
        lost_to_expiry = final_snapshot.lost_to_expiry,
        rejected_for_space = final_snapshot.rejected_for_space,
        rejected_at_intake,
        "Simulation complete"
    );
    let json = serde_json::to_string_pretty(&final_snapshot).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
