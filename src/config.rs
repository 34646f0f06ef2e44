//! # Simulation Configuration
//!
//! Immutable settings shared read-only by every decay process and courier.
//!
//! All values can be overridden from the environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `HOLDING_TICK_MS` | 1000 | Length of one decay tick (ms) |
//! | `HOLDING_COURIER_MIN_DELAY` | 2 | Minimum courier travel (ticks) |
//! | `HOLDING_COURIER_MAX_DELAY` | 8 | Random extra courier travel, exclusive upper bound (ticks) |
//! | `HOLDING_DISPATCH_COURIERS` | true | Send a courier for every stored order |
//! | `HOLDING_HOT_CAPACITY` | 15 | Hot shelf slots |
//! | `HOLDING_COLD_CAPACITY` | 15 | Cold shelf slots |
//! | `HOLDING_FROZEN_CAPACITY` | 15 | Frozen shelf slots |
//! | `HOLDING_OVERFLOW_CAPACITY` | 20 | Overflow shelf slots |
//!
//! ```bash
//! HOLDING_TICK_MS=100 HOLDING_OVERFLOW_CAPACITY=5 cargo run
//! ```

use crate::model::ShelfLabel;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const DEFAULT_TICK_MS: u64 = 1000;

/// Errors raised while assembling a facility from its configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// The facility was built without a simulation config.
    #[error("No simulation config found")]
    MissingSimulationConfig,

    /// A zero tick interval leaves the decay processes without a tick source.
    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Minimum courier travel time, in ticks.
    pub courier_min_delay: u32,
    /// Random extra courier travel time drawn from `[0, courier_max_delay)`, in ticks.
    pub courier_max_delay: u32,
    /// Length of one decay tick. Serialized as (possibly fractional) milliseconds.
    #[serde(rename = "tickIntervalMs", with = "millis")]
    pub tick_interval: Duration,
    /// Whether the dispatch stage sends a courier for each stored order.
    pub dispatch_couriers: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            courier_min_delay: 2,
            courier_max_delay: 8,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            dispatch_couriers: true,
        }
    }
}

impl SimulationConfig {
    /// Loads the config from `HOLDING_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            courier_min_delay: env_or("HOLDING_COURIER_MIN_DELAY", defaults.courier_min_delay),
            courier_max_delay: env_or("HOLDING_COURIER_MAX_DELAY", defaults.courier_max_delay),
            tick_interval: Duration::from_millis(env_or("HOLDING_TICK_MS", DEFAULT_TICK_MS)),
            dispatch_couriers: env_or("HOLDING_DISPATCH_COURIERS", defaults.dispatch_couriers),
        }
    }

    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }

    pub fn with_courier_delays(mut self, min_ticks: u32, max_ticks: u32) -> Self {
        self.courier_min_delay = min_ticks;
        self.courier_max_delay = max_ticks;
        self
    }

    pub fn with_dispatch_couriers(mut self, enabled: bool) -> Self {
        self.dispatch_couriers = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Draws one courier travel time: `tick * (min + uniform[0, max))`.
    pub fn courier_travel_time(&self) -> Duration {
        let jitter = if self.courier_max_delay > 0 {
            rand::thread_rng().gen_range(0..self.courier_max_delay)
        } else {
            0
        };
        self.tick_interval() * (self.courier_min_delay + jitter)
    }
}

/// Slot count per shelf, fixed when the pool is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfCapacities {
    pub hot: usize,
    pub cold: usize,
    pub frozen: usize,
    pub overflow: usize,
}

impl Default for ShelfCapacities {
    fn default() -> Self {
        Self {
            hot: 15,
            cold: 15,
            frozen: 15,
            overflow: 20,
        }
    }
}

impl ShelfCapacities {
    pub fn new(hot: usize, cold: usize, frozen: usize, overflow: usize) -> Self {
        Self {
            hot,
            cold,
            frozen,
            overflow,
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hot: env_or("HOLDING_HOT_CAPACITY", defaults.hot),
            cold: env_or("HOLDING_COLD_CAPACITY", defaults.cold),
            frozen: env_or("HOLDING_FROZEN_CAPACITY", defaults.frozen),
            overflow: env_or("HOLDING_OVERFLOW_CAPACITY", defaults.overflow),
        }
    }

    pub fn for_shelf(&self, label: ShelfLabel) -> usize {
        match label {
            ShelfLabel::Hot => self.hot,
            ShelfLabel::Cold => self.cold,
            ShelfLabel::Frozen => self.frozen,
            ShelfLabel::Overflow => self.overflow,
        }
    }
}

/// Durations as milliseconds, fractional below 1 ms.
mod millis {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        if !ms.is_finite() || ms < 0.0 {
            return Err(D::Error::custom(format!("invalid tick interval: {ms} ms")));
        }
        Ok(Duration::from_nanos((ms * 1_000_000.0).round() as u64))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Unparsable config value, using default");
            default
        }),
        Err(_) => default,
    }
}
