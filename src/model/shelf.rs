//! Temperature classes and the shelf labels they map onto.

use super::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Decay-rate multiplier applied while an order sits on the overflow shelf.
pub const OVERFLOW_DECAY_MULTIPLIER: f64 = 2.0;

/// The temperature class an order declares at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Hot,
    Cold,
    Frozen,
}

impl Temperature {
    pub const ALL: [Temperature; 3] = [Temperature::Hot, Temperature::Cold, Temperature::Frozen];

    /// The home shelf for this temperature class.
    pub fn home_shelf(self) -> ShelfLabel {
        match self {
            Temperature::Hot => ShelfLabel::Hot,
            Temperature::Cold => ShelfLabel::Cold,
            Temperature::Frozen => ShelfLabel::Frozen,
        }
    }
}

impl FromStr for Temperature {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Temperature::Hot),
            "cold" => Ok(Temperature::Cold),
            "frozen" => Ok(Temperature::Frozen),
            _ => Err(OrderError::UnknownTemperature(s.to_string())),
        }
    }
}

impl Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.home_shelf().fmt(f)
    }
}

/// Label of one shelf in the pool: a temperature shelf or the shared overflow shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfLabel {
    Hot,
    Cold,
    Frozen,
    Overflow,
}

impl ShelfLabel {
    pub const ALL: [ShelfLabel; 4] = [
        ShelfLabel::Hot,
        ShelfLabel::Cold,
        ShelfLabel::Frozen,
        ShelfLabel::Overflow,
    ];

    pub fn is_overflow(self) -> bool {
        self == ShelfLabel::Overflow
    }

    /// Decay rate an order with `original_rate` runs at while on this shelf.
    pub fn decay_rate_for(self, original_rate: f64) -> f64 {
        if self.is_overflow() {
            OVERFLOW_DECAY_MULTIPLIER * original_rate
        } else {
            original_rate
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShelfLabel::Hot => "hot",
            ShelfLabel::Cold => "cold",
            ShelfLabel::Frozen => "frozen",
            ShelfLabel::Overflow => "overflow",
        }
    }
}

impl Display for ShelfLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
