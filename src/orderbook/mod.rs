//! Order book module
//!
//! Per-instrument price ladders and the market-wide order table that
//! applies decoded order-lifecycle events to them.

mod book;
mod ladder;
mod market;
mod metrics;

pub use book::OrderBook;
pub use ladder::{Ladder, PriceLevel};
pub use market::{Market, Order, MAX_BOOKS};
pub use metrics::OrderBookMetrics;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FeedError;

/// ITCH prices carry four implied decimal places
pub const PRICE_SCALE: u32 = 4;

/// Render a wire price as a decimal
pub fn price_to_decimal(price: u32) -> Decimal {
    Decimal::new(price as i64, PRICE_SCALE)
}

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Buy/sell indicator byte; anything but `B` is a sell
    #[inline]
    pub fn from_indicator(indicator: u8) -> Self {
        if indicator == b'B' {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    #[inline]
    pub fn indicator(self) -> u8 {
        match self {
            Side::Buy => b'B',
            Side::Sell => b'S',
        }
    }

    /// Whether `a` is a more competitive price than `b` on this side
    #[inline]
    pub fn is_better(self, a: u32, b: u32) -> bool {
        match self {
            Side::Buy => a > b,
            Side::Sell => a < b,
        }
    }
}

/// How the order table treats an add for a reference that is still live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Overwrite the entry and leave the previous order's quantity on the book
    Ignore,
    /// Unwind the previous order from its book, overwrite, and report
    #[default]
    Report,
}

impl FromStr for CollisionPolicy {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(CollisionPolicy::Ignore),
            "report" => Ok(CollisionPolicy::Report),
            other => Err(FeedError::ConfigError(format!(
                "unknown COLLISION_POLICY: {}",
                other
            ))),
        }
    }
}

/// A single level in a book snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub quantity: u32,
}

/// Read-only view of one instrument's book, best level first on each side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookState {
    pub locate: u16,
    pub symbol: Option<String>,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub metrics: OrderBookMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_to_decimal() {
        assert_eq!(price_to_decimal(1_500_000), dec!(150.0000));
        assert_eq!(price_to_decimal(1), dec!(0.0001));
    }

    #[test]
    fn test_collision_policy_parse() {
        assert_eq!("Ignore".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Ignore);
        assert_eq!("report".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Report);
        assert!("detect".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn test_side_ordering() {
        assert!(Side::Buy.is_better(101, 100));
        assert!(Side::Sell.is_better(100, 101));
        assert!(!Side::Buy.is_better(100, 100));
        assert_eq!(Side::from_indicator(Side::Buy.indicator()), Side::Buy);
    }
}
