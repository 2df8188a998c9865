//! Order book metrics calculation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Computed metrics for an order book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookMetrics {
    pub best_bid: Option<Decimal>,

    pub best_ask: Option<Decimal>,

    /// Mid price (average of best bid and ask)
    pub mid_price: Option<Decimal>,

    /// Spread in basis points
    pub spread_bps: Option<Decimal>,

    /// Simple imbalance over the top levels: (bid_vol - ask_vol) / (bid_vol + ask_vol)
    pub imbalance: Option<Decimal>,

    /// Total resting bid quantity
    pub bid_depth: u64,

    /// Total resting ask quantity
    pub ask_depth: u64,

    /// Number of bid levels
    pub bid_levels: usize,

    /// Number of ask levels
    pub ask_levels: usize,
}

impl OrderBookMetrics {
    /// Both sides quoted and not crossed
    pub fn is_healthy(&self) -> bool {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => bid < ask,
            _ => false,
        }
    }
}
