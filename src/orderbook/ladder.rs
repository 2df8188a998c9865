//! One side of an order book
//!
//! Levels are kept in a vector ordered from furthest-from-best to best, so
//! the best price is always the last element. Inserts and reductions scan
//! from the best end; order flow concentrates near the top of book, which
//! keeps the scan short in practice. Worst case is linear in the depth.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Side;

/// Aggregate resting quantity at one price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: u32,
    pub quantity: u32,
}

/// Sorted price levels for one side of one instrument
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    levels: Vec<PriceLevel>,
}

impl Ladder {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Add `quantity` at `price`, creating the level if needed.
    ///
    /// A level's aggregate is capped at `u32::MAX`.
    pub fn insert(&mut self, price: u32, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let mut idx = self.levels.len();
        while idx > 0 {
            let level = &mut self.levels[idx - 1];
            if level.price == price {
                level.quantity = match level.quantity.checked_add(quantity) {
                    Some(total) => total,
                    None => {
                        warn!(
                            side = ?self.side,
                            price,
                            resting = level.quantity,
                            quantity,
                            "Level aggregate overflows u32, capping"
                        );
                        u32::MAX
                    }
                };
                return;
            }
            if self.side.is_better(price, level.price) {
                break;
            }
            idx -= 1;
        }

        self.levels.insert(idx, PriceLevel { price, quantity });
    }

    /// Take `quantity` off the level at `price`.
    ///
    /// The level is removed once its aggregate is exhausted. Returns false
    /// when no level exists at `price`.
    pub fn reduce(&mut self, price: u32, quantity: u32) -> bool {
        for idx in (0..self.levels.len()).rev() {
            let level = &mut self.levels[idx];
            if level.price == price {
                if quantity >= level.quantity {
                    self.levels.remove(idx);
                } else {
                    level.quantity -= quantity;
                }
                return true;
            }
            // Past the point where `price` could sit
            if self.side.is_better(price, level.price) {
                return false;
            }
        }
        false
    }

    /// Most competitive price, `None` when the side is empty
    #[inline]
    pub fn best_price(&self) -> Option<u32> {
        self.levels.last().map(|level| level.price)
    }

    /// All levels, worst to best
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Levels from best outward
    pub fn iter_best_first(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.iter().rev()
    }

    /// Quantity at exactly `price`, zero when absent
    pub fn quantity_at(&self, price: u32) -> u32 {
        self.iter_best_first()
            .find(|level| level.price == price)
            .map(|level| level.quantity)
            .unwrap_or(0)
    }

    pub fn total_quantity(&self) -> u64 {
        self.levels.iter().map(|level| level.quantity as u64).sum()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
