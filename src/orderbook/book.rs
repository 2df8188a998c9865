//! Core order book implementation
//!
//! A pair of price ladders for a single instrument.

use rust_decimal::Decimal;

use super::{price_to_decimal, Ladder, Level, OrderBookMetrics, OrderBookState, Side};

/// Levels per side counted by the book imbalance
const IMBALANCE_LEVELS: usize = 5;

/// Order book for a single instrument
#[derive(Debug, Clone)]
pub struct OrderBook {
    locate: u16,
    /// Symbol learned from the first add order carrying one
    symbol: Option<[u8; 8]>,
    /// Bids, ascending price, best (highest) last
    bids: Ladder,
    /// Asks, descending price, best (lowest) last
    asks: Ladder,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(locate: u16) -> Self {
        Self {
            locate,
            symbol: None,
            bids: Ladder::new(Side::Buy),
            asks: Ladder::new(Side::Sell),
        }
    }

    pub fn locate(&self) -> u16 {
        self.locate
    }

    /// Symbol with padding trimmed
    pub fn symbol(&self) -> Option<String> {
        self.symbol
            .map(|raw| String::from_utf8_lossy(&raw).trim_end().to_string())
    }

    pub(crate) fn learn_symbol(&mut self, stock: [u8; 8]) {
        if self.symbol.is_none() && stock.iter().any(|b| !b.is_ascii_whitespace() && *b != 0) {
            self.symbol = Some(stock);
        }
    }

    #[inline]
    pub fn insert(&mut self, side: Side, price: u32, quantity: u32) {
        self.ladder_mut(side).insert(price, quantity);
    }

    /// Returns false when no level exists at `price`
    #[inline]
    pub fn reduce(&mut self, side: Side, price: u32, quantity: u32) -> bool {
        self.ladder_mut(side).reduce(price, quantity)
    }

    pub fn insert_buy(&mut self, price: u32, quantity: u32) {
        self.bids.insert(price, quantity);
    }

    pub fn insert_sell(&mut self, price: u32, quantity: u32) {
        self.asks.insert(price, quantity);
    }

    pub fn reduce_buy(&mut self, price: u32, quantity: u32) -> bool {
        self.bids.reduce(price, quantity)
    }

    pub fn reduce_sell(&mut self, price: u32, quantity: u32) -> bool {
        self.asks.reduce(price, quantity)
    }

    pub fn ladder(&self, side: Side) -> &Ladder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    fn ladder_mut(&mut self, side: Side) -> &mut Ladder {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    /// Best bid as a wire price
    pub fn best_bid(&self) -> Option<u32> {
        self.bids.best_price()
    }

    /// Best ask as a wire price
    pub fn best_ask(&self) -> Option<u32> {
        self.asks.best_price()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => {
                Some((price_to_decimal(bid) + price_to_decimal(ask)) / Decimal::from(2))
            }
            _ => None,
        }
    }

    /// Get spread in basis points
    pub fn spread_bps(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask(), self.mid_price()) {
            (Some(bid), Some(ask), Some(mid)) if mid > Decimal::ZERO => Some(
                (price_to_decimal(ask) - price_to_decimal(bid)) / mid * Decimal::from(10000),
            ),
            _ => None,
        }
    }

    /// Calculate order book imbalance at top N levels
    pub fn imbalance(&self, levels: usize) -> Option<Decimal> {
        let bid_volume: u64 = self
            .bids
            .iter_best_first()
            .take(levels)
            .map(|l| l.quantity as u64)
            .sum();
        let ask_volume: u64 = self
            .asks
            .iter_best_first()
            .take(levels)
            .map(|l| l.quantity as u64)
            .sum();

        let total = bid_volume + ask_volume;
        if total > 0 {
            Some(
                (Decimal::from(bid_volume) - Decimal::from(ask_volume)) / Decimal::from(total),
            )
        } else {
            None
        }
    }

    /// Snapshot of the top `depth` levels of each side
    pub fn state(&self, depth: usize) -> OrderBookState {
        let to_levels = |ladder: &Ladder| -> Vec<Level> {
            ladder
                .iter_best_first()
                .take(depth)
                .map(|l| Level {
                    price: price_to_decimal(l.price),
                    quantity: l.quantity,
                })
                .collect()
        };

        OrderBookState {
            locate: self.locate,
            symbol: self.symbol(),
            bids: to_levels(&self.bids),
            asks: to_levels(&self.asks),
            metrics: self.calculate_metrics(),
        }
    }

    /// Calculate order book metrics
    pub fn calculate_metrics(&self) -> OrderBookMetrics {
        OrderBookMetrics {
            best_bid: self.best_bid().map(price_to_decimal),
            best_ask: self.best_ask().map(price_to_decimal),
            mid_price: self.mid_price(),
            spread_bps: self.spread_bps(),
            imbalance: self.imbalance(IMBALANCE_LEVELS),
            bid_depth: self.bids.total_quantity(),
            ask_depth: self.asks.total_quantity(),
            bid_levels: self.bids.len(),
            ask_levels: self.asks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_book() -> OrderBook {
        let mut book = OrderBook::new(7);
        book.insert_buy(500_000, 100);
        book.insert_buy(499_900, 200);
        book.insert_sell(500_100, 150);
        book.insert_sell(500_200, 250);
        book
    }

    #[test]
    fn test_best_bid_ask() {
        let book = create_test_book();
        assert_eq!(book.best_bid(), Some(500_000));
        assert_eq!(book.best_ask(), Some(500_100));
    }

    #[test]
    fn test_mid_price() {
        let book = create_test_book();
        assert_eq!(book.mid_price(), Some(dec!(50.005)));
    }

    #[test]
    fn test_imbalance() {
        let book = create_test_book();
        // Bids: 100 + 200 = 300, Asks: 150 + 250 = 400
        let imbalance = book.imbalance(10).unwrap();
        assert!(imbalance < Decimal::ZERO);
        assert_eq!(imbalance, dec!(-100) / dec!(700));
    }

    #[test]
    fn test_state_is_best_first_and_truncated() {
        let book = create_test_book();
        let state = book.state(1);
        assert_eq!(state.locate, 7);
        assert_eq!(
            state.bids,
            vec![Level {
                price: dec!(50.0000),
                quantity: 100
            }]
        );
        assert_eq!(state.asks[0].price, dec!(50.01));
        assert_eq!(state.metrics.bid_levels, 2);
        assert_eq!(state.metrics.ask_depth, 400);
        assert!(state.metrics.is_healthy());
    }

    #[test]
    fn test_symbol_learned_once() {
        let mut book = OrderBook::new(1);
        assert_eq!(book.symbol(), None);
        book.learn_symbol(*b"        ");
        assert_eq!(book.symbol(), None);
        book.learn_symbol(*b"MSFT    ");
        book.learn_symbol(*b"AAPL    ");
        assert_eq!(book.symbol().as_deref(), Some("MSFT"));
    }

    #[test]
    fn test_empty_book_metrics() {
        let book = OrderBook::new(0);
        let metrics = book.calculate_metrics();
        assert!(book.is_empty());
        assert_eq!(metrics.mid_price, None);
        assert_eq!(metrics.imbalance, None);
        assert!(!metrics.is_healthy());
    }
}
