//! ITCH Market Data Handler Library
//!
//! This crate reads a length-prefixed ITCH byte stream and maintains the
//! aggregated limit order book of every instrument it carries.

pub mod config;
pub mod encode;
pub mod error;
pub mod feed;
pub mod message;
pub mod metrics;
pub mod orderbook;
pub mod reader;

pub use config::Config;
pub use error::{BookError, FeedError, Result};
pub use feed::{FeedProcessor, FeedStats, Step};
pub use message::{MessageType, OrderEvent};
pub use metrics::FeedMetrics;
pub use orderbook::{
    CollisionPolicy, Ladder, Market, Order, OrderBook, OrderBookMetrics, OrderBookState,
    PriceLevel, Side,
};
pub use reader::StreamBuffer;
