//! Market state
//!
//! Owns one book per possible instrument locate and the table of live orders
//! keyed by exchange reference number. Orders point at their book by locate
//! index; the market alone owns book lifetime.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::{CollisionPolicy, OrderBook, Side};
use crate::error::BookError;
use crate::message::{AddOrder, CancelOrder, DeleteOrder, ExecuteOrder, OrderEvent, ReplaceOrder};

/// One book per `u16` stock locate
pub const MAX_BOOKS: usize = 1 << 16;

/// Initial order table capacity
const ORDER_TABLE_CAPACITY: usize = 1 << 16;

/// A live resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub price: u32,
    /// Remaining resting quantity
    pub quantity: u32,
    pub side: Side,
    /// Locate of the book this order rests in
    pub book: u16,
}

/// All books and live orders of one feed
pub struct Market {
    books: Vec<OrderBook>,
    orders: HashMap<u64, Order>,
    collision_policy: CollisionPolicy,
    /// Reductions that found no level at the order's price
    missing_levels: u64,
}

impl Market {
    pub fn new() -> Self {
        Self::with_policy(CollisionPolicy::default())
    }

    pub fn with_policy(collision_policy: CollisionPolicy) -> Self {
        Self {
            books: (0..MAX_BOOKS).map(|locate| OrderBook::new(locate as u16)).collect(),
            orders: HashMap::with_capacity(ORDER_TABLE_CAPACITY),
            collision_policy,
            missing_levels: 0,
        }
    }

    #[inline]
    pub fn book(&self, locate: u16) -> &OrderBook {
        &self.books[locate as usize]
    }

    #[inline]
    pub fn book_mut(&mut self, locate: u16) -> &mut OrderBook {
        &mut self.books[locate as usize]
    }

    /// Books holding at least one level
    pub fn active_books(&self) -> impl Iterator<Item = &OrderBook> {
        self.books.iter().filter(|book| !book.is_empty())
    }

    pub fn order(&self, reference: u64) -> Option<&Order> {
        self.orders.get(&reference)
    }

    pub fn live_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn missing_levels(&self) -> u64 {
        self.missing_levels
    }

    /// Apply one decoded event
    pub fn apply(&mut self, event: &OrderEvent) -> Result<(), BookError> {
        match event {
            OrderEvent::Add(msg) => self.on_add_order(msg),
            OrderEvent::Execute(msg) => self.on_execute_order(msg),
            OrderEvent::Cancel(msg) => self.on_cancel_order(msg),
            OrderEvent::Delete(msg) => self.on_delete_order(msg),
            OrderEvent::Replace(msg) => self.on_replace_order(msg),
        }
    }

    pub fn on_add_order(&mut self, msg: &AddOrder) -> Result<(), BookError> {
        self.book_mut(msg.header.locate).learn_symbol(msg.stock);
        self.add_order(msg.reference, msg.header.locate, msg.side, msg.shares, msg.price)
    }

    /// Executions reduce at the order's resting price, never the execution price
    pub fn on_execute_order(&mut self, msg: &ExecuteOrder) -> Result<(), BookError> {
        self.reduce_order(msg.reference, msg.executed)
    }

    pub fn on_cancel_order(&mut self, msg: &CancelOrder) -> Result<(), BookError> {
        self.reduce_order(msg.reference, msg.canceled)
    }

    pub fn on_delete_order(&mut self, msg: &DeleteOrder) -> Result<(), BookError> {
        self.delete_order(msg.reference)
    }

    pub fn on_replace_order(&mut self, msg: &ReplaceOrder) -> Result<(), BookError> {
        self.replace_order(msg.original_reference, msg.new_reference, msg.shares, msg.price)
    }

    /// Rest a new order and add its quantity to the book
    pub fn add_order(
        &mut self,
        reference: u64,
        locate: u16,
        side: Side,
        quantity: u32,
        price: u32,
    ) -> Result<(), BookError> {
        self.book_mut(locate).insert(side, price, quantity);
        self.record(
            reference,
            Order {
                price,
                quantity,
                side,
                book: locate,
            },
        )
    }

    /// Partial or full reduction by execution or cancel
    pub fn reduce_order(&mut self, reference: u64, quantity: u32) -> Result<(), BookError> {
        let order = self
            .orders
            .get_mut(&reference)
            .ok_or(BookError::DanglingReference { reference })?;

        let reduced = quantity.min(order.quantity);
        order.quantity -= reduced;
        let Order {
            price, side, book, ..
        } = *order;
        if order.quantity == 0 {
            self.orders.remove(&reference);
        }

        self.reduce_book(book, side, price, reduced);
        Ok(())
    }

    /// Remove an order and all of its remaining quantity
    pub fn delete_order(&mut self, reference: u64) -> Result<(), BookError> {
        let order = self
            .orders
            .remove(&reference)
            .ok_or(BookError::DanglingReference { reference })?;
        self.reduce_book(order.book, order.side, order.price, order.quantity);
        Ok(())
    }

    /// Cancel `original` and rest its replacement on the same book and side
    pub fn replace_order(
        &mut self,
        original: u64,
        replacement: u64,
        quantity: u32,
        price: u32,
    ) -> Result<(), BookError> {
        let old = self
            .orders
            .remove(&original)
            .ok_or(BookError::DanglingReference {
                reference: original,
            })?;
        self.reduce_book(old.book, old.side, old.price, old.quantity);
        self.add_order(replacement, old.book, old.side, quantity, price)
    }

    fn record(&mut self, reference: u64, order: Order) -> Result<(), BookError> {
        let Some(previous) = self.orders.insert(reference, order) else {
            return Ok(());
        };

        match self.collision_policy {
            CollisionPolicy::Ignore => Ok(()),
            CollisionPolicy::Report => {
                warn!(
                    reference,
                    previous_book = previous.book,
                    previous_price = previous.price,
                    previous_quantity = previous.quantity,
                    "Order reference reused while live, unwinding previous order"
                );
                self.reduce_book(previous.book, previous.side, previous.price, previous.quantity);
                Err(BookError::ReferenceCollision { reference })
            }
        }
    }

    #[inline]
    fn reduce_book(&mut self, locate: u16, side: Side, price: u32, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if !self.book_mut(locate).reduce(side, price, quantity) {
            self.missing_levels += 1;
            debug!(locate, ?side, price, quantity, "No level at order price");
        }
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new()
    }
}
