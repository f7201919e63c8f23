/// Price-level order book with per-order size attribution
///
/// Each side keeps its levels in a BTreeMap keyed by price, plus an index from
/// reference id to the price the order currently rests at. Every level knows
/// which orders make it up, and its aggregate size is always the sum of those
/// orders. Empty levels are removed as soon as their last order leaves.

use crate::protocol::Side;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

type PriceKey = OrderedFloat<f64>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("wrong message type: expected {expected}, got {actual}")]
    WrongMessageType { expected: &'static str, actual: String },

    #[error("unknown update action: {0}")]
    UnknownAction(String),

    #[error("reference id {ref_id} not found on {side} side")]
    RefIdNotFound { side: Side, ref_id: String },

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid value '{value}' for field {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("aggregate size overflow at {price} on {side} side")]
    SizeOverflow { side: Side, price: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderContribution {
    pub ref_id: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    price: f64,
    size: u64,
    // arrival order
    contributions: Vec<OrderContribution>,
}

impl PriceLevel {
    fn new(price: f64) -> Self {
        PriceLevel {
            price,
            size: 0,
            contributions: Vec::new(),
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Aggregate size of all orders at this price
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn contributions(&self) -> &[OrderContribution] {
        &self.contributions
    }

    pub fn contribution(&self, ref_id: &str) -> Option<&OrderContribution> {
        self.contributions.iter().find(|c| c.ref_id == ref_id)
    }

    pub fn order_count(&self) -> usize {
        self.contributions.len()
    }

    /// Aggregate the level would have with `ref_id` at `size`, None on overflow
    fn total_with(&self, ref_id: &str, size: u64) -> Option<u64> {
        self.contributions
            .iter()
            .filter(|c| c.ref_id != ref_id)
            .try_fold(size, |acc, c| acc.checked_add(c.size))
    }

    // `total` must come from `total_with` for the same ref_id and size
    fn upsert(&mut self, ref_id: &str, size: u64, total: u64) {
        match self.contributions.iter_mut().find(|c| c.ref_id == ref_id) {
            Some(c) => c.size = size,
            None => self.contributions.push(OrderContribution {
                ref_id: ref_id.to_string(),
                size,
            }),
        }
        self.size = total;
    }

    fn remove(&mut self, ref_id: &str) -> Option<OrderContribution> {
        let pos = self.contributions.iter().position(|c| c.ref_id == ref_id)?;
        let removed = self.contributions.remove(pos);
        self.size -= removed.size;
        Some(removed)
    }
}

/// One side of the book. Iteration is always best price first.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<PriceKey, PriceLevel>,
    // ref_id -> price of the level holding it
    index: HashMap<String, PriceKey>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        BookSide {
            side,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Add an order, or overwrite its size if it already rests at `price`.
    ///
    /// An order resting at a different price is moved, so a reference id never
    /// appears in two levels. Fails without touching the book if the level
    /// aggregate would overflow.
    pub fn new_entry(&mut self, ref_id: &str, price: f64, size: u64) -> Result<(), BookError> {
        let key = OrderedFloat(price);
        let total = self.checked_total(key, ref_id, size)?;

        if let Some(&old) = self.index.get(ref_id) {
            if old != key {
                tracing::debug!(side = %self.side, ref_id, from = old.0, to = price, "relocating existing order on new entry");
                self.remove_from_level(ref_id, old);
            }
        }

        self.levels
            .entry(key)
            .or_insert_with(|| PriceLevel::new(price))
            .upsert(ref_id, size, total);
        self.index.insert(ref_id.to_string(), key);
        Ok(())
    }

    pub fn delete_entry(&mut self, ref_id: &str) -> Result<OrderContribution, BookError> {
        let key = self.locate(ref_id)?;
        self.index.remove(ref_id);
        self.remove_from_level(ref_id, key)
            .ok_or_else(|| self.not_found(ref_id))
    }

    /// Update size and/or price of a resting order. A price change moves the
    /// order to the new level, keeping the (possibly just updated) size.
    pub fn change_entry(
        &mut self,
        ref_id: &str,
        price: Option<f64>,
        size: Option<u64>,
    ) -> Result<(), BookError> {
        let key = self.locate(ref_id)?;
        let current = self
            .levels
            .get(&key)
            .and_then(|l| l.contribution(ref_id))
            .map(|c| c.size)
            .ok_or_else(|| self.not_found(ref_id))?;
        let size = size.unwrap_or(current);

        match price.map(OrderedFloat) {
            Some(to) if to != key => self.new_entry(ref_id, to.0, size),
            _ => {
                let total = self.checked_total(key, ref_id, size)?;
                if let Some(level) = self.levels.get_mut(&key) {
                    level.upsert(ref_id, size, total);
                }
                Ok(())
            }
        }
    }

    fn checked_total(&self, key: PriceKey, ref_id: &str, size: u64) -> Result<u64, BookError> {
        match self.levels.get(&key) {
            Some(level) => level.total_with(ref_id, size),
            None => Some(size),
        }
        .ok_or(BookError::SizeOverflow {
            side: self.side,
            price: key.0,
        })
    }

    fn locate(&self, ref_id: &str) -> Result<PriceKey, BookError> {
        self.index
            .get(ref_id)
            .copied()
            .ok_or_else(|| self.not_found(ref_id))
    }

    fn not_found(&self, ref_id: &str) -> BookError {
        BookError::RefIdNotFound {
            side: self.side,
            ref_id: ref_id.to_string(),
        }
    }

    fn remove_from_level(&mut self, ref_id: &str, key: PriceKey) -> Option<OrderContribution> {
        let level = self.levels.get_mut(&key)?;
        let removed = level.remove(ref_id);
        if level.contributions.is_empty() {
            self.levels.remove(&key);
        }
        removed
    }

    /// Levels best price first: descending for bids, ascending for asks
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Bid => Box::new(self.levels.values().rev()),
            Side::Ask => Box::new(self.levels.values()),
        }
    }

    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels().next()
    }

    pub fn level(&self, price: f64) -> Option<&PriceLevel> {
        self.levels.get(&OrderedFloat(price))
    }

    /// Price of the level an order currently rests at
    pub fn price_of(&self, ref_id: &str) -> Option<f64> {
        self.index.get(ref_id).map(|k| k.0)
    }

    pub fn contains(&self, ref_id: &str) -> bool {
        self.index.contains_key(ref_id)
    }

    pub fn depth(&self, n: usize) -> Vec<(f64, u64)> {
        self.levels().take(n).map(|l| (l.price, l.size)).collect()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.index.clear();
    }
}

/// Order book - bid and ask sides built from the same feed
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
        }
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Get best bid price and size
    pub fn best_bid(&self) -> Option<(f64, u64)> {
        self.bids.best().map(|l| (l.price, l.size))
    }

    /// Get best ask price and size
    pub fn best_ask(&self) -> Option<(f64, u64)> {
        self.asks.best().map(|l| (l.price, l.size))
    }

    /// Best ask - best bid, None when a side is empty or the book is crossed
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) if bid < ask => Some(ask - bid),
            _ => None,
        }
    }

    /// Get market depth: top n levels on each side
    pub fn depth(&self, n: usize) -> BookDepth {
        BookDepth {
            bids: self.bids.depth(n),
            asks: self.asks.depth(n),
        }
    }

    pub fn order_count(&self) -> usize {
        self.bids.order_count() + self.asks.order_count()
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookDepth {
    pub bids: Vec<(f64, u64)>,
    pub asks: Vec<(f64, u64)>,
}
