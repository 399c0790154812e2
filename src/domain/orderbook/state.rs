//! Orderbook state containers — snapshot + delta reconciliation with sequence validation.

use super::wire::{WsBookData, WsBookLevel};
use super::BookLevel;
use crate::error::WsError;
use crate::shared::{Side, Symbol};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

// ─── OrderBookSide ───────────────────────────────────────────────────────────

/// One side of the book, keyed by price.
///
/// Iteration order follows the side: bids descending, asks ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookSide {
    side: Side,
    levels: BTreeMap<Decimal, Decimal>,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Upsert a level, or remove it when the quantity is zero (or negative).
    pub fn apply(&mut self, level: &WsBookLevel) {
        if level.qty <= Decimal::ZERO {
            self.levels.remove(&level.price);
        } else {
            self.levels.insert(level.price, level.qty);
        }
    }

    /// Levels in book order (best first).
    pub fn iter(&self) -> Box<dyn Iterator<Item = BookLevel> + '_> {
        let to_level = |(price, qty): (&Decimal, &Decimal)| BookLevel {
            price: *price,
            qty: *qty,
        };
        match self.side {
            Side::Buy => Box::new(self.levels.iter().rev().map(to_level)),
            Side::Sell => Box::new(self.levels.iter().map(to_level)),
        }
    }

    pub fn levels(&self) -> Vec<BookLevel> {
        self.iter().collect()
    }

    /// The best `n` levels.
    pub fn top(&self, n: usize) -> Vec<BookLevel> {
        self.iter().take(n).collect()
    }

    pub fn best(&self) -> Option<BookLevel> {
        self.iter().next()
    }

    pub fn qty_at(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&price).copied()
    }

    pub fn total_qty(&self) -> Decimal {
        self.levels.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

// ─── OrderBookState ──────────────────────────────────────────────────────────

/// Result of applying a delta to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// Levels were merged and the sequence baseline advanced.
    Applied,
    /// No snapshot has been applied yet; the delta was dropped.
    Discarded,
}

/// Live orderbook for one symbol.
///
/// Only two things mutate the levels: a full snapshot (which also resets the
/// sequence baseline) and a delta whose sequence is exactly `seq + 1`. A
/// delta that breaks the chain clears the book and leaves it not-ready until
/// the next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookState {
    pub symbol: Symbol,
    bids: OrderBookSide,
    asks: OrderBookSide,
    seq: u64,
    ready: bool,
    version: u64,
}

impl OrderBookState {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: OrderBookSide::new(Side::Buy),
            asks: OrderBookSide::new(Side::Sell),
            seq: 0,
            ready: false,
            version: 0,
        }
    }

    /// Replace the whole book and mark it ready.
    ///
    /// The sequence baseline becomes `seq`, or 0 when the backend sent none.
    pub fn apply_snapshot(&mut self, data: &WsBookData, seq: Option<u64>) {
        self.bids.clear();
        self.asks.clear();

        for level in &data.bids {
            self.bids.apply(level);
        }
        for level in &data.asks {
            self.asks.apply(level);
        }

        self.seq = seq.unwrap_or(0);
        self.ready = true;
        self.version += 1;
    }

    /// Merge an incremental update.
    ///
    /// A delta without a sequence number is taken as the next one in the
    /// chain. On a gap the book is cleared and `WsError::SequenceGap` is
    /// returned; the caller is expected to fetch a fresh snapshot.
    pub fn apply_delta(
        &mut self,
        data: &WsBookData,
        seq: Option<u64>,
    ) -> Result<DeltaOutcome, WsError> {
        if !self.ready {
            return Ok(DeltaOutcome::Discarded);
        }

        let expected = self.seq + 1;
        let received = seq.unwrap_or(expected);
        if received != expected {
            self.reset();
            return Err(WsError::SequenceGap { expected, received });
        }

        for level in &data.bids {
            self.bids.apply(level);
        }
        for level in &data.asks {
            self.asks.apply(level);
        }

        self.seq = received;
        self.version += 1;
        Ok(DeltaOutcome::Applied)
    }

    /// Drop all levels and wait for the next snapshot.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.seq = 0;
        self.ready = false;
        self.version += 1;
    }

    pub fn bids(&self) -> &OrderBookSide {
        &self.bids
    }

    pub fn asks(&self) -> &OrderBookSide {
        &self.asks
    }

    /// Last applied sequence number (the baseline for the next delta).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether a snapshot has been applied since the last reset.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Local counter bumped on every mutation, including resets.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.best()
    }

    /// Mid price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::from(2)),
            _ => None,
        }
    }

    /// Spread between best ask and best bid.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Top `n` levels per side, as a dashboard would render them.
    pub fn depth(&self, n: usize) -> (Vec<BookLevel>, Vec<BookLevel>) {
        (self.bids.top(n), self.asks.top(n))
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(bids: &[(i64, i64)], asks: &[(i64, i64)]) -> WsBookData {
        WsBookData {
            bids: bids.iter().map(|&(p, q)| WsBookLevel::new(p, q)).collect(),
            asks: asks.iter().map(|&(p, q)| WsBookLevel::new(p, q)).collect(),
        }
    }

    fn ready_book() -> OrderBookState {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        state.apply_snapshot(&book(&[(100, 5)], &[(101, 3)]), None);
        state
    }

    #[test]
    fn test_snapshot_replaces_state() {
        let mut state = ready_book();
        assert!(state.is_ready());
        assert_eq!(state.seq(), 0);

        state.apply_snapshot(&book(&[(99, 20)], &[(102, 8)]), Some(40));
        assert_eq!(state.bids().len(), 1);
        assert_eq!(state.asks().len(), 1);
        assert_eq!(state.best_bid().unwrap().price, Decimal::from(99));
        assert_eq!(state.best_ask().unwrap().price, Decimal::from(102));
        assert_eq!(state.seq(), 40);
    }

    #[test]
    fn test_snapshot_skips_zero_levels() {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        state.apply_snapshot(&book(&[(100, 0), (99, 2)], &[]), Some(3));
        assert_eq!(state.bids().len(), 1);
        assert_eq!(state.best_bid().unwrap().price, Decimal::from(99));
    }

    #[test]
    fn test_zero_qty_delta_removes_level() {
        let mut state = ready_book();
        let outcome = state.apply_delta(&book(&[(100, 0)], &[]), Some(1)).unwrap();

        assert_eq!(outcome, DeltaOutcome::Applied);
        assert!(state.bids().is_empty());
        assert_eq!(state.asks().levels(), vec![BookLevel {
            price: Decimal::from(101),
            qty: Decimal::from(3),
        }]);
        assert_eq!(state.seq(), 1);
    }

    #[test]
    fn test_readded_level_sorts_correctly() {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        state.apply_snapshot(&book(&[(100, 1), (98, 1)], &[(101, 1), (103, 1)]), Some(0));
        state.apply_delta(&book(&[(100, 0)], &[(101, 0)]), Some(1)).unwrap();
        state.apply_delta(&book(&[(100, 4), (99, 2)], &[(101, 6), (102, 1)]), Some(2)).unwrap();

        let bid_prices: Vec<_> = state.bids().iter().map(|l| l.price).collect();
        let ask_prices: Vec<_> = state.asks().iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![Decimal::from(100), Decimal::from(99), Decimal::from(98)]);
        assert_eq!(ask_prices, vec![Decimal::from(101), Decimal::from(102), Decimal::from(103)]);
        assert_eq!(state.bids().qty_at(Decimal::from(100)), Some(Decimal::from(4)));
    }

    #[test]
    fn test_delta_before_snapshot_is_discarded() {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        let outcome = state.apply_delta(&book(&[(100, 5)], &[]), Some(1)).unwrap();
        assert_eq!(outcome, DeltaOutcome::Discarded);
        assert!(state.is_empty());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_gap_resets_book() {
        let mut state = ready_book();
        let err = state.apply_delta(&book(&[(99, 1)], &[]), Some(3)).unwrap_err();

        assert_eq!(err, WsError::SequenceGap {
            expected: 1,
            received: 3
        });
        assert!(state.is_empty());
        assert!(!state.is_ready());

        // Further deltas wait for a snapshot.
        let outcome = state.apply_delta(&book(&[(99, 1)], &[]), Some(4)).unwrap();
        assert_eq!(outcome, DeltaOutcome::Discarded);
        assert!(state.is_empty());
    }

    #[test]
    fn test_duplicate_seq_is_a_gap() {
        let mut state = ready_book();
        state.apply_delta(&book(&[(99, 1)], &[]), Some(1)).unwrap();
        assert!(state.apply_delta(&book(&[(98, 1)], &[]), Some(1)).is_err());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_delta_without_seq_advances_locally() {
        let mut state = ready_book();
        state.apply_delta(&book(&[(99, 1)], &[]), None).unwrap();
        state.apply_delta(&book(&[(98, 1)], &[]), None).unwrap();
        assert_eq!(state.seq(), 2);
        assert_eq!(state.bids().len(), 3);
    }

    #[test]
    fn test_version_bumps_on_every_mutation() {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        assert_eq!(state.version(), 0);
        state.apply_snapshot(&book(&[(100, 5)], &[]), None);
        state.apply_delta(&book(&[(100, 6)], &[]), Some(1)).unwrap();
        state.reset();
        assert_eq!(state.version(), 3);
    }

    #[test]
    fn test_mid_price_spread_and_depth() {
        let mut state = OrderBookState::new(Symbol::from("AAPL"));
        state.apply_snapshot(
            &book(&[(50, 10), (49, 1), (48, 1)], &[(52, 5), (53, 1)]),
            Some(7),
        );
        assert_eq!(state.mid_price(), Some(Decimal::from(51)));
        assert_eq!(state.spread(), Some(Decimal::from(2)));

        let (bids, asks) = state.depth(2);
        assert_eq!(bids.len(), 2);
        assert_eq!(asks.len(), 2);
        assert_eq!(bids[0].price, Decimal::from(50));
        assert_eq!(state.bids().total_qty(), Decimal::from(12));
    }
}
