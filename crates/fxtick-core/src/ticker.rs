//! Ticker table

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::{Deferred, TickerId};

/// One per-frame registration
#[derive(Debug)]
pub struct TickerRecord<T> {
    pub callback: Rc<T>,
    /// Result of the previous invocation that has not settled yet. While
    /// set, the ticker is skipped.
    pub pending: Option<Deferred>,
}

impl<T> TickerRecord<T> {
    pub fn new(callback: T) -> Self {
        Self {
            callback: Rc::new(callback),
            pending: None,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }
}

/// Live tickers keyed by id, iterated in registration order
#[derive(Debug)]
pub struct TickerTable<T> {
    tickers: BTreeMap<TickerId, TickerRecord<T>>,
}

impl<T> TickerTable<T> {
    pub fn new() -> Self {
        Self { tickers: BTreeMap::new() }
    }

    pub fn insert(&mut self, id: TickerId, record: TickerRecord<T>) {
        self.tickers.insert(id, record);
    }

    pub fn remove(&mut self, id: TickerId) -> Option<TickerRecord<T>> {
        self.tickers.remove(&id)
    }

    pub fn get(&self, id: TickerId) -> Option<&TickerRecord<T>> {
        self.tickers.get(&id)
    }

    pub fn get_mut(&mut self, id: TickerId) -> Option<&mut TickerRecord<T>> {
        self.tickers.get_mut(&id)
    }

    pub fn snapshot(&self) -> Vec<TickerId> {
        self.tickers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn clear(&mut self) {
        self.tickers.clear();
    }
}

impl<T> Default for TickerTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred;

    #[test]
    fn test_suspension_follows_pending() {
        let mut table = TickerTable::new();
        let id = TickerId::from_raw(1);
        table.insert(id, TickerRecord::new(()));
        assert!(!table.get(id).unwrap().is_suspended());

        let (pending, _settler) = deferred();
        table.get_mut(id).unwrap().pending = Some(pending);
        assert!(table.get(id).unwrap().is_suspended());
    }
}
