use crate::network::common::errors::NetworkResult;
use log::trace;
use std::collections::HashMap;

/// What the memo keeps for one ordered pair of people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub value: usize,
    pub trace_name: String,
}

/// Realization-scoped memo of connection draws, keyed by the ordered pair
/// `(from, to)`. It must be reset before a realization constructs anything and is
/// never shared between realizations running at the same time.
#[derive(Debug, Default)]
pub struct ConnectionMemo {
    entries: HashMap<(u64, u64), ConnectionEntry>,
    hits: usize,
    misses: usize,
    resets: u64,
}

impl ConnectionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the memo for the next realization.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
        self.resets += 1;
    }

    /// Returns the stored entry for `(from, to)`, calling `factory` to draw it
    /// only when the pair has not been seen in this realization.
    pub fn get_or_create<F>(&mut self, from: u64, to: u64, factory: F) -> NetworkResult<ConnectionEntry>
    where
        F: FnOnce() -> NetworkResult<ConnectionEntry>,
    {
        if let Some(entry) = self.entries.get(&(from, to)) {
            self.hits += 1;
            trace!("memo hit for ({}, {}) -> {}", from, to, entry.trace_name);
            return Ok(entry.clone());
        }
        let entry = factory()?;
        self.misses += 1;
        self.entries.insert((from, to), entry.clone());
        Ok(entry)
    }

    pub fn get(&self, from: u64, to: u64) -> Option<&ConnectionEntry> {
        self.entries.get(&(from, to))
    }

    pub fn contains(&self, from: u64, to: u64) -> bool {
        self.entries.contains_key(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Number of realizations this memo has served.
    pub fn resets(&self) -> u64 {
        self.resets
    }
}
