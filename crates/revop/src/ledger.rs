#![forbid(unsafe_code)]

//! Cursor-addressed history of applied operations.
//!
//! [`Ledger`] stores entries in submission order with a cursor splitting
//! them into an undoable prefix and a redoable suffix. It never touches a
//! receiver: `undo`/`redo` only select the entry to replay and move the
//! cursor, and the caller performs the effect.
//!
//! # Invariants
//!
//! 1. `cursor <= len` (after any operation)
//! 2. `total_bytes` always equals the sum of `size_bytes()` for retained entries
//! 3. `len() <= config.max_depth` (after any operation)
//! 4. `record` drops the whole redo suffix before appending
//! 5. Every entry was applied from the state its predecessor left behind:
//!    eviction only removes the oldest undoable entries or the newest
//!    redoable ones
//! 6. `total_bytes <= config.max_bytes` unless a single retained entry
//!    alone exceeds the budget
//!
//! # Memory Model
//!
//! Entries live in a `VecDeque` for O(1) eviction at both ends. Limits drop
//! the redo suffix from the back first, then undoable entries from the
//! front; the cursor shifts with front evictions.
//!
//! ```text
//! record(e1..e5)
//! ┌────────────────────────────────────────────┐
//! │ [e1, e2, e3, e4, e5]                       │
//! │                     ^ cursor = 5           │
//! └────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌────────────────────────────────────────────┐
//! │ [e1, e2, e3, e4, e5]                       │
//! │             ^ cursor = 3                   │
//! └────────────────────────────────────────────┘
//!
//! record(e6)  <-- drops e4, e5
//! ┌────────────────────────────────────────────┐
//! │ [e1, e2, e3, e6]                           │
//! │                 ^ cursor = 4               │
//! └────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

#[cfg(feature = "config-files")]
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Memory accounting for ledger entries.
pub trait Footprint {
    /// Approximate size in bytes.
    fn size_bytes(&self) -> usize;
}

/// Capacity bounds for the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-files", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-files", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of retained entries.
    pub max_depth: usize,
    /// Maximum total bytes for all retained entries (0 = unlimited).
    pub max_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl HistoryConfig {
    /// Create a configuration with custom limits.
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
        }
    }

    /// No depth or byte limit (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
        }
    }

    /// Validation errors; empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_depth == 0 {
            errors.push("history.max_depth must be at least 1".to_string());
        }
        errors
    }
}

/// Ordered record of applied entries with an undo/redo cursor.
pub struct Ledger<T> {
    /// Entries in submission order.
    entries: VecDeque<T>,
    /// Boundary between undoable (`..cursor`) and redoable (`cursor..`).
    cursor: usize,
    config: HistoryConfig,
    /// Sum of `size_bytes()` over `entries`.
    total_bytes: usize,
    /// Entries dropped by capacity limits since construction.
    evicted: u64,
}

impl<T> fmt::Debug for Ledger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("undo_depth", &self.undo_depth())
            .field("redo_depth", &self.redo_depth())
            .field("total_bytes", &self.total_bytes)
            .field("evicted", &self.evicted)
            .field("config", &self.config)
            .finish()
    }
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<T> Ledger<T> {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            config,
            total_bytes: 0,
            evicted: 0,
        }
    }

    /// Step the cursor back and return the entry to reverse.
    ///
    /// The caller invokes the inverse effect.
    pub fn undo(&mut self) -> Result<&mut T, LedgerError> {
        if self.cursor == 0 {
            return Err(LedgerError::EmptyHistory);
        }
        self.cursor -= 1;
        self.entries
            .get_mut(self.cursor)
            .ok_or(LedgerError::EmptyHistory)
    }

    /// Return the entry at the cursor and step past it.
    ///
    /// The caller invokes the forward effect.
    pub fn redo(&mut self) -> Result<&mut T, LedgerError> {
        if self.cursor >= self.entries.len() {
            return Err(LedgerError::NothingToRedo);
        }
        let index = self.cursor;
        self.cursor += 1;
        self.entries
            .get_mut(index)
            .ok_or(LedgerError::NothingToRedo)
    }

    /// Drop every entry and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.total_bytes = 0;
    }

    /// Put the cursor back where a failed replay found it.
    pub(crate) fn reset_cursor(&mut self, cursor: usize) {
        debug_assert!(cursor <= self.entries.len());
        self.cursor = cursor.min(self.entries.len());
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Entries before the cursor.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Entries at or after the cursor.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of retained entries.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    /// Entries evicted by capacity limits since construction.
    #[must_use]
    pub fn evicted_total(&self) -> u64 {
        self.evicted
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Undoable entries, most recent first.
    pub fn iter_undoable(&self) -> impl Iterator<Item = &T> {
        self.entries.range(..self.cursor).rev()
    }

    /// Redoable entries, next redo first.
    pub fn iter_redoable(&self) -> impl Iterator<Item = &T> {
        self.entries.range(self.cursor..)
    }
}

impl<T: Footprint> Ledger<T> {
    /// Append an already-applied entry after the cursor.
    ///
    /// Drops the redo suffix, then evicts from the front until both limits
    /// hold. The new entry itself is kept even when it alone exceeds the
    /// byte budget. Returns the number of entries evicted.
    pub fn record(&mut self, entry: T) -> usize {
        self.truncate_redo();
        self.total_bytes += entry.size_bytes();
        self.entries.push_back(entry);
        self.cursor = self.entries.len();
        self.enforce_limits()
    }

    /// Replace the limits, evicting immediately if the new ones are tighter.
    ///
    /// Redo entries are dropped before undoable ones.
    pub fn set_config(&mut self, config: HistoryConfig) -> usize {
        self.config = config;
        self.enforce_limits()
    }

    fn truncate_redo(&mut self) {
        for entry in self.entries.drain(self.cursor..) {
            self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        }
    }

    /// Evict until both limits hold. Returns the number of entries dropped.
    ///
    /// Redo entries go first, newest first, so the redo suffix always
    /// continues from the cursor. Undoable entries go oldest first. The byte
    /// budget never evicts the most recent undoable entry.
    fn enforce_limits(&mut self) -> usize {
        let mut evicted = 0;

        while self.entries.len() > self.config.max_depth {
            if !self.drop_newest_redo() && !self.evict_oldest() {
                break;
            }
            evicted += 1;
        }

        if self.config.max_bytes > 0 {
            while self.total_bytes > self.config.max_bytes {
                if self.drop_newest_redo() {
                    evicted += 1;
                    continue;
                }
                if self.cursor <= 1 || !self.evict_oldest() {
                    break;
                }
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::debug!(
                target: "revop.ledger",
                evicted,
                retained = self.entries.len(),
                total_bytes = self.total_bytes,
                "history limit reached, oldest entries evicted"
            );
        }
        evicted
    }

    fn drop_newest_redo(&mut self) -> bool {
        if self.cursor >= self.entries.len() {
            return false;
        }
        let Some(entry) = self.entries.pop_back() else {
            return false;
        };
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        self.evicted += 1;
        true
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(entry) = self.entries.pop_front() else {
            return false;
        };
        self.total_bytes = self.total_bytes.saturating_sub(entry.size_bytes());
        self.cursor = self.cursor.saturating_sub(1);
        self.evicted += 1;
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Entry(&'static str, usize);

    impl Footprint for Entry {
        fn size_bytes(&self) -> usize {
            self.1
        }
    }

    fn filled(names: &[&'static str]) -> Ledger<Entry> {
        let mut ledger = Ledger::new(HistoryConfig::unlimited());
        for name in names {
            ledger.record(Entry(name, 10));
        }
        ledger
    }

    fn names<'a>(it: impl Iterator<Item = &'a Entry>) -> Vec<&'static str> {
        it.map(|e| e.0).collect()
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger: Ledger<Entry> = Ledger::default();
        assert!(ledger.is_empty());
        assert_eq!(ledger.cursor(), 0);
        assert!(!ledger.can_undo());
        assert!(!ledger.can_redo());
    }

    #[test]
    fn undo_returns_entry_before_cursor() {
        let mut ledger = filled(&["a", "b"]);
        assert_eq!(ledger.undo().unwrap().0, "b");
        assert_eq!(ledger.cursor(), 1);
        assert_eq!(ledger.undo().unwrap().0, "a");
        assert_eq!(ledger.undo().unwrap_err(), LedgerError::EmptyHistory);
        assert_eq!(ledger.cursor(), 0);
    }

    #[test]
    fn redo_returns_entry_at_cursor() {
        let mut ledger = filled(&["a", "b"]);
        ledger.undo().unwrap();
        ledger.undo().unwrap();
        assert_eq!(ledger.redo().unwrap().0, "a");
        assert_eq!(ledger.redo().unwrap().0, "b");
        assert_eq!(ledger.redo().unwrap_err(), LedgerError::NothingToRedo);
        assert_eq!(ledger.cursor(), 2);
    }

    #[test]
    fn record_after_undo_truncates_tail() {
        let mut ledger = filled(&["a", "b", "c"]);
        ledger.undo().unwrap();
        ledger.undo().unwrap();
        ledger.record(Entry("d", 10));

        assert_eq!(names(ledger.iter_undoable()), vec!["d", "a"]);
        assert_eq!(ledger.redo_depth(), 0);
        assert_eq!(ledger.memory_usage(), 20);
        assert_eq!(ledger.redo().unwrap_err(), LedgerError::NothingToRedo);
    }

    #[test]
    fn iterators_split_at_cursor() {
        let mut ledger = filled(&["a", "b", "c", "d"]);
        ledger.undo().unwrap();
        ledger.undo().unwrap();
        assert_eq!(names(ledger.iter_undoable()), vec!["b", "a"]);
        assert_eq!(names(ledger.iter_redoable()), vec!["c", "d"]);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut ledger = Ledger::new(HistoryConfig::new(3, 0));
        let mut evicted = 0;
        for name in ["a", "b", "c", "d", "e"] {
            evicted += ledger.record(Entry(name, 1));
        }
        assert_eq!(evicted, 2);
        assert_eq!(ledger.evicted_total(), 2);
        assert_eq!(ledger.undo_depth(), 3);
        assert_eq!(names(ledger.iter_undoable()), vec!["e", "d", "c"]);
    }

    #[test]
    fn byte_limit_evicts_oldest() {
        let mut ledger = Ledger::new(HistoryConfig::new(100, 25));
        ledger.record(Entry("a", 10));
        ledger.record(Entry("b", 10));
        ledger.record(Entry("c", 10));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.memory_usage(), 20);
        assert_eq!(names(ledger.iter_undoable()), vec!["c", "b"]);
    }

    #[test]
    fn oversized_entry_stays_undoable() {
        let mut ledger = Ledger::new(HistoryConfig::new(100, 25));
        ledger.record(Entry("a", 10));
        ledger.record(Entry("b", 10));
        assert_eq!(ledger.record(Entry("huge", 50)), 2);
        assert_eq!(names(ledger.iter_undoable()), vec!["huge"]);
        assert_eq!(ledger.memory_usage(), 50);
        assert_eq!(ledger.undo().unwrap().0, "huge");
    }

    #[test]
    fn oversized_entry_is_evicted_by_the_next_record() {
        let mut ledger = Ledger::new(HistoryConfig::new(100, 25));
        ledger.record(Entry("huge", 50));
        assert_eq!(ledger.record(Entry("c", 10)), 1);
        assert_eq!(names(ledger.iter_undoable()), vec!["c"]);
        assert_eq!(ledger.memory_usage(), 10);
    }

    #[test]
    fn clear_resets_everything_but_eviction_count() {
        let mut ledger = Ledger::new(HistoryConfig::new(1, 0));
        ledger.record(Entry("a", 1));
        ledger.record(Entry("b", 1));
        ledger.undo().unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.cursor(), 0);
        assert_eq!(ledger.memory_usage(), 0);
        assert_eq!(ledger.evicted_total(), 1);
    }

    #[test]
    fn tighter_config_evicts_immediately() {
        let mut ledger = filled(&["a", "b", "c", "d"]);
        assert_eq!(ledger.set_config(HistoryConfig::new(2, 0)), 2);
        assert_eq!(names(ledger.iter_undoable()), vec!["d", "c"]);
    }

    #[test]
    fn tighter_depth_drops_redo_tail_from_the_back() {
        let mut ledger = filled(&["a", "b", "c", "d"]);
        for _ in 0..4 {
            ledger.undo().unwrap();
        }
        assert_eq!(ledger.set_config(HistoryConfig::new(2, 0)), 2);
        assert_eq!(ledger.cursor(), 0);
        assert_eq!(names(ledger.iter_redoable()), vec!["a", "b"]);
        assert_eq!(ledger.redo().unwrap().0, "a");
        assert_eq!(ledger.redo().unwrap().0, "b");
        assert_eq!(ledger.redo().unwrap_err(), LedgerError::NothingToRedo);
    }

    #[test]
    fn tighter_depth_empties_redo_before_touching_undo() {
        let mut ledger = filled(&["a", "b", "c", "d"]);
        ledger.undo().unwrap();
        ledger.undo().unwrap();
        assert_eq!(ledger.set_config(HistoryConfig::new(1, 0)), 3);
        assert_eq!(names(ledger.iter_undoable()), vec!["b"]);
        assert_eq!(ledger.redo_depth(), 0);
        assert_eq!(ledger.memory_usage(), 10);
    }

    #[test]
    fn byte_budget_drops_redo_tail_first() {
        let mut ledger = filled(&["a", "b", "c", "d"]);
        ledger.undo().unwrap();
        ledger.undo().unwrap();
        assert_eq!(ledger.set_config(HistoryConfig::new(100, 30)), 1);
        assert_eq!(names(ledger.iter_undoable()), vec!["b", "a"]);
        assert_eq!(names(ledger.iter_redoable()), vec!["c"]);

        assert_eq!(ledger.set_config(HistoryConfig::new(100, 10)), 2);
        assert_eq!(names(ledger.iter_undoable()), vec!["b"]);
        assert_eq!(ledger.redo_depth(), 0);
    }

    #[test]
    fn reset_cursor_restores_position() {
        let mut ledger = filled(&["a", "b"]);
        let before = ledger.cursor();
        ledger.undo().unwrap();
        ledger.reset_cursor(before);
        assert_eq!(ledger.cursor(), 2);
    }

    #[test]
    fn config_default_and_validation() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_empty());
        assert_eq!(HistoryConfig::new(0, 0).validate().len(), 1);
    }

    #[test]
    fn debug_impl() {
        let ledger = filled(&["a"]);
        let debug_str = format!("{ledger:?}");
        assert!(debug_str.contains("Ledger"));
        assert!(debug_str.contains("undo_depth"));
    }
}
