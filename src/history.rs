//! In-memory command history with `!!` / `!n` recall.
//!
//! The store keeps the most recent lines up to a fixed capacity and forgets the
//! oldest one when a new line arrives at capacity. Ordinals shown to the user are
//! 1-based positions within what is currently kept.

use crate::error::ShellError;
use std::collections::VecDeque;
use std::fmt;

/// Number of lines kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// A recorded line together with its 1-based position in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    pub ordinal: usize,
    pub text: &'a str,
}

impl fmt::Display for HistoryEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ordinal, self.text)
    }
}

/// A parsed recall request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallSelector {
    /// `!!`
    Last,
    /// `!n`, 1-based.
    Nth(usize),
}

impl RecallSelector {
    /// Recognize recall syntax. Anything that is not exactly `!!` or `!` followed by
    /// digits is an ordinary command line and yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        if line == "!!" {
            return Some(RecallSelector::Last);
        }
        let digits = line.strip_prefix('!')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Ordinals too large for usize can never match an entry.
        Some(RecallSelector::Nth(digits.parse().unwrap_or(usize::MAX)))
    }
}

/// Fixed-capacity FIFO of previously executed lines.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// Create an empty store keeping at most `capacity` lines (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `line`, evicting the oldest entry when the store is full.
    pub fn record(&mut self, line: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
    }

    /// Entries in recording order with 1-based ordinals.
    ///
    /// The iterator borrows the store, so calling `display` again restarts it.
    pub fn display(&self) -> impl Iterator<Item = HistoryEntry<'_>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, text)| HistoryEntry {
                ordinal: idx + 1,
                text,
            })
    }

    /// Text of the entry the selector points to.
    pub fn recall(&self, selector: RecallSelector) -> Result<&str, ShellError> {
        match selector {
            RecallSelector::Last => self
                .entries
                .back()
                .map(String::as_str)
                .ok_or(ShellError::EmptyHistory),
            RecallSelector::Nth(n) => n
                .checked_sub(1)
                .and_then(|idx| self.entries.get(idx))
                .map(String::as_str)
                .ok_or(ShellError::NoSuchEntry(n)),
        }
    }
}
