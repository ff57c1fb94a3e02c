use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::types::Snapshot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("snapshot at {incoming} is older than the latest held ({latest})")]
    OutOfOrder {
        latest: DateTime<Utc>,
        incoming: DateTime<Utc>,
    },
}

/// Bounded FIFO of one instrument's most recent snapshots, oldest first.
#[derive(Clone, Debug)]
pub struct RollingHistory {
    values: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RollingHistory {
    /// A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `snapshot`, evicting and returning the oldest entry when full.
    ///
    /// Timestamps must be non-decreasing; an older snapshot is rejected and
    /// the history is left untouched.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<Option<Snapshot>, HistoryError> {
        if let Some(latest) = self.values.back() {
            if snapshot.timestamp < latest.timestamp {
                return Err(HistoryError::OutOfOrder {
                    latest: latest.timestamp,
                    incoming: snapshot.timestamp,
                });
            }
        }

        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(snapshot);

        Ok(evicted)
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.values.back()
    }

    /// The entry just before [`Self::latest`].
    pub fn previous(&self) -> Option<&Snapshot> {
        self.values.len().checked_sub(2).and_then(|i| self.values.get(i))
    }

    /// Every entry except the latest, oldest first.
    pub fn prior(&self) -> impl DoubleEndedIterator<Item = &Snapshot> {
        let n = self.values.len().saturating_sub(1);
        self.values.iter().take(n)
    }

    /// Every entry, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Snapshot> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
