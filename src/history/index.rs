use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// A tracked request identifier and when it was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub request_id: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory save order of history entries, oldest first.
///
/// The index never touches storage. It only decides which identifier has to
/// go when a new one pushes it past capacity; dropping the backing table is
/// the caller's job.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    entries: VecDeque<IndexEntry>,
    capacity: u32,
}

impl HistoryIndex {
    pub fn new(capacity: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append an entry. If that takes the index over capacity, the oldest
    /// entry is removed and returned.
    ///
    /// With capacity 0 the entry just registered is the one returned.
    pub fn register(
        &mut self,
        request_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Option<IndexEntry> {
        self.entries.push_back(IndexEntry {
            request_id: request_id.into(),
            created_at,
        });
        if self.entries.len() > self.capacity_usize() {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Revert a [`register`](Self::register) whose storage write failed.
    pub fn undo_register(&mut self, request_id: &str, evicted: Option<IndexEntry>) {
        if self
            .entries
            .back()
            .is_some_and(|e| e.request_id == request_id)
        {
            self.entries.pop_back();
        }
        if let Some(entry) = evicted
            && entry.request_id != request_id
        {
            self.entries.push_front(entry);
        }
    }

    /// Append an entry that already exists in storage, without evicting.
    pub(crate) fn restore(&mut self, entry: IndexEntry) {
        self.entries.push_back(entry);
    }

    /// Tracked identifiers, oldest first.
    pub fn list_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.request_id.clone()).collect()
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn get(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.entries.iter().any(|e| e.request_id == request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Takes effect on the next `register`; existing entries are kept even
    /// if they now exceed the new capacity.
    pub const fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
    }

    fn capacity_usize(&self) -> usize {
        usize::try_from(self.capacity).unwrap_or(usize::MAX)
    }
}
