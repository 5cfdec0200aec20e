//! Bounded history of saved search results.
//!
//! [`HistoryService`] owns the in-memory [`HistoryIndex`] and the durable
//! [`HistoryStore`] and keeps them in step: every tracked identifier has a
//! backing table and every request table is tracked.

pub mod config;
pub mod index;
pub mod store;

use std::path::Path;

use chrono::{DateTime, Utc};

pub use config::HistoryConfig;
pub use index::{HistoryIndex, IndexEntry};
pub use store::HistoryStore;

use crate::error::{HistoryError, Result};
use crate::render::{RenderedTheme, ThemeRenderer};
use crate::theme::{StoredTheme, ThemeRecord};

/// What a call to [`HistoryService::save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// History is disabled; nothing was written.
    Disabled,
    Inserted,
    /// Inserted, and the oldest entry was evicted to stay within capacity.
    Evicted(String),
}

/// The history cache: index, store, and the enabled switch.
///
/// All operations run synchronously on the caller's thread. Mutation goes
/// through `&mut self`, so sharing one service across threads needs an
/// external `Mutex`.
pub struct HistoryService {
    store: HistoryStore,
    index: HistoryIndex,
    enabled: bool,
}

impl HistoryService {
    /// Open the store at `path` and rebuild the index from its catalog.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or its catalog read.
    pub fn open(path: &Path, config: &HistoryConfig) -> Result<Self> {
        Self::with_store(HistoryStore::open(path)?, config)
    }

    /// # Errors
    /// Returns an error if the in-memory store cannot be created.
    pub fn open_in_memory(config: &HistoryConfig) -> Result<Self> {
        Self::with_store(HistoryStore::open_in_memory()?, config)
    }

    /// Wrap an existing store. Entries already in the catalog are tracked in
    /// save order; none are evicted, even if they exceed `config.capacity`.
    ///
    /// Tables left behind by a failed eviction are dropped again and never
    /// tracked. Catalog rows whose table is gone are removed.
    ///
    /// # Errors
    /// Returns an error if the catalog cannot be read.
    pub fn with_store(mut store: HistoryStore, config: &HistoryConfig) -> Result<Self> {
        purge_leaked(&mut store)?;

        let mut index = HistoryIndex::new(config.capacity);
        for entry in store.catalog()? {
            if store.table_exists(&entry.request_id)? {
                index.restore(entry);
                continue;
            }
            tracing::warn!(request_id = %entry.request_id, "catalog entry has no history table");
            if let Err(e) = store.forget(&entry.request_id) {
                tracing::warn!(
                    request_id = %entry.request_id,
                    error = %e,
                    "failed to remove catalog entry"
                );
            }
        }
        for orphan in store
            .request_tables()?
            .into_iter()
            .filter(|id| !index.contains(id))
        {
            tracing::warn!(request_id = %orphan, "history table is not tracked");
        }
        tracing::debug!(entries = index.len(), capacity = config.capacity, "history loaded");
        Ok(Self {
            store,
            index,
            enabled: config.enabled,
        })
    }

    /// Save the records of one search under `request_id`.
    ///
    /// Registration (and so the eviction decision) happens before the new
    /// table is written. If the write fails the registration is undone. If
    /// the evicted table cannot be dropped, the drop is retried once; the
    /// evicted identifier stays out of the index either way.
    ///
    /// # Errors
    /// - [`HistoryError::DuplicateTable`] if `request_id` is already saved;
    ///   nothing is changed.
    /// - [`HistoryError::TooManySwatches`] or a storage error if the insert
    ///   fails; nothing is changed.
    /// - [`HistoryError::EvictionLeak`] if the new entry was saved but the
    ///   evicted table is still present.
    pub fn save(&mut self, request_id: &str, records: &[ThemeRecord]) -> Result<SaveOutcome> {
        self.save_at(request_id, records, Utc::now())
    }

    /// [`save`](Self::save) with an explicit creation time.
    ///
    /// # Errors
    /// Same as [`save`](Self::save).
    pub fn save_at(
        &mut self,
        request_id: &str,
        records: &[ThemeRecord],
        created_at: DateTime<Utc>,
    ) -> Result<SaveOutcome> {
        if !self.enabled {
            tracing::debug!(request_id, "history disabled, not saving");
            return Ok(SaveOutcome::Disabled);
        }
        if self.index.contains(request_id) || self.store.table_exists(request_id)? {
            return Err(HistoryError::DuplicateTable(request_id.to_owned()));
        }

        let evicted = self.index.register(request_id, created_at);
        if let Err(e) = self
            .store
            .create_and_insert(request_id, created_at, records)
        {
            self.index.undo_register(request_id, evicted);
            return Err(e);
        }
        tracing::info!(request_id, records = records.len(), "saved history entry");

        let Some(evicted) = evicted else {
            return Ok(SaveOutcome::Inserted);
        };
        self.drop_evicted(&evicted.request_id)?;
        Ok(SaveOutcome::Evicted(evicted.request_id))
    }

    fn drop_evicted(&mut self, request_id: &str) -> Result<()> {
        let Err(first) = self.evict_from_store(request_id) else {
            tracing::info!(request_id, "evicted history entry");
            return Ok(());
        };
        tracing::warn!(request_id, error = %first, "failed to drop evicted entry, retrying");
        self.evict_from_store(request_id).map_err(|e| {
            tracing::error!(request_id, error = %e, "evicted history table leaked");
            HistoryError::EvictionLeak {
                evicted: request_id.to_owned(),
                source: Box::new(e),
            }
        })
    }

    fn evict_from_store(&mut self, request_id: &str) -> Result<()> {
        self.store.mark_evicted(request_id)?;
        self.store.drop_table(request_id)
    }

    /// Load the records saved under `request_id`.
    ///
    /// # Errors
    /// Returns [`HistoryError::TableNotFound`] if `request_id` is not tracked,
    /// or any error from [`HistoryStore::load_all`].
    pub fn load(&self, request_id: &str) -> Result<Vec<StoredTheme>> {
        if !self.index.contains(request_id) {
            return Err(HistoryError::TableNotFound(request_id.to_owned()));
        }
        self.store.load_all(request_id)
    }

    /// Load the entry at `position` in [`list_ids`](Self::list_ids) order.
    ///
    /// # Errors
    /// Returns [`HistoryError::TableNotFound`] if `position` is out of range,
    /// or any error from [`load`](Self::load).
    pub fn load_at(&self, position: usize) -> Result<Vec<StoredTheme>> {
        let entry = self
            .index
            .get(position)
            .ok_or_else(|| HistoryError::TableNotFound(format!("#{position}")))?;
        self.store.load_all(&entry.request_id)
    }

    /// Load an entry and attach the renderer's images to every theme.
    ///
    /// # Errors
    /// Same as [`load`](Self::load).
    pub fn load_rendered<R: ThemeRenderer>(
        &self,
        request_id: &str,
        renderer: &R,
    ) -> Result<Vec<RenderedTheme<R::Image>>> {
        Ok(self
            .load(request_id)?
            .into_iter()
            .map(|theme| RenderedTheme::render(theme, renderer))
            .collect())
    }

    /// Tracked identifiers, oldest first.
    pub fn list_ids(&self) -> Vec<String> {
        self.index.list_ids()
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &IndexEntry> {
        self.index.entries()
    }

    pub const fn capacity(&self) -> u32 {
        self.index.capacity()
    }

    /// Applies to later saves only; nothing is evicted now.
    pub const fn set_capacity(&mut self, capacity: u32) {
        self.index.set_capacity(capacity);
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub const fn store(&self) -> &HistoryStore {
        &self.store
    }
}

/// Retry the drop of every table whose eviction failed in an earlier save.
fn purge_leaked(store: &mut HistoryStore) -> Result<()> {
    for request_id in store.leaked()? {
        let purged = if store.table_exists(&request_id)? {
            store.drop_table(&request_id)
        } else {
            store.forget(&request_id)
        };
        match purged {
            Ok(()) => tracing::info!(request_id = %request_id, "dropped leaked history table"),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    "leaked history table still present"
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests_eviction;
