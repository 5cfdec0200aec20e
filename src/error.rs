/// Errors raised by the history index, store, and swatch codec.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A table for this request identifier already exists.
    #[error("history entry already exists: {0}")]
    DuplicateTable(String),

    /// No table backs this request identifier. The index and the store
    /// have drifted apart; callers should treat this as an internal fault.
    #[error("history entry not found: {0}")]
    TableNotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a theme holds at most {max} swatches, got {0}", max = crate::swatch::MAX_SWATCHES)]
    TooManySwatches(usize),

    #[error("stored swatch in slot {slot} is not a colour code: {value:?}")]
    CorruptSwatch { slot: usize, value: String },

    #[error("stored timestamp is not RFC 3339: {0:?}")]
    InvalidTimestamp(String),

    /// The new entry was saved but the evicted table could not be dropped.
    /// The evicted identifier is no longer tracked by the index.
    #[error("saved, but failed to drop evicted entry {evicted}: {source}")]
    EvictionLeak {
        evicted: String,
        #[source]
        source: Box<Self>,
    },
}

pub type Result<T> = std::result::Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_table_message_names_request() {
        let err = HistoryError::DuplicateTable("catA".to_string());
        assert_eq!(err.to_string(), "history entry already exists: catA");
    }

    #[test]
    fn too_many_swatches_mentions_limit() {
        let err = HistoryError::TooManySwatches(7);
        assert_eq!(err.to_string(), "a theme holds at most 5 swatches, got 7");
    }

    #[test]
    fn eviction_leak_exposes_source() {
        let err = HistoryError::EvictionLeak {
            evicted: "old".to_string(),
            source: Box::new(HistoryError::TableNotFound("old".to_string())),
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("history entry not found: old"));
    }
}
