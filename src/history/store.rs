use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use super::index::IndexEntry;
use crate::error::{HistoryError, Result};
use crate::swatch::{self, Slots};
use crate::theme::{StoredTheme, ThemeRecord};

/// Physical table names are this prefix plus the lowercase hex of the
/// identifier's UTF-8 bytes. SQLite folds ASCII case in table names, so the
/// raw identifier cannot be used.
const TABLE_PREFIX: &str = "theme_";

/// Durable storage with one table per saved request.
///
/// Alongside the request tables, `history_catalog` keeps the identifier and
/// save time of each entry so the index can be rebuilt when the store is
/// reopened. A request table and its catalog row are always created and
/// dropped in the same transaction. An entry being evicted is flagged in the
/// catalog first, so a table whose drop failed is never tracked again.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open or create the store at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the DB cannot be
    /// opened, or the catalog schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened history store");
        Self::with_connection(conn)
    }

    /// # Errors
    /// Returns an error if the catalog schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS history_catalog (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT    NOT NULL UNIQUE,
                created_at TEXT    NOT NULL,
                evicted    INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(Self { conn })
    }

    /// Whether a table backs `request_id`.
    ///
    /// # Errors
    /// Returns an error if the schema query fails.
    pub fn table_exists(&self, request_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table_name(request_id)],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the table for `request_id` and insert one row per record, in order.
    ///
    /// Swatches are encoded before anything is written, and the table, its
    /// rows and the catalog row are committed together.
    ///
    /// # Errors
    /// Returns [`HistoryError::DuplicateTable`] if the table already exists,
    /// [`HistoryError::TooManySwatches`] if a record cannot be encoded, or a
    /// storage error if any statement fails.
    pub fn create_and_insert(
        &mut self,
        request_id: &str,
        created_at: DateTime<Utc>,
        records: &[ThemeRecord],
    ) -> Result<()> {
        let encoded = records
            .iter()
            .map(|r| swatch::encode(&r.swatches).map(|slots| (r, slots)))
            .collect::<Result<Vec<_>>>()?;

        if self.table_exists(request_id)? {
            return Err(HistoryError::DuplicateTable(request_id.to_owned()));
        }

        let table = quoted_table(request_id);
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE TABLE {table} (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                title     TEXT NOT NULL,
                author    TEXT NOT NULL,
                edited_at TEXT NOT NULL,
                rating    TEXT NOT NULL,
                color0    TEXT,
                color1    TEXT,
                color2    TEXT,
                color3    TEXT,
                color4    TEXT
            );"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table}
                    (title, author, edited_at, rating,
                     color0, color1, color2, color3, color4)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ))?;
            for (record, [c0, c1, c2, c3, c4]) in &encoded {
                stmt.execute(params![
                    record.title,
                    record.author,
                    record.edited_at,
                    record.rating,
                    c0,
                    c1,
                    c2,
                    c3,
                    c4,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO history_catalog (request_id, created_at) VALUES (?1, ?2)",
            params![request_id, created_at.to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::debug!(request_id, rows = records.len(), "created history table");
        Ok(())
    }

    /// Read every record saved for `request_id`, in insertion order.
    ///
    /// # Errors
    /// Returns [`HistoryError::TableNotFound`] if no table backs `request_id`,
    /// [`HistoryError::CorruptSwatch`] if a stored colour cannot be decoded,
    /// or a storage error if the query fails.
    pub fn load_all(&self, request_id: &str) -> Result<Vec<StoredTheme>> {
        self.read_rows(request_id)?
            .into_iter()
            .map(|(record, slots)| -> Result<StoredTheme> {
                Ok(StoredTheme::new(record, swatch::decode(&slots)?))
            })
            .collect()
    }

    /// The undecoded `color0..color4` columns of every row, in insertion order.
    ///
    /// # Errors
    /// Same as [`load_all`](Self::load_all), minus decoding.
    pub fn raw_slots(&self, request_id: &str) -> Result<Vec<Slots>> {
        Ok(self
            .read_rows(request_id)?
            .into_iter()
            .map(|(_, slots)| slots)
            .collect())
    }

    fn read_rows(&self, request_id: &str) -> Result<Vec<(ThemeRecord, Slots)>> {
        if !self.table_exists(request_id)? {
            return Err(HistoryError::TableNotFound(request_id.to_owned()));
        }
        let mut stmt = self.conn.prepare(&format!(
            "SELECT title, author, edited_at, rating,
                    color0, color1, color2, color3, color4
             FROM {}
             ORDER BY id",
            quoted_table(request_id)
        ))?;
        let rows = stmt.query_map([], map_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Drop the table for `request_id` together with its catalog row.
    ///
    /// # Errors
    /// Returns [`HistoryError::TableNotFound`] if no such table exists, or a
    /// storage error if the drop fails.
    pub fn drop_table(&mut self, request_id: &str) -> Result<()> {
        if !self.table_exists(request_id)? {
            return Err(HistoryError::TableNotFound(request_id.to_owned()));
        }
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE {};", quoted_table(request_id)))?;
        tx.execute(
            "DELETE FROM history_catalog WHERE request_id = ?1",
            [request_id],
        )?;
        tx.commit()?;
        tracing::debug!(request_id, "dropped history table");
        Ok(())
    }

    /// Flag the catalog row of `request_id` as evicted.
    ///
    /// Flagged rows are left out of [`catalog`](Self::catalog) and reported
    /// by [`leaked`](Self::leaked) until the table is dropped.
    ///
    /// # Errors
    /// Returns a storage error if the update fails.
    pub fn mark_evicted(&self, request_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE history_catalog SET evicted = 1 WHERE request_id = ?1",
            [request_id],
        )?;
        Ok(())
    }

    /// Delete the catalog row of `request_id` without touching its table.
    ///
    /// # Errors
    /// Returns a storage error if the delete fails.
    pub fn forget(&self, request_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM history_catalog WHERE request_id = ?1",
            [request_id],
        )?;
        tracing::debug!(request_id, "removed catalog row");
        Ok(())
    }

    /// Identifiers flagged as evicted whose catalog row is still present,
    /// oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn leaked(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT request_id FROM history_catalog WHERE evicted = 1 ORDER BY seq")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Persisted index rows not flagged as evicted, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a timestamp cannot be parsed.
    pub fn catalog(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT request_id, created_at FROM history_catalog
             WHERE evicted = 0
             ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
        let mut result = Vec::new();
        for row in rows {
            let (request_id, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|_| HistoryError::InvalidTimestamp(created_at.clone()))?
                .with_timezone(&Utc);
            result.push(IndexEntry {
                request_id,
                created_at,
            });
        }
        Ok(result)
    }

    /// Request identifiers that have a table, sorted by their UTF-8 bytes.
    ///
    /// Tables whose name carries the prefix but does not decode to an
    /// identifier are skipped.
    ///
    /// # Errors
    /// Returns an error if the schema query fails.
    pub fn request_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(name, ?1) FROM sqlite_master
             WHERE type = 'table' AND substr(name, 1, ?2) = ?3
             ORDER BY name",
        )?;
        #[allow(clippy::cast_possible_wrap)]
        let prefix_len = TABLE_PREFIX.len() as i64;
        let rows = stmt.query_map(params![prefix_len + 1, prefix_len, TABLE_PREFIX], |r| {
            r.get::<_, String>(0)
        })?;
        let mut result = Vec::new();
        for row in rows {
            let encoded = row?;
            match request_id_from(&encoded) {
                Some(request_id) => result.push(request_id),
                None => tracing::debug!(table = %encoded, "skipping foreign table"),
            }
        }
        Ok(result)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(ThemeRecord, Slots)> {
    let record = ThemeRecord {
        title: row.get(0)?,
        author: row.get(1)?,
        edited_at: row.get(2)?,
        rating: row.get(3)?,
        swatches: Vec::new(),
    };
    let slots = [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?];
    Ok((record, slots))
}

fn table_name(request_id: &str) -> String {
    format!("{TABLE_PREFIX}{}", hex::encode(request_id))
}

fn request_id_from(encoded: &str) -> Option<String> {
    // `table_name` only produces lowercase hex.
    if encoded.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    String::from_utf8(hex::decode(encoded).ok()?).ok()
}

/// Table name as a quoted SQL identifier; safe for any request identifier.
fn quoted_table(request_id: &str) -> String {
    format!("\"{}\"", table_name(request_id).replace('"', "\"\""))
}
