//! SQLite store for inventory counts.
//!
//! A single table keyed by (item_location, item_code). Writes fold a signed
//! delta into the stored quantity, which makes the store the authoritative
//! running total across sessions; the in-memory history is only the undo log
//! for the current one.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use std::path::Path;

/// Upsert that adds a signed delta to the stored stock-on-hand.
pub const UPSERT_COUNT: &str = "INSERT INTO inventory (item_location, item_code, item_soh) \
     VALUES (?1, ?2, ?3) \
     ON CONFLICT(item_location, item_code) \
     DO UPDATE SET item_soh = item_soh + excluded.item_soh";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

        let conn = Connection::open_with_flags(path, flags)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS inventory (
                item_location TEXT NOT NULL,
                item_code TEXT NOT NULL,
                item_soh INTEGER NOT NULL,
                UNIQUE (item_location, item_code)
             );",
        )?;

        Ok(Self { conn })
    }

    /// Opens the session-long transaction the persistence worker commits
    /// exactly once, after end-of-stream.
    pub fn begin(&mut self) -> Result<Transaction<'_>, rusqlite::Error> {
        self.conn.transaction()
    }

    /// Reads the stored quantity for one (location, code) pair.
    pub fn soh(&self, location: &str, code: &str) -> Result<Option<i64>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT item_soh FROM inventory WHERE item_location = ?1 AND item_code = ?2",
                params![location, code],
                |row| row.get(0),
            )
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store(dir: &tempfile::TempDir) -> Store {
        Store::open(&dir.path().join("inventory.db")).expect("open store")
    }

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = scratch_store(&dir);
        assert_eq!(store.soh("A1", "SKU001").expect("query"), None);
    }

    #[test]
    fn upsert_inserts_then_increments() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = scratch_store(&dir);

        let tx = store.begin().expect("begin");
        tx.execute(UPSERT_COUNT, params!["A1", "SKU001", 3])
            .expect("insert");
        tx.execute(UPSERT_COUNT, params!["A1", "SKU001", 4])
            .expect("increment");
        tx.execute(UPSERT_COUNT, params!["A1", "SKU002", 1])
            .expect("second key");
        tx.commit().expect("commit");

        assert_eq!(store.soh("A1", "SKU001").expect("query"), Some(7));
        assert_eq!(store.soh("A1", "SKU002").expect("query"), Some(1));
    }

    #[test]
    fn negative_delta_round_trips_to_the_prior_total() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = scratch_store(&dir);

        let tx = store.begin().expect("begin");
        tx.execute(UPSERT_COUNT, params!["B2", "SKU009", 5])
            .expect("count");
        tx.execute(UPSERT_COUNT, params!["B2", "SKU009", -5])
            .expect("compensate");
        tx.commit().expect("commit");

        assert_eq!(store.soh("B2", "SKU009").expect("query"), Some(0));
    }

    #[test]
    fn totals_survive_reopening_the_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("inventory.db");
        {
            let mut store = Store::open(&path).expect("open store");
            let tx = store.begin().expect("begin");
            tx.execute(UPSERT_COUNT, params!["C3", "SKU100", 9])
                .expect("count");
            tx.commit().expect("commit");
        }

        let store = Store::open(&path).expect("reopen store");
        assert_eq!(store.soh("C3", "SKU100").expect("query"), Some(9));
    }
}
