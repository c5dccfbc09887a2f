//! The indexer's persisted block cursor.

use crate::{Store, StoreError};
use rusqlite::params;

const CURSOR_KEY: &str = "next_block";

impl Store {
    /// Next block the indexer should scan from. Zero before the first pass.
    pub fn next_block(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT next_block FROM cursor WHERE key = ?1",
            params![CURSOR_KEY],
            |row| row.get::<_, i64>(0),
        )
        .map(|v| v as u64)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(0),
            other => Err(StoreError::Sqlite(other)),
        })
    }

    /// Advances the cursor; writes that would move it backwards are ignored.
    pub fn set_next_block(&self, next_block: u64) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO cursor (key, next_block) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                 next_block = MAX(next_block, excluded.next_block)",
            params![CURSOR_KEY, next_block as i64],
        )?;
        Ok(())
    }
}
