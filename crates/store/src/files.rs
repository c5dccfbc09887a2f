//! File rows and per-file proof counters.

use crate::{Store, StoreError};
use kahu_kzg::Commitment;
use rusqlite::{params, Row};

/// A registered file and its lifetime counters.
#[derive(Clone, Debug)]
pub struct FileRecord {
    /// 1-based position in registration order; the selection index space.
    pub id: i64,
    /// KZG commitment, the file key.
    pub commitment: Commitment,
    /// Blob size in bytes.
    pub size: i64,
    /// Storage term end, unix seconds.
    pub expiration: i64,
    /// Cycles in which this file was part of a challenged set.
    pub choose_number: i64,
    /// Cycles in which the covering proof survived unchallenged.
    pub proved_success_number: i64,
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, i64, i64, i64, i64)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode(raw: (i64, String, i64, i64, i64, i64)) -> Result<FileRecord, StoreError> {
    Ok(FileRecord {
        id: raw.0,
        commitment: Commitment::from_hex(&raw.1).map_err(|e| StoreError::Decode(e.to_string()))?,
        size: raw.2,
        expiration: raw.3,
        choose_number: raw.4,
        proved_success_number: raw.5,
    })
}

const FILE_COLUMNS: &str =
    "id, commitment, size, expiration, choose_number, proved_success_number";

impl Store {
    /// Registers a file; a replayed event is a no-op.
    pub fn create_file(
        &self,
        commitment: &Commitment,
        size: i64,
        expiration: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO files (commitment, size, expiration) VALUES (?1, ?2, ?3)",
            params![commitment.to_hex(), size, expiration],
        )?;
        Ok(())
    }

    /// Looks a file up by its 1-based registration index.
    pub fn file_by_id(&self, id: i64) -> Result<FileRecord, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let raw = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
                params![id],
                file_from_row,
            )
            .map_err(StoreError::from_query)?;
        decode(raw)
    }

    /// Looks a file up by its commitment.
    pub fn file_by_commitment(&self, commitment: &Commitment) -> Result<FileRecord, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let raw = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE commitment = ?1"),
                params![commitment.to_hex()],
                file_from_row,
            )
            .map_err(StoreError::from_query)?;
        decode(raw)
    }

    /// Files in a contiguous 1-based id range, inclusive.
    pub fn files_in_range(&self, start: i64, end: i64) -> Result<Vec<FileRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id >= ?1 AND id <= ?2 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![start, end], file_from_row)?;
        rows.map(|r| decode(r?)).collect()
    }

    /// Total number of registered files.
    pub fn file_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        Ok(conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?)
    }

    /// Advances the cycle counters for one file: `choose_number` always,
    /// `proved_success_number` only when the cycle's proof stood.
    pub fn bump_counters(
        &self,
        commitment: &Commitment,
        proved_success: bool,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let updated = conn.execute(
            "UPDATE files SET
                 choose_number = choose_number + 1,
                 proved_success_number = proved_success_number
                     + (CASE WHEN ?1 THEN 1 ELSE 0 END)
             WHERE commitment = ?2",
            params![proved_success, commitment.to_hex()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Records the commitment-to-blob-id mapping from the gateway.
    pub fn create_blob_mapping(
        &self,
        commitment: &Commitment,
        blob_id: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO file_blobs (commitment, blob_id) VALUES (?1, ?2)",
            params![commitment.to_hex(), blob_id],
        )?;
        Ok(())
    }

    /// The gateway blob id for a commitment.
    pub fn blob_id_by_commitment(&self, commitment: &Commitment) -> Result<String, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.query_row(
            "SELECT blob_id FROM file_blobs WHERE commitment = ?1",
            params![commitment.to_hex()],
            |row| row.get(0),
        )
        .map_err(StoreError::from_query)
    }
}
