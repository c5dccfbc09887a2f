//! Durable local state materialized from chain events.
//!
//! One SQLite database holds everything a node role needs to act
//! deterministically between restarts: registered files with their per-file
//! counters, the commitment-to-blob-id mapping, submitted aggregate proofs,
//! dispute outcomes, penalties and the indexer's block cursor. Writes are
//! idempotent on their natural keys, so the indexer can replay any suffix of
//! the log stream without double counting.

mod challenges;
mod cursor;
mod error;
mod files;
mod proofs;

pub use challenges::{ChallengeResultRecord, PenaltyRecord};
pub use error::StoreError;
pub use files::FileRecord;
pub use proofs::ProofRecord;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Handle to the node database, cheap to clone across tasks.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commitment TEXT NOT NULL UNIQUE,
    size INTEGER NOT NULL,
    expiration INTEGER NOT NULL,
    choose_number INTEGER NOT NULL DEFAULT 0,
    proved_success_number INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS file_blobs (
    commitment TEXT PRIMARY KEY,
    blob_id TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS proofs (
    submitter TEXT NOT NULL,
    rnd TEXT NOT NULL,
    agg_commit TEXT NOT NULL,
    opening_h TEXT NOT NULL,
    claimed_value TEXT NOT NULL,
    last INTEGER NOT NULL,
    profit TEXT NOT NULL,
    UNIQUE(submitter, rnd)
);
CREATE TABLE IF NOT EXISTS challenge_results (
    submitter TEXT NOT NULL,
    last INTEGER NOT NULL,
    challenger TEXT NOT NULL,
    res INTEGER NOT NULL,
    UNIQUE(submitter, last)
);
CREATE TABLE IF NOT EXISTS penalties (
    block_number INTEGER NOT NULL,
    log_index INTEGER NOT NULL,
    penalized TEXT NOT NULL,
    rewarded TEXT NOT NULL,
    reward_amount TEXT NOT NULL,
    foundation_amount TEXT NOT NULL,
    UNIQUE(block_number, log_index)
);
CREATE TABLE IF NOT EXISTS cursor (
    key TEXT PRIMARY KEY,
    next_block INTEGER NOT NULL
);
";

impl Store {
    /// Opens (and migrates) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::Decode(format!("create {}: {e}", dir.display())))?;
        }
        Self::from_conn(Connection::open(path)?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}
