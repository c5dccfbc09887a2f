//! Submitted aggregate proofs.

use crate::{Store, StoreError};
use alloy_primitives::{hex, Address, U256};
use kahu_kzg::{fr_from_be_bytes, fr_to_be_bytes, Commitment, OpeningProof};
use rusqlite::{params, Row};
use std::str::FromStr;

/// One accepted aggregate proof, keyed by `(submitter, rnd)`.
#[derive(Clone, Debug)]
pub struct ProofRecord {
    /// Proving account.
    pub submitter: Address,
    /// Cycle randomness the proof was opened at, raw bytes.
    pub rnd: [u8; 32],
    /// Folded commitment.
    pub agg_commit: Commitment,
    /// Folded opening.
    pub opening: OpeningProof,
    /// Cycle start the proof belongs to.
    pub last: i64,
    /// Reward credited for the submission.
    pub profit: U256,
}

type RawProof = (String, String, String, String, String, i64, String);

fn proof_from_row(row: &Row<'_>) -> rusqlite::Result<RawProof> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode(raw: RawProof) -> Result<ProofRecord, StoreError> {
    let bad = |what: &str| StoreError::Decode(format!("proof row: {what}"));
    let rnd_bytes = hex::decode(&raw.1).map_err(|_| bad("rnd"))?;
    let rnd: [u8; 32] = rnd_bytes.try_into().map_err(|_| bad("rnd length"))?;
    let value_bytes = hex::decode(&raw.4).map_err(|_| bad("claimed value"))?;
    let value: [u8; 32] = value_bytes.try_into().map_err(|_| bad("value length"))?;
    Ok(ProofRecord {
        submitter: Address::from_str(&raw.0).map_err(|_| bad("submitter"))?,
        rnd,
        agg_commit: Commitment::from_hex(&raw.2).map_err(|e| StoreError::Decode(e.to_string()))?,
        opening: OpeningProof {
            h: Commitment::from_hex(&raw.3)
                .map_err(|e| StoreError::Decode(e.to_string()))?
                .0,
            claimed_value: fr_from_be_bytes(&value),
        },
        last: raw.5,
        profit: U256::from_str(&raw.6).map_err(|_| bad("profit"))?,
    })
}

const PROOF_COLUMNS: &str =
    "submitter, rnd, agg_commit, opening_h, claimed_value, last, profit";

impl Store {
    /// Records an accepted proof; a replayed event is a no-op.
    pub fn create_proof(&self, proof: &ProofRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO proofs
                 (submitter, rnd, agg_commit, opening_h, claimed_value, last, profit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                proof.submitter.to_string(),
                hex::encode(proof.rnd),
                proof.agg_commit.to_hex(),
                Commitment(proof.opening.h).to_hex(),
                hex::encode(fr_to_be_bytes(&proof.opening.claimed_value)),
                proof.last,
                proof.profit.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Every proof opened at the given cycle randomness.
    pub fn proofs_by_rnd(&self, rnd: &[u8; 32]) -> Result<Vec<ProofRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE rnd = ?1"
        ))?;
        let rows = stmt.query_map(params![hex::encode(rnd)], proof_from_row)?;
        rows.map(|r| decode(r?)).collect()
    }

    /// Every proof an account ever submitted.
    pub fn proofs_by_submitter(&self, submitter: Address) -> Result<Vec<ProofRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROOF_COLUMNS} FROM proofs WHERE submitter = ?1"
        ))?;
        let rows = stmt.query_map(params![submitter.to_string()], proof_from_row)?;
        rows.map(|r| decode(r?)).collect()
    }
}
