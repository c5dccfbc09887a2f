//! Dispute outcomes and penalties.

use crate::{Store, StoreError};
use alloy_primitives::{Address, U256};
use rusqlite::{params, Row};
use std::str::FromStr;

/// Outcome of one dispute, keyed by `(submitter, last)`.
#[derive(Clone, Debug)]
pub struct ChallengeResultRecord {
    /// Account whose proof was disputed.
    pub submitter: Address,
    /// Account that ran the dispute.
    pub challenger: Address,
    /// Cycle start the dispute belongs to.
    pub last: i64,
    /// True when fraud was established.
    pub res: bool,
}

/// One stake slash, append-only.
#[derive(Clone, Debug)]
pub struct PenaltyRecord {
    /// Account whose pledge was slashed.
    pub penalized: Address,
    /// Account rewarded out of the slash.
    pub rewarded: Address,
    /// Portion paid to the rewarded account.
    pub reward_amount: U256,
    /// Portion paid to the foundation.
    pub foundation_amount: U256,
}

fn penalty_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_penalty(raw: (String, String, String, String)) -> Result<PenaltyRecord, StoreError> {
    let bad = |what: &str| StoreError::Decode(format!("penalty row: {what}"));
    Ok(PenaltyRecord {
        penalized: Address::from_str(&raw.0).map_err(|_| bad("penalized"))?,
        rewarded: Address::from_str(&raw.1).map_err(|_| bad("rewarded"))?,
        reward_amount: U256::from_str(&raw.2).map_err(|_| bad("reward amount"))?,
        foundation_amount: U256::from_str(&raw.3).map_err(|_| bad("foundation amount"))?,
    })
}

impl Store {
    /// Records a dispute outcome; only the first write per `(submitter, last)`
    /// sticks.
    pub fn create_challenge_result(
        &self,
        submitter: Address,
        challenger: Address,
        last: i64,
        res: bool,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO challenge_results (submitter, last, challenger, res)
             VALUES (?1, ?2, ?3, ?4)",
            params![submitter.to_string(), last, challenger.to_string(), res],
        )?;
        Ok(())
    }

    /// The dispute outcome for one submitter and cycle, if any.
    pub fn challenge_result(
        &self,
        submitter: Address,
        last: i64,
    ) -> Result<Option<ChallengeResultRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let found = conn
            .query_row(
                "SELECT challenger, res FROM challenge_results
                 WHERE submitter = ?1 AND last = ?2",
                params![submitter.to_string(), last],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(StoreError::Sqlite(other)),
            })?;

        found
            .map(|(challenger, res)| {
                Ok(ChallengeResultRecord {
                    submitter,
                    challenger: Address::from_str(&challenger)
                        .map_err(|_| StoreError::Decode("challenge row: challenger".into()))?,
                    last,
                    res,
                })
            })
            .transpose()
    }

    /// Records a penalty, keyed by log position so replays are no-ops.
    pub fn create_penalty(
        &self,
        block_number: u64,
        log_index: u64,
        penalized: Address,
        rewarded: Address,
        reward_amount: U256,
        foundation_amount: U256,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO penalties
                 (block_number, log_index, penalized, rewarded, reward_amount, foundation_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                block_number as i64,
                log_index as i64,
                penalized.to_string(),
                rewarded.to_string(),
                reward_amount.to_string(),
                foundation_amount.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Penalties charged against an account.
    pub fn penalties_by_penalized(
        &self,
        account: Address,
    ) -> Result<Vec<PenaltyRecord>, StoreError> {
        self.penalties_where("penalized", account)
    }

    /// Penalties paid out to an account.
    pub fn penalties_by_rewarded(
        &self,
        account: Address,
    ) -> Result<Vec<PenaltyRecord>, StoreError> {
        self.penalties_where("rewarded", account)
    }

    fn penalties_where(
        &self,
        column: &str,
        account: Address,
    ) -> Result<Vec<PenaltyRecord>, StoreError> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT penalized, rewarded, reward_amount, foundation_amount
             FROM penalties WHERE {column} = ?1"
        ))?;
        let rows = stmt.query_map(params![account.to_string()], penalty_from_row)?;
        rows.map(|r| decode_penalty(r?)).collect()
    }
}
