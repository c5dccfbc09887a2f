//! The chain-event indexer.
//!
//! Follows the two proxy contracts from the persisted block cursor,
//! materializing every decoded event into the store. Delivery is
//! at-least-once: the cursor only advances past an event once its write
//! committed, and every write is idempotent on its natural key, so a crashed
//! or restarted pass re-applies a suffix of the stream without changing the
//! outcome.

use crate::NodeError;
use alloy_provider::Provider;
use alloy_rpc_types_eth::Log;
use kahu_contract::{decode_event, FileProofCaller, ProofEvent};
use kahu_store::{ProofRecord, Store};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const PASS_INTERVAL: Duration = Duration::from_secs(10);

/// Materializes contract logs into the local store.
#[derive(Clone, Debug)]
pub struct Indexer {
    store: Store,
}

impl Indexer {
    /// New indexer over the node store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Follows the chain until cancelled, one pass every ten seconds.
    pub async fn run<P>(self, caller: FileProofCaller<P>, cancel: CancellationToken)
    where
        P: Provider + Clone + Send + Sync + 'static,
    {
        loop {
            if let Err(e) = self.pass(&caller).await {
                error!(error = %e, "indexer pass aborted");
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(PASS_INTERVAL) => {}
            }
        }
    }

    /// One scan from the persisted cursor. Stops at the first handler error,
    /// leaving the cursor at the last successfully applied event.
    pub async fn pass<P>(&self, caller: &FileProofCaller<P>) -> Result<(), NodeError>
    where
        P: Provider + Clone + Send + Sync + 'static,
    {
        let from = self.store.next_block()?;
        let logs = caller.fetch_logs(from).await?;
        if !logs.is_empty() {
            debug!(from, count = logs.len(), "indexer pass");
        }
        for log in &logs {
            self.handle_log(log)?;
        }
        Ok(())
    }

    /// Decodes and applies one log, then persists the cursor past it.
    /// Unknown topics and removed logs are skipped.
    pub fn handle_log(&self, log: &Log) -> Result<(), NodeError> {
        if log.removed {
            return Ok(());
        }
        let (Some(block_number), Some(log_index)) = (log.block_number, log.log_index) else {
            return Ok(());
        };
        let Some(event) = decode_event(&log.inner.data)? else {
            return Ok(());
        };

        self.apply_event(&event, block_number, log_index)?;
        self.store.set_next_block(block_number + 1)?;
        Ok(())
    }

    /// Applies one decoded event to the store. Idempotent.
    pub fn apply_event(
        &self,
        event: &ProofEvent,
        block_number: u64,
        log_index: u64,
    ) -> Result<(), NodeError> {
        match event {
            ProofEvent::AddFile(ev) => {
                info!(size = ev.size, end = ev.end, "add file event");
                self.store.create_file(&ev.commitment, ev.size as i64, ev.end)?;
            }
            ProofEvent::SubmitProof(ev) => {
                info!(submitter = %ev.submitter, last = ev.last, "submit proof event");
                self.store.create_proof(&ProofRecord {
                    submitter: ev.submitter,
                    rnd: ev.rnd,
                    agg_commit: ev.agg_commit,
                    opening: ev.opening,
                    last: ev.last,
                    profit: ev.profit,
                })?;
            }
            ProofEvent::ChallengeRes(ev) => {
                info!(submitter = %ev.submitter, res = ev.res, "challenge result event");
                self.store
                    .create_challenge_result(ev.submitter, ev.challenger, ev.last, ev.res)?;
            }
            ProofEvent::Penalize(ev) => {
                info!(penalized = %ev.penalized, "penalize event");
                self.store.create_penalty(
                    block_number,
                    log_index,
                    ev.penalized,
                    ev.rewarded,
                    ev.reward_amount,
                    ev.foundation_amount,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, FixedBytes, LogData, B256, U256};
    use alloy_sol_types::SolEvent;
    use kahu_contract::{IFileProof, IPledge, ProofInfo};
    use kahu_kzg::{commit, split_data, Commitment, Srs};

    fn rpc_log(block: u64, index: u64, data: LogData) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: Address::ZERO,
                data,
            },
            block_number: Some(block),
            log_index: Some(index),
            ..Default::default()
        }
    }

    fn commitment(tag: &[u8]) -> Commitment {
        let srs = Srs::deterministic(8);
        commit(&split_data(tag), &srs.pk()).unwrap()
    }

    fn sol_limbs(c: &Commitment) -> [FixedBytes<32>; 4] {
        let limbs = c.to_limbs();
        [
            FixedBytes(limbs[0]),
            FixedBytes(limbs[1]),
            FixedBytes(limbs[2]),
            FixedBytes(limbs[3]),
        ]
    }

    fn add_file_log(block: u64, index: u64, c: &Commitment, start: i64, end: i64) -> Log {
        let ev = IFileProof::AddFile {
            account: address!("0000000000000000000000000000000000000011"),
            etag: sol_limbs(c),
            start: U256::from(start),
            end: U256::from(end),
            size: 200,
            price: 1,
        };
        rpc_log(block, index, ev.encode_log_data())
    }

    fn submit_proof_log(block: u64, index: u64, c: &Commitment, rnd: u8, profit: u64) -> Log {
        let ev = IFileProof::SubmitProof {
            submitter: address!("0000000000000000000000000000000000000022"),
            rnd: B256::repeat_byte(rnd),
            cn: sol_limbs(c),
            pn: ProofInfo {
                h: sol_limbs(&Commitment::zero()),
                value: FixedBytes([0u8; 32]),
            },
            last: U256::from(100u64),
            profit: U256::from(profit),
        };
        rpc_log(block, index, ev.encode_log_data())
    }

    fn penalize_log(block: u64, index: u64, reward: u64, foundation: u64) -> Log {
        let ev = IPledge::Penalize {
            from: address!("0000000000000000000000000000000000000022"),
            to: address!("0000000000000000000000000000000000000033"),
            rewardAmount: U256::from(reward),
            foundationAmount: U256::from(foundation),
        };
        rpc_log(block, index, ev.encode_log_data())
    }

    fn stream() -> Vec<Log> {
        let c1 = commitment(b"indexed 1");
        let c2 = commitment(b"indexed 2");
        vec![
            add_file_log(1, 0, &c1, 1_000, 1_000 + 604_800),
            add_file_log(2, 0, &c2, 1_100, 1_100 + 604_800),
            submit_proof_log(3, 0, &c1, 0x0a, 5),
            submit_proof_log(3, 1, &c2, 0x0b, 7),
            penalize_log(4, 0, 3, 1),
        ]
    }

    fn snapshot(store: &Store) -> (i64, u64, usize, usize) {
        let submitter = address!("0000000000000000000000000000000000000022");
        (
            store.file_count().unwrap(),
            store.next_block().unwrap(),
            store.proofs_by_submitter(submitter).unwrap().len(),
            store.penalties_by_penalized(submitter).unwrap().len(),
        )
    }

    #[test]
    fn stream_materializes_files_proofs_and_penalties() {
        let store = Store::open_in_memory().unwrap();
        let indexer = Indexer::new(store.clone());
        for log in stream() {
            indexer.handle_log(&log).unwrap();
        }

        assert_eq!(snapshot(&store), (2, 5, 2, 1));
        let file = store.file_by_id(1).unwrap();
        assert_eq!(file.size, 200);
        assert_eq!(file.expiration, 1_000 + 604_800);
    }

    #[test]
    fn full_replay_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let indexer = Indexer::new(store.clone());

        for log in stream() {
            indexer.handle_log(&log).unwrap();
        }
        let first = snapshot(&store);

        // replay the whole stream from block 0, as a re-scan would
        for log in stream() {
            indexer.handle_log(&log).unwrap();
        }
        assert_eq!(snapshot(&store), first);
    }

    #[test]
    fn restart_mid_stream_converges_to_the_same_state() {
        let full = {
            let store = Store::open_in_memory().unwrap();
            let indexer = Indexer::new(store.clone());
            for log in stream() {
                indexer.handle_log(&log).unwrap();
            }
            snapshot(&store)
        };

        let store = Store::open_in_memory().unwrap();
        let indexer = Indexer::new(store.clone());
        let logs = stream();
        for log in &logs[..3] {
            indexer.handle_log(log).unwrap();
        }
        // crash and restart: the new pass re-reads from the cursor onwards
        let cursor = store.next_block().unwrap();
        for log in logs.iter().filter(|l| l.block_number.unwrap() >= cursor) {
            indexer.handle_log(log).unwrap();
        }
        assert_eq!(snapshot(&store), full);
    }

    #[test]
    fn unknown_topics_do_not_advance_the_cursor() {
        let store = Store::open_in_memory().unwrap();
        let indexer = Indexer::new(store.clone());

        let data = LogData::new_unchecked(vec![B256::repeat_byte(0x77)], Default::default());
        indexer.handle_log(&rpc_log(9, 0, data)).unwrap();
        assert_eq!(store.next_block().unwrap(), 0);
    }
}
