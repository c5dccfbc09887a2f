//! The challenging role.
//!
//! One cycle behind the provers: for every aggregate proof submitted at the
//! current randomness it checks the pairing, re-derives the submitter's
//! challenge set and compares the fold. A bad pairing is a one-step disproof
//! (`challengePn`); a bad fold starts the interactive bisection. At the next
//! cycle boundary it settles the per-file counters for everything it judged.

use crate::{
    power_of_ten, select_indices, spread_commits, spread_range, unix_now, ChallengerAction,
    Context, CycleClock, Narrower, NodeError,
};
use alloy_primitives::Address;
use kahu_contract::ProofContract;
use kahu_kzg::{fold_commitments, fr_from_be_bytes, verify, Commitment};
use kahu_store::{ProofRecord, Store};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const BOOTSTRAP_POLL: Duration = Duration::from_secs(5);
const DISPUTE_POLL: Duration = Duration::from_secs(5);

/// Verifies competing submitters' proofs and disputes the bad ones.
pub struct Challenger<C> {
    contract: Arc<C>,
    ctx: Context,
    clock: CycleClock,
    chal_sum: u64,
    respond_time: i64,
    /// Dedicated challenger nodes keep the legacy range-spread selection for
    /// undersized file tables; light nodes always use the shared derivation.
    legacy_spread: bool,
}

impl<C: ProofContract + 'static> Challenger<C> {
    /// Reads the network settings and validates the challenge-set width.
    pub async fn new(
        contract: Arc<C>,
        ctx: Context,
        legacy_spread: bool,
    ) -> Result<Self, NodeError> {
        let info = contract.setting_info().await?;
        power_of_ten(info.chal_sum)?;

        Ok(Self {
            contract,
            ctx,
            clock: CycleClock::new(info.interval, info.period),
            chal_sum: info.chal_sum,
            respond_time: info.respond_time,
            legacy_spread,
        })
    }

    /// Judges every cycle until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        let Some(mut last_rnd) = self.bootstrap(&cancel).await else {
            return;
        };

        let mut pending: Vec<ProofRecord> = Vec::new();
        loop {
            let wait = self.clock.challenger_wait(unix_now());
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            // Settle counters for the cycle that just closed.
            for proof in pending.drain(..) {
                if let Err(e) = self.bookkeep(&proof).await {
                    error!(error = %e, submitter = %proof.submitter, "counter bookkeeping failed");
                }
            }

            if let Err(e) = self.contract.generate_rnd().await {
                error!(error = %e, "randomness roll failed, skipping cycle");
                continue;
            }
            let rnd = match self.contract.rnd_raw().await {
                Ok(v) => v,
                Err(e) => {
                    error!(error = %e, "randomness unavailable, skipping cycle");
                    continue;
                }
            };

            let proofs = match self.ctx.store.proofs_by_rnd(&rnd) {
                Ok(v) => v,
                Err(e) => {
                    error!(error = %e, "proof lookup failed, skipping cycle");
                    continue;
                }
            };
            if proofs.is_empty() {
                info!(last = self.clock.last, "no proofs this cycle");
                continue;
            }
            if proofs[0].rnd == last_rnd {
                warn!("randomness did not advance, submitters may have stalled");
                continue;
            }
            last_rnd = rnd;
            pending = proofs.clone();

            for proof in proofs {
                if proof.submitter == self.ctx.address {
                    continue;
                }
                if let Err(e) = self.judge(&proof, &rnd, &cancel).await {
                    error!(error = %e, submitter = %proof.submitter, "judging failed");
                }
            }
        }
    }

    /// Blocks until the contract reports a cycle boundary, returning the
    /// randomness observed at that point.
    async fn bootstrap(&mut self, cancel: &CancellationToken) -> Option<[u8; 32]> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(BOOTSTRAP_POLL) => {}
            }
            if let Err(e) = self.contract.generate_rnd().await {
                warn!(error = %e, "waiting for cycle boundary");
                continue;
            }
            let last = match self.contract.last().await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "waiting for cycle boundary");
                    continue;
                }
            };
            match self.contract.rnd_raw().await {
                Ok(rnd) if last != 0 => {
                    self.clock.last = last;
                    return Some(rnd);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "waiting for cycle boundary"),
            }
        }
    }

    /// Pairing check first, then the fold comparison, then escalation.
    async fn judge(
        &self,
        proof: &ProofRecord,
        rnd: &[u8; 32],
        cancel: &CancellationToken,
    ) -> Result<(), NodeError> {
        let z = fr_from_be_bytes(rnd);
        if verify(&proof.agg_commit, &proof.opening, z, &self.ctx.srs.vk()).is_err() {
            warn!(submitter = %proof.submitter, last = proof.last,
                  "pairing check failed, disputing the opening");
            self.contract.challenge_pn(proof.submitter).await?;
            return Ok(());
        }

        let commits = self.select_commits(proof.submitter, rnd).await?;
        if fold_commitments(&commits) == proof.agg_commit {
            info!(submitter = %proof.submitter, last = proof.last, "aggregate proof is sound");
            return Ok(());
        }

        warn!(submitter = %proof.submitter, last = proof.last,
              "aggregate commitment mismatch, starting bisection");
        self.run_bisection(proof.submitter, commits, cancel).await
    }

    /// The challenger's own derivation of a submitter's selected commitments.
    async fn select_commits(
        &self,
        submitter: Address,
        rnd: &[u8; 32],
    ) -> Result<Vec<Commitment>, NodeError> {
        let total = self.contract.files_amount().await?;
        if total == 0 {
            return Err(NodeError::CycleSkip("no files registered yet".into()));
        }

        if self.legacy_spread && self.chal_sum > total {
            let (start, end) = spread_range(rnd, total, self.chal_sum);
            let files = self.ctx.store.files_in_range(start, end)?;
            return Ok(spread_commits(&files, total, self.chal_sum, self.clock.last));
        }

        let indices = select_indices(rnd, submitter, total, self.chal_sum);
        let mut commits = Vec::with_capacity(indices.len());
        for idx in indices {
            let file = self.ctx.store.file_by_id(idx as i64 + 1)?;
            commits.push(if file.expiration > self.clock.last {
                file.commitment
            } else {
                Commitment::zero()
            });
        }
        Ok(commits)
    }

    /// Drives the ten-way bisection until the contract adjudicates.
    async fn run_bisection(
        &self,
        submitter: Address,
        commits: Vec<Commitment>,
        cancel: &CancellationToken,
    ) -> Result<(), NodeError> {
        self.contract.challenge_cn(submitter, 0).await?;

        let mut narrower = Narrower::new(commits);
        loop {
            let info = self.contract.challenge_info(submitter).await?;
            match narrower.step(&info, unix_now(), self.clock.last, self.respond_time) {
                ChallengerAction::TimeoutWin => {
                    info!(%submitter, "no division arrived in time, dispute won by default");
                    return Ok(self.contract.end_challenge(submitter).await?);
                }
                ChallengerAction::Terminal => {
                    let submitter_won = self.contract.is_submitter_winner(submitter).await?;
                    if submitter_won {
                        info!(%submitter, "dispute lost, the final blob verified on-chain");
                    } else {
                        info!(%submitter, "dispute won, fraud established on-chain");
                    }
                    return Ok(());
                }
                ChallengerAction::Descend { index } => {
                    info!(%submitter, status = info.status, index, "descending into sub-range");
                    self.contract.challenge_cn(submitter, index).await?;
                }
                ChallengerAction::Wait => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(DISPUTE_POLL) => {}
            }
        }
    }

    /// Post-verdict counter bookkeeping for one judged proof.
    async fn bookkeep(&self, proof: &ProofRecord) -> Result<(), NodeError> {
        let total = self.contract.files_amount().await?;
        bookkeep_proof(&self.ctx.store, proof, total, self.chal_sum)
    }
}

/// Advances `choose_number` for every file selected in the judged cycle and
/// `proved_success_number` when no fraud was established. Each file counts
/// once per cycle no matter how often the selection repeated it. Expiry is
/// judged against `proof.last`, the boundary of the cycle the files were
/// selected under — bookkeeping runs one cycle later, and a file that lapsed
/// in between was still covered by the judged proof.
pub(crate) fn bookkeep_proof(
    store: &Store,
    proof: &ProofRecord,
    total_files: u64,
    chal_sum: u64,
) -> Result<(), NodeError> {
    let fraud_established = matches!(
        store.challenge_result(proof.submitter, proof.last)?,
        Some(res) if res.res
    );

    let indices: BTreeSet<u64> =
        select_indices(&proof.rnd, proof.submitter, total_files, chal_sum)
            .into_iter()
            .collect();
    for idx in indices {
        let file = match store.file_by_id(idx as i64 + 1) {
            Ok(f) => f,
            Err(kahu_store::StoreError::NotFound) => continue,
            Err(e) => return Err(e.into()),
        };
        if file.expiration <= proof.last {
            continue;
        }
        store.bump_counters(&file.commitment, !fraud_established)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use kahu_kzg::{commit, split_data, OpeningProof, Srs};

    fn commitment(tag: &[u8]) -> Commitment {
        let srs = Srs::deterministic(8);
        commit(&split_data(tag), &srs.pk()).unwrap()
    }

    fn proof_for(submitter: Address) -> ProofRecord {
        ProofRecord {
            submitter,
            rnd: [1u8; 32],
            agg_commit: Commitment::zero(),
            opening: OpeningProof::zero(),
            last: 100,
            profit: U256::ZERO,
        }
    }

    #[test]
    fn unchallenged_proof_bumps_both_counters_once() {
        let store = Store::open_in_memory().unwrap();
        let c = commitment(b"bookkeeping");
        store.create_file(&c, 1, 10_000).unwrap();

        let submitter = address!("00000000000000000000000000000000000000aa");
        // one file, ten selections: the whole set collapses onto it
        bookkeep_proof(&store, &proof_for(submitter), 1, 10).unwrap();

        let rec = store.file_by_commitment(&c).unwrap();
        assert_eq!(rec.choose_number, 1);
        assert_eq!(rec.proved_success_number, 1);
    }

    #[test]
    fn established_fraud_withholds_the_success_counter() {
        let store = Store::open_in_memory().unwrap();
        let c = commitment(b"fraudulent cycle");
        store.create_file(&c, 1, 10_000).unwrap();

        let submitter = address!("00000000000000000000000000000000000000ab");
        let challenger = address!("00000000000000000000000000000000000000cd");
        store
            .create_challenge_result(submitter, challenger, 100, true)
            .unwrap();

        bookkeep_proof(&store, &proof_for(submitter), 1, 10).unwrap();

        let rec = store.file_by_commitment(&c).unwrap();
        assert_eq!(rec.choose_number, 1);
        assert_eq!(rec.proved_success_number, 0);
    }

    #[test]
    fn expired_files_are_left_alone() {
        let store = Store::open_in_memory().unwrap();
        let c = commitment(b"long gone");
        // already expired at the judged cycle's boundary (proof.last = 100)
        store.create_file(&c, 1, 90).unwrap();

        let submitter = address!("00000000000000000000000000000000000000ac");
        bookkeep_proof(&store, &proof_for(submitter), 1, 10).unwrap();

        let rec = store.file_by_commitment(&c).unwrap();
        assert_eq!(rec.choose_number, 0);
        assert_eq!(rec.proved_success_number, 0);
    }

    #[test]
    fn file_lapsing_after_the_judged_cycle_is_still_counted() {
        let store = Store::open_in_memory().unwrap();
        let c = commitment(b"lapsed in the gap");
        // live at the judged cycle (proof.last = 100) but expired by the time
        // bookkeeping runs, one cycle later
        store.create_file(&c, 1, 150).unwrap();

        let submitter = address!("00000000000000000000000000000000000000ae");
        bookkeep_proof(&store, &proof_for(submitter), 1, 10).unwrap();

        let rec = store.file_by_commitment(&c).unwrap();
        assert_eq!(rec.choose_number, 1);
        assert_eq!(rec.proved_success_number, 1);
    }

    #[test]
    fn failed_dispute_still_counts_as_success() {
        let store = Store::open_in_memory().unwrap();
        let c = commitment(b"survived a dispute");
        store.create_file(&c, 1, 10_000).unwrap();

        let submitter = address!("00000000000000000000000000000000000000ad");
        let challenger = address!("00000000000000000000000000000000000000ce");
        store
            .create_challenge_result(submitter, challenger, 100, false)
            .unwrap();

        bookkeep_proof(&store, &proof_for(submitter), 1, 10).unwrap();

        let rec = store.file_by_commitment(&c).unwrap();
        assert_eq!(rec.choose_number, 1);
        assert_eq!(rec.proved_success_number, 1);
    }
}
