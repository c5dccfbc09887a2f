//! The proving role.
//!
//! Once per cycle: roll the on-chain randomness, derive this submitter's
//! challenge set, open every live blob at the randomness, fold the openings
//! into one aggregate and submit it, then sit in the dispute responder until
//! the cycle's challenges are settled. Any transient failure skips the cycle;
//! the next one re-derives everything from fresh chain state.

use crate::{
    power_of_ten, select_indices, unix_now, Context, CycleClock, NodeError, Responder,
    ResponderAction,
};
use kahu_contract::ProofContract;
use kahu_kzg::{
    fold_commitments, fold_openings, fr_from_be_bytes, open, split_data, Commitment, OpeningProof,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const BOOTSTRAP_POLL: Duration = Duration::from_secs(5);
const DISPUTE_POLL: Duration = Duration::from_secs(5);

/// Submits one aggregate proof per cycle and answers bisection challenges.
pub struct Prover<C> {
    contract: Arc<C>,
    ctx: Context,
    clock: CycleClock,
    chal_sum: u64,
    respond_time: i64,
    sub_pledge: alloy_primitives::U256,
}

impl<C: ProofContract + 'static> Prover<C> {
    /// Reads the network settings and validates the challenge-set width.
    pub async fn new(contract: Arc<C>, ctx: Context) -> Result<Self, NodeError> {
        let info = contract.setting_info().await?;
        power_of_ten(info.chal_sum)?;

        Ok(Self {
            contract,
            ctx,
            clock: CycleClock::new(info.interval, info.period),
            chal_sum: info.chal_sum,
            respond_time: info.respond_time,
            sub_pledge: info.sub_pledge,
        })
    }

    /// Registers this account as a submitter if it is not one yet.
    pub async fn register_submitter(&self) -> Result<(), NodeError> {
        if !self.contract.is_submitter(self.ctx.address).await? {
            self.contract.be_submitter().await?;
        }
        Ok(())
    }

    /// Tops the pledge up to the required stake.
    pub async fn ensure_pledge(&self) -> Result<(), NodeError> {
        let balance = self.contract.pledge_balance(self.ctx.address).await?;
        if balance < self.sub_pledge {
            self.contract.pledge(self.sub_pledge - balance).await?;
        }
        Ok(())
    }

    /// Proves every cycle until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.bootstrap(&cancel).await {
            return;
        }
        if let Err(e) = self.contract.generate_rnd().await {
            warn!(error = %e, "initial randomness roll failed");
        }

        let mut last_rnd = [0u8; 32];
        let mut prove_success = false;
        loop {
            let (wait, next_last) = self.clock.prover_wait(unix_now());
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            if let Err(e) = self.reset_challenge_status().await {
                warn!(error = %e, "stale dispute reset failed");
            }

            info!("prove window open");
            let started = std::time::Instant::now();
            let (rnd, final_expire) = match self.roll_randomness().await {
                Ok(v) => v,
                Err(e) => {
                    error!(error = %e, "randomness unavailable, skipping cycle");
                    prove_success = false;
                    continue;
                }
            };

            if unix_now() > final_expire {
                warn!("every file is expired, nothing to prove");
                self.clock.last = next_last;
                continue;
            }
            if rnd == last_rnd && prove_success {
                warn!("randomness unchanged since last submit, skipping cycle");
                continue;
            }
            last_rnd = rnd;

            let (commits, openings) = match self.select_files(&rnd).await {
                Ok(v) => v,
                Err(e) => {
                    error!(error = %e, "selection failed, skipping cycle");
                    prove_success = false;
                    continue;
                }
            };

            if let Err(e) = self.submit(&rnd, &commits, &openings).await {
                error!(error = %e, "proof submission failed, skipping cycle");
                prove_success = false;
                continue;
            }
            prove_success = true;
            info!(elapsed = ?started.elapsed(), "aggregate proof submitted");

            self.clock.last = next_last;
            if let Err(e) = self.respond_challenges(commits, &cancel).await {
                error!(error = %e, "dispute responder aborted");
            }
        }
    }

    /// Blocks until the contract reports a cycle boundary.
    async fn bootstrap(&mut self, cancel: &CancellationToken) -> bool {
        while self.clock.last == 0 {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(BOOTSTRAP_POLL) => {}
            }
            match self.contract.last().await {
                Ok(last) => self.clock.last = last,
                Err(e) => warn!(error = %e, "waiting for cycle boundary"),
            }
        }
        true
    }

    async fn roll_randomness(&self) -> Result<([u8; 32], i64), NodeError> {
        self.contract.generate_rnd().await?;
        let rnd = self.contract.rnd_raw().await?;
        let final_expire = self.contract.final_expire().await?;
        Ok((rnd, final_expire))
    }

    /// Clears a dispute left over from a previous cycle.
    async fn reset_challenge_status(&self) -> Result<(), NodeError> {
        let info = self.contract.challenge_info(self.ctx.address).await?;
        if info.status != 0 && info.status != crate::TERMINAL_STATUS {
            self.contract.end_challenge(self.ctx.address).await?;
        }
        Ok(())
    }

    /// Derives the challenge set and opens every live blob at the randomness.
    /// Expired entries contribute the identity to both folds.
    async fn select_files(
        &self,
        rnd: &[u8; 32],
    ) -> Result<(Vec<Commitment>, Vec<OpeningProof>), NodeError> {
        let total = self.contract.files_amount().await?;
        let indices = select_indices(rnd, self.ctx.address, total, self.chal_sum);
        if indices.is_empty() {
            return Err(NodeError::CycleSkip("no files registered yet".into()));
        }

        let z = fr_from_be_bytes(rnd);
        let mut commits = Vec::with_capacity(indices.len());
        let mut openings = Vec::with_capacity(indices.len());
        for idx in indices {
            let file = self.ctx.store.file_by_id(idx as i64 + 1)?;
            if file.expiration <= self.clock.last {
                commits.push(Commitment::zero());
                openings.push(OpeningProof::zero());
                continue;
            }

            let blob_id = self
                .ctx
                .store
                .blob_id_by_commitment(&file.commitment)
                .unwrap_or_else(|_| file.commitment.to_hex());
            let data = self.ctx.gateway.get_object(&blob_id).await?;
            let poly = split_data(&data);
            openings.push(open(&poly, z, &self.ctx.srs.pk())?);
            commits.push(file.commitment);
        }
        Ok((commits, openings))
    }

    async fn submit(
        &self,
        rnd: &[u8; 32],
        commits: &[Commitment],
        openings: &[OpeningProof],
    ) -> Result<(), NodeError> {
        let agg_commit = fold_commitments(commits);
        let agg_opening = fold_openings(openings);
        self.contract
            .submit_aggregation_proof(*rnd, &agg_commit, &agg_opening)
            .await?;
        Ok(())
    }

    /// Polls the dispute state until it settles or the window lapses.
    async fn respond_challenges(
        &self,
        commits: Vec<Commitment>,
        cancel: &CancellationToken,
    ) -> Result<(), NodeError> {
        let mut responder = Responder::new(commits);
        loop {
            let info = self.contract.challenge_info(self.ctx.address).await?;
            match responder.step(&info, unix_now(), self.clock.last, self.respond_time) {
                ResponderAction::Done => return Ok(()),
                ResponderAction::Concede => {
                    warn!("response window lapsed, conceding the dispute");
                    return Ok(self.contract.end_challenge(self.ctx.address).await?);
                }
                ResponderAction::Post { divided, is_final } => {
                    info!(status = info.status, is_final, "posting dispute division");
                    self.contract.response_challenge(&divided, is_final).await?;
                }
                ResponderAction::Wait => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(DISPUTE_POLL) => {}
            }
        }
    }
}
