//! The contract capabilities the node roles drive, and their RPC-backed
//! implementation.
//!
//! Keeping the surface behind a trait lets the prover and challenger cycle
//! logic run against a scripted in-memory contract in tests.

use crate::bindings::{IFileProof, IPledge, ProofInfo};
use crate::types::limbs_to_sol;
use crate::{ChallengeInfo, ContractError, SettingInfo};
use alloy_primitives::{Address, FixedBytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log};
use async_trait::async_trait;
use kahu_kzg::{fr_to_be_bytes, Commitment, OpeningProof};

/// Everything the prover and challenger need from the settlement layer.
#[async_trait]
pub trait ProofContract: Send + Sync {
    /// Schedule and pledge parameters.
    async fn setting_info(&self) -> Result<SettingInfo, ContractError>;
    /// Most recent cycle boundary recognized by the contract.
    async fn last(&self) -> Result<i64, ContractError>;
    /// Latest expiration over all registered files.
    async fn final_expire(&self) -> Result<i64, ContractError>;
    /// Total number of registered files.
    async fn files_amount(&self) -> Result<u64, ContractError>;
    /// Rolls the on-chain randomness forward if the cycle allows it.
    async fn generate_rnd(&self) -> Result<(), ContractError>;
    /// Raw 32 bytes of the current cycle randomness.
    async fn rnd_raw(&self) -> Result<[u8; 32], ContractError>;
    /// Registers a file under its commitment.
    async fn add_file(
        &self,
        commitment: &Commitment,
        size: u64,
        start: i64,
        end: i64,
        signature: &[u8],
    ) -> Result<(), ContractError>;
    /// Submits the folded commitment and opening for this cycle.
    async fn submit_aggregation_proof(
        &self,
        rnd: [u8; 32],
        agg_commit: &Commitment,
        opening: &OpeningProof,
    ) -> Result<(), ContractError>;
    /// Disputes one tenth of the submitter's current range.
    async fn challenge_cn(&self, submitter: Address, index: u8) -> Result<(), ContractError>;
    /// Disputes the pairing itself; a one-step disproof.
    async fn challenge_pn(&self, submitter: Address) -> Result<(), ContractError>;
    /// Posts the caller's ten-way division (or the final single-blob row).
    async fn response_challenge(
        &self,
        divided: &[Commitment; 10],
        is_final: bool,
    ) -> Result<(), ContractError>;
    /// Closes a dispute that lapsed or concluded.
    async fn end_challenge(&self, submitter: Address) -> Result<(), ContractError>;
    /// Current dispute state for a submitter.
    async fn challenge_info(&self, submitter: Address) -> Result<ChallengeInfo, ContractError>;
    /// Whether the submitter prevailed in the adjudicated dispute.
    async fn is_submitter_winner(&self, submitter: Address) -> Result<bool, ContractError>;
    /// Whether the account is registered as a submitter.
    async fn is_submitter(&self, account: Address) -> Result<bool, ContractError>;
    /// Registers the caller as a submitter.
    async fn be_submitter(&self) -> Result<(), ContractError>;
    /// Tops up the caller's pledge.
    async fn pledge(&self, amount: U256) -> Result<(), ContractError>;
    /// Pledged balance of an account.
    async fn pledge_balance(&self, account: Address) -> Result<U256, ContractError>;
}

/// RPC-backed [`ProofContract`] over a wallet-carrying provider.
#[derive(Clone, Debug)]
pub struct FileProofCaller<P> {
    provider: P,
    file_proof: Address,
    pledge: Address,
}

impl<P> FileProofCaller<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    /// Binds the caller to the two proxy addresses.
    pub fn new(provider: P, file_proof: Address, pledge: Address) -> Self {
        Self {
            provider,
            file_proof,
            pledge,
        }
    }

    fn proof(&self) -> IFileProof::IFileProofInstance<P> {
        IFileProof::new(self.file_proof, self.provider.clone())
    }

    fn pledge_contract(&self) -> IPledge::IPledgeInstance<P> {
        IPledge::new(self.pledge, self.provider.clone())
    }

    /// All logs of both proxies from `from_block` onward, in block order.
    pub async fn fetch_logs(&self, from_block: u64) -> Result<Vec<Log>, ContractError> {
        let filter = Filter::new()
            .from_block(from_block)
            .address(vec![self.file_proof, self.pledge]);
        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))
    }
}

fn rpc(e: impl std::fmt::Display) -> ContractError {
    ContractError::Rpc(e.to_string())
}

fn pending(e: impl std::fmt::Display) -> ContractError {
    ContractError::PendingTx(e.to_string())
}

#[async_trait]
impl<P> ProofContract for FileProofCaller<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn setting_info(&self) -> Result<SettingInfo, ContractError> {
        let setting = self.proof().getSettingInfo().call().await.map_err(rpc)?;
        Ok(setting.into())
    }

    async fn last(&self) -> Result<i64, ContractError> {
        let last = self.proof().getLast().call().await.map_err(rpc)?;
        i64::try_from(last).map_err(|_| ContractError::Decode(format!("last out of range: {last}")))
    }

    async fn final_expire(&self) -> Result<i64, ContractError> {
        let v = self.proof().getFinalExpire().call().await.map_err(rpc)?;
        i64::try_from(v)
            .map_err(|_| ContractError::Decode(format!("finalExpire out of range: {v}")))
    }

    async fn files_amount(&self) -> Result<u64, ContractError> {
        let v = self.proof().getFilesAmount().call().await.map_err(rpc)?;
        u64::try_from(v)
            .map_err(|_| ContractError::Decode(format!("filesAmount out of range: {v}")))
    }

    async fn generate_rnd(&self) -> Result<(), ContractError> {
        self.proof()
            .generateRnd()
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn rnd_raw(&self) -> Result<[u8; 32], ContractError> {
        let rnd = self.proof().getRndRawBytes().call().await.map_err(rpc)?;
        Ok(rnd.0)
    }

    async fn add_file(
        &self,
        commitment: &Commitment,
        size: u64,
        start: i64,
        end: i64,
        signature: &[u8],
    ) -> Result<(), ContractError> {
        self.proof()
            .addFile(
                limbs_to_sol(&commitment.to_limbs()),
                size,
                U256::from(start),
                U256::from(end),
                signature.to_vec().into(),
            )
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn submit_aggregation_proof(
        &self,
        rnd: [u8; 32],
        agg_commit: &Commitment,
        opening: &OpeningProof,
    ) -> Result<(), ContractError> {
        let pn = ProofInfo {
            h: limbs_to_sol(&Commitment(opening.h).to_limbs()),
            value: FixedBytes(fr_to_be_bytes(&opening.claimed_value)),
        };
        self.proof()
            .submitAggregationProof(B256::from(rnd), limbs_to_sol(&agg_commit.to_limbs()), pn)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn challenge_cn(&self, submitter: Address, index: u8) -> Result<(), ContractError> {
        self.proof()
            .challengeCn(submitter, index)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn challenge_pn(&self, submitter: Address) -> Result<(), ContractError> {
        self.proof()
            .challengePn(submitter)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn response_challenge(
        &self,
        divided: &[Commitment; 10],
        is_final: bool,
    ) -> Result<(), ContractError> {
        let rows = std::array::from_fn(|i| limbs_to_sol(&divided[i].to_limbs()));
        self.proof()
            .responseChallenge(rows, is_final)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn end_challenge(&self, submitter: Address) -> Result<(), ContractError> {
        self.proof()
            .endChallenge(submitter)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn challenge_info(&self, submitter: Address) -> Result<ChallengeInfo, ContractError> {
        let ret = self
            .proof()
            .getChallengeInfo(submitter)
            .call()
            .await
            .map_err(rpc)?;
        ret.try_into()
    }

    async fn is_submitter_winner(&self, submitter: Address) -> Result<bool, ContractError> {
        self.proof()
            .isSubmitterWinner(submitter)
            .call()
            .await
            .map_err(rpc)
    }

    async fn is_submitter(&self, account: Address) -> Result<bool, ContractError> {
        self.proof().isSubmitter(account).call().await.map_err(rpc)
    }

    async fn be_submitter(&self) -> Result<(), ContractError> {
        self.proof()
            .beSubmitter()
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn pledge(&self, amount: U256) -> Result<(), ContractError> {
        self.pledge_contract()
            .pledge(amount)
            .send()
            .await
            .map_err(rpc)?
            .watch()
            .await
            .map_err(pending)?;
        Ok(())
    }

    async fn pledge_balance(&self, account: Address) -> Result<U256, ContractError> {
        self.pledge_contract()
            .getPledgeBalance(account)
            .call()
            .await
            .map_err(rpc)
    }
}
