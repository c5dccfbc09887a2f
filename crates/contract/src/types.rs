//! Domain-typed views of the contract structs.

use crate::bindings::{IFileProof, Setting};
use crate::ContractError;
use alloy_primitives::{FixedBytes, U256};
use kahu_kzg::{Commitment, G1Limbs};
use std::time::Duration;

/// Network schedule and pledge parameters, in host types.
#[derive(Clone, Copy, Debug)]
pub struct SettingInfo {
    /// Number of blobs selected per proof cycle.
    pub chal_sum: u64,
    /// Prove-window length.
    pub interval: Duration,
    /// Remainder of the cycle after the prove window.
    pub period: Duration,
    /// Per-round response allowance of the bisection protocol, seconds.
    pub respond_time: i64,
    /// Stake required of a submitter.
    pub sub_pledge: U256,
}

impl From<Setting> for SettingInfo {
    fn from(s: Setting) -> Self {
        Self {
            chal_sum: s.chalSum,
            interval: Duration::from_secs(s.interval),
            period: Duration::from_secs(s.period),
            respond_time: s.respondTime as i64,
            sub_pledge: s.subPledge,
        }
    }
}

/// Live dispute state for one submitter.
#[derive(Clone, Debug)]
pub struct ChallengeInfo {
    /// Bisection status, 0 (idle) through 11 (terminal).
    pub status: u8,
    /// Sub-range the challenger picked at the last even step.
    pub chal_index: u8,
    /// The submitter's most recent ten-way division.
    pub divided_cn: [Commitment; 10],
}

impl TryFrom<IFileProof::getChallengeInfoReturn> for ChallengeInfo {
    type Error = ContractError;

    fn try_from(ret: IFileProof::getChallengeInfoReturn) -> Result<Self, Self::Error> {
        let mut divided_cn = [Commitment::zero(); 10];
        for (slot, raw) in divided_cn.iter_mut().zip(ret.dividedCn.iter()) {
            *slot = Commitment::from_limbs(&limbs_from_sol(raw))?;
        }
        Ok(Self {
            status: ret.status,
            chal_index: ret.chalIndex,
            divided_cn,
        })
    }
}

/// Contract word arrays to kernel limbs.
pub(crate) fn limbs_from_sol(words: &[FixedBytes<32>; 4]) -> G1Limbs {
    [words[0].0, words[1].0, words[2].0, words[3].0]
}

/// Kernel limbs to contract word arrays.
pub(crate) fn limbs_to_sol(limbs: &G1Limbs) -> [FixedBytes<32>; 4] {
    [
        FixedBytes(limbs[0]),
        FixedBytes(limbs[1]),
        FixedBytes(limbs[2]),
        FixedBytes(limbs[3]),
    ]
}
