//! Topic-0 keyed event decoding for the indexer.
//!
//! Each contract event gets a generated decoder; unknown topics come back as
//! `None` so newer contract revisions do not break older nodes.

use crate::bindings::{IFileProof, IPledge};
use crate::types::limbs_from_sol;
use crate::ContractError;
use alloy_primitives::{Address, LogData, U256};
use alloy_sol_types::SolEvent;
use kahu_kzg::{fr_from_be_bytes, Commitment, Fr, OpeningProof};

/// A file registered on chain.
#[derive(Clone, Debug)]
pub struct AddFileEvent {
    /// Uploading account.
    pub account: Address,
    /// KZG commitment of the blob, the file key.
    pub commitment: Commitment,
    /// Storage term start, unix seconds.
    pub start: i64,
    /// Storage term end, unix seconds.
    pub end: i64,
    /// Blob size in bytes.
    pub size: u64,
    /// Price paid per term.
    pub price: u64,
}

/// An aggregate proof accepted by the contract.
#[derive(Clone, Debug)]
pub struct SubmitProofEvent {
    /// Proving account.
    pub submitter: Address,
    /// Cycle randomness the proof was opened at, raw 32 bytes.
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

/// Outcome of a dispute.
#[derive(Clone, Debug)]
pub struct ChallengeResEvent {
    /// Account whose proof was disputed.
    pub submitter: Address,
    /// Account that ran the dispute.
    pub challenger: Address,
    /// Cycle start the dispute belongs to.
    pub last: i64,
    /// True when fraud was established.
    pub res: bool,
}

/// A stake transfer following an adjudicated dispute.
#[derive(Clone, Debug)]
pub struct PenalizeEvent {
    /// Account whose pledge was slashed.
    pub penalized: Address,
    /// Account rewarded out of the slash.
    pub rewarded: Address,
    /// Portion paid to the rewarded account.
    pub reward_amount: U256,
    /// Portion paid to the foundation.
    pub foundation_amount: U256,
}

/// Any event the indexer materializes.
#[derive(Clone, Debug)]
pub enum ProofEvent {
    /// New file registration.
    AddFile(AddFileEvent),
    /// Accepted aggregate proof.
    SubmitProof(SubmitProofEvent),
    /// Dispute outcome.
    ChallengeRes(ChallengeResEvent),
    /// Stake slash.
    Penalize(PenalizeEvent),
}

/// Decodes one log by topic-0. Unknown topics yield `Ok(None)`.
pub fn decode_event(data: &LogData) -> Result<Option<ProofEvent>, ContractError> {
    let Some(topic0) = data.topics().first() else {
        return Ok(None);
    };

    let event = match *topic0 {
        IFileProof::AddFile::SIGNATURE_HASH => {
            let ev = IFileProof::AddFile::decode_log_data(data)
                .map_err(|e| ContractError::Decode(e.to_string()))?;
            ProofEvent::AddFile(AddFileEvent {
                account: ev.account,
                commitment: Commitment::from_limbs(&limbs_from_sol(&ev.etag))?,
                start: u256_to_i64(ev.start)?,
                end: u256_to_i64(ev.end)?,
                size: ev.size,
                price: ev.price,
            })
        }
        IFileProof::SubmitProof::SIGNATURE_HASH => {
            let ev = IFileProof::SubmitProof::decode_log_data(data)
                .map_err(|e| ContractError::Decode(e.to_string()))?;
            ProofEvent::SubmitProof(SubmitProofEvent {
                submitter: ev.submitter,
                rnd: ev.rnd.0,
                agg_commit: Commitment::from_limbs(&limbs_from_sol(&ev.cn))?,
                opening: OpeningProof {
                    h: Commitment::from_limbs(&limbs_from_sol(&ev.pn.h))?.0,
                    claimed_value: fr_from_bytes32(&ev.pn.value.0),
                },
                last: u256_to_i64(ev.last)?,
                profit: ev.profit,
            })
        }
        IFileProof::ChallengeRes::SIGNATURE_HASH => {
            let ev = IFileProof::ChallengeRes::decode_log_data(data)
                .map_err(|e| ContractError::Decode(e.to_string()))?;
            ProofEvent::ChallengeRes(ChallengeResEvent {
                submitter: ev.submitter,
                challenger: ev.challenger,
                last: u256_to_i64(ev.last)?,
                res: ev.res,
            })
        }
        IPledge::Penalize::SIGNATURE_HASH => {
            let ev = IPledge::Penalize::decode_log_data(data)
                .map_err(|e| ContractError::Decode(e.to_string()))?;
            ProofEvent::Penalize(PenalizeEvent {
                penalized: ev.from,
                rewarded: ev.to,
                reward_amount: ev.rewardAmount,
                foundation_amount: ev.foundationAmount,
            })
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

fn fr_from_bytes32(bytes: &[u8; 32]) -> Fr {
    fr_from_be_bytes(bytes)
}

fn u256_to_i64(v: U256) -> Result<i64, ContractError> {
    i64::try_from(v).map_err(|_| ContractError::Decode(format!("timestamp out of range: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::limbs_to_sol;
    use alloy_primitives::{address, FixedBytes, B256};
    use kahu_kzg::{commit, split_data, Srs};

    fn sample_commitment() -> Commitment {
        let srs = Srs::deterministic(8);
        commit(&split_data(b"event blob"), &srs.pk()).unwrap()
    }

    #[test]
    fn add_file_round_trips() {
        let c = sample_commitment();
        let raw = IFileProof::AddFile {
            account: address!("00000000000000000000000000000000000000aa"),
            etag: limbs_to_sol(&c.to_limbs()),
            start: U256::from(1_700_000_000u64),
            end: U256::from(1_700_604_800u64),
            size: 200,
            price: 5,
        };
        let decoded = decode_event(&raw.encode_log_data()).unwrap().unwrap();

        match decoded {
            ProofEvent::AddFile(ev) => {
                assert_eq!(ev.commitment, c);
                assert_eq!(ev.start, 1_700_000_000);
                assert_eq!(ev.end, 1_700_604_800);
                assert_eq!(ev.size, 200);
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn submit_proof_round_trips() {
        let c = sample_commitment();
        let raw = IFileProof::SubmitProof {
            submitter: address!("00000000000000000000000000000000000000bb"),
            rnd: B256::repeat_byte(1),
            cn: limbs_to_sol(&c.to_limbs()),
            pn: crate::ProofInfo {
                h: limbs_to_sol(&c.to_limbs()),
                value: FixedBytes([0u8; 32]),
            },
            last: U256::from(42u64),
            profit: U256::from(7u64),
        };
        let decoded = decode_event(&raw.encode_log_data()).unwrap().unwrap();

        match decoded {
            ProofEvent::SubmitProof(ev) => {
                assert_eq!(ev.agg_commit, c);
                assert_eq!(ev.rnd, [1u8; 32]);
                assert_eq!(ev.last, 42);
                assert_eq!(ev.profit, U256::from(7u64));
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn unknown_topic_is_skipped() {
        let data = LogData::new_unchecked(vec![B256::repeat_byte(0xfe)], Default::default());
        assert!(decode_event(&data).unwrap().is_none());
    }
}
