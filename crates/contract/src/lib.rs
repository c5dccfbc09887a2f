//! Typed surface of the settlement contracts.
//!
//! `sol!`-generated bindings for the file-proof and pledge proxies, decoded
//! event payloads keyed by topic-0, and the [`ProofContract`] trait the
//! prover and challenger drive. The RPC implementation signs through the
//! wallet configured on the provider.

mod bindings;
pub use bindings::{IFileProof, IPledge, ProofInfo, Setting};

mod error;
pub use error::ContractError;

mod events;
pub use events::{
    decode_event, AddFileEvent, ChallengeResEvent, PenalizeEvent, ProofEvent, SubmitProofEvent,
};

mod types;
pub use types::{ChallengeInfo, SettingInfo};

mod client;
pub use client::{FileProofCaller, ProofContract};
