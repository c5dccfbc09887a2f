//! KZG aggregation kernel for the kahu DA proof network.
//!
//! Everything a prover or challenger needs to turn blob bytes into field
//! elements, commit to them, open the commitment at the cycle randomness and
//! fold many openings into a single aggregate that verifies with one pairing
//! check. Curve arithmetic comes from arkworks; this crate only layers the
//! scheme and the contract-facing encodings on top.

mod bridge;
pub use bridge::{fr_from_be_bytes, fr_to_be_bytes, G1Limbs};

mod error;
pub use error::KzgError;

mod fr31;
pub use fr31::{pad127, split_data, SHARD_LEN};

mod kzg;
pub use kzg::{
    commit, fold_commitments, fold_openings, open, verify, Commitment, OpeningProof,
};

mod srs;
pub use srs::{ProvingKey, Srs, VerifyingKey, DEFAULT_SRS_SIZE};

/// Scalar field of BLS12-381, the coefficient domain of blob polynomials.
pub type Fr = ark_bls12_381::Fr;

/// Compressed G1 size in bytes; blob ids are the hex of this encoding.
pub const G1_COMPRESSED_SIZE: usize = 48;
