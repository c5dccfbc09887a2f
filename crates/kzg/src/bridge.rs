//! Encodings at the contract and storage boundary.
//!
//! G1 points cross the settlement contract as `bytes32[4]` limbs
//! `(X.hi, X.lo, Y.hi, Y.lo)`; the return path re-checks curve membership and
//! the prime-order subgroup. Blob ids and database columns use the hex of the
//! 48-byte compressed encoding.

use crate::{Commitment, Fr, KzgError, G1_COMPRESSED_SIZE};
use ark_bls12_381::{Fq, G1Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Solidity-side G1 representation: `(X.hi, X.lo, Y.hi, Y.lo)` big-endian.
pub type G1Limbs = [[u8; 32]; 4];

const FQ_BYTES: usize = 48;

impl Commitment {
    /// Encodes into contract limbs. The identity encodes as all zeroes.
    pub fn to_limbs(&self) -> G1Limbs {
        let mut limbs = [[0u8; 32]; 4];
        let Some((x, y)) = self.0.xy() else {
            return limbs;
        };
        let (hi_x, rest) = limbs.split_at_mut(1);
        let (lo_x, rest) = rest.split_at_mut(1);
        let (hi_y, lo_y) = rest.split_at_mut(1);
        write_fq(x, &mut hi_x[0], &mut lo_x[0]);
        write_fq(y, &mut hi_y[0], &mut lo_y[0]);
        limbs
    }

    /// Decodes contract limbs, rejecting coordinates outside the base field,
    /// points off the curve and points outside the prime-order subgroup.
    pub fn from_limbs(limbs: &G1Limbs) -> Result<Self, KzgError> {
        if limbs.iter().all(|l| l.iter().all(|&b| b == 0)) {
            return Ok(Self::zero());
        }
        let x = read_fq(&limbs[0], &limbs[1])?;
        let y = read_fq(&limbs[2], &limbs[3])?;

        let point = G1Affine::new_unchecked(x, y);
        if !point.is_on_curve() {
            return Err(KzgError::NotOnCurve);
        }
        if !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(KzgError::NotInSubgroup);
        }
        Ok(Self(point))
    }

    /// Hex of the compressed encoding, the blob id format.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(G1_COMPRESSED_SIZE);
        self.0
            .serialize_compressed(&mut bytes)
            .expect("compressed G1 serialization is infallible");
        alloy_primitives::hex::encode(bytes)
    }

    /// Parses a blob id back into a checked commitment.
    pub fn from_hex(id: &str) -> Result<Self, KzgError> {
        let bytes = alloy_primitives::hex::decode(id)
            .map_err(|e| KzgError::Decode(format!("commitment hex: {e}")))?;
        if bytes.len() != G1_COMPRESSED_SIZE {
            return Err(KzgError::Decode(format!(
                "commitment must be {G1_COMPRESSED_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let point = G1Affine::deserialize_compressed(bytes.as_slice())
            .map_err(|_| KzgError::Decode("invalid compressed G1 point".into()))?;
        Ok(Self(point))
    }
}

fn write_fq(v: &Fq, hi: &mut [u8; 32], lo: &mut [u8; 32]) {
    let bytes = v.into_bigint().to_bytes_be();
    let mut padded = [0u8; FQ_BYTES];
    padded[FQ_BYTES - bytes.len()..].copy_from_slice(&bytes);
    hi[16..].copy_from_slice(&padded[..16]);
    lo.copy_from_slice(&padded[16..]);
}

fn read_fq(hi: &[u8; 32], lo: &[u8; 32]) -> Result<Fq, KzgError> {
    if hi[..16].iter().any(|&b| b != 0) {
        return Err(KzgError::Decode("high limb exceeds 128 bits".into()));
    }
    let mut bytes = [0u8; FQ_BYTES];
    bytes[..16].copy_from_slice(&hi[16..]);
    bytes[16..].copy_from_slice(lo);

    let uint = num::BigUint::from_bytes_be(&bytes);
    let bigint = ark_ff::BigInt::try_from(uint)
        .map_err(|_| KzgError::Decode("coordinate exceeds the base field".into()))?;
    Fq::from_bigint(bigint).ok_or_else(|| KzgError::Decode("coordinate exceeds the base field".into()))
}

/// Reads a 32-byte big-endian scalar, reducing mod r (contract rnd semantics).
pub fn fr_from_be_bytes(bytes: &[u8; 32]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Writes a scalar as 32 big-endian bytes.
pub fn fr_to_be_bytes(v: &Fr) -> [u8; 32] {
    let bytes = v.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commit, split_data, Srs};

    #[test]
    fn limbs_round_trip() {
        let srs = Srs::deterministic(16);
        let poly = split_data(b"bridge me");
        let c = commit(&poly, &srs.pk()).unwrap();

        let limbs = c.to_limbs();
        assert_eq!(Commitment::from_limbs(&limbs).unwrap(), c);
    }

    #[test]
    fn identity_round_trips_as_zero_limbs() {
        let zero = Commitment::zero();
        let limbs = zero.to_limbs();
        assert!(limbs.iter().all(|l| l.iter().all(|&b| b == 0)));
        assert_eq!(Commitment::from_limbs(&limbs).unwrap(), zero);
    }

    #[test]
    fn off_curve_limbs_are_rejected() {
        let mut limbs = [[0u8; 32]; 4];
        limbs[1][31] = 3;
        limbs[3][31] = 5;
        assert!(matches!(
            Commitment::from_limbs(&limbs),
            Err(KzgError::NotOnCurve)
        ));
    }

    #[test]
    fn hex_id_round_trips() {
        let srs = Srs::deterministic(16);
        let poly = split_data(b"id me");
        let c = commit(&poly, &srs.pk()).unwrap();
        assert_eq!(Commitment::from_hex(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn scalar_bytes_round_trip() {
        let v = Fr::from(0xfeed_f00du64);
        assert_eq!(fr_from_be_bytes(&fr_to_be_bytes(&v)), v);
    }
}
