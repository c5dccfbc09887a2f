//! KZG commit, open, verify and the additive fold.
//!
//! Openings are taken at a common point (the cycle randomness), which makes
//! the fold a plain sum: the folded triple verifies under the same key iff
//! every honestly generated constituent does.

use crate::{Fr, KzgError, ProvingKey, VerifyingKey};
use ark_bls12_381::{Bls12_381, G1Affine, G1Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{One, Zero};

/// KZG commitment, a single G1 point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commitment(pub G1Affine);

impl Commitment {
    /// The G1 identity, the commitment stand-in for expired blobs.
    pub fn zero() -> Self {
        Self(G1Affine::zero())
    }
}

/// KZG opening at one point: the quotient commitment and the claimed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningProof {
    /// Commitment to the quotient polynomial `(f(X) - f(z)) / (X - z)`.
    pub h: G1Affine,
    /// Claimed evaluation `f(z)`.
    pub claimed_value: Fr,
}

impl OpeningProof {
    /// The opening stand-in for expired blobs.
    pub fn zero() -> Self {
        Self {
            h: G1Affine::zero(),
            claimed_value: Fr::zero(),
        }
    }
}

/// Commits to a polynomial given by its monomial coefficients.
pub fn commit(poly: &[Fr], pk: &ProvingKey<'_>) -> Result<Commitment, KzgError> {
    if poly.len() > pk.g1_powers.len() {
        return Err(KzgError::DegreeTooLarge {
            got: poly.len(),
            max: pk.g1_powers.len(),
        });
    }
    if poly.is_empty() {
        return Ok(Commitment::zero());
    }
    let acc = G1Projective::msm(&pk.g1_powers[..poly.len()], poly)
        .map_err(|_| KzgError::Decode("msm input length mismatch".into()))?;
    Ok(Commitment(acc.into_affine()))
}

/// Opens a polynomial at `z` by committing to the synthetic-division quotient.
pub fn open(poly: &[Fr], z: Fr, pk: &ProvingKey<'_>) -> Result<OpeningProof, KzgError> {
    if poly.len() > pk.g1_powers.len() {
        return Err(KzgError::DegreeTooLarge {
            got: poly.len(),
            max: pk.g1_powers.len(),
        });
    }
    if poly.is_empty() {
        return Ok(OpeningProof::zero());
    }

    // Horner division by (X - z): quotient coefficients top-down, the final
    // accumulation step yields f(z).
    let n = poly.len();
    let mut quotient = vec![Fr::zero(); n - 1];
    if n > 1 {
        quotient[n - 2] = poly[n - 1];
        for i in (1..n - 1).rev() {
            quotient[i - 1] = poly[i] + z * quotient[i];
        }
    }
    let claimed_value = match quotient.first() {
        Some(q0) => poly[0] + z * q0,
        None => poly[0],
    };

    Ok(OpeningProof {
        h: commit(&quotient, pk)?.0,
        claimed_value,
    })
}

/// Single pairing-product check:
/// `e(C - v*G1 + z*H, G2) * e(-H, tau*G2) == 1`.
pub fn verify(
    commitment: &Commitment,
    proof: &OpeningProof,
    z: Fr,
    vk: &VerifyingKey<'_>,
) -> Result<(), KzgError> {
    let left = commitment.0.into_group() - vk.g1 * proof.claimed_value + proof.h * z;
    let miller = Bls12_381::multi_miller_loop(
        [
            <Bls12_381 as Pairing>::G1Prepared::from(left.into_affine()),
            <Bls12_381 as Pairing>::G1Prepared::from((-proof.h.into_group()).into_affine()),
        ],
        [
            <Bls12_381 as Pairing>::G2Prepared::from(vk.g2),
            <Bls12_381 as Pairing>::G2Prepared::from(vk.tau_g2),
        ],
    );
    match Bls12_381::final_exponentiation(miller) {
        Some(out) if out.0.is_one() => Ok(()),
        _ => Err(KzgError::VerifyFailed),
    }
}

/// Sums a batch of commitments.
pub fn fold_commitments(commitments: &[Commitment]) -> Commitment {
    let acc: G1Projective = commitments.iter().map(|c| c.0.into_group()).sum();
    Commitment(acc.into_affine())
}

/// Sums a batch of openings taken at a common point.
pub fn fold_openings(proofs: &[OpeningProof]) -> OpeningProof {
    let h: G1Projective = proofs.iter().map(|p| p.h.into_group()).sum();
    let claimed_value = proofs.iter().map(|p| p.claimed_value).sum();
    OpeningProof {
        h: h.into_affine(),
        claimed_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{split_data, Srs};

    fn setup() -> Srs {
        Srs::deterministic(64)
    }

    #[test]
    fn opening_verifies_at_the_evaluation_point() {
        let srs = setup();
        let poly = split_data(b"some blob held by a storage provider");
        let z = Fr::from(0x1234_5678u64);

        let c = commit(&poly, &srs.pk()).unwrap();
        let proof = open(&poly, z, &srs.pk()).unwrap();
        verify(&c, &proof, z, &srs.vk()).unwrap();
    }

    #[test]
    fn wrong_point_fails_verification() {
        let srs = setup();
        let poly = split_data(b"another blob");
        let proof = open(&poly, Fr::from(7u64), &srs.pk()).unwrap();
        let c = commit(&poly, &srs.pk()).unwrap();

        assert!(matches!(
            verify(&c, &proof, Fr::from(8u64), &srs.vk()),
            Err(KzgError::VerifyFailed)
        ));
    }

    #[test]
    fn tampered_value_fails_verification() {
        let srs = setup();
        let poly = split_data(b"yet another blob");
        let z = Fr::from(99u64);
        let c = commit(&poly, &srs.pk()).unwrap();
        let mut proof = open(&poly, z, &srs.pk()).unwrap();
        proof.claimed_value += Fr::one();

        assert!(verify(&c, &proof, z, &srs.vk()).is_err());
    }

    #[test]
    fn fold_of_honest_openings_verifies() {
        let srs = setup();
        let z = Fr::from(0xdead_beefu64);
        let blobs: [&[u8]; 3] = [b"first", b"second blob body", b"third one, longer still"];

        let mut commitments = Vec::new();
        let mut proofs = Vec::new();
        for blob in blobs {
            let poly = split_data(blob);
            commitments.push(commit(&poly, &srs.pk()).unwrap());
            proofs.push(open(&poly, z, &srs.pk()).unwrap());
        }

        let agg_c = fold_commitments(&commitments);
        let agg_p = fold_openings(&proofs);
        verify(&agg_c, &agg_p, z, &srs.vk()).unwrap();
    }

    #[test]
    fn fold_with_one_forged_member_fails() {
        let srs = setup();
        let z = Fr::from(41u64);

        let honest = split_data(b"held");
        let missing = split_data(b"gone");
        let c_honest = commit(&honest, &srs.pk()).unwrap();
        let c_missing = commit(&missing, &srs.pk()).unwrap();

        // The prover no longer has `missing` and opens `honest` in its place.
        let p_honest = open(&honest, z, &srs.pk()).unwrap();
        let forged = open(&honest, z, &srs.pk()).unwrap();

        let agg_c = fold_commitments(&[c_honest, c_missing]);
        let agg_p = fold_openings(&[p_honest, forged]);
        assert!(verify(&agg_c, &agg_p, z, &srs.vk()).is_err());
    }

    #[test]
    fn zero_substitution_folds_cleanly() {
        let srs = setup();
        let z = Fr::from(3u64);
        let poly = split_data(b"live blob");
        let c = commit(&poly, &srs.pk()).unwrap();
        let p = open(&poly, z, &srs.pk()).unwrap();

        // An expired blob contributes the identity to every component.
        let agg_c = fold_commitments(&[c, Commitment::zero()]);
        let agg_p = fold_openings(&[p, OpeningProof::zero()]);
        verify(&agg_c, &agg_p, z, &srs.vk()).unwrap();
        assert_eq!(agg_c, c);
    }
}
