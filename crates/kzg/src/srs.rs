//! Structured reference string handling.
//!
//! The network runs on a fixed published setup; [`Srs::deterministic`]
//! reproduces it from the embedded constant, while [`Srs::from_file`] loads an
//! operator-supplied setup instead. Both are built once at startup and live in
//! the node context.

use crate::{Fr, KzgError};
use ark_bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{CurveGroup, Group};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use std::path::Path;

/// Number of G1 powers in the network's default setup. Four scalars per
/// 127-byte shard puts the largest committable blob just above 127 KiB.
pub const DEFAULT_SRS_SIZE: usize = 4 * 1024;

/// Toxic-waste constant of the network's published setup.
const DEFAULT_TAU: u64 = 985;

/// KZG structured reference string: G1 powers of tau for committing, the G2
/// generator and `tau * G2` for verifying.
#[derive(Clone, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct Srs {
    g1_powers: Vec<G1Affine>,
    g2: G2Affine,
    tau_g2: G2Affine,
}

/// Commit-side view of the SRS.
#[derive(Clone, Copy, Debug)]
pub struct ProvingKey<'a> {
    pub(crate) g1_powers: &'a [G1Affine],
}

/// Verify-side view of the SRS.
#[derive(Clone, Copy, Debug)]
pub struct VerifyingKey<'a> {
    pub(crate) g1: G1Affine,
    pub(crate) g2: G2Affine,
    pub(crate) tau_g2: G2Affine,
    pub(crate) _marker: std::marker::PhantomData<&'a ()>,
}

impl Srs {
    /// Rebuilds the network's fixed setup with `size` G1 powers.
    pub fn deterministic(size: usize) -> Self {
        let tau = Fr::from(DEFAULT_TAU);
        let gen = G1Projective::generator();

        let mut powers = Vec::with_capacity(size);
        let mut acc = Fr::from(1u64);
        for _ in 0..size {
            powers.push(gen * acc);
            acc *= tau;
        }

        let g2 = G2Projective::generator();
        Self {
            g1_powers: G1Projective::normalize_batch(&powers),
            g2: g2.into_affine(),
            tau_g2: (g2 * tau).into_affine(),
        }
    }

    /// Loads a setup from its compressed serialization on disk.
    pub fn from_file(path: &Path) -> Result<Self, KzgError> {
        let bytes =
            std::fs::read(path).map_err(|e| KzgError::Io(format!("{}: {e}", path.display())))?;
        let srs = Self::deserialize_compressed(bytes.as_slice())
            .map_err(|e| KzgError::Io(format!("{}: {e}", path.display())))?;
        if srs.g1_powers.is_empty() {
            return Err(KzgError::Io(format!(
                "{}: setup holds no G1 powers",
                path.display()
            )));
        }
        Ok(srs)
    }

    /// Writes the compressed serialization, the inverse of [`Srs::from_file`].
    pub fn write_to(&self, path: &Path) -> Result<(), KzgError> {
        let mut bytes = Vec::new();
        self.serialize_compressed(&mut bytes)
            .map_err(|e| KzgError::Io(e.to_string()))?;
        std::fs::write(path, bytes).map_err(|e| KzgError::Io(format!("{}: {e}", path.display())))
    }

    /// Commit-side key.
    pub fn pk(&self) -> ProvingKey<'_> {
        ProvingKey {
            g1_powers: &self.g1_powers,
        }
    }

    /// Verify-side key.
    pub fn vk(&self) -> VerifyingKey<'_> {
        VerifyingKey {
            g1: self.g1_powers[0],
            g2: self.g2,
            tau_g2: self.tau_g2,
            _marker: std::marker::PhantomData,
        }
    }

    /// Largest number of coefficients this setup can commit to.
    pub fn max_coefficients(&self) -> usize {
        self.g1_powers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_setup_is_reproducible() {
        let a = Srs::deterministic(8);
        let b = Srs::deterministic(8);
        assert_eq!(a.g1_powers, b.g1_powers);
        assert_eq!(a.tau_g2, b.tau_g2);
        assert_eq!(a.max_coefficients(), 8);
    }

    #[test]
    fn setup_round_trips_through_disk() {
        let srs = Srs::deterministic(4);
        let dir = std::env::temp_dir().join("kahu-srs-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("setup.bin");

        srs.write_to(&path).unwrap();
        let loaded = Srs::from_file(&path).unwrap();
        assert_eq!(loaded.g1_powers, srs.g1_powers);
    }
}
