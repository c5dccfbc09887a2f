//! Error type of the crypto kernel.

/// Failures surfaced by the KZG kernel.
#[derive(Debug, thiserror::Error)]
pub enum KzgError {
    /// Input bytes are not a valid encoding (hex, point or scalar).
    #[error("decode error: {0}")]
    Decode(String),
    /// Affine coordinates do not satisfy the curve equation.
    #[error("point is not on the curve")]
    NotOnCurve,
    /// Point is on the curve but outside the prime-order subgroup.
    #[error("point is not in the prime-order subgroup")]
    NotInSubgroup,
    /// Polynomial degree exceeds the loaded SRS.
    #[error("polynomial has {got} coefficients but the SRS supports {max}")]
    DegreeTooLarge {
        /// Coefficients supplied.
        got: usize,
        /// Coefficients the SRS can commit to.
        max: usize,
    },
    /// The pairing check did not hold.
    #[error("kzg verification failed")]
    VerifyFailed,
    /// SRS file could not be read or parsed.
    #[error("srs load: {0}")]
    Io(String),
}
