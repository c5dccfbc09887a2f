//! Node-level error kinds and their HTTP mapping.

use kahu_contract::ContractError;
use kahu_kzg::KzgError;
use kahu_store::StoreError;

/// Everything that can go wrong inside a node role or HTTP handler.
///
/// Background tasks log and continue on the transient kinds; only
/// [`NodeError::Fatal`] aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Bad hex, bad point or bad scalar in an input.
    #[error("decode error: {0}")]
    Decode(String),
    /// The referenced entity is not in the store.
    #[error("not found")]
    NotFound,
    /// The entity already exists under its natural key.
    #[error("already exists")]
    AlreadyExists,
    /// Settlement-chain RPC failure.
    #[error("chain rpc: {0}")]
    Chain(String),
    /// Storage-gateway HTTP failure.
    #[error("gateway: {0}")]
    Gateway(String),
    /// A KZG pairing check failed.
    #[error("verification failed")]
    VerifyFailure,
    /// The current cycle cannot proceed and is skipped.
    #[error("cycle skipped: {0}")]
    CycleSkip(String),
    /// Observed state does not admit the requested transition.
    #[error("state precondition: {0}")]
    StatePrecondition(String),
    /// Unrecoverable startup failure.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl NodeError {
    /// HTTP status for the JSON error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Decode(_) => 400,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::Chain(_) | Self::Gateway(_) => 502,
            Self::VerifyFailure
            | Self::CycleSkip(_)
            | Self::StatePrecondition(_)
            | Self::Fatal(_) => 500,
        }
    }
}

impl From<ContractError> for NodeError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Decode(msg) => Self::Decode(msg),
            ContractError::Point(p) => p.into(),
            other => Self::Chain(other.to_string()),
        }
    }
}

impl From<KzgError> for NodeError {
    fn from(e: KzgError) -> Self {
        match e {
            KzgError::VerifyFailed => Self::VerifyFailure,
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound,
            StoreError::Decode(msg) => Self::Decode(msg),
            StoreError::Sqlite(e) => Self::Fatal(format!("sqlite: {e}")),
        }
    }
}
