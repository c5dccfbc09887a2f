//! Contract-boundary error type.

use kahu_kzg::KzgError;

/// Failures crossing the settlement-contract boundary.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// RPC call or transaction submission failed.
    #[error("chain rpc: {0}")]
    Rpc(String),
    /// Transaction was sent but confirmation did not arrive.
    #[error("pending transaction: {0}")]
    PendingTx(String),
    /// Log payload did not decode against the event ABI.
    #[error("event decode: {0}")]
    Decode(String),
    /// A G1 point from the contract failed the checked conversion.
    #[error(transparent)]
    Point(#[from] KzgError),
}
