//! Node configuration shared by the role binaries.

use alloy_primitives::Address;
use std::path::PathBuf;

/// Which long-running pieces this process enables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Gateway proxy + indexer + prover.
    Store,
    /// Full node: indexer + prover + challenger + HTTP surface.
    Light,
    /// Indexer + challenger.
    Challenger,
}

impl Role {
    /// Whether this role submits aggregate proofs.
    pub fn proves(&self) -> bool {
        matches!(self, Role::Store | Role::Light)
    }

    /// Whether this role verifies and disputes other submitters.
    pub fn challenges(&self) -> bool {
        matches!(self, Role::Light | Role::Challenger)
    }

    /// Whether the HTTP surface exposes the gateway warmup proxy.
    pub fn proxies_warmup(&self) -> bool {
        matches!(self, Role::Store)
    }

    /// Default data directory name for this role.
    pub fn data_dir_name(&self) -> &'static str {
        match self {
            Role::Store => ".kahu-store",
            Role::Light => ".kahu-light",
            Role::Challenger => ".kahu-challenger",
        }
    }
}

/// Everything a node process needs to come up.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Enabled role.
    pub role: Role,
    /// HTTP listen endpoint, e.g. `0.0.0.0:8082`.
    pub listen: String,
    /// Settlement-chain RPC url.
    pub chain_rpc: String,
    /// Storage gateway base url.
    pub gateway_url: String,
    /// Optional gateway access token.
    pub gateway_token: Option<String>,
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Optional SRS file; the embedded deterministic setup otherwise.
    pub srs_path: Option<PathBuf>,
    /// File-proof proxy contract.
    pub file_proof: Address,
    /// Pledge contract.
    pub pledge: Address,
    /// Proof-control contract.
    pub proof_control: Address,
    /// Proof proxy the dispute transactions go through.
    pub proof_proxy: Address,
    /// Top the pledge up to the required stake at startup.
    pub auto_pledge: bool,
}

impl NodeConfig {
    /// Default database location under the user's home directory.
    pub fn default_db_path(role: Role) -> PathBuf {
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
        home.join(role.data_dir_name()).join("kahu.db")
    }
}
