//! Startup context threaded into every task.

use crate::{GatewayClient, NodeConfig, NodeError};
use alloy_primitives::Address;
use kahu_kzg::{Srs, DEFAULT_SRS_SIZE};
use kahu_store::Store;
use std::sync::Arc;

/// Shared handles built once at startup. There are no global singletons; a
/// task owns a clone of this and nothing else.
#[derive(Clone, Debug)]
pub struct Context {
    /// Node configuration.
    pub cfg: NodeConfig,
    /// KZG setup.
    pub srs: Arc<Srs>,
    /// Local database.
    pub store: Store,
    /// Storage gateway client.
    pub gateway: GatewayClient,
    /// This node's account.
    pub address: Address,
}

impl Context {
    /// Loads the SRS, opens the database and builds the gateway client.
    /// Any failure here is fatal.
    pub fn new(cfg: NodeConfig, address: Address) -> Result<Self, NodeError> {
        let srs = match &cfg.srs_path {
            Some(path) => Srs::from_file(path).map_err(|e| NodeError::Fatal(e.to_string()))?,
            None => Srs::deterministic(DEFAULT_SRS_SIZE),
        };
        let store =
            Store::open(&cfg.db_path).map_err(|e| NodeError::Fatal(format!("store: {e}")))?;
        let gateway = GatewayClient::new(cfg.gateway_url.clone(), cfg.gateway_token.clone())?;

        Ok(Self {
            cfg,
            srs: Arc::new(srs),
            store,
            gateway,
            address,
        })
    }
}
