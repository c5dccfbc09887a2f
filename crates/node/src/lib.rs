//! Node roles of the kahu DA proof network.
//!
//! A node is composed from four long-running pieces sharing one [`Context`]:
//! the [`Indexer`] materializes contract events into the local store, the
//! [`Prover`] submits one aggregate KZG proof per cycle and answers bisection
//! challenges, the [`Challenger`] re-derives every other submitter's
//! selection and disputes proofs that do not check out, and the HTTP surface
//! proxies blob upload/retrieval through the storage gateway. Which pieces a
//! process runs is a role configuration, not a separate binary.

mod clock;
pub use clock::CycleClock;

mod config;
pub use config::{NodeConfig, Role};

mod context;
pub use context::Context;

mod dispute;
pub use dispute::{
    power_of_ten, ChallengerAction, Narrower, Responder, ResponderAction, TERMINAL_STATUS,
};

mod error;
pub use error::NodeError;

mod gateway;
pub use gateway::{GatewayClient, PutObjectResponse};

mod http;
pub use http::{router, HttpState};

mod indexer;
pub use indexer::Indexer;

mod prover;
pub use prover::Prover;

mod challenger;
pub use challenger::Challenger;

mod selection;
pub use selection::{select_indices, spread_commits, spread_range};

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}
