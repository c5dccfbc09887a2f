//! Command tree and role orchestration.
//!
//! One binary, three role configurations: `store` (gateway proxy + indexer +
//! prover), `light` (everything) and `challenger` (indexer + challenger).
//! SIGINT/SIGTERM cancel the background tasks and drain the HTTP listener.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::ProviderBuilder;
use alloy_signer_local::PrivateKeySigner;
use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use kahu_contract::{FileProofCaller, ProofContract};
use kahu_node::{router, Challenger, Context, HttpState, Indexer, NodeConfig, Prover, Role};
use kahu_store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// The kahu node CLI.
#[derive(Parser)]
#[command(name = "kahu", about = "kahu DA proof network node")]
pub struct Cli {
    /// Verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Storage-provider node: gateway proxy, indexer and prover.
    Store {
        #[command(subcommand)]
        cmd: StoreCmd,
    },
    /// Full node: indexer, prover, challenger and the HTTP surface.
    Light {
        #[command(subcommand)]
        cmd: LightCmd,
    },
    /// Watchdog node: indexer and challenger.
    Challenger {
        #[command(subcommand)]
        cmd: ChallengerCmd,
    },
    /// Print the node version.
    Version,
}

#[derive(Subcommand)]
enum StoreCmd {
    /// Run the store node.
    Run(RunArgs),
}

#[derive(Subcommand)]
enum LightCmd {
    /// Run the light node.
    Run(RunArgs),
    /// Aggregate submit and challenge earnings for an account.
    Profit(ProfitArgs),
}

#[derive(Subcommand)]
enum ChallengerCmd {
    /// Run the challenger node.
    Run(RunArgs),
}

#[derive(Args, Clone)]
struct RunArgs {
    /// HTTP listen endpoint.
    #[arg(long, short = 'e', env = "KAHU_ENDPOINT", default_value = "0.0.0.0:8082")]
    endpoint: String,

    /// Hex private key; a throwaway key is generated when absent.
    #[arg(long, env = "KAHU_SK", default_value = "", hide_env_values = true)]
    sk: String,

    /// Settlement-chain RPC url.
    #[arg(long, env = "KAHU_CHAIN", default_value = "http://127.0.0.1:8545")]
    chain: String,

    /// Storage gateway base url.
    #[arg(long = "ip", env = "KAHU_GATEWAY", default_value = "http://127.0.0.1:38082")]
    gateway: String,

    /// Gateway access token.
    #[arg(long, env = "KAHU_TOKEN")]
    token: Option<String>,

    /// Pledge contract address.
    #[arg(long, default_value_t = Address::ZERO)]
    pledge: Address,

    /// File-proof contract address.
    #[arg(long, default_value_t = Address::ZERO)]
    fileproof: Address,

    /// Proof-control contract address.
    #[arg(long, default_value_t = Address::ZERO)]
    proofcontrol: Address,

    /// Proof-proxy contract address.
    #[arg(long, default_value_t = Address::ZERO)]
    proofproxy: Address,

    /// SRS file overriding the embedded setup.
    #[arg(long, env = "KAHU_SRS")]
    srs: Option<PathBuf>,

    /// Database path (defaults under the role's data directory).
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct ProfitArgs {
    /// Account to aggregate for.
    #[arg(long, required = true)]
    address: Address,

    /// Database path (defaults to the light node's).
    #[arg(long)]
    db: Option<PathBuf>,
}

impl Cli {
    /// Dispatches the parsed command.
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Store {
                cmd: StoreCmd::Run(args),
            } => run_node(Role::Store, args).await,
            Command::Light {
                cmd: LightCmd::Run(args),
            } => run_node(Role::Light, args).await,
            Command::Light {
                cmd: LightCmd::Profit(args),
            } => profit(args),
            Command::Challenger {
                cmd: ChallengerCmd::Run(args),
            } => run_node(Role::Challenger, args).await,
            Command::Version => {
                println!("kahu version {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

async fn run_node(role: Role, args: RunArgs) -> anyhow::Result<()> {
    let signer = args.sk.parse::<PrivateKeySigner>().unwrap_or_else(|_| {
        warn!("no usable private key supplied, generating a throwaway one");
        PrivateKeySigner::random()
    });
    let address = signer.address();
    info!(%address, ?role, "starting node");

    let chain_url: Url = args.chain.parse().context("settlement chain url")?;
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(chain_url);
    let caller = FileProofCaller::new(provider, args.fileproof, args.pledge);

    let cfg = NodeConfig {
        role,
        listen: args.endpoint.clone(),
        chain_rpc: args.chain,
        gateway_url: args.gateway,
        gateway_token: args.token,
        db_path: args.db.unwrap_or_else(|| NodeConfig::default_db_path(role)),
        srs_path: args.srs,
        file_proof: args.fileproof,
        pledge: args.pledge,
        proof_control: args.proofcontrol,
        proof_proxy: args.proofproxy,
        auto_pledge: role.proves(),
    };
    let ctx = Context::new(cfg, address).context("node context")?;

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    let indexer = Indexer::new(ctx.store.clone());
    tasks.push(tokio::spawn(
        indexer.run(caller.clone(), cancel.clone()),
    ));

    let contract = Arc::new(caller.clone());
    if role.proves() {
        let prover = Prover::new(contract.clone(), ctx.clone())
            .await
            .context("prover init")?;
        prover.register_submitter().await.context("submitter registration")?;
        if ctx.cfg.auto_pledge {
            prover.ensure_pledge().await.context("pledge top-up")?;
        }
        tasks.push(tokio::spawn(prover.run(cancel.clone())));
    }
    if role.challenges() {
        let challenger =
            Challenger::new(contract.clone(), ctx.clone(), role == Role::Challenger)
                .await
                .context("challenger init")?;
        tasks.push(tokio::spawn(challenger.run(cancel.clone())));
    }

    let state = HttpState {
        ctx: ctx.clone(),
        contract: contract.clone() as Arc<dyn ProofContract>,
    };
    let app = router(state, role.proxies_warmup());
    let listener = tokio::net::TcpListener::bind(&ctx.cfg.listen)
        .await
        .with_context(|| format!("bind {}", ctx.cfg.listen))?;
    info!(endpoint = %ctx.cfg.listen, "http listener up");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("http server")?;

    cancel.cancel();
    for task in tasks {
        let _ = task.await;
    }
    info!("node exited cleanly");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
    cancel.cancel();
}

fn profit(args: ProfitArgs) -> anyhow::Result<()> {
    let db_path = args
        .db
        .unwrap_or_else(|| NodeConfig::default_db_path(Role::Light));
    let store = Store::open(&db_path).context("open store")?;

    let submit_profit: U256 = store
        .proofs_by_submitter(args.address)?
        .iter()
        .map(|p| p.profit)
        .sum();
    let challenge_penalty: U256 = store
        .penalties_by_penalized(args.address)?
        .iter()
        .map(|p| p.reward_amount + p.foundation_amount)
        .sum();
    let challenge_profit: U256 = store
        .penalties_by_rewarded(args.address)?
        .iter()
        .map(|p| p.reward_amount)
        .sum();

    println!("submitProfit: {submit_profit}");
    println!("challengeProfit: {challenge_profit}");
    println!("challengePenalty: {challenge_penalty}");
    Ok(())
}
