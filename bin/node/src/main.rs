//! Main entrypoint for the kahu node binary.

use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

mod cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::try_parse()?;
    init_tracing_subscriber(cli.verbose)?;

    cli.run().await
}

fn init_tracing_subscriber(verbosity_level: u8) -> anyhow::Result<()> {
    let level = match verbosity_level {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // The http stacks are extremely chatty at debug; keep them at info so the
    // proof and dispute logs stay readable.
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse("")?
        .add_directive("hyper_util=info".parse()?)
        .add_directive("reqwest=info".parse()?)
        .add_directive("alloy_rpc_client=info".parse()?)
        .add_directive("alloy_transport_http=info".parse()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
    Ok(())
}
