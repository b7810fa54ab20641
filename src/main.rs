//! citeguard CLI entrypoint

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use citeguard::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries JSON results
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    cli.execute().await
}
