//! CLI for sending Teams messages
//!
//! Run `teams-send --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use anyhow::Result;
use clap::Parser;
use teams_send::{build_message, client_for, submit, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // RUST_LOG wins over the output flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(&config).await {
        if !config.silent {
            eprintln!(
                "ERROR: Failed to submit message to {:?} channel in the {:?} team: {e:#}",
                config.channel, config.team
            );
        }
        std::process::exit(1);
    }

    if !config.silent {
        println!("Message successfully sent!");
    }
}

async fn run(config: &Config) -> Result<()> {
    config.validate()?;

    if config.verbose {
        println!("Configuration: {config}");
    }

    let mut message = build_message(config)?;
    if config.verbose {
        message.prepare()?;
        println!("Payload:\n{}", message.pretty_print());
    }

    let client = client_for(config)?;
    submit(config, &client, &mut message).await?;
    Ok(())
}
