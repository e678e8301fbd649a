//! hookrelay server
//!
//! Loads `hookrelay.toml` (or `--config`), builds the handler registry from
//! `handlers.modules` and serves the webhook endpoint until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package relay-server -- --port 8080 --modules log,sso
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hookrelay::plugins;
use hookrelay::prelude::*;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "hookrelay", version, about = "3scale webhook fan-out server")]
struct Args {
    /// Configuration file to load instead of searching for hookrelay.toml.
    #[arg(short, long, env = "HOOKRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration profile (loads hookrelay.<profile>.toml on top).
    #[arg(short, long)]
    profile: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Comma-separated handler plugins to load, in dispatch order.
    #[arg(short, long, value_delimiter = ',')]
    modules: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = HookRelayRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(modules) = args.modules {
        builder = builder.modules(modules);
    }

    let runtime = builder.build()?;
    info!(
        builtin = ?[plugins::log::LOG_PLUGIN.name, plugins::sso::SSO_PLUGIN.name],
        "Starting hookrelay"
    );
    runtime.run().await?;

    Ok(())
}
