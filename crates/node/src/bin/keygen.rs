//! State channel key tool
//!
//! Generates signing keys for channel owners and checks engine config files.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use statechannel_node::EngineConfig;
use statechannel_types::KeyPair;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statechannel-keygen")]
#[command(about = "Key and config utilities for state channel owners")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a secp256k1 key pair and print its address
    Generate {
        /// 32-byte hex seed for a deterministic key (random if omitted)
        #[arg(long)]
        seed: Option<String>,

        /// Also print the secret key
        #[arg(long)]
        show_secret: bool,
    },

    /// Parse an engine config file and print the contract addresses
    CheckConfig {
        /// Path to the TOML file
        path: PathBuf,
    },
}

fn parse_seed(seed: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(seed.trim_start_matches("0x")).context("seed is not valid hex")?;
    match <[u8; 32]>::try_from(bytes.as_slice()) {
        Ok(seed) => Ok(seed),
        Err(_) => bail!("seed must be 32 bytes, got {}", bytes.len()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { seed, show_secret } => {
            let keypair = match seed {
                Some(seed) => KeyPair::from_seed(&parse_seed(&seed)?),
                None => KeyPair::generate(),
            };
            info!(address = %keypair.address(), "Generated key pair");

            println!("address: {}", keypair.address());
            if show_secret {
                println!("secret:  0x{}", hex::encode(keypair.secret_bytes()));
            }
        }

        Commands::CheckConfig { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config = EngineConfig::from_toml_str(&text)?;
            let network = &config.network;

            println!("app_registry:              {}", network.app_registry);
            println!("nonce_registry:            {}", network.nonce_registry);
            println!("multi_send:                {}", network.multi_send);
            println!("state_channel_transaction: {}", network.state_channel_transaction);
            println!("free_balance_app:          {}", network.free_balance_app);
            println!("lock_timeout:              {:?}", config.lock_timeout());
        }
    }

    Ok(())
}
