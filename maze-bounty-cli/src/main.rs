//! Maze CLI - drive the `MazeGameBounty` contract from the command line.

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use anyhow::Context;
use clap::{Parser, Subcommand};
use maze_bounty::prelude::{AdapterConfig, EvmWallet, MazeContract, OperationResult};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Maze CLI - create bounty games, report progress, claim rewards
#[derive(Parser, Debug)]
#[command(name = "maze")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint of the chain
    #[arg(long, env = "MAZE_RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Hex private key to sign with (node-managed accounts if neither key nor mnemonic is given)
    #[arg(long, env = "MAZE_PRIVATE_KEY", hide_env_values = true, conflicts_with = "mnemonic")]
    private_key: Option<String>,

    /// BIP39 mnemonic to derive the signing key from
    #[arg(long, env = "MAZE_MNEMONIC", hide_env_values = true)]
    mnemonic: Option<String>,

    /// Derivation index used with --mnemonic
    #[arg(long, default_value_t = 0, requires = "mnemonic")]
    index: u32,

    /// Contract address (overrides MAZE_CONTRACT_ADDRESS)
    #[arg(long, value_parser = parse_address)]
    contract: Option<Address>,

    /// ABI location: a path, an http(s) URL, or "bundled" (overrides MAZE_ABI)
    #[arg(long)]
    abi: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request account access and print the connected account
    Connect,
    /// Create a game funded with a bounty
    CreateGame {
        /// Number of rounds
        #[arg(long)]
        rounds: u64,
        /// Bounty in ether, e.g. 0.1
        #[arg(long)]
        bounty: String,
    },
    /// Report the connected player's progress
    Progress {
        /// Game identifier
        #[arg(long, value_parser = parse_u256)]
        game: U256,
        /// Round the player reached
        #[arg(long)]
        round: u64,
        /// Completion time in seconds
        #[arg(long)]
        time: u64,
    },
    /// Claim the reward for a finishing position
    Claim {
        /// Game identifier
        #[arg(long, value_parser = parse_u256)]
        game: U256,
        /// Finishing position
        #[arg(long)]
        position: u64,
    },
    /// Show a game's record
    Game {
        /// Game identifier
        #[arg(long, value_parser = parse_u256)]
        id: U256,
    },
    /// Show a player's progress in a game (defaults to the connected account)
    Player {
        /// Game identifier
        #[arg(long, value_parser = parse_u256)]
        game: U256,
        /// Player address
        #[arg(long, value_parser = parse_address)]
        address: Option<Address>,
    },
}

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_str(s.trim()).map_err(|e| format!("invalid integer '{s}': {e}"))
}

fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s.trim()).map_err(|e| format!("invalid address '{s}': {e}"))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("maze_bounty=debug,maze=debug")
    } else {
        EnvFilter::new("maze_bounty=warn,maze=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn build_wallet(args: &Args) -> anyhow::Result<EvmWallet> {
    let mut builder = EvmWallet::builder().rpc_url(&args.rpc_url);
    if let Some(key) = &args.private_key {
        builder = builder.private_key(key);
    } else if let Some(mnemonic) = &args.mnemonic {
        builder = builder.mnemonic(mnemonic).index(args.index);
    }
    let wallet = builder.build().await.context("failed to set up wallet")?;
    info!(
        chain_id = wallet.chain_id(),
        local = wallet.local_address().is_some(),
        "wallet ready"
    );
    Ok(wallet)
}

fn build_config(args: &Args) -> anyhow::Result<AdapterConfig> {
    let mut config = AdapterConfig::from_env()?;
    if let Some(contract) = args.contract {
        config = config.with_contract_address(contract);
    }
    if let Some(abi) = &args.abi {
        config = config.with_descriptor(abi.parse()?);
    }
    Ok(config)
}

#[allow(clippy::print_stdout)]
fn emit(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit_envelope(envelope: &OperationResult) -> anyhow::Result<ExitCode> {
    emit(&serde_json::to_value(envelope)?)?;
    Ok(if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = build_config(&args)?;
    let wallet = build_wallet(&args).await?;
    let maze = MazeContract::builder()
        .config(config)
        .wallet(Arc::new(wallet))
        .build()?;

    let account = maze.connect().await?;

    match args.command {
        Command::Connect => {
            emit(&json!({
                "account": account.to_checksum(None),
                "contract": maze.contract_address().to_checksum(None),
            }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CreateGame { rounds, bounty } => {
            emit_envelope(&maze.create_game(rounds, bounty).await.into())
        }
        Command::Progress { game, round, time } => {
            emit_envelope(&maze.update_player_progress(game, round, time).await.into())
        }
        Command::Claim { game, position } => {
            emit_envelope(&maze.claim_reward(game, position).await.into())
        }
        Command::Game { id } => {
            emit(&maze.get_game(id).await?.to_json())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Player { game, address } => {
            let player = address.unwrap_or(account);
            emit(&maze.get_player_progress(game, player).await?.to_json())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
