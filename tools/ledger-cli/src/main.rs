//! ledger-cli: read-only views of the food-donation ledger.
//!
//! Talks to a JSON-RPC node directly; no wallet is involved, so every
//! command takes the account to inspect explicitly.

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::Instrument;

use ledger_sync::{
    BalanceReader, ContractBindings, EventLogIndexer, HistoryWindow, JsonRpcChainClient,
    LedgerSyncConfig,
};
use ledger_telemetry::{init_telemetry, ledger_span, TelemetryConfig};
use shared_types::Address;

/// ledger-cli: inspect balances, history and achievements on the ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Read-only client for the food-donation ledger")]
struct Args {
    /// JSON-RPC endpoint of the chain node
    #[arg(short, long, env = "LEDGER_RPC_URL")]
    rpc_url: Option<String>,

    /// Contract bindings document
    #[arg(short, long, env = "LEDGER_BINDINGS")]
    bindings: Option<PathBuf>,

    /// Blocks scanned back from the chain head for history
    #[arg(short, long)]
    window: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Native and reward-token balances
    Balance {
        /// Account address (0x...)
        address: Address,
    },
    /// Confirmed reward-token transfers
    History {
        /// Account address (0x...)
        address: Address,
    },
    /// Achievement NFTs currently held
    Nfts {
        /// Account address (0x...)
        address: Address,
    },
    /// Latest price oracle answer
    Price,
    /// Whether an address is a registered NGO
    Registered {
        /// Account address (0x...)
        address: Address,
    },
    /// Check the bindings document and the node's chain id
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr through the subscriber; stdout carries results only.
    if let Err(e) = init_telemetry(&TelemetryConfig::from_env()) {
        eprintln!("Warning: telemetry disabled: {}", e);
    }

    let mut config = LedgerSyncConfig::from_env();
    if let Some(url) = args.rpc_url.clone() {
        config.rpc_url = url;
    }
    if let Some(path) = args.bindings.clone() {
        config.bindings_path = path;
    }
    if let Some(window) = args.window {
        config.history_block_window = window;
    }

    let bindings = Arc::new(
        ContractBindings::load(&config.bindings_path)
            .with_context(|| format!("loading {}", config.bindings_path.display()))?,
    );
    let chain = Arc::new(JsonRpcChainClient::new(&config.rpc_url)?);
    let reader = Arc::new(BalanceReader::new(
        chain.clone(),
        bindings.clone(),
        config.native_decimals,
    ));
    let indexer = EventLogIndexer::new(
        chain.clone(),
        bindings.clone(),
        reader.clone(),
        config.placeholder_image_uri.clone(),
    );
    let window = HistoryWindow::new(config.history_block_window);

    match args.command {
        Command::Balance { address } => {
            let (native, token) = tokio::try_join!(
                reader.native_balance(address),
                reader.reward_balance(address)
            )?;
            output::balance(args.json, address, native, token)?;
        }
        Command::History { address } => {
            let history = indexer
                .fetch_transfer_history(address, window)
                .instrument(ledger_span!("history", account = %address))
                .await?;
            output::warnings(&history.warnings);
            output::history(args.json, &history.records)?;
        }
        Command::Nfts { address } => {
            let owned = indexer
                .fetch_owned_nfts(address, window)
                .instrument(ledger_span!("nfts", account = %address))
                .await?;
            output::warnings(&owned.warnings);
            output::nfts(args.json, &owned.records)?;
        }
        Command::Price => {
            let quote = reader.price_quote().await?;
            output::value(args.json, "price", quote.0.to_string())?;
        }
        Command::Registered { address } => {
            let registered = reader.is_registered(address).await?;
            output::value(args.json, "registered", registered.to_string())?;
        }
        Command::Check => {
            let chain_id = chain.chain_id().await?;
            if chain_id != config.chain_id {
                bail!(
                    "node is on chain {} but the bindings target chain {}",
                    chain_id,
                    config.chain_id
                );
            }
            for binding in bindings.all() {
                println!("{:<16} {}", binding.role.to_string(), binding.address);
            }
            println!("chain {} ok", chain_id);
        }
    }

    Ok(())
}
