use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chain_reader::{
    AccountInfoOptions, AccountReader, BlockhashSource, LatestBlockhash, Reader, ReaderConfig,
    RpcReader, SlotSource, Source, SourcePoller,
};

#[derive(Parser, Debug)]
#[command(name = "chain-reader")]
#[command(about = "Read-only queries against a Solana node")]
struct Cli {
    /// Path to reader configuration file
    #[arg(short, long, default_value = "reader.toml")]
    config: String,

    /// Override the RPC URL from the configuration
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Override the commitment (processed, confirmed, finalized)
    #[arg(long)]
    commitment: Option<String>,

    /// Log filter, e.g. "debug" or "chain_reader=trace"
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance of an address in lamports
    Balance { address: String },
    /// Current slot
    Slot,
    /// Latest blockhash and its last valid block height
    Blockhash,
    /// Cluster the node belongs to
    ChainId,
    /// Fee for a base64-encoded message
    Fee { message: String },
    /// Summary of the latest block
    Block,
    /// Raw account lookup
    Account { address: String },
    /// Print slot or blockhash updates until interrupted
    Watch {
        /// Watch blockhash changes instead of slots
        #[arg(long)]
        blockhash: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref());

    let mut config = if Path::new(&cli.config).exists() {
        ReaderConfig::load(&cli.config)?
    } else {
        warn!("Config file not found, using defaults: {}", cli.config);
        ReaderConfig::default()
    };

    if let Some(url) = cli.rpc_url {
        config = config.with_rpc_url(url);
    }
    if let Some(commitment) = cli.commitment {
        config = config.with_commitment(commitment);
    }

    let reader = Arc::new(RpcReader::from_config(&config)?);
    info!("RPC URL: {}", reader.url());
    info!("Commitment: {:?}", reader.commitment());

    match cli.command {
        Command::Balance { address } => {
            let address = parse_pubkey(&address)?;
            let lamports = reader.balance(&address).await?;
            println!("{}", lamports);
        }
        Command::Slot => {
            println!("{}", reader.slot_height().await?);
        }
        Command::Blockhash => {
            let latest = reader.latest_blockhash().await?;
            println!("blockhash: {}", latest.blockhash);
            println!("last valid block height: {}", latest.last_valid_block_height);
        }
        Command::ChainId => {
            println!("{}", reader.chain_id().await?);
        }
        Command::Fee { message } => {
            println!("{}", reader.get_fee_for_message(&message).await?);
        }
        Command::Block => {
            let latest = reader.get_latest_block().await?;
            let block = &latest.block;
            println!("slot: {}", latest.slot);
            println!("blockhash: {}", block.blockhash);
            println!("parent slot: {}", block.parent_slot);
            println!(
                "transactions: {}",
                block.transactions.as_ref().map(|txs| txs.len()).unwrap_or(0)
            );
            if let Some(block_time) = block.block_time {
                println!("block time: {}", block_time);
            }
        }
        Command::Account { address } => {
            let address = parse_pubkey(&address)?;
            let info = reader
                .get_account_info_with_opts(&address, AccountInfoOptions::default())
                .await?;
            println!("context slot: {}", info.context_slot);
            match info.account {
                Some(account) => {
                    println!("lamports: {}", account.lamports);
                    println!("owner: {}", account.owner);
                    println!("executable: {}", account.executable);
                    println!("data length: {}", account.data.len());
                }
                None => println!("account not found"),
            }
        }
        Command::Watch { blockhash } => {
            if blockhash {
                let poller = SourcePoller::new(BlockhashSource::new(reader), config.poller);
                watch(poller, |latest: LatestBlockhash| {
                    println!(
                        "{} (valid until height {})",
                        latest.blockhash, latest.last_valid_block_height
                    )
                })
                .await?;
            } else {
                let poller = SourcePoller::new(SlotSource::new(reader), config.poller);
                watch(poller, |slot| println!("{}", slot)).await?;
            }
            info!("Watch stopped");
        }
    }

    Ok(())
}

/// Print updates from a poller until the stream ends or ctrl-c arrives
async fn watch<S: Source>(poller: SourcePoller<S>, print: impl Fn(S::Output)) -> Result<()> {
    let (handle, mut updates) = poller.start()?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => print(update),
                None => break,
            },
            _ = signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid public key: {}", value))
}
