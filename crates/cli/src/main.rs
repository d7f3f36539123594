// Path: crates/cli/src/main.rs
//! `pact`: verifiable commitment memory for software agents.

mod commands;

use clap::{Parser, Subcommand};
use pact_store::CommitmentStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pact",
    version,
    about = "Record signed commitments, anchor them on chain, prove them offline"
)]
struct Cli {
    /// Data directory holding the database and identity key.
    #[arg(long, global = true, default_value = ".pact", env = "PACT_DATA_DIR")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the store and identity key.
    Init,
    /// Record a signed commitment.
    Commit(commands::commit::CommitArgs),
    /// Fetch one commitment by id.
    Get {
        id: String,
    },
    /// List commitments, optionally filtered.
    List(commands::query::ListArgs),
    /// Show store status: counts, root, identity, anchor chain head.
    Status,
    /// Print the number of stored commitments.
    Count,
    /// Write a portable proof file for an anchored commitment.
    Prove {
        id: String,
        /// Output path; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Verify a proof file offline.
    Verify {
        file: PathBuf,
        /// Also check the commitment signature under this public key.
        #[arg(long)]
        public_key: Option<String>,
    },
    /// Assemble the anchor payload and broadcast it through the wallet.
    Anchor {
        /// Fee rate hint for the wallet, satoshis per byte.
        #[arg(long)]
        fee_rate: Option<f64>,
        /// Print the payload without broadcasting or recording.
        #[arg(long)]
        dry_run: bool,
    },
    /// Record an anchor for a transaction broadcast out-of-band.
    RecordAnchor {
        txid: String,
        /// Recording timestamp in milliseconds; now when omitted.
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// Apply a confirmation fact to a recorded anchor.
    Refresh {
        txid: String,
        /// Confirmation height observed on chain.
        #[arg(long)]
        height: Option<u64>,
        /// Block timestamp in milliseconds, if known.
        #[arg(long)]
        block_time: Option<u64>,
    },
    /// List recorded anchors in chain order.
    Anchors,
    /// Answer one proof protocol message (from a file or stdin).
    Respond {
        /// Message file; stdin when omitted.
        file: Option<PathBuf>,
        /// Peer identifier used for rate limiting.
        #[arg(long, default_value = "local")]
        peer: String,
        /// Chain tip height for confirmation-depth checks.
        #[arg(long)]
        chain_tip: Option<u64>,
    },
    /// Show or update wallet configuration.
    Wallet {
        /// Set the wallet helper command used by `anchor`.
        #[arg(long)]
        command: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Command::Init => {
            let store = CommitmentStore::open(&data_dir)?;
            println!("Initialized store at {}", store.data_dir().display());
            println!("Public key: {}", store.public_key());
        }
        Command::Commit(args) => {
            let mut store = CommitmentStore::open(&data_dir)?;
            commands::commit::run(&mut store, args)?;
        }
        Command::Get { id } => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::query::get(&store, &id)?;
        }
        Command::List(args) => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::query::list(&store, args)?;
        }
        Command::Status => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::query::status(&store)?;
        }
        Command::Count => {
            let store = CommitmentStore::open(&data_dir)?;
            println!("{}", store.count());
        }
        Command::Prove { id, out } => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::prove::prove(&store, &id, out.as_deref())?;
        }
        Command::Verify { file, public_key } => {
            commands::prove::verify(&file, public_key.as_deref())?;
        }
        Command::Anchor { fee_rate, dry_run } => {
            let mut store = CommitmentStore::open(&data_dir)?;
            commands::anchor::anchor(&mut store, fee_rate, dry_run)?;
        }
        Command::RecordAnchor { txid, timestamp } => {
            let mut store = CommitmentStore::open(&data_dir)?;
            commands::anchor::record(&mut store, &txid, timestamp)?;
        }
        Command::Refresh {
            txid,
            height,
            block_time,
        } => {
            let mut store = CommitmentStore::open(&data_dir)?;
            commands::anchor::refresh(&mut store, &txid, height, block_time)?;
        }
        Command::Anchors => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::anchor::list(&store)?;
        }
        Command::Respond {
            file,
            peer,
            chain_tip,
        } => {
            let store = CommitmentStore::open(&data_dir)?;
            commands::respond::run(&store, &peer, file.as_deref(), chain_tip)?;
        }
        Command::Wallet { command } => {
            let mut store = CommitmentStore::open(&data_dir)?;
            commands::anchor::wallet(&mut store, command.as_deref())?;
        }
    }
    Ok(())
}
