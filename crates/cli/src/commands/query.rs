// Path: crates/cli/src/commands/query.rs

use clap::Args;
use pact_store::CommitmentStore;
use pact_types::{CommitmentFilter, CommitmentType};

#[derive(Args)]
pub struct ListArgs {
    /// Filter by commitment type.
    #[arg(long)]
    pub r#type: Option<String>,
    /// Filter by subject substring.
    #[arg(long)]
    pub subject: Option<String>,
    /// Filter by exact counterparty.
    #[arg(long)]
    pub counterparty: Option<String>,
    /// Only commitments at or after this timestamp (ms).
    #[arg(long)]
    pub since: Option<u64>,
    /// Only commitments at or before this timestamp (ms).
    #[arg(long)]
    pub until: Option<u64>,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

pub fn get(store: &CommitmentStore, id: &str) -> anyhow::Result<()> {
    match store.get(id)? {
        Some(commitment) => {
            println!("{}", serde_json::to_string_pretty(&commitment)?);
            Ok(())
        }
        None => anyhow::bail!("no commitment with id {id}"),
    }
}

pub fn list(store: &CommitmentStore, args: ListArgs) -> anyhow::Result<()> {
    let commitment_type: Option<CommitmentType> = args
        .r#type
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let filter = CommitmentFilter {
        commitment_type,
        subject: args.subject,
        counterparty: args.counterparty,
        since: args.since,
        until: args.until,
        limit: Some(args.limit),
        offset: Some(args.offset),
    };

    let results = store.query(&filter)?;
    if results.is_empty() {
        println!("No matching commitments.");
        return Ok(());
    }
    for c in &results {
        println!(
            "{}  [{}]  #{}  {}  {}",
            c.id, c.commitment_type, c.tree_index, c.timestamp, c.payload.subject
        );
    }
    Ok(())
}

pub fn status(store: &CommitmentStore) -> anyhow::Result<()> {
    println!("Data directory:  {}", store.data_dir().display());
    println!("Public key:      {}", store.public_key());
    println!("Commitments:     {}", store.count());
    println!(
        "Tree root:       {}",
        store.root_hash().unwrap_or_else(|| "(empty)".into())
    );
    println!("Unanchored:      {}", store.unanchored_count()?);

    match store.latest_anchor()? {
        Some(anchor) => {
            println!(
                "Latest anchor:   #{} txid {} ({} commitments, {})",
                anchor.anchor_index,
                anchor.txid,
                anchor.commitment_count,
                match anchor.block_height {
                    Some(h) => format!("confirmed at {h}"),
                    None => "unconfirmed".into(),
                }
            );
        }
        None => println!("Latest anchor:   (none)"),
    }
    Ok(())
}
