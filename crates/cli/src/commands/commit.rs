// Path: crates/cli/src/commands/commit.rs

use anyhow::Context;
use clap::Args;
use pact_store::CommitmentStore;
use pact_types::commitment::CanonicalValue;
use pact_types::{CommitmentPayload, CommitmentType};
use std::collections::BTreeMap;

#[derive(Args)]
pub struct CommitArgs {
    /// Commitment type: agreement, attestation, state, or custom.
    #[arg(long, default_value = "attestation")]
    pub r#type: String,
    /// What the commitment is about.
    #[arg(long)]
    pub subject: String,
    /// The statement itself.
    #[arg(long)]
    pub content: String,
    /// The other party, for bilateral commitments.
    #[arg(long)]
    pub counterparty: Option<String>,
    /// Structured annotations as a JSON object (integer numbers only).
    #[arg(long)]
    pub metadata: Option<String>,
}

pub fn run(store: &mut CommitmentStore, args: CommitArgs) -> anyhow::Result<()> {
    let commitment_type: CommitmentType = args
        .r#type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let metadata: Option<BTreeMap<String, CanonicalValue>> = args
        .metadata
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("metadata must be a JSON object with integer numbers")?;

    let commitment = store.commit(
        commitment_type,
        CommitmentPayload {
            subject: args.subject,
            content: args.content,
            counterparty: args.counterparty,
            metadata,
        },
    )?;

    println!("{}", serde_json::to_string_pretty(&commitment)?);
    Ok(())
}
