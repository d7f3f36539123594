// Path: crates/cli/src/commands/respond.rs
//! One-shot proof-service handler: feed a protocol message in, get the
//! reply out. Lets any transport (or a human with a pipe) exercise the
//! proof endpoint without a daemon.

use anyhow::Context;
use pact_service::{ProofMessage, ProofService, ProofServiceConfig};
use pact_store::CommitmentStore;
use std::io::Read;
use std::path::Path;

pub fn run(
    store: &CommitmentStore,
    peer: &str,
    file: Option<&Path>,
    chain_tip: Option<u64>,
) -> anyhow::Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading message from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let message: ProofMessage =
        serde_json::from_str(&raw).context("input is not a valid proof protocol message")?;

    let mut service = ProofService::new(ProofServiceConfig::default());
    if let Some(tip) = chain_tip {
        service.set_chain_tip(tip);
    }

    match service.handle(store, peer, message) {
        Some(reply) => println!("{}", serde_json::to_string_pretty(&reply)?),
        None => log::info!("Message kind takes no reply"),
    }
    Ok(())
}
