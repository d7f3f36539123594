// Path: crates/cli/src/commands/prove.rs

use anyhow::Context;
use pact_store::CommitmentStore;
use pact_types::ProofBundle;
use std::fs;
use std::path::Path;

pub fn prove(store: &CommitmentStore, id: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let Some(_) = store.get(id)? else {
        anyhow::bail!("no commitment with id {id}");
    };
    let Some(bundle) = store.prove(id)? else {
        anyhow::bail!("commitment {id} is not covered by any anchor yet");
    };

    let encoded = serde_json::to_string_pretty(&bundle)?;
    match out {
        Some(path) => {
            fs::write(path, &encoded)
                .with_context(|| format!("writing proof to {}", path.display()))?;
            println!("Wrote proof for {id} to {}", path.display());
        }
        None => println!("{encoded}"),
    }
    Ok(())
}

pub fn verify(file: &Path, public_key: Option<&str>) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("reading proof file {}", file.display()))?;
    let bundle: ProofBundle =
        serde_json::from_str(&raw).context("proof file is not a valid proof bundle")?;

    let ok = CommitmentStore::verify_bundle(&bundle, public_key);
    if ok {
        match public_key {
            Some(_) => println!("OK: inclusion and signature verified"),
            None => println!("OK: inclusion verified (no key supplied, signature unchecked)"),
        }
        println!("Anchor txid: {}", bundle.anchor.txid);
        if let Some(height) = bundle.anchor.block_height {
            println!("Confirmed at height {height}");
        }
        Ok(())
    } else {
        anyhow::bail!("proof verification FAILED");
    }
}
