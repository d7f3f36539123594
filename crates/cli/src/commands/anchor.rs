// Path: crates/cli/src/commands/anchor.rs

use pact_store::wallet::{ChainView, ConfirmationStatus, NoWallet, WalletBroadcaster};
use pact_store::{AnchorOptions, AnchorOutcome, CommitmentStore};
use pact_types::error::ExternalError;
use std::process::Command;

/// Config key naming the external wallet helper the `anchor` command
/// shells out to.
pub const WALLET_COMMAND_KEY: &str = "wallet.command";

/// A wallet seam backed by an external helper program. The helper gets
/// the payload hex as its last argument and must print the resulting
/// txid on stdout.
struct CommandWallet {
    command: String,
}

impl WalletBroadcaster for CommandWallet {
    fn broadcast_anchor(
        &self,
        payload: &[u8],
        fee_rate: Option<f64>,
    ) -> Result<String, ExternalError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("{} \"$0\"", self.command))
            .arg(hex::encode(payload));
        if let Some(rate) = fee_rate {
            cmd.env("PACT_FEE_RATE", rate.to_string());
        }

        let output = cmd
            .output()
            .map_err(|e| ExternalError::Unavailable(format!("wallet helper: {e}")))?;
        if !output.status.success() {
            return Err(ExternalError::Broadcast(format!(
                "wallet helper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let txid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if txid.is_empty() {
            return Err(ExternalError::Broadcast(
                "wallet helper printed no txid".into(),
            ));
        }
        Ok(txid)
    }
}

/// A confirmation fact supplied on the command line, standing in for a
/// block explorer.
struct SuppliedFact {
    height: Option<u64>,
    block_time: Option<u64>,
}

impl ChainView for SuppliedFact {
    fn confirmation(&self, _txid: &str) -> Result<ConfirmationStatus, ExternalError> {
        match self.height {
            Some(height) => Ok(ConfirmationStatus {
                confirmed: true,
                block_height: Some(height),
                block_time: self.block_time,
            }),
            None => Err(ExternalError::Unavailable(
                "no block explorer configured; pass --height with the observed confirmation"
                    .into(),
            )),
        }
    }
}

pub fn anchor(
    store: &mut CommitmentStore,
    fee_rate: Option<f64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let options = AnchorOptions { fee_rate, dry_run };

    let outcome = match store.get_config(WALLET_COMMAND_KEY)? {
        Some(command) => store.anchor(options, &CommandWallet { command })?,
        // The dry run never reaches the wallet seam.
        None if dry_run => store.anchor(options, &NoWallet)?,
        None => anyhow::bail!(
            "no wallet configured; run `pact anchor --dry-run`, broadcast the payload \
             yourself, then `pact record-anchor <txid>` (or set a helper with \
             `pact wallet --command <cmd>`)"
        ),
    };

    match outcome {
        AnchorOutcome::DryRun(payload) => {
            println!("Anchor payload ({} bytes):", payload.to_bytes().len());
            println!("{}", hex::encode(payload.to_bytes()));
        }
        AnchorOutcome::Recorded(anchor) => {
            println!("{}", serde_json::to_string_pretty(&anchor)?);
        }
    }
    Ok(())
}

pub fn record(
    store: &mut CommitmentStore,
    txid: &str,
    timestamp: Option<u64>,
) -> anyhow::Result<()> {
    let anchor = store.record_anchor(txid, timestamp)?;
    println!("{}", serde_json::to_string_pretty(&anchor)?);
    Ok(())
}

pub fn refresh(
    store: &mut CommitmentStore,
    txid: &str,
    height: Option<u64>,
    block_time: Option<u64>,
) -> anyhow::Result<()> {
    let fact = SuppliedFact { height, block_time };
    match store.refresh_anchor(txid, &fact)? {
        Some(anchor) => {
            println!("{}", serde_json::to_string_pretty(&anchor)?);
            Ok(())
        }
        None => anyhow::bail!("no recorded anchor with txid {txid}"),
    }
}

pub fn list(store: &CommitmentStore) -> anyhow::Result<()> {
    let anchors = store.list_anchors()?;
    if anchors.is_empty() {
        println!("No anchors recorded.");
        return Ok(());
    }
    for a in &anchors {
        println!(
            "#{}  txid {}  {} commitments  {}",
            a.anchor_index,
            a.txid,
            a.commitment_count,
            match a.block_height {
                Some(h) => format!("confirmed at {h}"),
                None => "unconfirmed".into(),
            }
        );
    }
    Ok(())
}

pub fn wallet(store: &mut CommitmentStore, command: Option<&str>) -> anyhow::Result<()> {
    if let Some(command) = command {
        store.set_config(WALLET_COMMAND_KEY, command)?;
        println!("Wallet helper set to: {command}");
        return Ok(());
    }
    match store.get_config(WALLET_COMMAND_KEY)? {
        Some(command) => println!("Wallet helper: {command}"),
        None => println!("No wallet configured. Set one with `pact wallet --command <cmd>`."),
    }
    Ok(())
}
