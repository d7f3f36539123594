// Path: crates/store/src/anchor.rs
//! The anchor engine: payload assembly, the anchor chain, the binding
//! rule, and proof production.
//!
//! An anchor captures `(root, count)` at payload-assembly time and links
//! to its predecessor by txid, forming a linear chain. A commitment's
//! proof binds to the *earliest* anchor whose count exceeds the
//! commitment's tree index; commitments past the newest anchor are
//! unanchored and cannot be proven yet.

use crate::schema::{state_key, ANCHORS, ANCHOR_TXIDS, TREE_STATE};
use crate::store::{backend, now_millis, parse_u64, CommitmentStore};
use crate::wallet::{ChainView, WalletBroadcaster};
use pact_crypto::canonical::reimage_unsigned;
use pact_crypto::hash::leaf_hash;
use pact_crypto::identity::verify_with_key_hex;
use pact_tree::{verify_inclusion, MerkleTree};
use pact_types::error::{AnchorError, StoreError};
use pact_types::{Anchor, AnchorRef, CommitmentImage, ProofBundle};
use redb::ReadableTable;
use serde::Deserialize;

/// ASCII protocol identifier at the head of every anchor payload.
pub const ANCHOR_PROTOCOL_ID: &[u8; 10] = b"BSV-ANCHOR";
/// Payload format version.
pub const ANCHOR_VERSION: u8 = 0x01;
/// Exact payload length; the layout is bit-exact and part of the external
/// contract.
pub const ANCHOR_PAYLOAD_LEN: usize = 79;

/// The fixed-layout on-chain payload.
///
/// ```text
/// [0..10)   "BSV-ANCHOR"
/// [10]      version 0x01
/// [11..43)  tree root, raw bytes
/// [43..47)  commitment count, big-endian u32
/// [47..79)  previous anchor txid raw bytes, all-zero for the first anchor
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPayload {
    pub root_hash: [u8; 32],
    pub commitment_count: u32,
    pub previous_txid: Option<[u8; 32]>,
}

impl AnchorPayload {
    pub fn to_bytes(&self) -> [u8; ANCHOR_PAYLOAD_LEN] {
        let mut out = [0u8; ANCHOR_PAYLOAD_LEN];
        out[..10].copy_from_slice(ANCHOR_PROTOCOL_ID);
        out[10] = ANCHOR_VERSION;
        out[11..43].copy_from_slice(&self.root_hash);
        out[43..47].copy_from_slice(&self.commitment_count.to_be_bytes());
        if let Some(prev) = &self.previous_txid {
            out[47..79].copy_from_slice(prev);
        }
        out
    }

    /// Parse and validate a payload observed on chain.
    pub fn parse(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() != ANCHOR_PAYLOAD_LEN {
            return Err(StoreError::Validation(format!(
                "anchor payload must be {ANCHOR_PAYLOAD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if &bytes[..10] != ANCHOR_PROTOCOL_ID {
            return Err(StoreError::Validation(
                "anchor payload has wrong protocol identifier".into(),
            ));
        }
        if bytes[10] != ANCHOR_VERSION {
            return Err(StoreError::Validation(format!(
                "unsupported anchor payload version {:#04x}",
                bytes[10]
            )));
        }
        let mut root_hash = [0u8; 32];
        root_hash.copy_from_slice(&bytes[11..43]);
        let mut count_bytes = [0u8; 4];
        count_bytes.copy_from_slice(&bytes[43..47]);
        let commitment_count = u32::from_be_bytes(count_bytes);
        let mut prev = [0u8; 32];
        prev.copy_from_slice(&bytes[47..79]);
        let previous_txid = if prev == [0u8; 32] { None } else { Some(prev) };
        Ok(Self {
            root_hash,
            commitment_count,
            previous_txid,
        })
    }
}

/// Options for the anchor operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorOptions {
    /// Fee rate hint passed through to the wallet, satoshis per byte.
    pub fee_rate: Option<f64>,
    /// Assemble the payload but do not broadcast or record.
    pub dry_run: bool,
}

/// Result of the anchor operation.
#[derive(Debug, Clone)]
pub enum AnchorOutcome {
    /// The payload was broadcast and the anchor recorded.
    Recorded(Anchor),
    /// Dry run: the payload that would have been broadcast.
    DryRun(AnchorPayload),
}

/// Signature field of a verbatim commitment image.
#[derive(Deserialize)]
struct SignedImageFields {
    signature: String,
}

impl CommitmentStore {
    /// Assemble the payload for the current tree state.
    ///
    /// Refused when the tree is empty or when nothing was committed since
    /// the most recent anchor.
    pub fn build_anchor_payload(&self) -> Result<AnchorPayload, StoreError> {
        let Some(root_hash) = self.tree.root() else {
            log::warn!("Refusing to assemble anchor payload: tree is empty");
            return Err(AnchorError::EmptyTree.into());
        };
        let leaf_count = self.tree.leaf_count();

        let previous = self.latest_anchor()?;
        if let Some(prev) = &previous {
            if leaf_count <= prev.commitment_count {
                log::warn!(
                    "Refusing to assemble anchor payload: no commitments since anchor {}",
                    prev.anchor_index
                );
                return Err(AnchorError::NothingNew(prev.anchor_index).into());
            }
        }

        let commitment_count = u32::try_from(leaf_count).map_err(|_| {
            StoreError::Validation(format!("leaf count {leaf_count} exceeds payload range"))
        })?;
        let previous_txid = previous
            .as_ref()
            .map(|a| decode_txid(&a.txid))
            .transpose()?;

        Ok(AnchorPayload {
            root_hash,
            commitment_count,
            previous_txid,
        })
    }

    /// Assemble, broadcast through the wallet seam, and record.
    ///
    /// The recorded anchor snapshots the root and count captured at
    /// payload-assembly time, not whatever the tree holds when the wallet
    /// returns. A failed broadcast leaves the store unchanged.
    pub fn anchor(
        &mut self,
        options: AnchorOptions,
        wallet: &dyn WalletBroadcaster,
    ) -> Result<AnchorOutcome, StoreError> {
        let payload = self.build_anchor_payload()?;
        if options.dry_run {
            return Ok(AnchorOutcome::DryRun(payload));
        }

        let txid = wallet.broadcast_anchor(&payload.to_bytes(), options.fee_rate)?;
        let anchor = self.record_anchor_snapshot(
            &txid,
            payload.root_hash,
            payload.commitment_count as u64,
            now_millis(),
        )?;
        Ok(AnchorOutcome::Recorded(anchor))
    }

    /// Record an anchor for a transaction broadcast out-of-band.
    ///
    /// This is the repair path for a broadcast that succeeded without a
    /// local record; it snapshots the *current* tree state.
    pub fn record_anchor(
        &mut self,
        txid: &str,
        timestamp: Option<u64>,
    ) -> Result<Anchor, StoreError> {
        let Some(root_hash) = self.tree.root() else {
            return Err(AnchorError::EmptyTree.into());
        };
        self.record_anchor_snapshot(
            txid,
            root_hash,
            self.tree.leaf_count(),
            timestamp.unwrap_or_else(now_millis),
        )
    }

    fn record_anchor_snapshot(
        &mut self,
        txid: &str,
        root_hash: [u8; 32],
        commitment_count: u64,
        timestamp: u64,
    ) -> Result<Anchor, StoreError> {
        let txid = normalize_txid(txid)?;
        if self.anchor_by_txid(&txid)?.is_some() {
            return Err(AnchorError::DuplicateTxid(txid).into());
        }

        let previous = self.latest_anchor()?;
        let anchor = Anchor {
            anchor_index: previous.as_ref().map(|a| a.anchor_index + 1).unwrap_or(0),
            txid: txid.clone(),
            timestamp,
            block_height: None,
            root_hash: hex::encode(root_hash),
            commitment_count,
            previous_anchor: previous.map(|a| a.txid),
        };
        let anchor_bytes = serde_json::to_vec(&anchor).map_err(backend)?;

        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut anchors = write.open_table(ANCHORS).map_err(backend)?;
            anchors
                .insert(anchor.anchor_index, anchor_bytes.as_slice())
                .map_err(backend)?;

            let mut txids = write.open_table(ANCHOR_TXIDS).map_err(backend)?;
            txids
                .insert(txid.as_str(), anchor.anchor_index)
                .map_err(backend)?;

            let mut state = write.open_table(TREE_STATE).map_err(backend)?;
            state
                .insert(
                    state_key::LAST_ANCHOR_INDEX,
                    anchor.anchor_index.to_be_bytes().as_slice(),
                )
                .map_err(backend)?;
        }
        write.commit().map_err(backend)?;

        log::info!(
            "Recorded anchor {} (txid {}, {} commitments)",
            anchor.anchor_index,
            anchor.txid,
            anchor.commitment_count
        );
        Ok(anchor)
    }

    /// Apply a confirmation fact from the chain view. Returns the updated
    /// anchor, or `None` for an unknown txid. A height, once set, is never
    /// unset or lowered back to pending.
    pub fn refresh_anchor(
        &mut self,
        txid: &str,
        chain: &dyn ChainView,
    ) -> Result<Option<Anchor>, StoreError> {
        let Some(mut anchor) = self.anchor_by_txid(txid)? else {
            return Ok(None);
        };
        if anchor.block_height.is_some() {
            return Ok(Some(anchor));
        }

        let status = chain.confirmation(&anchor.txid)?;
        if !status.confirmed {
            return Ok(Some(anchor));
        }
        let Some(height) = status.block_height else {
            return Ok(Some(anchor));
        };

        anchor.block_height = Some(height);
        if let Some(block_time) = status.block_time {
            anchor.timestamp = block_time;
        }
        let anchor_bytes = serde_json::to_vec(&anchor).map_err(backend)?;

        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut anchors = write.open_table(ANCHORS).map_err(backend)?;
            anchors
                .insert(anchor.anchor_index, anchor_bytes.as_slice())
                .map_err(backend)?;
        }
        write.commit().map_err(backend)?;

        log::info!(
            "Anchor {} confirmed at height {}",
            anchor.anchor_index,
            height
        );
        Ok(Some(anchor))
    }

    /// The most recently recorded anchor.
    pub fn latest_anchor(&self) -> Result<Option<Anchor>, StoreError> {
        let index = {
            let read = self.db.begin_read().map_err(backend)?;
            let state = read.open_table(TREE_STATE).map_err(backend)?;
            let x = match state.get(state_key::LAST_ANCHOR_INDEX).map_err(backend)? {
                Some(raw) => Some(parse_u64(raw.value())?),
                None => None,
            };
            x
        };
        match index {
            Some(index) => self.get_anchor(index),
            None => Ok(None),
        }
    }

    /// Fetch an anchor by chain position.
    pub fn get_anchor(&self, anchor_index: u64) -> Result<Option<Anchor>, StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let anchors = read.open_table(ANCHORS).map_err(backend)?;
        let x = anchors
            .get(anchor_index)
            .map_err(backend)?
            .map(|raw| parse_anchor(anchor_index, raw.value()))
            .transpose();
        x
    }

    /// Fetch an anchor by txid.
    pub fn anchor_by_txid(&self, txid: &str) -> Result<Option<Anchor>, StoreError> {
        let txid = txid.to_ascii_lowercase();
        let index = {
            let read = self.db.begin_read().map_err(backend)?;
            let txids = read.open_table(ANCHOR_TXIDS).map_err(backend)?;
            let x = txids
                .get(txid.as_str())
                .map_err(backend)?
                .map(|guard| guard.value());
            x
        };
        match index {
            Some(index) => self.get_anchor(index),
            None => Ok(None),
        }
    }

    /// All anchors in chain order.
    pub fn list_anchors(&self) -> Result<Vec<Anchor>, StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let anchors = read.open_table(ANCHORS).map_err(backend)?;
        let mut out = Vec::new();
        for entry in anchors.range::<u64>(..).map_err(backend)? {
            let (index, raw) = entry.map_err(backend)?;
            out.push(parse_anchor(index.value(), raw.value())?);
        }
        Ok(out)
    }

    /// The earliest anchor whose snapshot contains the given leaf.
    /// Counts are monotone along the chain, so the first hit wins.
    pub fn binding_anchor(&self, tree_index: u64) -> Result<Option<Anchor>, StoreError> {
        for anchor in self.list_anchors()? {
            if anchor.covers(tree_index) {
                return Ok(Some(anchor));
            }
        }
        Ok(None)
    }

    /// Number of commitments no anchor covers yet.
    pub fn unanchored_count(&self) -> Result<u64, StoreError> {
        let anchored = self
            .latest_anchor()?
            .map(|a| a.commitment_count)
            .unwrap_or(0);
        Ok(self.tree.leaf_count().saturating_sub(anchored))
    }

    /// Produce a portable proof for a commitment.
    ///
    /// `None` when the id is unknown or no anchor covers the commitment.
    /// The proof is generated against the bound anchor's historical tree
    /// (its first `commitment_count` leaves), since later appends have
    /// overwritten the live path nodes.
    pub fn prove(&self, id: &str) -> Result<Option<ProofBundle>, StoreError> {
        let Some(row) = self.get_row(id)? else {
            return Ok(None);
        };
        let commitment = &row.commitment;
        let Some(anchor) = self.binding_anchor(commitment.tree_index)? else {
            return Ok(None);
        };

        let leaves = self.leaf_hashes(anchor.commitment_count)?;
        let snapshot = MerkleTree::from_leaves(leaves)?;
        let merkle_proof = snapshot.prove(commitment.tree_index)?;
        if merkle_proof.root_hash != anchor.root_hash {
            return Err(AnchorError::RootMismatch(id.to_string()).into());
        }

        Ok(Some(ProofBundle {
            commitment: CommitmentImage::from_canonical(row.signed_image),
            merkle_proof,
            anchor: AnchorRef {
                txid: anchor.txid,
                block_height: anchor.block_height,
                timestamp: anchor.timestamp,
            },
        }))
    }

    /// Offline verification of a proof bundle.
    ///
    /// Checks the leaf hash against the verbatim commitment bytes and
    /// folds the inclusion proof. With a public key, additionally checks
    /// the signature over the rebuilt unsigned image. Malformed input
    /// fails closed.
    pub fn verify_bundle(bundle: &ProofBundle, public_key: Option<&str>) -> bool {
        let raw = bundle.commitment.get();

        let leaf = leaf_hash(bundle.commitment.as_bytes());
        if hex::encode(leaf) != bundle.merkle_proof.leaf_hash {
            log::debug!("Proof rejected: leaf hash does not match commitment bytes");
            return false;
        }
        if !verify_inclusion(&bundle.merkle_proof) {
            log::debug!("Proof rejected: inclusion fold does not reach the root");
            return false;
        }

        if let Some(key) = public_key {
            let Ok(fields) = serde_json::from_str::<SignedImageFields>(raw) else {
                return false;
            };
            let Ok(unsigned) = reimage_unsigned(raw) else {
                return false;
            };
            return verify_with_key_hex(key, &unsigned, &fields.signature).unwrap_or(false);
        }
        true
    }
}

fn parse_anchor(index: u64, raw: &[u8]) -> Result<Anchor, StoreError> {
    serde_json::from_slice(raw)
        .map_err(|e| StoreError::Corrupt(format!("anchor row {index}: {e}")))
}

fn normalize_txid(txid: &str) -> Result<String, StoreError> {
    let txid = txid.to_ascii_lowercase();
    decode_txid(&txid)?;
    Ok(txid)
}

fn decode_txid(txid: &str) -> Result<[u8; 32], StoreError> {
    hex::decode(txid)
        .ok()
        .and_then(|b| <[u8; 32]>::try_from(b).ok())
        .ok_or_else(|| AnchorError::InvalidTxid(txid.to_string()).into())
}
