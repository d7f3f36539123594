// Path: crates/store/src/store.rs
//! The persistent commitment store.

use crate::schema::{
    node_key, state_key, ANCHORS, ANCHOR_TXIDS, COMMITMENTS, COMMITMENT_INDEX, CONFIG, TREE_NODES,
    TREE_STATE,
};
use pact_crypto::canonical::image_with_signature;
use pact_crypto::hash::leaf_hash;
use pact_crypto::IdentityKey;
use pact_tree::MerkleTree;
use pact_types::error::StoreError;
use pact_types::{Commitment, CommitmentFilter, CommitmentPayload, CommitmentType};
use rand::RngCore;
use redb::{Database, ReadableTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Database file name inside the data directory.
pub const DB_FILE: &str = "pact.redb";

/// A persisted commitment together with its verbatim signed canonical
/// image. The image is what was leaf-hashed; proofs embed it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitmentRow {
    pub commitment: Commitment,
    pub signed_image: String,
}

/// A durable, single-writer commitment store rooted at one data
/// directory.
///
/// The in-memory tree is a cache over the persisted rows: every reopen
/// replays the leaf sequence and cross-checks the recomputed root against
/// the persisted one before the store accepts writes.
pub struct CommitmentStore {
    pub(crate) db: Database,
    pub(crate) tree: MerkleTree,
    identity: IdentityKey,
    data_dir: PathBuf,
}

pub(crate) fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl CommitmentStore {
    /// Open (or initialize) the store in `data_dir`.
    ///
    /// Refuses to open when the persisted tree state disagrees with the
    /// root recomputed from the stored leaf sequence.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let identity = IdentityKey::load_or_create(&data_dir)?;
        let db = Database::create(data_dir.join(DB_FILE)).map_err(backend)?;

        // Ensure all tables exist so later read transactions never miss.
        {
            let write = db.begin_write().map_err(backend)?;
            {
                write.open_table(COMMITMENTS).map_err(backend)?;
                write.open_table(COMMITMENT_INDEX).map_err(backend)?;
                write.open_table(TREE_NODES).map_err(backend)?;
                write.open_table(TREE_STATE).map_err(backend)?;
                write.open_table(ANCHORS).map_err(backend)?;
                write.open_table(ANCHOR_TXIDS).map_err(backend)?;
                write.open_table(CONFIG).map_err(backend)?;
            }
            write.commit().map_err(backend)?;
        }

        let leaves = load_leaves(&db, u64::MAX)?;
        let store = Self {
            db,
            tree: MerkleTree::from_leaves(leaves)?,
            identity,
            data_dir,
        };
        store.check_integrity()?;

        log::info!(
            "Opened commitment store at {} ({} commitments)",
            store.data_dir.display(),
            store.tree.leaf_count()
        );
        Ok(store)
    }

    /// The persisted root/count must match the replayed tree exactly.
    fn check_integrity(&self) -> Result<(), StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let state = read.open_table(TREE_STATE).map_err(backend)?;

        let stored_count = state
            .get(state_key::LEAF_COUNT)
            .map_err(backend)?
            .map(|v| parse_u64(v.value()))
            .transpose()?
            .unwrap_or(0);
        if stored_count != self.tree.leaf_count() {
            return Err(StoreError::Corrupt(format!(
                "persisted leaf count {} != replayed leaf count {}",
                stored_count,
                self.tree.leaf_count()
            )));
        }

        let stored_root = state
            .get(state_key::ROOT_HASH)
            .map_err(backend)?
            .map(|v| parse_hash(v.value()))
            .transpose()?;
        if stored_root != self.tree.root() {
            return Err(StoreError::Corrupt(format!(
                "persisted root {} != replayed root {}",
                stored_root.map(hex::encode).unwrap_or_else(|| "∅".into()),
                self.tree
                    .root()
                    .map(hex::encode)
                    .unwrap_or_else(|| "∅".into()),
            )));
        }
        Ok(())
    }

    /// Sign, hash, append, and persist a new commitment in one
    /// transaction.
    pub fn commit(
        &mut self,
        commitment_type: CommitmentType,
        payload: CommitmentPayload,
    ) -> Result<Commitment, StoreError> {
        if payload.subject.is_empty() {
            return Err(StoreError::Validation("payload subject is empty".into()));
        }
        if payload.content.is_empty() {
            return Err(StoreError::Validation("payload content is empty".into()));
        }

        let id = new_commitment_id();
        let timestamp = now_millis();

        let unsigned = image_with_signature(&id, commitment_type, &payload, timestamp, "");
        let signature = self.identity.sign_hex(&unsigned);
        let signed = image_with_signature(&id, commitment_type, &payload, timestamp, &signature);
        let leaf = leaf_hash(&signed);

        let plan = self.tree.plan_append(leaf)?;
        let commitment = Commitment {
            id: id.clone(),
            commitment_type,
            payload,
            timestamp,
            signature,
            leaf_hash: hex::encode(leaf),
            tree_index: plan.leaf_index,
        };
        let row = CommitmentRow {
            commitment: commitment.clone(),
            signed_image: String::from_utf8(signed)
                .map_err(|e| StoreError::Validation(format!("payload is not UTF-8: {e}")))?,
        };
        let row_bytes = serde_json::to_vec(&row).map_err(backend)?;

        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut commitments = write.open_table(COMMITMENTS).map_err(backend)?;
            commitments
                .insert(id.as_str(), row_bytes.as_slice())
                .map_err(backend)?;

            let mut index = write.open_table(COMMITMENT_INDEX).map_err(backend)?;
            index.insert(plan.leaf_index, id.as_str()).map_err(backend)?;

            let mut nodes = write.open_table(TREE_NODES).map_err(backend)?;
            for w in &plan.nodes {
                nodes
                    .insert(node_key(w.level, w.index).as_slice(), &w.hash)
                    .map_err(backend)?;
            }

            let mut state = write.open_table(TREE_STATE).map_err(backend)?;
            state
                .insert(state_key::ROOT_HASH, plan.root.as_slice())
                .map_err(backend)?;
            state
                .insert(state_key::LEAF_COUNT, plan.leaf_count.to_be_bytes().as_slice())
                .map_err(backend)?;
        }
        write.commit().map_err(backend)?;

        // The database is the source of truth; only advance the cache once
        // the transaction has landed.
        self.tree.apply(&plan);

        log::debug!(
            "Committed {} at tree index {} (root {})",
            commitment.id,
            commitment.tree_index,
            hex::encode(plan.root)
        );
        Ok(commitment)
    }

    /// Fetch a commitment by id.
    pub fn get(&self, id: &str) -> Result<Option<Commitment>, StoreError> {
        Ok(self.get_row(id)?.map(|row| row.commitment))
    }

    /// Fetch a commitment by tree index.
    pub fn get_by_index(&self, tree_index: u64) -> Result<Option<Commitment>, StoreError> {
        let id = {
            let read = self.db.begin_read().map_err(backend)?;
            let index = read.open_table(COMMITMENT_INDEX).map_err(backend)?;
            let x = index
                .get(tree_index)
                .map_err(backend)?
                .map(|guard| guard.value().to_string());
            x
        };
        match id {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }

    pub(crate) fn get_row(&self, id: &str) -> Result<Option<CommitmentRow>, StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let commitments = read.open_table(COMMITMENTS).map_err(backend)?;
        let Some(raw) = commitments.get(id).map_err(backend)? else {
            return Ok(None);
        };
        let row: CommitmentRow = serde_json::from_slice(raw.value())
            .map_err(|e| StoreError::Corrupt(format!("commitment row {id}: {e}")))?;
        Ok(Some(row))
    }

    /// Filtered query, newest first, paginated.
    pub fn query(&self, filter: &CommitmentFilter) -> Result<Vec<Commitment>, StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let commitments = read.open_table(COMMITMENTS).map_err(backend)?;

        let mut matches = Vec::new();
        for entry in commitments.range::<&str>(..).map_err(backend)? {
            let (id, raw) = entry.map_err(backend)?;
            let row: CommitmentRow = serde_json::from_slice(raw.value())
                .map_err(|e| StoreError::Corrupt(format!("commitment row {}: {e}", id.value())))?;
            if filter.matches(&row.commitment) {
                matches.push(row.commitment);
            }
        }

        matches.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.tree_index.cmp(&a.tree_index))
        });

        let offset = filter.offset.unwrap_or(0) as usize;
        let matches: Vec<Commitment> = match filter.limit {
            Some(limit) => matches
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect(),
            None => matches.into_iter().skip(offset).collect(),
        };
        Ok(matches)
    }

    /// Total number of committed statements.
    pub fn count(&self) -> u64 {
        self.tree.leaf_count()
    }

    /// Current tree root, if any.
    pub fn root_hash(&self) -> Option<String> {
        self.tree.root().map(hex::encode)
    }

    /// Compressed public key of the store identity, hex.
    pub fn public_key(&self) -> String {
        self.identity.public_key_hex()
    }

    /// The data directory this store owns.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Leaf hashes for tree indices `0..limit`, in order.
    pub(crate) fn leaf_hashes(&self, limit: u64) -> Result<Vec<[u8; 32]>, StoreError> {
        load_leaves(&self.db, limit)
    }

    /// Read a configuration value.
    pub fn get_config(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read = self.db.begin_read().map_err(backend)?;
        let config = read.open_table(CONFIG).map_err(backend)?;
        let x = Ok(config
            .get(key)
            .map_err(backend)?
            .map(|v| v.value().to_string()));
        x
    }

    /// Write a configuration value.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let write = self.db.begin_write().map_err(backend)?;
        {
            let mut config = write.open_table(CONFIG).map_err(backend)?;
            config.insert(key, value).map_err(backend)?;
        }
        write.commit().map_err(backend)?;
        Ok(())
    }

    /// Flush and release the store. Dropping does the same; this just
    /// makes the lifecycle explicit at call sites.
    pub fn close(self) {
        log::info!("Closed commitment store at {}", self.data_dir.display());
        drop(self);
    }
}

fn load_leaves(db: &Database, limit: u64) -> Result<Vec<[u8; 32]>, StoreError> {
    let read = db.begin_read().map_err(backend)?;
    let index = read.open_table(COMMITMENT_INDEX).map_err(backend)?;
    let commitments = read.open_table(COMMITMENTS).map_err(backend)?;

    let mut leaves = Vec::new();
    for entry in index.range(0..limit).map_err(backend)? {
        let (tree_index, id) = entry.map_err(backend)?;
        let raw = commitments
            .get(id.value())
            .map_err(backend)?
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "tree index {} references missing commitment {}",
                    tree_index.value(),
                    id.value()
                ))
            })?;
        let row: CommitmentRow = serde_json::from_slice(raw.value())
            .map_err(|e| StoreError::Corrupt(format!("commitment row {}: {e}", id.value())))?;
        let leaf = hex::decode(&row.commitment.leaf_hash)
            .ok()
            .and_then(|b| <[u8; 32]>::try_from(b).ok())
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "commitment {} has malformed leaf hash",
                    id.value()
                ))
            })?;
        leaves.push(leaf);
    }
    Ok(leaves)
}

fn new_commitment_id() -> String {
    let mut entropy = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut entropy);
    format!("commit_{}", hex::encode(entropy))
}

pub(crate) fn parse_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Corrupt("malformed u64 state value".into()))?;
    Ok(u64::from_be_bytes(arr))
}

pub(crate) fn parse_hash(bytes: &[u8]) -> Result<[u8; 32], StoreError> {
    bytes
        .try_into()
        .map_err(|_| StoreError::Corrupt("malformed hash state value".into()))
}
