// Path: crates/store/src/schema.rs
//! Table definitions and key encodings for the redb database.

use redb::TableDefinition;

/// Commitment rows: id → JSON-encoded [`crate::store::CommitmentRow`].
pub(crate) const COMMITMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("commitments");

/// Insertion order: tree index → commitment id.
pub(crate) const COMMITMENT_INDEX: TableDefinition<u64, &str> =
    TableDefinition::new("commitment_index");

/// Merkle nodes: `[level_be(4) || index_be(8)]` → 32-byte hash.
pub(crate) const TREE_NODES: TableDefinition<&[u8], &[u8; 32]> = TableDefinition::new("tree_nodes");

/// Tree state: key → raw value (see the `state_key` constants).
pub(crate) const TREE_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("tree_state");

/// Anchor rows: anchor index → JSON-encoded [`pact_types::Anchor`].
pub(crate) const ANCHORS: TableDefinition<u64, &[u8]> = TableDefinition::new("anchors");

/// Txid uniqueness and reverse lookup: txid → anchor index.
pub(crate) const ANCHOR_TXIDS: TableDefinition<&str, u64> = TableDefinition::new("anchor_txids");

/// Free-form configuration: key → value.
pub(crate) const CONFIG: TableDefinition<&str, &str> = TableDefinition::new("config");

pub(crate) mod state_key {
    pub const ROOT_HASH: &str = "root_hash";
    pub const LEAF_COUNT: &str = "leaf_count";
    pub const LAST_ANCHOR_INDEX: &str = "last_anchor_index";
}

/// Composite key for a tree node.
pub(crate) fn node_key(level: u32, index: u64) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..4].copy_from_slice(&level.to_be_bytes());
    key[4..].copy_from_slice(&index.to_be_bytes());
    key
}
