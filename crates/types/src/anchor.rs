// Path: crates/types/src/anchor.rs
//! Anchor records: the link between a tree root and an on-chain
//! transaction.

use serde::{Deserialize, Serialize};

/// A recorded anchor. Anchors form a linear chain: each references its
/// predecessor by txid, and `commitment_count` is nondecreasing along the
/// chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// Dense sequential number starting at 0.
    pub anchor_index: u64,
    /// Transaction identifier returned by the wallet, lowercase hex.
    pub txid: String,
    /// Recording instant in milliseconds; refined to the block time once
    /// the anchor confirms.
    pub timestamp: u64,
    /// Confirmation height. Absent until the transaction confirms; once
    /// set it is never unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    /// Tree root captured at anchor time, lowercase hex.
    pub root_hash: String,
    /// Leaf count at anchor time. Always greater than zero.
    pub commitment_count: u64,
    /// Txid of the anchor with index `anchor_index - 1`; absent for the
    /// first anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_anchor: Option<String>,
}

impl Anchor {
    /// Whether the anchor has been observed in a block.
    pub fn is_confirmed(&self) -> bool {
        self.block_height.is_some()
    }

    /// Whether the tree snapshot this anchor captured contains the leaf at
    /// `tree_index`.
    pub fn covers(&self, tree_index: u64) -> bool {
        self.commitment_count > tree_index
    }

    /// Confirmation depth given an observed chain tip, `None` while
    /// unconfirmed.
    pub fn confirmations(&self, tip_height: u64) -> Option<u64> {
        self.block_height
            .map(|h| tip_height.saturating_sub(h) + 1)
    }
}
