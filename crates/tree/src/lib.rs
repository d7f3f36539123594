// Path: crates/tree/src/lib.rs
#![forbid(unsafe_code)]
//! # pact-tree
//!
//! An append-only Merkle tree over leaf hashes, addressed by
//! `(level, index)` with level 0 holding the leaves. Odd shapes follow the
//! rightmost-path rule: a parent whose right child does not exist hashes
//! its left child with itself, recursively at every level.
//!
//! Appends are planned before they are applied so a caller can persist the
//! whole dirty path in one transaction and only then advance the in-memory
//! tree. Proof verification is stateless and needs no tree at all.

use pact_crypto::hash::node_hash;
use pact_types::error::TreeError;
use pact_types::{MerkleProof, ProofStep, SiblingPosition};

mod verify;

pub use verify::verify_inclusion;

/// A single node write produced by an append plan: the value the node at
/// `(level, index)` takes once the plan is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeWrite {
    pub level: u32,
    pub index: u64,
    pub hash: [u8; 32],
}

/// The effect of appending one leaf: every node on the updated path plus
/// the resulting root and leaf count.
#[derive(Debug, Clone)]
pub struct AppendPlan {
    /// Index the new leaf lands at.
    pub leaf_index: u64,
    /// Dirty nodes from leaf level upward, in ascending level order.
    pub nodes: Vec<NodeWrite>,
    /// Root after the append.
    pub root: [u8; 32],
    /// Leaf count after the append.
    pub leaf_count: u64,
}

/// The append-only Merkle tree. Levels are dense vectors; level `L` has
/// `ceil(n / 2^L)` nodes for `n` leaves.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tree by appending the given leaves in order.
    pub fn from_leaves(leaves: impl IntoIterator<Item = [u8; 32]>) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for leaf in leaves {
            tree.append(leaf)?;
        }
        Ok(tree)
    }

    pub fn leaf_count(&self) -> u64 {
        self.levels.first().map(|l| l.len() as u64).unwrap_or(0)
    }

    /// `ceil(log2(max(n, 1)))`: the level index of the root.
    pub fn height(&self) -> u32 {
        height_for(self.leaf_count())
    }

    /// Current root, `None` for an empty tree. A single-leaf tree's root is
    /// the leaf itself.
    pub fn root(&self) -> Option<[u8; 32]> {
        let height = self.height();
        self.node(height, 0)
    }

    /// The stored hash at `(level, index)`, if that node exists.
    pub fn node(&self, level: u32, index: u64) -> Option<[u8; 32]> {
        self.levels
            .get(level as usize)
            .and_then(|l| l.get(index as usize))
            .copied()
    }

    /// Compute the node writes appending `leaf` would produce, without
    /// mutating the tree.
    ///
    /// The updated path is always the rightmost path: at every level the
    /// dirty node is the last node of that level, so its sibling exists
    /// exactly when the dirty index is odd.
    pub fn plan_append(&self, leaf: [u8; 32]) -> Result<AppendPlan, TreeError> {
        let leaf_index = self.leaf_count();
        let new_count = leaf_index + 1;
        let height = height_for(new_count);

        let mut nodes = Vec::with_capacity(height as usize + 1);
        nodes.push(NodeWrite {
            level: 0,
            index: leaf_index,
            hash: leaf,
        });

        let mut acc = leaf;
        let mut index = leaf_index;
        for level in 0..height {
            acc = if index % 2 == 1 {
                let left = self
                    .node(level, index - 1)
                    .ok_or(TreeError::MissingNode {
                        level,
                        index: index - 1,
                    })?;
                node_hash(&left, &acc)
            } else {
                node_hash(&acc, &acc)
            };
            index /= 2;
            nodes.push(NodeWrite {
                level: level + 1,
                index,
                hash: acc,
            });
        }

        Ok(AppendPlan {
            leaf_index,
            nodes,
            root: acc,
            leaf_count: new_count,
        })
    }

    /// Apply a plan produced by [`plan_append`] on this tree state.
    pub fn apply(&mut self, plan: &AppendPlan) {
        for write in &plan.nodes {
            let level = write.level as usize;
            if self.levels.len() <= level {
                self.levels.push(Vec::new());
            }
            let row = &mut self.levels[level];
            if write.index as usize == row.len() {
                row.push(write.hash);
            } else {
                row[write.index as usize] = write.hash;
            }
        }
    }

    /// Plan and apply in one step. Returns the plan so callers can inspect
    /// the dirty path.
    pub fn append(&mut self, leaf: [u8; 32]) -> Result<AppendPlan, TreeError> {
        let plan = self.plan_append(leaf)?;
        self.apply(&plan);
        Ok(plan)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// One sibling per level from 0 to `height - 1`; where the sibling does
    /// not exist the node's own hash stands in on the right, mirroring the
    /// rightmost-path rule. A single-leaf tree yields an empty sibling
    /// list.
    pub fn prove(&self, index: u64) -> Result<MerkleProof, TreeError> {
        let count = self.leaf_count();
        if index >= count {
            return Err(TreeError::LeafOutOfRange { index, count });
        }

        let leaf = self.node(0, index).ok_or(TreeError::MissingNode {
            level: 0,
            index,
        })?;
        let root = self.root().ok_or(TreeError::MissingNode {
            level: self.height(),
            index: 0,
        })?;

        let mut siblings = Vec::with_capacity(self.height() as usize);
        let mut i = index;
        for level in 0..self.height() {
            let sibling_index = i ^ 1;
            let position = if i % 2 == 0 {
                SiblingPosition::Right
            } else {
                SiblingPosition::Left
            };
            let hash = match self.node(level, sibling_index) {
                Some(h) => h,
                // Missing right sibling: the node pairs with itself.
                None => self.node(level, i).ok_or(TreeError::MissingNode {
                    level,
                    index: i,
                })?,
            };
            siblings.push(ProofStep {
                hash: hex::encode(hash),
                position,
            });
            i /= 2;
        }

        Ok(MerkleProof {
            leaf_hash: hex::encode(leaf),
            tree_index: index,
            siblings,
            root_hash: hex::encode(root),
        })
    }
}

fn height_for(leaf_count: u64) -> u32 {
    match leaf_count {
        0 | 1 => 0,
        n => 64 - (n - 1).leading_zeros(),
    }
}

#[cfg(test)]
mod tests;
