// Path: crates/tree/src/verify.rs
//! Stateless inclusion-proof verification.

use pact_crypto::hash::node_hash;
use pact_types::{MerkleProof, SiblingPosition};

/// Fold the proof's siblings over its leaf hash and accept iff the result
/// equals the proof's root hash.
///
/// Depends on nothing but the proof itself; any malformed hex or
/// wrong-length hash fails verification rather than erroring.
pub fn verify_inclusion(proof: &MerkleProof) -> bool {
    let Some(leaf) = decode_hash(&proof.leaf_hash) else {
        return false;
    };
    let Some(root) = decode_hash(&proof.root_hash) else {
        return false;
    };

    let mut acc = leaf;
    for step in &proof.siblings {
        let Some(sibling) = decode_hash(&step.hash) else {
            return false;
        };
        acc = match step.position {
            SiblingPosition::Left => node_hash(&sibling, &acc),
            SiblingPosition::Right => node_hash(&acc, &sibling),
        };
    }
    acc == root
}

fn decode_hash(hex_hash: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(hex_hash).ok()?;
    bytes.try_into().ok()
}
