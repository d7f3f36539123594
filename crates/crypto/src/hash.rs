// Path: crates/crypto/src/hash.rs
//! Domain-separated SHA-256 hashing.
//!
//! Leaves and internal nodes hash under distinct one-byte prefixes so a
//! leaf image can never collide with an internal-node image.

use sha2::{Digest, Sha256};

/// Prefix byte for leaf hashes.
pub const LEAF_DOMAIN: u8 = 0x00;
/// Prefix byte for internal-node hashes.
pub const NODE_DOMAIN: u8 = 0x01;

/// Plain SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 applied twice, the Bitcoin-family message digest.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Hash of a signed canonical image as stored at the leaf level:
/// `SHA256(0x00 || image)`.
pub fn leaf_hash(signed_image: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_DOMAIN]);
    hasher.update(signed_image);
    hasher.finalize().into()
}

/// Hash of an internal node from its two children:
/// `SHA256(0x01 || left || right)`. Order-sensitive.
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_DOMAIN]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
