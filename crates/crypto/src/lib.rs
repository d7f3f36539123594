// Path: crates/crypto/src/lib.rs
#![forbid(unsafe_code)]
//! # pact-crypto
//!
//! The deterministic byte layer of the commitment store:
//!
//! - Canonical JSON images of commitments (the exact bytes that get signed
//!   and hashed).
//! - Domain-separated SHA-256 hashing for tree leaves and internal nodes.
//! - The persistent secp256k1 identity key, with Bitcoin-family
//!   double-SHA-256 message hashing and compact 64-byte signatures.

pub mod canonical;
pub mod hash;
pub mod identity;

pub use hash::{double_sha256, leaf_hash, node_hash, sha256};
pub use identity::IdentityKey;
