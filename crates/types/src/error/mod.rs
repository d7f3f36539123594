// Path: crates/types/src/error/mod.rs
//! Error taxonomy for the pact workspace.

use thiserror::Error;

/// Errors from canonicalization, hashing, signing, and key handling.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The key material could not be parsed or is otherwise unusable.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    /// Producing a signature failed.
    #[error("Signing failed: {0}")]
    Signing(String),
    /// A signature or hash was not valid hex of the expected length.
    #[error("Invalid encoding: {0}")]
    Encoding(String),
    /// The identity key file is malformed.
    #[error("Key file error: {0}")]
    KeyFile(String),
    /// An I/O error while reading or writing key material.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the append-only Merkle tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A proof was requested for a leaf index at or beyond the leaf count.
    #[error("Leaf index {index} out of range for {count} leaves")]
    LeafOutOfRange { index: u64, count: u64 },
    /// A node the append or proof path requires is not present.
    #[error("Missing tree node at level {level}, index {index}")]
    MissingNode { level: u32, index: u64 },
    /// A hash was not 32 bytes of valid hex.
    #[error("Invalid hash encoding: {0}")]
    InvalidHash(String),
}

/// Errors from anchor payload assembly and the anchor chain.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// Payload assembly was requested on an empty tree.
    #[error("Tree is empty; nothing to anchor")]
    EmptyTree,
    /// No commitments were added since the most recent anchor.
    #[error("No new commitments since anchor {0}")]
    NothingNew(u64),
    /// The wallet returned a txid that is already recorded.
    #[error("Anchor txid already recorded: {0}")]
    DuplicateTxid(String),
    /// A txid was not 32 bytes of hex.
    #[error("Invalid txid: {0}")]
    InvalidTxid(String),
    /// A regenerated proof did not reproduce the bound anchor's root.
    #[error("Proof root does not match anchor root for commitment {0}")]
    RootMismatch(String),
}

/// Errors surfaced by the external wallet and chain-view seams.
#[derive(Error, Debug)]
pub enum ExternalError {
    /// No wallet or explorer is configured or reachable.
    #[error("External service unavailable: {0}")]
    Unavailable(String),
    /// The wallet rejected or failed the broadcast.
    #[error("Broadcast failed: {0}")]
    Broadcast(String),
    /// The chain view could not answer a confirmation query.
    #[error("Chain query failed: {0}")]
    Query(String),
}

/// Errors from the persistent store and its operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The caller supplied invalid input; no state was changed.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The storage backend reported a failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
    /// Persisted state is internally inconsistent; the store refuses to
    /// open read-write.
    #[error("Store is corrupt: {0}")]
    Corrupt(String),
    /// A crypto-layer failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    /// A tree-layer failure.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
    /// An anchor-layer failure.
    #[error("Anchor error: {0}")]
    Anchor(#[from] AnchorError),
    /// A failure in an external collaborator; the store is unchanged.
    #[error("External error: {0}")]
    External(#[from] ExternalError),
    /// An I/O error outside the storage backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
