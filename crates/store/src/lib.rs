// Path: crates/store/src/lib.rs
#![forbid(unsafe_code)]
//! # pact-store
//!
//! The durable half of the commitment system:
//!
//! - A redb-backed store holding commitments, tree nodes, tree state,
//!   anchors, and configuration, written transactionally so a crash can
//!   never leave the tree and its leaves disagreeing.
//! - Crash-safe reopen: the persisted leaf sequence is replayed and the
//!   recomputed root must match the persisted root, or the store refuses
//!   to open.
//! - The anchor engine: fixed-layout payload assembly, the anchor chain,
//!   the earliest-covering-anchor binding rule, and proof production.
//!
//! The store is single-writer: mutations take `&mut self` and are thereby
//! serialized per instance, while reads work on `&self` snapshots.

pub mod anchor;
mod schema;
pub mod store;
pub mod wallet;

pub use anchor::{AnchorOptions, AnchorOutcome, AnchorPayload};
pub use store::CommitmentStore;
pub use wallet::{ChainView, ConfirmationStatus, WalletBroadcaster};
