// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
//! # pact-types
//!
//! Core data model for the pact commitment store. This crate defines the
//! stable vocabulary shared by every other crate in the workspace:
//! commitments and their payloads, anchors, inclusion proofs, query
//! filters, and the error taxonomy.

pub mod anchor;
pub mod commitment;
pub mod error;
pub mod filter;
pub mod proof;

pub use anchor::Anchor;
pub use commitment::{CanonicalValue, Commitment, CommitmentPayload, CommitmentType};
pub use filter::CommitmentFilter;
pub use proof::{AnchorRef, CommitmentImage, MerkleProof, ProofBundle, ProofStep, SiblingPosition};
