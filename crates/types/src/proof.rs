// Path: crates/types/src/proof.rs
//! Inclusion proofs and the portable proof file format.

use serde::{Deserialize, Serialize};

/// Which side a proof sibling sits on relative to the running hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingPosition {
    Left,
    Right,
}

/// One level of a Merkle inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofStep {
    /// Sibling hash, lowercase hex.
    pub hash: String,
    pub position: SiblingPosition,
}

/// A compact inclusion proof for one leaf. Verification is stateless: fold
/// the siblings over the leaf hash and compare against `root_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    /// Leaf hash being proven, lowercase hex.
    pub leaf_hash: String,
    /// Position of the leaf at proof-generation time.
    pub tree_index: u64,
    /// Sibling hashes from leaf level upward. Empty for a single-leaf
    /// tree.
    pub siblings: Vec<ProofStep>,
    /// Root the fold must reproduce, lowercase hex.
    pub root_hash: String,
}

/// The minimal anchor reference embedded in a proof file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRef {
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    pub timestamp: u64,
}

/// The signed canonical image of a commitment, carried as its exact text.
///
/// Verifiers hash these bytes as-is to reproduce the leaf hash, so the
/// text must never be re-canonicalized. On the wire the image appears
/// inline as the JSON object itself; because canonical images are already
/// minified with sorted keys, parsing and re-emitting them is
/// byte-stable, and anything that is not a fixed point of that round trip
/// could not have been leaf-hashed by a conforming store in the first
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentImage(String);

impl CommitmentImage {
    pub fn from_canonical(text: String) -> Self {
        Self(text)
    }

    /// The exact image text.
    pub fn get(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Serialize for CommitmentImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = serde_json::value::RawValue::from_string(self.0.clone())
            .map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommitmentImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Deserializing through `Value` keeps this usable inside tagged
        // message enums, where raw capture is unavailable. serde_json maps
        // are key-sorted, so canonical text survives unchanged.
        let value = serde_json::Value::deserialize(deserializer)?;
        let text = serde_json::to_string(&value).map_err(serde::de::Error::custom)?;
        Ok(Self(text))
    }
}

/// A self-contained, offline-verifiable proof file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Verbatim signed canonical image of the commitment.
    pub commitment: CommitmentImage,
    pub merkle_proof: MerkleProof,
    pub anchor: AnchorRef,
}
