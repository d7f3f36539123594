// Path: crates/types/src/commitment.rs
//! Commitment records and the canonical value tree used for metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of commitment categories. Carries no semantics beyond
/// filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentType {
    /// A bilateral promise between the agent and a counterparty.
    Agreement,
    /// A unilateral statement of fact.
    Attestation,
    /// A snapshot of agent state.
    State,
    /// Anything else.
    Custom,
}

impl CommitmentType {
    /// Stable lowercase name, as used on the wire and in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitmentType::Agreement => "agreement",
            CommitmentType::Attestation => "attestation",
            CommitmentType::State => "state",
            CommitmentType::Custom => "custom",
        }
    }
}

impl fmt::Display for CommitmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agreement" => Ok(CommitmentType::Agreement),
            "attestation" => Ok(CommitmentType::Attestation),
            "state" => Ok(CommitmentType::State),
            "custom" => Ok(CommitmentType::Custom),
            other => Err(format!("unknown commitment type: {other}")),
        }
    }
}

/// A deterministic value tree for the free-form `metadata` field.
///
/// Numbers are restricted to `i64`: the canonical encoding admits neither
/// fractional nor exponential forms, so fractional JSON input is rejected
/// at deserialization time rather than silently rounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Array(Vec<CanonicalValue>),
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Convenience constructor for object values.
    pub fn object(entries: impl IntoIterator<Item = (String, CanonicalValue)>) -> Self {
        CanonicalValue::Object(entries.into_iter().collect())
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        CanonicalValue::Str(s.to_string())
    }
}

impl From<i64> for CanonicalValue {
    fn from(n: i64) -> Self {
        CanonicalValue::Int(n)
    }
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        CanonicalValue::Bool(b)
    }
}

/// The statement body of a commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentPayload {
    /// What the commitment is about.
    pub subject: String,
    /// The statement itself.
    pub content: String,
    /// The other party, when the commitment is bilateral.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    /// Free-form structured annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, CanonicalValue>>,
}

impl CommitmentPayload {
    /// A payload with just the two required fields.
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            counterparty: None,
            metadata: None,
        }
    }
}

/// A signed, canonicalized statement that has been inserted into the tree.
///
/// `leaf_hash` and `tree_index` are populated at insertion time and never
/// change afterwards; tree indices are contiguous from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    /// Opaque unique identifier, `commit_` followed by 24 hex chars.
    pub id: String,
    #[serde(rename = "type")]
    pub commitment_type: CommitmentType,
    pub payload: CommitmentPayload,
    /// Creation instant, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Hex of the 64-byte compact secp256k1 signature over the unsigned
    /// canonical image.
    pub signature: String,
    /// Hex of the domain-separated SHA-256 of the signed canonical image.
    pub leaf_hash: String,
    /// Zero-based position at which this commitment was appended.
    pub tree_index: u64,
}
