// Path: crates/types/src/filter.rs
//! Query filters over the commitment store.

use crate::commitment::{Commitment, CommitmentType};
use serde::{Deserialize, Serialize};

/// The largest page size a remote caller may request.
pub const MAX_QUERY_LIMIT: u32 = 100;

/// AND-composed filter predicates. Results are ordered by timestamp
/// descending and paginated with `limit`/`offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitmentFilter {
    /// Exact match on commitment type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub commitment_type: Option<CommitmentType>,
    /// Substring match on the payload subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Exact match on the payload counterparty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    /// Inclusive lower bound on timestamp, milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    /// Inclusive upper bound on timestamp, milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl CommitmentFilter {
    /// Whether a commitment passes every set predicate.
    pub fn matches(&self, c: &Commitment) -> bool {
        if let Some(t) = self.commitment_type {
            if c.commitment_type != t {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if !c.payload.subject.contains(subject.as_str()) {
                return false;
            }
        }
        if let Some(counterparty) = &self.counterparty {
            if c.payload.counterparty.as_deref() != Some(counterparty.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if c.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if c.timestamp > until {
                return false;
            }
        }
        true
    }
}
