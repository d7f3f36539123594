// Path: crates/store/src/wallet.rs
//! Trait seams for the external wallet and block explorer.
//!
//! The store never builds, funds, or broadcasts a transaction, and never
//! talks to a chain index. It hands the wallet an opaque payload and gets
//! a txid back; it hands the chain view a txid and gets a confirmation
//! fact back. Everything behind these traits is glue.

use pact_types::error::ExternalError;

/// Broadcasts an anchor payload inside an `OP_RETURN`-style output and
/// returns the transaction id as lowercase hex.
pub trait WalletBroadcaster {
    fn broadcast_anchor(
        &self,
        payload: &[u8],
        fee_rate: Option<f64>,
    ) -> Result<String, ExternalError>;
}

/// A confirmation fact observed on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationStatus {
    pub confirmed: bool,
    /// Height of the containing block, when confirmed.
    pub block_height: Option<u64>,
    /// Block timestamp in milliseconds, when the source exposes it.
    pub block_time: Option<u64>,
}

impl ConfirmationStatus {
    /// A transaction that is known but not yet mined.
    pub fn pending() -> Self {
        Self {
            confirmed: false,
            block_height: None,
            block_time: None,
        }
    }

    /// A transaction confirmed at the given height.
    pub fn confirmed_at(block_height: u64) -> Self {
        Self {
            confirmed: true,
            block_height: Some(block_height),
            block_time: None,
        }
    }
}

/// Answers confirmation queries for a txid.
pub trait ChainView {
    fn confirmation(&self, txid: &str) -> Result<ConfirmationStatus, ExternalError>;
}

/// A wallet seam with nothing behind it. Every broadcast fails with an
/// unavailability error, leaving the store untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWallet;

impl WalletBroadcaster for NoWallet {
    fn broadcast_anchor(
        &self,
        _payload: &[u8],
        _fee_rate: Option<f64>,
    ) -> Result<String, ExternalError> {
        Err(ExternalError::Unavailable(
            "no wallet configured; broadcast externally and use record-anchor".into(),
        ))
    }
}
