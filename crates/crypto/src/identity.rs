// Path: crates/crypto/src/identity.rs
//! The store's persistent secp256k1 identity key.
//!
//! The key lives as `identity.json` in the data directory with owner-only
//! file permissions. Messages are hashed with double SHA-256 before
//! signing, and signatures are 64-byte compact ECDSA, so any
//! Bitcoin-family verifier can check them against the compressed public
//! key.

use crate::hash::double_sha256;
use pact_types::error::CryptoError;
use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

/// File name of the identity key inside the data directory.
pub const IDENTITY_FILE: &str = "identity.json";

/// Key scheme identifier written into the key file.
pub const KEY_TYPE: &str = "secp256k1";

/// Compact signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityKeyFile {
    private_key: String,
    public_key: String,
    created_at: u64,
    key_type: String,
}

/// A loaded secp256k1 keypair bound to one store.
pub struct IdentityKey {
    secp: Secp256k1<All>,
    secret: SecretKey,
    public: PublicKey,
}

impl IdentityKey {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        Self {
            secp,
            secret,
            public,
        }
    }

    /// Reconstruct a keypair from a 32-byte secret in hex.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(secret_hex)
                .map_err(|e| CryptoError::InvalidKey(format!("secret hex: {e}")))?,
        );
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let secp = Secp256k1::new();
        let public = secret.public_key(&secp);
        Ok(Self {
            secp,
            secret,
            public,
        })
    }

    /// Load the identity key from a data directory, creating and persisting
    /// a new one if no key file exists yet.
    pub fn load_or_create(data_dir: &Path) -> Result<Self, CryptoError> {
        let path = data_dir.join(IDENTITY_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            let key = Self::generate();
            key.save(&path)?;
            log::info!("Generated new identity key at {}", path.display());
            Ok(key)
        }
    }

    /// Load a key file.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(fs::read_to_string(path)?);
        let file: IdentityKeyFile = serde_json::from_str(&raw)
            .map_err(|e| CryptoError::KeyFile(format!("{}: {e}", path.display())))?;
        if file.key_type != KEY_TYPE {
            return Err(CryptoError::KeyFile(format!(
                "unsupported key type: {}",
                file.key_type
            )));
        }
        let key = Self::from_secret_hex(&file.private_key)?;
        // The stored public key is advisory; the secret is authoritative.
        if file.public_key != key.public_key_hex() {
            return Err(CryptoError::KeyFile(
                "public key does not match private key".into(),
            ));
        }
        Ok(key)
    }

    /// Persist the key file with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<(), CryptoError> {
        let file = IdentityKeyFile {
            private_key: hex::encode(self.secret.secret_bytes()),
            public_key: self.public_key_hex(),
            created_at: now_millis(),
            key_type: KEY_TYPE.to_string(),
        };
        let body = Zeroizing::new(
            serde_json::to_string_pretty(&file)
                .map_err(|e| CryptoError::KeyFile(e.to_string()))?,
        );

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut handle = options.open(path)?;
        handle.write_all(body.as_bytes())?;
        handle.sync_all()?;
        Ok(())
    }

    /// Compressed public key, lowercase hex (66 chars).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.serialize())
    }

    /// Sign a message: compact ECDSA over its double-SHA-256 digest.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let digest = Message::from_digest(double_sha256(message));
        self.secp
            .sign_ecdsa(&digest, &self.secret)
            .serialize_compact()
    }

    /// Sign and render as hex (128 chars).
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.sign(message))
    }

    /// Verify a compact signature under this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        verify_with_key(&self.public_key_hex(), message, signature)
    }
}

/// Stateless verification against any compressed public key in hex.
pub fn verify_with_key(
    public_key_hex: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    let key_bytes = hex::decode(public_key_hex)
        .map_err(|e| CryptoError::InvalidKey(format!("public key hex: {e}")))?;
    let public =
        PublicKey::from_slice(&key_bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let sig = Signature::from_compact(signature)
        .map_err(|e| CryptoError::Encoding(format!("signature: {e}")))?;
    let digest = Message::from_digest(double_sha256(message));
    let secp = Secp256k1::verification_only();
    Ok(secp.verify_ecdsa(&digest, &sig, &public).is_ok())
}

/// Hex variant of [`verify_with_key`].
pub fn verify_with_key_hex(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, CryptoError> {
    let sig = hex::decode(signature_hex)
        .map_err(|e| CryptoError::Encoding(format!("signature hex: {e}")))?;
    verify_with_key(public_key_hex, message, &sig)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
