//! Signing identity: an Ed25519 private key and the address it controls.
//!
//! # Security
//! - Keys are never logged or serialized
//! - `Debug` only shows the derived address

use ed25519_dalek::{Signer, SigningKey};

use crate::blockchain::payload::{RawTransaction, SignedTransaction, TransactionAuthenticator};
use crate::blockchain::types::{Address, BlockchainError, BlockchainResult};

/// Private key plus derived address for one wallet session.
pub struct SigningIdentity {
    key: SigningKey,
    address: Address,
}

impl SigningIdentity {
    /// Create an identity from a hex-encoded private key.
    ///
    /// # Arguments
    /// * `private_key_hex` - 32-byte key as hex, with or without `0x` prefix
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let mut secret = [0u8; 32];
        hex::decode_to_slice(key_hex, &mut secret)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let key = SigningKey::from_bytes(&secret);
        let address = Address::from_ed25519_public_key(key.verifying_key().as_bytes());

        tracing::debug!(address = %address, "Signing identity loaded");

        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Sign raw bytes. Ed25519 signatures are deterministic.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }

    /// Sign the canonical signing message of a raw transaction.
    pub fn sign_transaction(&self, raw: RawTransaction) -> BlockchainResult<SignedTransaction> {
        let signature = self.sign(&raw.signing_message()?);
        Ok(SignedTransaction {
            raw,
            authenticator: TransactionAuthenticator::Ed25519 {
                public_key: self.public_key(),
                signature,
            },
        })
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
