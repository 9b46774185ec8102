//! ECDSA key management and signer recovery
//!
//! Key pairs live on the secp256k1 curve. Identities are 20-byte addresses
//! derived from the uncompressed public key, and signatures carry a recovery
//! id so the signer's address can be recovered from a digest alone.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::signed_message_hash;
use crate::core::Address;

/// Length of a serialized recoverable signature (`r || s || v`)
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Signer could not be recovered")]
    RecoveryFailed,
}

/// A 65-byte recoverable ECDSA signature in `r || s || v` layout
///
/// `v` is accepted both as `0/1` and as the wallet-style `27/28`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wrap raw signature bytes
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse from a byte slice, checking the length
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let raw: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(raw))
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        Self::from_slice(&bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed hex rendering
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The recovery id normalised to `0` or `1`
    pub fn recovery_byte(&self) -> Result<u8, KeyError> {
        match self.0[64] {
            v @ (0 | 1) => Ok(v),
            v @ (27 | 28) => Ok(v - 27),
            v => Err(KeyError::InvalidRecoveryId(v)),
        }
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, KeyError> {
        let recovery_id = RecoveryId::from_i32(self.recovery_byte()? as i32)
            .map_err(|_| KeyError::InvalidRecoveryId(self.0[64]))?;
        RecoverableSignature::from_compact(&self.0[..64], recovery_id)
            .map_err(|_| KeyError::InvalidSignature)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key (optional `0x` prefix)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The identity this key signs as
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Sign a 32-byte digest the way a wallet does: over the signed-message hash
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Signature {
        self.sign_prehashed(&signed_message_hash(digest))
    }

    /// Sign an already-final 32-byte hash without any prefix
    pub fn sign_prehashed(&self, hash: &[u8; 32]) -> Signature {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*hash);
        let sig = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = sig.serialize_compact();

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = 27 + recovery_id.to_i32() as u8;
        Signature(bytes)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Recover the public key that produced `signature` over a final hash
pub fn recover_public_key(hash: &[u8; 32], signature: &Signature) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*hash);
    let recoverable = signature.to_recoverable()?;
    secp.recover_ecdsa(&message, &recoverable)
        .map_err(|_| KeyError::RecoveryFailed)
}

/// Recover the address that signed `digest` through [`KeyPair::sign_digest`]
pub fn recover_signer(digest: &[u8; 32], signature: &Signature) -> Result<Address, KeyError> {
    let public_key = recover_public_key(&signed_message_hash(digest), signature)?;
    Ok(Address::from_public_key(&public_key))
}
