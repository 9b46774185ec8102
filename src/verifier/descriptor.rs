//! Action descriptors and their canonical digests
//!
//! The digest is `keccak256` over the packed encoding of
//! `(uint256[K] resource_ids, address[K] authorizers, address[K] participants,
//! uint256 nonce, bool role)`. Signers and the verifier both build it here.

use crate::core::{Address, U256};
use crate::crypto::{KeyPair, PackedEncoder, Signature};
use serde::{Deserialize, Serialize};

/// Identifier of a resource (e.g. a token ID), encoded as `uint256`
pub type ResourceId = U256;

/// The neutral description of an action, signed by every participant
pub const OFFER: bool = false;
/// The committing variant, signed again by the accepting participant
pub const COMMIT: bool = true;

/// Everything a co-signed action commits to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub resource_ids: Vec<ResourceId>,
    pub authorizers: Vec<Address>,
    pub participants: Vec<Address>,
    pub nonce: u64,
    pub role: bool,
}

impl ActionDescriptor {
    /// Descriptor for the offer phase at `nonce`
    pub fn new(
        resource_ids: Vec<ResourceId>,
        authorizers: Vec<Address>,
        participants: Vec<Address>,
        nonce: u64,
    ) -> Self {
        Self {
            resource_ids,
            authorizers,
            participants,
            nonce,
            role: OFFER,
        }
    }

    /// Same descriptor with a different role flag
    pub fn with_role(&self, role: bool) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    /// Packed, order-preserving encoding
    pub fn encode(&self) -> Vec<u8> {
        self.encoder().into_bytes()
    }

    /// Keccak-256 of [`encode`](Self::encode)
    pub fn digest(&self) -> [u8; 32] {
        self.encoder().digest()
    }

    /// `(offer digest, commit digest)` for this descriptor's nonce
    pub fn digests(&self) -> ([u8; 32], [u8; 32]) {
        (self.with_role(OFFER).digest(), self.with_role(COMMIT).digest())
    }

    fn encoder(&self) -> PackedEncoder {
        PackedEncoder::new()
            .uint256_array(&self.resource_ids)
            .address_array(&self.authorizers)
            .address_array(&self.participants)
            .uint256(U256::from(self.nonce))
            .boolean(self.role)
    }

    /// Produce the full signature list for this action
    ///
    /// `keys[i]` must belong to `participants[i]`. Every participant signs the
    /// offer digest; the last participant also signs the commit digest.
    pub fn cosign(&self, keys: &[KeyPair]) -> Vec<Signature> {
        let (offer, commit) = self.digests();
        let mut signatures: Vec<Signature> = keys.iter().map(|k| k.sign_digest(&offer)).collect();
        if let Some(last) = keys.last() {
            signatures.push(last.sign_digest(&commit));
        }
        signatures
    }
}
