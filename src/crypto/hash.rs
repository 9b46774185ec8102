//! Keccak-256 hashing utilities
//!
//! Provides the hash used for identities, function selectors and action
//! digests. Everything that signers and verifiers must agree on byte for
//! byte goes through [`keccak256`].

use sha3::{Digest, Keccak256};

/// Prefix applied by wallets before signing a 32-byte message
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Computes Keccak-256 of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes Keccak-256 and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

/// Hash that a wallet actually signs when asked to sign a 32-byte digest
///
/// `keccak256("\x19Ethereum Signed Message:\n32" || digest)`
pub fn signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(digest);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            keccak256_hex(b""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_selector_prefix() {
        let hash = keccak256(b"transfer(address,uint256)");
        assert_eq!(hex::encode(&hash[..4]), "a9059cbb");
    }

    #[test]
    fn test_signed_message_hash() {
        let digest: [u8; 32] =
            hex::decode("273fb813ce79f96890d04524b007accfa97a47d4d3d7f0cf8740579c4455e8ac")
                .unwrap()
                .try_into()
                .unwrap();
        assert_eq!(
            hex::encode(signed_message_hash(&digest)),
            "24cb475fee2cc1055ce813e655c7d3442150a6157995bfe786a080fcaed3d570"
        );
    }
}
