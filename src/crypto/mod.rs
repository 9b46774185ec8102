//! Cryptographic utilities
//!
//! This module provides:
//! - Keccak-256 hashing and the signed-message hash
//! - ECDSA key management and signer recovery (secp256k1)
//! - Canonical call and packed encodings

pub mod abi;
pub mod hash;
pub mod keys;

pub use abi::{
    decode_call, encode_call, encode_call_from_strings, parse_signature, selector, uint_word,
    AbiError, AbiValue, DecodedCall, PackedEncoder, ParamType,
};
pub use hash::{keccak256, keccak256_hex, signed_message_hash, SIGNED_MESSAGE_PREFIX};
pub use keys::{
    public_key_from_hex, recover_public_key, recover_signer, KeyError, KeyPair, Signature,
    SIGNATURE_LENGTH,
};
