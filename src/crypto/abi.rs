//! Canonical byte encodings shared by signers and verifiers
//!
//! Two encodings live here:
//! - call encoding: a 4-byte selector followed by 32-byte argument words,
//!   used for instructions routed through the multisig
//! - packed encoding: the order-preserving concatenation hashed into action
//!   digests (array elements padded to a full word, scalars at native width)
//!
//! Any divergence between the signing side and the verifying side breaks
//! signer recovery, so both sides must use these functions.

use super::hash::keccak256;
use crate::core::{Address, U256};
use std::fmt;
use thiserror::Error;

/// Size of an ABI word
pub const WORD: usize = 32;

/// Size of a function selector
pub const SELECTOR_LENGTH: usize = 4;

/// Encoding and decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Payload too short: {0} bytes")]
    TooShort(usize),
    #[error("Argument data is not a whole number of words: {0} bytes")]
    UnalignedArguments(usize),
    #[error("Expected {expected} argument(s), found {found}")]
    ArgumentCount { expected: usize, found: usize },
    #[error("Address word has non-zero padding")]
    DirtyAddress,
    #[error("Invalid function signature: {0}")]
    InvalidSignature(String),
    #[error("Unsupported parameter type: {0}")]
    UnsupportedType(String),
    #[error("Invalid {kind} argument: {value}")]
    InvalidArgument { kind: ParamType, value: String },
}

/// Parameter types accepted in instruction signatures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint256,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamType::Address => "address",
            ParamType::Uint256 => "uint256",
            ParamType::Bool => "bool",
        })
    }
}

/// A single static ABI value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
}

impl AbiValue {
    /// Parse a textual argument as the given type
    pub fn parse(kind: ParamType, value: &str) -> Result<Self, AbiError> {
        let invalid = || AbiError::InvalidArgument {
            kind,
            value: value.to_string(),
        };
        match kind {
            ParamType::Address => value.parse().map(AbiValue::Address).map_err(|_| invalid()),
            ParamType::Uint256 => value.parse().map(AbiValue::Uint).map_err(|_| invalid()),
            ParamType::Bool => value.parse().map(AbiValue::Bool).map_err(|_| invalid()),
        }
    }

    /// Encode as a single 32-byte word
    pub fn to_word(&self) -> [u8; WORD] {
        match self {
            AbiValue::Address(address) => address.to_word(),
            AbiValue::Uint(value) => uint_word(*value),
            AbiValue::Bool(flag) => uint_word(U256::from(*flag as u8)),
        }
    }
}

/// Big-endian, left-padded `uint256` word
pub fn uint_word(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

/// Compute the 4-byte selector for a function signature like `addMinterAddress(address)`
pub fn selector(signature: &str) -> [u8; SELECTOR_LENGTH] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Split `name(type,type)` into its parameter types
pub fn parse_signature(signature: &str) -> Result<Vec<ParamType>, AbiError> {
    let invalid = || AbiError::InvalidSignature(signature.to_string());

    let open = signature.find('(').ok_or_else(invalid)?;
    let inner = signature[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
    if open == 0 || signature.contains(' ') {
        return Err(invalid());
    }
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|ty| match ty {
            "address" => Ok(ParamType::Address),
            "uint256" | "uint" => Ok(ParamType::Uint256),
            "bool" => Ok(ParamType::Bool),
            other => Err(AbiError::UnsupportedType(other.to_string())),
        })
        .collect()
}

/// Encode a call: selector followed by each argument as a word
pub fn encode_call(signature: &str, args: &[AbiValue]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SELECTOR_LENGTH + args.len() * WORD);
    payload.extend_from_slice(&selector(signature));
    for arg in args {
        payload.extend_from_slice(&arg.to_word());
    }
    payload
}

/// Parse textual arguments against a signature and encode the call
pub fn encode_call_from_strings(signature: &str, args: &[String]) -> Result<Vec<u8>, AbiError> {
    let types = parse_signature(signature)?;
    if types.len() != args.len() {
        return Err(AbiError::ArgumentCount {
            expected: types.len(),
            found: args.len(),
        });
    }

    let values = types
        .iter()
        .zip(args)
        .map(|(kind, raw)| AbiValue::parse(*kind, raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encode_call(signature, &values))
}

/// A decoded call: selector plus raw argument words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall<'a> {
    pub selector: [u8; SELECTOR_LENGTH],
    words: &'a [u8],
}

impl<'a> DecodedCall<'a> {
    /// Number of argument words
    pub fn word_count(&self) -> usize {
        self.words.len() / WORD
    }

    /// Argument word at `index`
    pub fn word(&self, index: usize) -> Option<&'a [u8; WORD]> {
        self.words
            .get(index * WORD..(index + 1) * WORD)
            .and_then(|w| w.try_into().ok())
    }

    /// Decode a call that takes exactly one `address` argument
    pub fn single_address(&self) -> Result<Address, AbiError> {
        if self.word_count() != 1 {
            return Err(AbiError::ArgumentCount {
                expected: 1,
                found: self.word_count(),
            });
        }
        let word = self.word(0).ok_or(AbiError::TooShort(self.words.len()))?;
        Address::from_word(word).ok_or(AbiError::DirtyAddress)
    }
}

/// Split a payload into selector and argument words
pub fn decode_call(payload: &[u8]) -> Result<DecodedCall<'_>, AbiError> {
    if payload.len() < SELECTOR_LENGTH {
        return Err(AbiError::TooShort(payload.len()));
    }
    let (head, words) = payload.split_at(SELECTOR_LENGTH);
    if words.len() % WORD != 0 {
        return Err(AbiError::UnalignedArguments(words.len()));
    }
    Ok(DecodedCall {
        selector: [head[0], head[1], head[2], head[3]],
        words,
    })
}

/// Builder for Solidity-style packed encoding
///
/// Elements of fixed-size arrays take a full word each; the standalone
/// `uint256` takes a word; a standalone `bool` takes one byte.
#[derive(Debug, Default, Clone)]
pub struct PackedEncoder {
    buf: Vec<u8>,
}

impl PackedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint256(mut self, value: U256) -> Self {
        self.buf.extend_from_slice(&uint_word(value));
        self
    }

    pub fn uint256_array(mut self, values: &[U256]) -> Self {
        for value in values {
            self.buf.extend_from_slice(&uint_word(*value));
        }
        self
    }

    pub fn address_array(mut self, addresses: &[Address]) -> Self {
        for address in addresses {
            self.buf.extend_from_slice(&address.to_word());
        }
        self
    }

    pub fn boolean(mut self, flag: bool) -> Self {
        self.buf.push(flag as u8);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Keccak-256 of the packed bytes
    pub fn digest(&self) -> [u8; 32] {
        keccak256(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_selectors() {
        assert_eq!(hex::encode(selector("addMinterAddress(address)")), "83ca5a05");
        assert_eq!(hex::encode(selector("addPlatformAddress(address)")), "fd5e0fe2");
    }

    #[test]
    fn test_encode_call_layout() {
        let target: Address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap();
        let payload = encode_call("addMinterAddress(address)", &[AbiValue::Address(target)]);

        assert_eq!(payload.len(), SELECTOR_LENGTH + WORD);
        assert_eq!(&payload[..4], &[0x83, 0xca, 0x5a, 0x05]);
        assert!(payload[4..16].iter().all(|b| *b == 0));
        assert_eq!(&payload[16..], target.as_bytes());

        let decoded = decode_call(&payload).unwrap();
        assert_eq!(decoded.single_address().unwrap(), target);
    }

    #[test]
    fn test_encode_from_strings() {
        let payload = encode_call_from_strings(
            "addPlatformAddress(address)",
            &["0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc".to_string()],
        )
        .unwrap();
        assert_eq!(&payload[..4], &selector("addPlatformAddress(address)"));

        let err = encode_call_from_strings("addPlatformAddress(address)", &[]).unwrap_err();
        assert_eq!(err, AbiError::ArgumentCount { expected: 1, found: 0 });

        let err = encode_call_from_strings("f(address)", &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, AbiError::InvalidArgument { kind: ParamType::Address, .. }));
    }

    #[test]
    fn test_parse_signature() {
        assert_eq!(
            parse_signature("mint(address,uint256)").unwrap(),
            vec![ParamType::Address, ParamType::Uint256]
        );
        assert!(parse_signature("pause()").unwrap().is_empty());
        assert!(parse_signature("broken").is_err());
        assert!(parse_signature("(address)").is_err());
        assert!(matches!(
            parse_signature("f(bytes)"),
            Err(AbiError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert_eq!(decode_call(&[1, 2]).unwrap_err(), AbiError::TooShort(2));
        assert_eq!(
            decode_call(&[0u8; 4 + 31]).unwrap_err(),
            AbiError::UnalignedArguments(31)
        );

        let mut dirty = encode_call("f(address)", &[AbiValue::Address(Address::ZERO)]);
        dirty[5] = 1;
        assert_eq!(
            decode_call(&dirty).unwrap().single_address().unwrap_err(),
            AbiError::DirtyAddress
        );
    }

    #[test]
    fn test_uint_words_cover_full_width() {
        let max = AbiValue::parse(ParamType::Uint256, &format!("0x{}", "ff".repeat(32))).unwrap();
        assert_eq!(max.to_word(), [0xff; WORD]);

        // 2^128 needs the 17th byte from the right
        let wide = AbiValue::parse(ParamType::Uint256, "340282366920938463463374607431768211456").unwrap();
        let mut expected = [0u8; WORD];
        expected[15] = 1;
        assert_eq!(wide.to_word(), expected);

        assert!(AbiValue::parse(ParamType::Uint256, &format!("0x1{}", "00".repeat(32))).is_err());
        assert!(AbiValue::parse(ParamType::Uint256, "-1").is_err());
    }

    #[test]
    fn test_packed_widths() {
        let packed = PackedEncoder::new()
            .uint256_array(&[U256::from(1), U256::from(2)])
            .address_array(&[Address::ZERO])
            .uint256(U256::ZERO)
            .boolean(true)
            .into_bytes();

        assert_eq!(packed.len(), 4 * WORD + 1);
        assert_eq!(packed[WORD - 1], 1);
        assert_eq!(packed[2 * WORD - 1], 2);
        assert_eq!(*packed.last().unwrap(), 1);
    }
}
