//! Failures reported by external collaborators
//!
//! The multisig and the verifier forward exactly one call downstream after
//! consuming their approval. Whatever that call rejects with is carried back
//! to the caller as a [`DownstreamError`]; the consumption is not undone.

use super::{Address, U256};
use crate::crypto::AbiError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    #[error("Caller {caller} is not permitted to call {target}")]
    Unauthorized { caller: Address, target: Address },
    #[error("Target {0} does not accept value")]
    NotPayable(Address),
    #[error("Unknown selector 0x{0}")]
    UnknownSelector(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] AbiError),
    #[error("No component deployed at {0}")]
    UnknownTarget(Address),
    #[error("Component {0} is already initialized")]
    AlreadyInitialized(Address),
    #[error("Component {0} is not initialized")]
    NotInitialized(Address),
    #[error("Token {0} already exists")]
    TokenExists(U256),
    #[error("Rejected: {0}")]
    Rejected(String),
}
