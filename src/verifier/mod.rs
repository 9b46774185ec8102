//! Multi-party co-signature verification
//!
//! Participants sign a canonical action digest bound to a per-pair nonce.
//! The verifier recovers each signer, consumes the nonce, and forwards the
//! action to the ledger exactly once.
//!
//! # Example
//!
//! ```ignore
//! use trust_gate::verifier::CoSignatureVerifier;
//! use trust_gate::U256;
//!
//! let ids = [U256::from(1), U256::from(2)];
//! let descriptor = verifier.descriptor(&ids, &minters, &players);
//! let signatures = descriptor.cosign(&[player1_key, player2_key]);
//! verifier.verify(platform, &signatures, &ids, &minters, &players, &mut ledger)?;
//! ```

pub mod descriptor;
pub mod engine;
pub mod nonce;

pub use descriptor::{ActionDescriptor, ResourceId, COMMIT, OFFER};
pub use engine::{
    CoSignatureVerifier, FinalizeCall, FinalizeTarget, VerifierState, VerifyError, DEFAULT_ARITY,
};
pub use nonce::{NonceTable, ParticipantKey};
