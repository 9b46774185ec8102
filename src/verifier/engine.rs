//! Nonce-guarded co-signature verification
//!
//! `verify` accepts an action only if every participant signed the offer
//! digest for the current nonce and the last participant also signed the
//! commit digest. On success the nonce advances, then the action is
//! forwarded to the ledger. The nonce is not rolled back if the ledger
//! rejects, so a signature set is usable at most once.

use crate::core::{Address, DownstreamError, EventKind, EventLog};
use crate::crypto::{recover_signer, Signature};
use crate::verifier::descriptor::{ActionDescriptor, ResourceId};
use crate::verifier::nonce::NonceTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Participants per action in the deployed protocol
pub const DEFAULT_ARITY: usize = 2;

/// Errors from `verify`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Expected {expected} {what}, got {got}")]
    ArityMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Actions need at least one participant, arity is {0}")]
    InvalidArity(usize),
    #[error("Participant {0} appears more than once")]
    DuplicateParticipant(Address),
    #[error("Signature {slot} does not belong to {expected}")]
    InvalidSigner {
        slot: usize,
        expected: Address,
        recovered: Option<Address>,
    },
    #[error("Finalize failed: {0}")]
    DownstreamFailure(#[from] DownstreamError),
}

/// The finalize instruction forwarded after a successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeCall<'a> {
    /// The verifier's own address
    pub caller: Address,
    pub resource_ids: &'a [ResourceId],
    pub authorizers: &'a [Address],
    pub participants: &'a [Address],
    /// The nonce that was consumed
    pub nonce: u64,
}

/// Anything that applies verified actions
pub trait FinalizeTarget {
    fn finalize(&mut self, call: FinalizeCall<'_>) -> Result<(), DownstreamError>;
}

/// Verifier state as it appears in snapshots, before arity is checked
#[derive(Debug, Deserialize)]
pub struct VerifierState {
    address: Address,
    arity: usize,
    nonces: NonceTable,
    events: EventLog,
}

/// Verifier instance owning the nonce table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VerifierState")]
pub struct CoSignatureVerifier {
    address: Address,
    arity: usize,
    nonces: NonceTable,
    events: EventLog,
}

impl TryFrom<VerifierState> for CoSignatureVerifier {
    type Error = VerifyError;

    fn try_from(state: VerifierState) -> Result<Self, Self::Error> {
        if state.arity == 0 {
            return Err(VerifyError::InvalidArity(state.arity));
        }
        Ok(Self {
            address: state.address,
            arity: state.arity,
            nonces: state.nonces,
            events: state.events,
        })
    }
}

impl CoSignatureVerifier {
    /// Create a verifier for actions with `arity` participants
    pub fn new(address: Address, arity: usize) -> Self {
        Self {
            address,
            arity: arity.max(1),
            nonces: NonceTable::new(),
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// One offer signature per participant plus one commit signature
    pub fn required_signatures(&self) -> usize {
        self.arity + 1
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn nonces(&self) -> &NonceTable {
        &self.nonces
    }

    /// Current nonce for a pair, regardless of argument order
    pub fn get_nonce(&self, a: Address, b: Address) -> u64 {
        self.nonces.get(&[a, b])
    }

    /// Current nonce for any participant set
    pub fn nonce_of(&self, participants: &[Address]) -> u64 {
        self.nonces.get(participants)
    }

    /// The descriptor signers must sign right now
    pub fn descriptor(
        &self,
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
    ) -> ActionDescriptor {
        ActionDescriptor::new(
            resource_ids.to_vec(),
            authorizers.to_vec(),
            participants.to_vec(),
            self.nonce_of(participants),
        )
    }

    /// Check shapes and recover every signer without touching state
    ///
    /// Returns the nonce the signatures are valid for.
    pub fn check(
        &self,
        signatures: &[Signature],
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
    ) -> Result<u64, VerifyError> {
        self.check_arity("resource ids", resource_ids.len())?;
        self.check_arity("authorizers", authorizers.len())?;
        self.check_arity("participants", participants.len())?;
        if signatures.len() != self.required_signatures() {
            return Err(VerifyError::ArityMismatch {
                what: "signatures",
                expected: self.required_signatures(),
                got: signatures.len(),
            });
        }

        let mut seen = participants.to_vec();
        seen.sort();
        if let Some(pair) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(VerifyError::DuplicateParticipant(pair[0]));
        }

        let descriptor = self.descriptor(resource_ids, authorizers, participants);
        let (offer, commit) = descriptor.digests();

        let last = *participants.last().ok_or(VerifyError::ArityMismatch {
            what: "participants",
            expected: self.arity,
            got: 0,
        })?;
        let expectations = participants
            .iter()
            .map(|p| (*p, &offer))
            .chain(std::iter::once((last, &commit)));

        for (slot, ((expected, digest), signature)) in expectations.zip(signatures).enumerate() {
            let recovered = recover_signer(digest, signature).ok();
            if recovered != Some(expected) {
                log::debug!(
                    "Signature {} recovered {:?}, expected {}",
                    slot,
                    recovered,
                    expected
                );
                return Err(VerifyError::InvalidSigner {
                    slot,
                    expected,
                    recovered,
                });
            }
        }

        Ok(descriptor.nonce)
    }

    fn check_arity(&self, what: &'static str, got: usize) -> Result<(), VerifyError> {
        if got == self.arity {
            Ok(())
        } else {
            Err(VerifyError::ArityMismatch {
                what,
                expected: self.arity,
                got,
            })
        }
    }

    /// Verify a co-signed action and forward it to `ledger`
    ///
    /// Returns the nonce that was consumed.
    pub fn verify(
        &mut self,
        submitter: Address,
        signatures: &[Signature],
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
        ledger: &mut dyn FinalizeTarget,
    ) -> Result<u64, VerifyError> {
        let nonce = self.check(signatures, resource_ids, authorizers, participants)?;

        let next = self.nonces.advance(participants);
        self.events.record(
            self.address,
            EventKind::Verified {
                participants: participants.to_vec(),
                nonce,
                submitter,
            },
        );
        log::info!(
            "Action verified for {} participants at nonce {} (next {})",
            participants.len(),
            nonce,
            next
        );

        let outcome = ledger.finalize(FinalizeCall {
            caller: self.address,
            resource_ids,
            authorizers,
            participants,
            nonce,
        });

        self.events.record(
            self.address,
            EventKind::Finalized {
                participants: participants.to_vec(),
                nonce,
                success: outcome.is_ok(),
                error: outcome.as_ref().err().map(|e| e.to_string()),
            },
        );

        match outcome {
            Ok(()) => Ok(nonce),
            Err(err) => {
                log::warn!("Nonce {} consumed but finalize failed: {}", nonce, err);
                Err(err.into())
            }
        }
    }
}
