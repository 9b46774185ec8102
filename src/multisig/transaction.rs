//! Proposed administrative transactions
//!
//! A proposal carries an opaque instruction for a target component. It
//! collects confirmations from committee members and is consumed exactly
//! once by execution. Proposals are never removed.

use crate::core::Address;
use crate::crypto::abi::SELECTOR_LENGTH;
use crate::multisig::committee::MultisigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle position of a proposal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Waiting for more confirmations
    AwaitingConfirmations,
    /// Has enough confirmations, any member may execute
    Executable,
    /// Consumed (terminal)
    Executed,
}

/// A transaction awaiting confirmation and execution
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProposedTransaction {
    /// Zero-based index assigned at submission
    pub index: u64,
    /// Component the instruction is addressed to
    pub target: Address,
    /// Opaque instruction: selector followed by encoded arguments
    #[serde(with = "crate::core::hex_bytes")]
    pub payload: Vec<u8>,
    /// Value forwarded with the call
    pub value: u128,
    /// Committee members who confirmed, in confirmation order
    confirmations: Vec<Address>,
    executed: bool,
    pub submitted_by: Address,
    pub submitted_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    /// Error reported by the forwarded call, if it failed
    pub execution_error: Option<String>,
}

impl ProposedTransaction {
    /// Create a new, unconfirmed proposal
    pub fn new(
        index: u64,
        target: Address,
        payload: Vec<u8>,
        value: u128,
        submitted_by: Address,
    ) -> Self {
        Self {
            index,
            target,
            payload,
            value,
            confirmations: Vec::new(),
            executed: false,
            submitted_by,
            submitted_at: Utc::now(),
            executed_at: None,
            execution_error: None,
        }
    }

    pub fn confirmations(&self) -> &[Address] {
        &self.confirmations
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    pub fn is_confirmed_by(&self, signer: &Address) -> bool {
        self.confirmations.contains(signer)
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Status relative to a confirmation threshold
    pub fn status(&self, threshold: usize) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if self.confirmations.len() >= threshold {
            ProposalStatus::Executable
        } else {
            ProposalStatus::AwaitingConfirmations
        }
    }

    /// The 4-byte selector of the instruction, if the payload has one
    pub fn selector(&self) -> Option<[u8; SELECTOR_LENGTH]> {
        self.payload.get(..SELECTOR_LENGTH).map(|s| [s[0], s[1], s[2], s[3]])
    }

    /// Record a confirmation
    ///
    /// Membership is checked by the caller; this enforces the per-proposal
    /// rules only.
    pub fn add_confirmation(&mut self, signer: Address) -> Result<(), MultisigError> {
        if self.executed {
            return Err(MultisigError::AlreadyExecuted(self.index));
        }

        if self.is_confirmed_by(&signer) {
            return Err(MultisigError::AlreadyConfirmed {
                index: self.index,
                signer,
            });
        }

        self.confirmations.push(signer);
        Ok(())
    }

    /// Consume the proposal. Must happen before the instruction is forwarded.
    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
        self.executed_at = Some(Utc::now());
    }

    pub(crate) fn record_failure(&mut self, error: String) {
        self.execution_error = Some(error);
    }
}
