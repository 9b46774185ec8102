//! Fixed signer committee
//!
//! A committee is the ordered set of identities allowed to submit, confirm
//! and execute administrative transactions, plus the confirmation threshold.
//! It is validated once at construction and never changes afterwards.

use crate::core::{Address, DownstreamError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Committee must have at least one signer")]
    EmptyCommittee,
    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Address),
    #[error("Caller is not a committee member: {0}")]
    Unauthorized(Address),
    #[error("Transaction not found: {0}")]
    NotFound(u64),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(u64),
    #[error("Transaction {index} already confirmed by {signer}")]
    AlreadyConfirmed { index: u64, signer: Address },
    #[error("Insufficient confirmations: have {have}, need {need}")]
    InsufficientConfirmations { have: usize, need: usize },
    #[error("Forwarded call failed: {0}")]
    DownstreamFailure(#[from] DownstreamError),
}

/// Raw, unvalidated committee as it appears in config files and snapshots
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitteeConfig {
    pub threshold: usize,
    pub signers: Vec<Address>,
}

/// A validated M-of-N committee
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "CommitteeConfig", into = "CommitteeConfig")]
pub struct Committee {
    threshold: usize,
    signers: Vec<Address>,
}

impl Committee {
    /// Create a new committee
    ///
    /// # Errors
    /// Fails if the signer list is empty or has duplicates, or if the
    /// threshold is zero or larger than the signer count.
    pub fn new(threshold: usize, signers: Vec<Address>) -> Result<Self, MultisigError> {
        if signers.is_empty() {
            return Err(MultisigError::EmptyCommittee);
        }

        if threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }

        if threshold > signers.len() {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds signer count {}",
                threshold,
                signers.len()
            )));
        }

        let mut sorted = signers.clone();
        sorted.sort();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(MultisigError::DuplicateSigner(pair[0]));
        }

        Ok(Self { threshold, signers })
    }

    /// Minimum confirmations required (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Total signer count (N)
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Signers in their configured order
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    pub fn is_member(&self, identity: &Address) -> bool {
        self.signers.contains(identity)
    }

    /// Fail with `Unauthorized` unless `identity` is a member
    pub fn ensure_member(&self, identity: &Address) -> Result<(), MultisigError> {
        if self.is_member(identity) {
            Ok(())
        } else {
            Err(MultisigError::Unauthorized(*identity))
        }
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.signers.len())
    }
}

impl TryFrom<CommitteeConfig> for Committee {
    type Error = MultisigError;

    fn try_from(config: CommitteeConfig) -> Result<Self, Self::Error> {
        Committee::new(config.threshold, config.signers)
    }
}

impl From<Committee> for CommitteeConfig {
    fn from(committee: Committee) -> Self {
        CommitteeConfig {
            threshold: committee.threshold,
            signers: committee.signers,
        }
    }
}
