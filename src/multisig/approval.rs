//! Multi-signature approval state machine
//!
//! Committee members submit administrative transactions, confirm them, and
//! once the threshold is met any member may execute. Execution consumes the
//! proposal before the instruction is forwarded, so a failing or hostile
//! target can never trigger the same approval twice.

use crate::core::{Address, DownstreamError, EventKind, EventLog};
use crate::multisig::committee::{Committee, MultisigError};
use crate::multisig::transaction::{ProposalStatus, ProposedTransaction};
use serde::{Deserialize, Serialize};

/// The single call a multisig forwards when a proposal executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundCall<'a> {
    /// The multisig's own address
    pub caller: Address,
    pub target: Address,
    pub payload: &'a [u8],
    pub value: u128,
}

/// Anything that can receive a forwarded instruction
pub trait CallDispatcher {
    fn dispatch(&mut self, call: OutboundCall<'_>) -> Result<(), DownstreamError>;
}

/// Multisig approval instance owning its committee and proposal history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSigApproval {
    /// Executor identity seen by downstream targets
    address: Address,
    committee: Committee,
    transactions: Vec<ProposedTransaction>,
    events: EventLog,
}

impl MultiSigApproval {
    /// Create an instance with an empty proposal history
    pub fn new(address: Address, committee: Committee) -> Self {
        Self {
            address,
            committee,
            transactions: Vec::new(),
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn committee(&self) -> &Committee {
        &self.committee
    }

    pub fn threshold(&self) -> usize {
        self.committee.threshold()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    /// Propose a transaction; returns its index
    pub fn submit(
        &mut self,
        caller: Address,
        target: Address,
        payload: Vec<u8>,
        value: u128,
    ) -> Result<u64, MultisigError> {
        self.committee.ensure_member(&caller)?;

        let index = self.transactions.len() as u64;
        self.events.record(
            self.address,
            EventKind::Submitted {
                index,
                submitter: caller,
                target,
                payload: payload.clone(),
                value,
            },
        );
        self.transactions
            .push(ProposedTransaction::new(index, target, payload, value, caller));

        log::info!(
            "Transaction {} submitted by {} for target {}",
            index,
            caller.short(),
            target.short()
        );

        Ok(index)
    }

    /// Confirm a transaction as `caller`
    pub fn confirm(&mut self, caller: Address, index: u64) -> Result<(), MultisigError> {
        self.committee.ensure_member(&caller)?;

        let tx = self.get_mut(index)?;
        tx.add_confirmation(caller)?;
        let have = tx.confirmation_count();

        self.events.record(
            self.address,
            EventKind::Confirmed {
                index,
                signer: caller,
            },
        );
        log::info!(
            "Transaction {} confirmed by {} ({}/{})",
            index,
            caller.short(),
            have,
            self.committee.threshold()
        );

        Ok(())
    }

    /// Execute a sufficiently confirmed transaction through `dispatcher`
    ///
    /// The proposal is marked executed before forwarding. If the forwarded
    /// call fails the error is returned and the proposal stays executed.
    pub fn execute(
        &mut self,
        caller: Address,
        index: u64,
        dispatcher: &mut dyn CallDispatcher,
    ) -> Result<(), MultisigError> {
        self.committee.ensure_member(&caller)?;
        let need = self.committee.threshold();
        let address = self.address;

        let tx = self.get_mut(index)?;
        if tx.is_executed() {
            return Err(MultisigError::AlreadyExecuted(index));
        }
        if tx.confirmation_count() < need {
            return Err(MultisigError::InsufficientConfirmations {
                have: tx.confirmation_count(),
                need,
            });
        }

        tx.mark_executed();

        let outcome = dispatcher.dispatch(OutboundCall {
            caller: address,
            target: tx.target,
            payload: &tx.payload,
            value: tx.value,
        });

        if let Err(err) = &outcome {
            tx.record_failure(err.to_string());
        }

        self.events.record(
            address,
            EventKind::Executed {
                index,
                executor: caller,
                success: outcome.is_ok(),
                error: outcome.as_ref().err().map(|e| e.to_string()),
            },
        );

        match outcome {
            Ok(()) => {
                log::info!("Transaction {} executed by {}", index, caller.short());
                Ok(())
            }
            Err(err) => {
                log::warn!("Transaction {} consumed but forwarded call failed: {}", index, err);
                Err(err.into())
            }
        }
    }

    /// Get a transaction by index
    pub fn transaction(&self, index: u64) -> Option<&ProposedTransaction> {
        self.transactions.get(usize::try_from(index).ok()?)
    }

    fn get_mut(&mut self, index: u64) -> Result<&mut ProposedTransaction, MultisigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.transactions.get_mut(i))
            .ok_or(MultisigError::NotFound(index))
    }

    /// All transactions in submission order
    pub fn transactions(&self) -> &[ProposedTransaction] {
        &self.transactions
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Confirmations collected for a transaction
    pub fn confirmation_count(&self, index: u64) -> Result<usize, MultisigError> {
        self.transaction(index)
            .map(|tx| tx.confirmation_count())
            .ok_or(MultisigError::NotFound(index))
    }

    /// Whether a transaction has reached the threshold
    pub fn is_confirmed(&self, index: u64) -> Result<bool, MultisigError> {
        Ok(self.confirmation_count(index)? >= self.committee.threshold())
    }

    pub fn is_confirmed_by(&self, index: u64, signer: &Address) -> Result<bool, MultisigError> {
        self.transaction(index)
            .map(|tx| tx.is_confirmed_by(signer))
            .ok_or(MultisigError::NotFound(index))
    }

    pub fn status(&self, index: u64) -> Result<ProposalStatus, MultisigError> {
        self.transaction(index)
            .map(|tx| tx.status(self.committee.threshold()))
            .ok_or(MultisigError::NotFound(index))
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> Vec<&ProposedTransaction> {
        self.transactions.iter().filter(|tx| !tx.is_executed()).collect()
    }
}
