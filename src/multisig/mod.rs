//! Fixed-committee multi-signature approval
//!
//! Administrative instructions are proposed by committee members, collect
//! confirmations, and execute once M of N members have confirmed.
//!
//! # Example
//!
//! ```ignore
//! use trust_gate::multisig::{Committee, MultiSigApproval};
//!
//! // 2-of-3 committee
//! let committee = Committee::new(2, vec![s1, s2, s3])?;
//! let mut multisig = MultiSigApproval::new(executor, committee);
//!
//! let index = multisig.submit(s1, registry, payload, 0)?;
//! multisig.confirm(s1, index)?;
//! multisig.confirm(s2, index)?;
//! multisig.execute(s1, index, &mut dispatcher)?;
//! ```

pub mod approval;
pub mod committee;
pub mod transaction;

pub use approval::{CallDispatcher, MultiSigApproval, OutboundCall};
pub use committee::{Committee, CommitteeConfig, MultisigError};
pub use transaction::{ProposalStatus, ProposedTransaction};
