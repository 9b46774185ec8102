//! trust-gate: threshold approvals and co-signed action verification
//!
//! This crate provides two independent authorization gates and the
//! components they guard:
//! - M-of-N multisig approval over opaque instructions, executed once
//! - Replay-safe verification of co-signed actions (secp256k1 recovery,
//!   keccak256 digests, per-participant-set nonces)
//! - An administrative registry of minters and platforms, owned by the multisig
//! - A stats ledger that accepts finalized actions from the verifier only
//! - Asset collections whose ownership the ledger checks
//! - JSON snapshot persistence with backups
//!
//! # Example
//!
//! ```rust
//! use trust_gate::crypto::{AbiValue, KeyPair};
//! use trust_gate::deployment::{Deployment, DeploymentConfig};
//! use trust_gate::registry::ADD_MINTER;
//! use trust_gate::U256;
//!
//! let signers: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let committee = signers.iter().map(|k| k.address()).collect();
//! let deployer = KeyPair::generate().address();
//! let mut deployment = Deployment::new(DeploymentConfig::new(deployer, committee, 2)).unwrap();
//!
//! // Register a collection as minter through the multisig
//! let nft = deployment.deploy_collection(deployer, "Cards").unwrap();
//! let index = deployment
//!     .submit_registry_call(signers[0].address(), ADD_MINTER, &[AbiValue::Address(nft)])
//!     .unwrap();
//! deployment.confirm(signers[0].address(), index).unwrap();
//! deployment.confirm(signers[1].address(), index).unwrap();
//! deployment.execute(signers[2].address(), index).unwrap();
//! assert!(deployment.registry().is_minter(&nft));
//!
//! // Two players co-sign a match over their tokens
//! let players = [KeyPair::generate(), KeyPair::generate()];
//! let addresses = [players[0].address(), players[1].address()];
//! let ids = [U256::from(1), U256::from(2)];
//! deployment.mint(&nft, deployer, addresses[0], ids[0]).unwrap();
//! deployment.mint(&nft, deployer, addresses[1], ids[1]).unwrap();
//!
//! let signatures = deployment
//!     .descriptor(&ids, &[nft, nft], &addresses)
//!     .cosign(&players);
//! let nonce = deployment
//!     .verify(addresses[0], &signatures, &ids, &[nft, nft], &addresses)
//!     .unwrap();
//! assert_eq!(nonce, 0);
//! assert_eq!(deployment.get_nonce(addresses[0], addresses[1]), 1);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod deployment;
pub mod multisig;
pub mod registry;
pub mod storage;
pub mod token;
pub mod verifier;

// Re-export commonly used types
pub use core::{Address, DownstreamError, Event, EventClock, EventKind, EventLog, U256};
pub use crypto::{KeyPair, Signature};
pub use deployment::{Deployment, DeploymentConfig, DeploymentError, SharedDeployment};
pub use multisig::{CallDispatcher, Committee, MultiSigApproval, MultisigError};
pub use registry::ManagementRegistry;
pub use storage::{Storage, StorageConfig};
pub use token::{CollectionManager, StatsLedger};
pub use verifier::{ActionDescriptor, CoSignatureVerifier, FinalizeTarget, VerifyError};
