//! Asset bookkeeping
//!
//! Provides the collaborators that co-signed actions act upon:
//! - Collections of uniquely identified tokens
//! - A stats ledger that records finalized matches
//!
//! # Example
//!
//! ```ignore
//! use trust_gate::token::CollectionManager;
//!
//! let mut manager = CollectionManager::new(namespace);
//! let nft = manager.deploy("Test NFT".to_string(), deployer)?;
//! manager.mint(&nft, deployer, player1, 1)?;
//! assert_eq!(manager.owner_of(&nft, 1), Some(player1));
//! ```

pub mod collection;
pub mod manager;
pub mod stats;

pub use collection::{Collection, MintEvent, TokenError};
pub use manager::CollectionManager;
pub use stats::{MatchRecord, StatsLedger};
