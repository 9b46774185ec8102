//! Non-fungible asset collection
//!
//! Each token ID can be minted once and is owned by exactly one address.
//! A collection's address is what co-signed actions name as the authorizer
//! (minter) of its tokens.

use crate::core::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token {0} already minted")]
    TokenExists(U256),
    #[error("Token {0} not found")]
    TokenNotFound(U256),
    #[error("Collection not found: {0}")]
    CollectionNotFound(Address),
    #[error("Only the collection creator may mint: {0}")]
    Unauthorized(Address),
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
}

/// Mint event (emitted when a token is created)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintEvent {
    pub collection: Address,
    pub to: Address,
    pub token_id: U256,
    pub timestamp: DateTime<Utc>,
}

/// A collection of uniquely identified tokens
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Collection {
    pub address: Address,
    pub name: String,
    pub creator: Address,
    /// token id -> owner
    #[serde(with = "owner_entries")]
    owners: BTreeMap<U256, Address>,
    pub mint_history: Vec<MintEvent>,
}

impl Collection {
    pub fn new(address: Address, name: String, creator: Address) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }

        Ok(Self {
            address,
            name,
            creator,
            owners: BTreeMap::new(),
            mint_history: Vec::new(),
        })
    }

    /// Mint `token_id` to `to`; IDs are never reused
    pub fn mint(&mut self, caller: Address, to: Address, token_id: U256) -> Result<MintEvent, TokenError> {
        if caller != self.creator {
            return Err(TokenError::Unauthorized(caller));
        }
        if self.owners.contains_key(&token_id) {
            return Err(TokenError::TokenExists(token_id));
        }

        self.owners.insert(token_id, to);
        let event = MintEvent {
            collection: self.address,
            to,
            token_id,
            timestamp: Utc::now(),
        };
        self.mint_history.push(event.clone());

        log::info!("Minted token {} of {} to {}", token_id, self.name, to.short());
        Ok(event)
    }

    pub fn owner_of(&self, token_id: U256) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    pub fn balance_of(&self, owner: &Address) -> usize {
        self.owners.values().filter(|o| *o == owner).count()
    }

    pub fn total_supply(&self) -> usize {
        self.owners.len()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (U256, Address)> + '_ {
        self.owners.iter().map(|(id, owner)| (*id, *owner))
    }
}

/// Stores the owner map as a list of `{id, owner}` entries
mod owner_entries {
    use crate::core::{Address, U256};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        id: U256,
        owner: Address,
    }

    pub fn serialize<S: Serializer>(
        owners: &BTreeMap<U256, Address>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = owners
            .iter()
            .map(|(id, owner)| Entry { id: *id, owner: *owner })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<U256, Address>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.id, e.owner)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn id(value: u64) -> U256 {
        U256::from(value)
    }

    fn collection() -> Collection {
        Collection::new(addr(0xc0), "Test NFT".to_string(), addr(1)).unwrap()
    }

    #[test]
    fn test_mint_and_ownership() {
        let mut nft = collection();
        nft.mint(addr(1), addr(7), id(1)).unwrap();
        nft.mint(addr(1), addr(8), id(2)).unwrap();

        assert_eq!(nft.owner_of(id(1)), Some(addr(7)));
        assert_eq!(nft.owner_of(id(2)), Some(addr(8)));
        assert_eq!(nft.owner_of(id(3)), None);
        assert_eq!(nft.balance_of(&addr(7)), 1);
        assert_eq!(nft.total_supply(), 2);
        assert_eq!(nft.mint_history.len(), 2);
    }

    #[test]
    fn test_token_ids_unique() {
        let mut nft = collection();
        nft.mint(addr(1), addr(7), id(1)).unwrap();

        assert_eq!(nft.mint(addr(1), addr(8), id(1)), Err(TokenError::TokenExists(id(1))));
        assert_eq!(nft.owner_of(id(1)), Some(addr(7)));
    }

    #[test]
    fn test_only_creator_mints() {
        let mut nft = collection();
        assert_eq!(nft.mint(addr(2), addr(2), id(1)), Err(TokenError::Unauthorized(addr(2))));
    }

    #[test]
    fn test_name_validation() {
        assert!(Collection::new(addr(1), String::new(), addr(1)).is_err());
        assert!(Collection::new(addr(1), "x".repeat(51), addr(1)).is_err());
    }

    #[test]
    fn test_serde_keeps_owners() {
        let mut nft = collection();
        let wide: U256 = "340282366920938463463374607431768211456".parse().unwrap();
        nft.mint(addr(1), addr(7), wide).unwrap();
        nft.mint(addr(1), addr(8), U256::MAX).unwrap();

        let json = serde_json::to_string(&nft).unwrap();
        let back: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.owner_of(wide), Some(addr(7)));
        assert_eq!(back.owner_of(U256::MAX), Some(addr(8)));
        assert_eq!(back.owner_of(id(0)), None);
    }
}
