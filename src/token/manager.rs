//! Collection manager for deploying and looking up collections

use crate::core::{Address, U256};
use crate::token::collection::{Collection, MintEvent, TokenError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manages all collections in a deployment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionManager {
    /// Seed for collection address derivation
    namespace: Address,
    /// All collections by address
    collections: BTreeMap<Address, Collection>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl CollectionManager {
    pub fn new(namespace: Address) -> Self {
        Self {
            namespace,
            collections: BTreeMap::new(),
            nonce: 0,
        }
    }

    /// Deploy a new, empty collection owned by `creator`
    pub fn deploy(&mut self, name: String, creator: Address) -> Result<Address, TokenError> {
        let address = Address::derive(&self.namespace, self.nonce);
        let collection = Collection::new(address, name, creator)?;
        self.nonce += 1;

        log::info!("Collection {} deployed at {}", collection.name, address);
        self.collections.insert(address, collection);

        Ok(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Collection> {
        self.collections.get(address)
    }

    pub fn list(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn count(&self) -> usize {
        self.collections.len()
    }

    /// Mint through the collection at `collection`
    pub fn mint(
        &mut self,
        collection: &Address,
        caller: Address,
        to: Address,
        token_id: U256,
    ) -> Result<MintEvent, TokenError> {
        self.collections
            .get_mut(collection)
            .ok_or(TokenError::CollectionNotFound(*collection))?
            .mint(caller, to, token_id)
    }

    /// Owner of `token_id` in the collection at `collection`
    pub fn owner_of(&self, collection: &Address, token_id: U256) -> Option<Address> {
        self.collections.get(collection)?.owner_of(token_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_deploy_unique_addresses() {
        let mut manager = CollectionManager::new(addr(9));
        let a = manager.deploy("A".to_string(), addr(1)).unwrap();
        let b = manager.deploy("B".to_string(), addr(1)).unwrap();

        assert_ne!(a, b);
        assert_eq!(manager.count(), 2);
        assert_eq!(manager.get(&a).unwrap().name, "A");
    }

    #[test]
    fn test_mint_through_manager() {
        let mut manager = CollectionManager::new(addr(9));
        let nft = manager.deploy("NFT".to_string(), addr(1)).unwrap();

        let id = U256::from(1);

        manager.mint(&nft, addr(1), addr(5), id).unwrap();
        assert_eq!(manager.owner_of(&nft, id), Some(addr(5)));
        assert_eq!(manager.owner_of(&addr(0), id), None);
        assert_eq!(
            manager.mint(&addr(0), addr(1), addr(5), id),
            Err(TokenError::CollectionNotFound(addr(0)))
        );
    }
}
