//! Match ledger fed by verified co-signed actions
//!
//! The ledger accepts finalize calls from one bound verifier only. Each
//! accepted call becomes a [`MatchRecord`] and bumps every participant's
//! match count.

use crate::core::{Address, DownstreamError};
use crate::registry::ManagementRegistry;
use crate::token::manager::CollectionManager;
use crate::verifier::{FinalizeCall, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One finalized action
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: u64,
    pub resource_ids: Vec<ResourceId>,
    pub authorizers: Vec<Address>,
    pub participants: Vec<Address>,
    /// Verifier nonce the action consumed
    pub nonce: u64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsLedger {
    address: Address,
    verifier: Option<Address>,
    matches: Vec<MatchRecord>,
    match_counts: BTreeMap<Address, u64>,
}

impl StatsLedger {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            verifier: None,
            matches: Vec::new(),
            match_counts: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn verifier(&self) -> Option<Address> {
        self.verifier
    }

    /// Bind the verifier allowed to finalize; only once
    pub fn init(&mut self, verifier: Address) -> Result<(), DownstreamError> {
        if self.verifier.is_some() {
            return Err(DownstreamError::AlreadyInitialized(self.address));
        }
        self.verifier = Some(verifier);
        log::info!("Stats ledger bound to verifier {}", verifier);
        Ok(())
    }

    /// Record a verified action
    ///
    /// Every authorizer must be a registered minter and every resource must
    /// be owned by the participant at the same position.
    pub fn record(
        &mut self,
        call: FinalizeCall<'_>,
        registry: &ManagementRegistry,
        collections: &CollectionManager,
    ) -> Result<u64, DownstreamError> {
        match self.verifier {
            None => return Err(DownstreamError::NotInitialized(self.address)),
            Some(v) if v != call.caller => {
                return Err(DownstreamError::Unauthorized {
                    caller: call.caller,
                    target: self.address,
                })
            }
            Some(_) => {}
        }

        let positions = call
            .resource_ids
            .iter()
            .zip(call.authorizers)
            .zip(call.participants);
        for ((id, authorizer), participant) in positions {
            if !registry.is_minter(authorizer) {
                return Err(DownstreamError::Rejected(format!(
                    "{} is not a registered minter",
                    authorizer
                )));
            }
            if collections.owner_of(authorizer, *id) != Some(*participant) {
                return Err(DownstreamError::Rejected(format!(
                    "token {} of {} is not owned by {}",
                    id, authorizer, participant
                )));
            }
        }

        let id = self.matches.len() as u64;
        self.matches.push(MatchRecord {
            id,
            resource_ids: call.resource_ids.to_vec(),
            authorizers: call.authorizers.to_vec(),
            participants: call.participants.to_vec(),
            nonce: call.nonce,
            recorded_at: Utc::now(),
        });
        for participant in call.participants {
            *self.match_counts.entry(*participant).or_insert(0) += 1;
        }

        log::info!("Match {} recorded for {} participants", id, call.participants.len());
        Ok(id)
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn match_count(&self, player: &Address) -> u64 {
        self.match_counts.get(player).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::U256;
    use crate::registry::RegistryCall;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    const VERIFIER: u8 = 0xcc;
    const OWNER: u8 = 0xaa;

    struct World {
        ledger: StatsLedger,
        registry: ManagementRegistry,
        collections: CollectionManager,
        nft: Address,
    }

    fn world() -> World {
        let mut collections = CollectionManager::new(addr(0x50));
        let nft = collections.deploy("NFT".to_string(), addr(1)).unwrap();
        collections.mint(&nft, addr(1), addr(7), U256::from(1)).unwrap();
        collections.mint(&nft, addr(1), addr(8), U256::from(2)).unwrap();

        let mut registry = ManagementRegistry::new(addr(0xee), addr(OWNER));
        registry
            .handle_call(addr(OWNER), &RegistryCall::AddMinter(nft).encode(), 0)
            .unwrap();

        let mut ledger = StatsLedger::new(addr(0x57));
        ledger.init(addr(VERIFIER)).unwrap();

        World {
            ledger,
            registry,
            collections,
            nft,
        }
    }

    fn ids(values: &[u64]) -> Vec<ResourceId> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    fn call<'a>(caller: Address, ids: &'a [ResourceId], minters: &'a [Address], players: &'a [Address]) -> FinalizeCall<'a> {
        FinalizeCall {
            caller,
            resource_ids: ids,
            authorizers: minters,
            participants: players,
            nonce: 0,
        }
    }

    #[test]
    fn test_record_match() {
        let mut w = world();
        let minters = [w.nft, w.nft];
        let players = [addr(7), addr(8)];

        let id = w
            .ledger
            .record(call(addr(VERIFIER), &ids(&[1, 2]), &minters, &players), &w.registry, &w.collections)
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(w.ledger.match_count(&addr(7)), 1);
        assert_eq!(w.ledger.match_count(&addr(8)), 1);
        assert_eq!(w.ledger.matches()[0].resource_ids, ids(&[1, 2]));
    }

    #[test]
    fn test_only_bound_verifier() {
        let mut w = world();
        let minters = [w.nft, w.nft];
        let players = [addr(7), addr(8)];

        let err = w
            .ledger
            .record(call(addr(1), &ids(&[1, 2]), &minters, &players), &w.registry, &w.collections)
            .unwrap_err();
        assert!(matches!(err, DownstreamError::Unauthorized { .. }));

        let mut fresh = StatsLedger::new(addr(0x58));
        let err = fresh
            .record(call(addr(VERIFIER), &ids(&[1, 2]), &minters, &players), &w.registry, &w.collections)
            .unwrap_err();
        assert_eq!(err, DownstreamError::NotInitialized(addr(0x58)));
    }

    #[test]
    fn test_init_once() {
        let mut w = world();
        assert_eq!(w.ledger.init(addr(3)), Err(DownstreamError::AlreadyInitialized(addr(0x57))));
        assert_eq!(w.ledger.verifier(), Some(addr(VERIFIER)));
    }

    #[test]
    fn test_rejects_unregistered_minter_and_wrong_owner() {
        let mut w = world();
        let players = [addr(7), addr(8)];

        let stranger = [addr(0x99), addr(0x99)];
        assert!(matches!(
            w.ledger.record(call(addr(VERIFIER), &ids(&[1, 2]), &stranger, &players), &w.registry, &w.collections),
            Err(DownstreamError::Rejected(_))
        ));

        let minters = [w.nft, w.nft];
        assert!(matches!(
            w.ledger.record(call(addr(VERIFIER), &ids(&[2, 1]), &minters, &players), &w.registry, &w.collections),
            Err(DownstreamError::Rejected(_))
        ));
        assert!(w.ledger.matches().is_empty());
    }
}
