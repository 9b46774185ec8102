//! Administrative registry of minter and platform addresses
//!
//! The registry only accepts calls from its owner, which in a deployment is
//! the multisig executor. Calls arrive as encoded instructions.

use crate::core::{Address, DownstreamError};
use crate::crypto::{decode_call, selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const ADD_MINTER: &str = "addMinterAddress(address)";
pub const REMOVE_MINTER: &str = "removeMinterAddress(address)";
pub const ADD_PLATFORM: &str = "addPlatformAddress(address)";
pub const REMOVE_PLATFORM: &str = "removePlatformAddress(address)";

/// Operations the registry understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryCall {
    AddMinter(Address),
    RemoveMinter(Address),
    AddPlatform(Address),
    RemovePlatform(Address),
}

impl RegistryCall {
    /// Function signatures in selector lookup order
    pub const SIGNATURES: [&'static str; 4] = [ADD_MINTER, REMOVE_MINTER, ADD_PLATFORM, REMOVE_PLATFORM];

    /// Decode an instruction payload
    pub fn decode(payload: &[u8]) -> Result<Self, DownstreamError> {
        let call = decode_call(payload)?;
        let signature = Self::SIGNATURES
            .iter()
            .find(|sig| selector(sig) == call.selector)
            .ok_or_else(|| DownstreamError::UnknownSelector(hex::encode(call.selector)))?;
        let address = call.single_address()?;

        Ok(match *signature {
            ADD_MINTER => RegistryCall::AddMinter(address),
            REMOVE_MINTER => RegistryCall::RemoveMinter(address),
            ADD_PLATFORM => RegistryCall::AddPlatform(address),
            _ => RegistryCall::RemovePlatform(address),
        })
    }

    /// Encode as an instruction payload
    pub fn encode(&self) -> Vec<u8> {
        let (signature, address) = match self {
            RegistryCall::AddMinter(a) => (ADD_MINTER, a),
            RegistryCall::RemoveMinter(a) => (REMOVE_MINTER, a),
            RegistryCall::AddPlatform(a) => (ADD_PLATFORM, a),
            RegistryCall::RemovePlatform(a) => (REMOVE_PLATFORM, a),
        };
        crate::crypto::encode_call(signature, &[crate::crypto::AbiValue::Address(*address)])
    }
}

/// Minter and platform address lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagementRegistry {
    address: Address,
    owner: Address,
    minters: BTreeSet<Address>,
    platforms: BTreeSet<Address>,
}

impl ManagementRegistry {
    /// Create an empty registry controlled by `owner`
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            minters: BTreeSet::new(),
            platforms: BTreeSet::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Apply an encoded instruction from `caller`
    pub fn handle_call(
        &mut self,
        caller: Address,
        payload: &[u8],
        value: u128,
    ) -> Result<RegistryCall, DownstreamError> {
        if caller != self.owner {
            return Err(DownstreamError::Unauthorized {
                caller,
                target: self.address,
            });
        }
        if value != 0 {
            return Err(DownstreamError::NotPayable(self.address));
        }

        let call = RegistryCall::decode(payload)?;
        self.apply(call)?;
        log::info!("Registry applied {:?}", call);
        Ok(call)
    }

    fn apply(&mut self, call: RegistryCall) -> Result<(), DownstreamError> {
        let changed = match call {
            RegistryCall::AddMinter(a) => self.minters.insert(a),
            RegistryCall::RemoveMinter(a) => self.minters.remove(&a),
            RegistryCall::AddPlatform(a) => self.platforms.insert(a),
            RegistryCall::RemovePlatform(a) => self.platforms.remove(&a),
        };

        if changed {
            Ok(())
        } else {
            Err(DownstreamError::Rejected(format!("{:?} has no effect", call)))
        }
    }

    pub fn is_minter(&self, address: &Address) -> bool {
        self.minters.contains(address)
    }

    pub fn is_platform(&self, address: &Address) -> bool {
        self.platforms.contains(address)
    }

    pub fn minters(&self) -> impl Iterator<Item = &Address> {
        self.minters.iter()
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Address> {
        self.platforms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AbiError;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn registry() -> ManagementRegistry {
        ManagementRegistry::new(addr(0xee), addr(0xaa))
    }

    #[test]
    fn test_add_and_remove() {
        let mut reg = registry();
        let minter = addr(5);

        reg.handle_call(addr(0xaa), &RegistryCall::AddMinter(minter).encode(), 0)
            .unwrap();
        assert!(reg.is_minter(&minter));
        assert!(!reg.is_platform(&minter));

        reg.handle_call(addr(0xaa), &RegistryCall::AddPlatform(minter).encode(), 0)
            .unwrap();
        reg.handle_call(addr(0xaa), &RegistryCall::RemoveMinter(minter).encode(), 0)
            .unwrap();
        assert!(!reg.is_minter(&minter));
        assert_eq!(reg.platforms().count(), 1);
    }

    #[test]
    fn test_only_owner() {
        let mut reg = registry();
        let err = reg
            .handle_call(addr(1), &RegistryCall::AddMinter(addr(5)).encode(), 0)
            .unwrap_err();
        assert_eq!(
            err,
            DownstreamError::Unauthorized { caller: addr(1), target: addr(0xee) }
        );
        assert_eq!(reg.minters().count(), 0);
    }

    #[test]
    fn test_rejects_value_and_bad_payloads() {
        let mut reg = registry();
        let payload = RegistryCall::AddMinter(addr(5)).encode();

        assert_eq!(
            reg.handle_call(addr(0xaa), &payload, 1),
            Err(DownstreamError::NotPayable(addr(0xee)))
        );
        assert!(matches!(
            reg.handle_call(addr(0xaa), &[0, 0, 0, 0], 0),
            Err(DownstreamError::UnknownSelector(_))
        ));
        assert_eq!(
            reg.handle_call(addr(0xaa), &payload[..4], 0),
            Err(DownstreamError::MalformedPayload(AbiError::ArgumentCount {
                expected: 1,
                found: 0
            }))
        );
    }

    #[test]
    fn test_no_op_rejected() {
        let mut reg = registry();
        let add = RegistryCall::AddPlatform(addr(5)).encode();
        reg.handle_call(addr(0xaa), &add, 0).unwrap();

        assert!(matches!(
            reg.handle_call(addr(0xaa), &add, 0),
            Err(DownstreamError::Rejected(_))
        ));
        assert!(matches!(
            reg.handle_call(addr(0xaa), &RegistryCall::RemoveMinter(addr(5)).encode(), 0),
            Err(DownstreamError::Rejected(_))
        ));
    }

    #[test]
    fn test_decode_matches_encode() {
        for call in [
            RegistryCall::AddMinter(addr(1)),
            RegistryCall::RemoveMinter(addr(2)),
            RegistryCall::AddPlatform(addr(3)),
            RegistryCall::RemovePlatform(addr(4)),
        ] {
            assert_eq!(RegistryCall::decode(&call.encode()).unwrap(), call);
        }
    }
}
