//! A wired-up deployment
//!
//! Owns one instance of every component and routes forwarded calls between
//! them: multisig execution reaches the registry, verifier finalization
//! reaches the stats ledger. All mutation goes through `&mut self`, so a
//! deployment has exactly one writer at a time.

use crate::core::{Address, DownstreamError, EventClock, EventLog, U256};
use crate::crypto::{encode_call, AbiValue, Signature};
use crate::deployment::config::{ConfigError, DeploymentConfig};
use crate::multisig::{
    CallDispatcher, Committee, MultiSigApproval, MultisigError, OutboundCall, ProposedTransaction,
};
use crate::registry::ManagementRegistry;
use crate::token::{CollectionManager, MintEvent, StatsLedger, TokenError};
use crate::verifier::{
    ActionDescriptor, CoSignatureVerifier, FinalizeCall, FinalizeTarget, ResourceId, VerifyError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Errors surfaced by deployment operations
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("Multisig error: {0}")]
    Multisig(#[from] MultisigError),
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Downstream error: {0}")]
    Downstream(#[from] DownstreamError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Addresses of the deployed components
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Addresses {
    pub multisig: Address,
    pub registry: Address,
    pub stats: Address,
    pub verifier: Address,
}

impl Addresses {
    fn derive(deployer: &Address) -> Self {
        Self {
            multisig: Address::derive(deployer, 0),
            registry: Address::derive(deployer, 1),
            stats: Address::derive(deployer, 2),
            verifier: Address::derive(deployer, 3),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    deployer: Address,
    addresses: Addresses,
    multisig: MultiSigApproval,
    registry: ManagementRegistry,
    verifier: CoSignatureVerifier,
    ledger: StatsLedger,
    collections: CollectionManager,
    created_at: DateTime<Utc>,
}

/// Routes multisig instructions to their target component
struct Router<'a> {
    registry: &'a mut ManagementRegistry,
}

impl CallDispatcher for Router<'_> {
    fn dispatch(&mut self, call: OutboundCall<'_>) -> Result<(), DownstreamError> {
        if call.target == self.registry.address() {
            self.registry
                .handle_call(call.caller, call.payload, call.value)
                .map(|_| ())
        } else {
            Err(DownstreamError::UnknownTarget(call.target))
        }
    }
}

/// Gives the ledger read access to the registry and collections it checks
struct LedgerGateway<'a> {
    ledger: &'a mut StatsLedger,
    registry: &'a ManagementRegistry,
    collections: &'a CollectionManager,
}

impl FinalizeTarget for LedgerGateway<'_> {
    fn finalize(&mut self, call: FinalizeCall<'_>) -> Result<(), DownstreamError> {
        self.ledger
            .record(call, self.registry, self.collections)
            .map(|_| ())
    }
}

impl Deployment {
    /// Deploy every component and bind the ledger to the verifier
    pub fn new(config: DeploymentConfig) -> Result<Self, DeploymentError> {
        config.validate()?;
        let committee = Committee::new(config.threshold, config.committee)?;
        let addresses = Addresses::derive(&config.deployer);

        let multisig = MultiSigApproval::new(addresses.multisig, committee);
        let registry = ManagementRegistry::new(addresses.registry, addresses.multisig);
        let verifier = CoSignatureVerifier::new(addresses.verifier, config.arity);
        let mut ledger = StatsLedger::new(addresses.stats);
        ledger.init(addresses.verifier)?;
        let collections = CollectionManager::new(Address::derive(&config.deployer, 4));

        log::info!(
            "Deployed {} multisig at {}, registry at {}, verifier at {}",
            multisig.committee().description(),
            addresses.multisig,
            addresses.registry,
            addresses.verifier
        );

        let mut deployment = Self {
            deployer: config.deployer,
            addresses,
            multisig,
            registry,
            verifier,
            ledger,
            collections,
            created_at: Utc::now(),
        };
        deployment.link_event_clock();
        Ok(deployment)
    }

    /// Share one event clock between the multisig and verifier logs
    ///
    /// Called on construction and again after a snapshot is loaded.
    pub fn link_event_clock(&mut self) -> EventClock {
        EventClock::link(&mut [self.multisig.events_mut(), self.verifier.events_mut()])
    }

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn addresses(&self) -> &Addresses {
        &self.addresses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn multisig(&self) -> &MultiSigApproval {
        &self.multisig
    }

    pub fn registry(&self) -> &ManagementRegistry {
        &self.registry
    }

    pub fn verifier(&self) -> &CoSignatureVerifier {
        &self.verifier
    }

    pub fn ledger(&self) -> &StatsLedger {
        &self.ledger
    }

    pub fn collections(&self) -> &CollectionManager {
        &self.collections
    }

    /// Propose an instruction to the multisig
    pub fn submit(
        &mut self,
        caller: Address,
        target: Address,
        payload: Vec<u8>,
        value: u128,
    ) -> Result<u64, DeploymentError> {
        Ok(self.multisig.submit(caller, target, payload, value)?)
    }

    /// Propose a registry call encoded from a signature and arguments
    pub fn submit_registry_call(
        &mut self,
        caller: Address,
        signature: &str,
        args: &[AbiValue],
    ) -> Result<u64, DeploymentError> {
        let target = self.registry.address();
        self.submit(caller, target, encode_call(signature, args), 0)
    }

    pub fn confirm(&mut self, caller: Address, index: u64) -> Result<(), DeploymentError> {
        Ok(self.multisig.confirm(caller, index)?)
    }

    pub fn execute(&mut self, caller: Address, index: u64) -> Result<(), DeploymentError> {
        let mut router = Router {
            registry: &mut self.registry,
        };
        Ok(self.multisig.execute(caller, index, &mut router)?)
    }

    pub fn transaction(&self, index: u64) -> Option<&ProposedTransaction> {
        self.multisig.transaction(index)
    }

    /// Current nonce for a participant pair
    pub fn get_nonce(&self, a: Address, b: Address) -> u64 {
        self.verifier.get_nonce(a, b)
    }

    /// Descriptor participants must sign for their next action
    pub fn descriptor(
        &self,
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
    ) -> ActionDescriptor {
        self.verifier.descriptor(resource_ids, authorizers, participants)
    }

    /// Verify a co-signed action and finalize it on the stats ledger
    pub fn verify(
        &mut self,
        submitter: Address,
        signatures: &[Signature],
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
    ) -> Result<u64, DeploymentError> {
        let mut gateway = LedgerGateway {
            ledger: &mut self.ledger,
            registry: &self.registry,
            collections: &self.collections,
        };
        Ok(self.verifier.verify(
            submitter,
            signatures,
            resource_ids,
            authorizers,
            participants,
            &mut gateway,
        )?)
    }

    pub fn deploy_collection(&mut self, creator: Address, name: &str) -> Result<Address, DeploymentError> {
        Ok(self.collections.deploy(name.to_string(), creator)?)
    }

    pub fn mint(
        &mut self,
        collection: &Address,
        caller: Address,
        to: Address,
        token_id: U256,
    ) -> Result<MintEvent, DeploymentError> {
        Ok(self.collections.mint(collection, caller, to, token_id)?)
    }

    /// Multisig and verifier events in the order they were recorded
    pub fn events(&self) -> EventLog {
        EventLog::merged(&[self.multisig.events(), self.verifier.events()])
    }
}

/// A deployment shared between threads; every operation takes the write lock
#[derive(Clone, Debug)]
pub struct SharedDeployment(Arc<RwLock<Deployment>>);

impl SharedDeployment {
    pub fn new(deployment: Deployment) -> Self {
        Self(Arc::new(RwLock::new(deployment)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Deployment> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Deployment> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn confirm(&self, caller: Address, index: u64) -> Result<(), DeploymentError> {
        self.write().confirm(caller, index)
    }

    pub fn execute(&self, caller: Address, index: u64) -> Result<(), DeploymentError> {
        self.write().execute(caller, index)
    }

    pub fn verify(
        &self,
        submitter: Address,
        signatures: &[Signature],
        resource_ids: &[ResourceId],
        authorizers: &[Address],
        participants: &[Address],
    ) -> Result<u64, DeploymentError> {
        self.write()
            .verify(submitter, signatures, resource_ids, authorizers, participants)
    }

    pub fn get_nonce(&self, a: Address, b: Address) -> u64 {
        self.read().get_nonce(a, b)
    }
}
