//! Deployment wiring
//!
//! Builds the multisig, registry, verifier, stats ledger and collections
//! from a [`DeploymentConfig`] and routes calls between them.

pub mod config;
pub mod deployment;

pub use config::{ConfigError, DeploymentConfig};
pub use deployment::{Addresses, Deployment, DeploymentError, SharedDeployment};
