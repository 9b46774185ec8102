//! Deployment configuration
//!
//! Describes who deploys, who sits on the committee, and how many
//! participants a co-signed action has. Loaded from JSON or built from CLI
//! flags.

use crate::core::Address;
use crate::verifier::DEFAULT_ARITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_arity() -> usize {
    DEFAULT_ARITY
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Identity that deploys every component; seeds component addresses
    pub deployer: Address,
    /// Multisig committee members
    pub committee: Vec<Address>,
    /// Confirmations required to execute
    pub threshold: usize,
    /// Participants per co-signed action
    #[serde(default = "default_arity")]
    pub arity: usize,
}

impl DeploymentConfig {
    pub fn new(deployer: Address, committee: Vec<Address>, threshold: usize) -> Self {
        Self {
            deployer,
            committee,
            threshold,
            arity: DEFAULT_ARITY,
        }
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    /// Basic shape checks; committee rules are enforced by `Committee::new`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arity == 0 {
            return Err(ConfigError::Invalid("arity must be at least 1".to_string()));
        }
        if self.deployer.is_zero() {
            return Err(ConfigError::Invalid("deployer must not be the zero address".to_string()));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deployment.json");
        let config = DeploymentConfig::new(addr(1), vec![addr(2), addr(3)], 2);

        config.save(&path).unwrap();
        assert_eq!(DeploymentConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_arity_defaults() {
        let json = format!(
            r#"{{"deployer":"{}","committee":["{}"],"threshold":1}}"#,
            addr(1),
            addr(2)
        );
        let config: DeploymentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.arity, DEFAULT_ARITY);
    }

    #[test]
    fn test_validate() {
        let config = DeploymentConfig::new(addr(1), vec![addr(2)], 1);
        assert!(config.validate().is_ok());
        assert!(config.clone().with_arity(0).validate().is_err());
        assert!(DeploymentConfig::new(Address::ZERO, vec![addr(2)], 1).validate().is_err());
    }
}
