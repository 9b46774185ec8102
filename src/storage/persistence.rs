//! Deployment persistence layer
//!
//! Saves the whole deployment (committee, proposals, registry sets, nonce
//! table, ledger, collections and event logs) as one JSON snapshot.

use crate::deployment::Deployment;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub snapshot_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".trustgate_data"),
            snapshot_file: "deployment.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Deployment snapshot storage
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.snapshot_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.snapshot_file, index))
    }

    /// Save the deployment, rotating the previous snapshot into the backups
    pub fn save(&self, deployment: &Deployment) -> Result<(), StorageError> {
        let path = self.snapshot_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("deployment.tmp");
        let file = fs::File::create(&temp_path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), deployment)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;
        log::debug!("Snapshot saved to {}", path.display());

        Ok(())
    }

    pub fn load(&self) -> Result<Deployment, StorageError> {
        let path = self.snapshot_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "No deployment found; run `init` first".to_string(),
            ));
        }

        load_from_file(&path)
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path().exists()
    }

    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.snapshot_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup; 0 is the most recent
    pub fn restore_backup(&self, backup_index: usize) -> Result<Deployment, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        load_from_file(&backup_path)
    }

    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.snapshot_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Save a deployment to a specific file path
pub fn save_to_file(deployment: &Deployment, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), deployment)?;
    Ok(())
}

/// Load a deployment from a specific file path
pub fn load_from_file(path: &Path) -> Result<Deployment, StorageError> {
    let file = fs::File::open(path)?;
    let mut deployment: Deployment = serde_json::from_reader(BufReader::new(file))?;

    // The ledger only accepts finalization from the verifier it was bound to
    if deployment.ledger().verifier() != Some(deployment.addresses().verifier) {
        return Err(StorageError::InvalidData(
            "stats ledger is not bound to the deployed verifier".to_string(),
        ));
    }

    deployment.link_event_clock();
    Ok(deployment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;
    use crate::crypto::{AbiValue, KeyPair};
    use crate::deployment::DeploymentConfig;
    use crate::registry::ADD_MINTER;

    fn deployment() -> (Deployment, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let signers: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let config = DeploymentConfig::new(KeyPair::generate().address(), signers, 2);
        (Deployment::new(config).unwrap(), keys)
    }

    #[test]
    fn test_save_load_deployment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        let (mut deployment, keys) = deployment();
        let signer = keys[0].address();
        let index = deployment
            .submit_registry_call(signer, ADD_MINTER, &[AbiValue::Address(signer)])
            .unwrap();
        deployment.confirm(signer, index).unwrap();

        storage.save(&deployment).unwrap();
        assert!(storage.exists());

        let mut loaded = storage.load().unwrap();
        assert_eq!(loaded.addresses(), deployment.addresses());
        assert_eq!(loaded.multisig().confirmation_count(index).unwrap(), 1);
        assert_eq!(loaded.events().len(), deployment.events().len());

        // Pending proposal survives the round trip and can be completed
        loaded.confirm(keys[1].address(), index).unwrap();
        loaded.execute(keys[2].address(), index).unwrap();
        assert!(loaded.registry().is_minter(&signer));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 3,
            ..Default::default()
        })
        .unwrap();

        let (mut deployment, keys) = deployment();
        let signer = keys[0].address();
        for i in 0..5u8 {
            storage.save(&deployment).unwrap();
            deployment
                .submit(signer, Address::from_bytes([i; 20]), vec![], 0)
                .unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.multisig().transaction_count(), 3);
        assert_eq!(storage.stats().unwrap().backup_count, 3);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
        assert!(storage.restore_backup(1).is_err());
    }

    #[test]
    fn test_loaded_logs_continue_one_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        let (mut deployment, keys) = deployment();
        let signer = keys[0].address();
        let index = deployment
            .submit_registry_call(signer, ADD_MINTER, &[AbiValue::Address(signer)])
            .unwrap();
        storage.save(&deployment).unwrap();

        let mut loaded = storage.load().unwrap();
        loaded.confirm(keys[1].address(), index).unwrap();

        let stamps: Vec<u64> = loaded.events().iter().map(|e| e.stamp).collect();
        assert_eq!(stamps, vec![0, 1]);
    }

    #[test]
    fn test_zero_arity_snapshot_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        let (deployment, _) = deployment();
        let mut json = serde_json::to_value(&deployment).unwrap();
        json["verifier"]["arity"] = serde_json::json!(0);
        fs::write(
            temp_dir.path().join("deployment.json"),
            serde_json::to_vec(&json).unwrap(),
        )
        .unwrap();

        assert!(matches!(storage.load(), Err(StorageError::SerializationError(_))));
    }
}
