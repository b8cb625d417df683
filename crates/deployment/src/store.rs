//! Append-only deployment record stores.
//!
//! A store holds the records of a single network, keyed by logical name. Once a name is
//! recorded its address never changes.

use crate::DeploymentRecord;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A record already exists under this name
    #[error("`{name}` is already recorded on {network}")]
    AlreadyRecorded { name: String, network: String },

    /// A logical name that is not a plain file stem
    #[error("invalid logical name `{0}`: expected letters, digits, `_` or `-`")]
    InvalidName(String),

    /// A record file whose name differs from the logical name it holds
    #[error("{path} holds the record of `{name}`")]
    MisplacedRecord { path: PathBuf, name: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record file could not be parsed or written as JSON
    #[error("corrupt deployment record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Name-keyed record store of one network.
pub trait DeploymentStore {
    /// Network the records belong to.
    fn network(&self) -> &str;

    fn get(&self, logical_name: &str) -> Option<&DeploymentRecord>;

    /// Add a record. Fails with [`StoreError::AlreadyRecorded`] if the name is taken.
    fn insert(&mut self, record: DeploymentRecord) -> Result<(), StoreError>;

    /// All records, ordered by logical name.
    fn records(&self) -> Vec<&DeploymentRecord>;

    fn contains(&self, logical_name: &str) -> bool {
        self.get(logical_name).is_some()
    }
}

/// Store kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    network: String,
    records: BTreeMap<String, DeploymentRecord>,
}

impl MemoryStore {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            records: BTreeMap::new(),
        }
    }
}

impl DeploymentStore for MemoryStore {
    fn network(&self) -> &str {
        &self.network
    }

    fn get(&self, logical_name: &str) -> Option<&DeploymentRecord> {
        self.records.get(logical_name)
    }

    fn insert(&mut self, record: DeploymentRecord) -> Result<(), StoreError> {
        validate_name(&record.logical_name)?;
        if self.records.contains_key(&record.logical_name) {
            return Err(StoreError::AlreadyRecorded {
                name: record.logical_name,
                network: self.network.clone(),
            });
        }
        self.records.insert(record.logical_name.clone(), record);
        Ok(())
    }

    fn records(&self) -> Vec<&DeploymentRecord> {
        self.records.values().collect()
    }
}

/// Logical names double as file stems, so they are limited to `[A-Za-z0-9_-]+`.
fn validate_name(logical_name: &str) -> Result<(), StoreError> {
    let valid = !logical_name.is_empty()
        && logical_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(logical_name.to_string()))
    }
}

/// Store persisted as `<root>/<network>/<logical name>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the store of `network` under `root`, loading any existing records.
    pub fn open(root: impl AsRef<Path>, network: &str) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(network);
        let mut inner = MemoryStore::new(network);

        if dir.is_dir() {
            let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|source| StoreError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    let record = read_record(&path)?;
                    let stem = path.file_stem().and_then(|stem| stem.to_str());
                    if stem != Some(record.logical_name.as_str()) {
                        return Err(StoreError::MisplacedRecord {
                            path,
                            name: record.logical_name,
                        });
                    }
                    inner.insert(record)?;
                }
            }
        }

        debug!(network, dir = %dir.display(), records = inner.records.len(), "opened deployment store");
        Ok(Self { dir, inner })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn read_record(path: &Path) -> Result<DeploymentRecord, StoreError> {
    let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

impl DeploymentStore for FileStore {
    fn network(&self) -> &str {
        self.inner.network()
    }

    fn get(&self, logical_name: &str) -> Option<&DeploymentRecord> {
        self.inner.get(logical_name)
    }

    fn insert(&mut self, record: DeploymentRecord) -> Result<(), StoreError> {
        validate_name(&record.logical_name)?;
        if self.inner.contains(&record.logical_name) {
            return Err(StoreError::AlreadyRecorded {
                name: record.logical_name,
                network: self.inner.network.clone(),
            });
        }

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| StoreError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.dir.join(format!("{}.json", record.logical_name));
        let tmp = path.with_extension("json.tmp");

        let contents = serde_json::to_string_pretty(&record).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, contents).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;

        self.inner.insert(record)
    }

    fn records(&self) -> Vec<&DeploymentRecord> {
        self.inner.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address};

    const WETH: Address = address!("0x980B62Da83eFf3D4576C647993b0c1D7faf17c73");

    #[test]
    fn test_memory_store_is_append_only() {
        let mut store = MemoryStore::new("arbitrum-sepolia");
        store.insert(DeploymentRecord::imported("WETH", WETH)).unwrap();

        let err = store
            .insert(DeploymentRecord::imported("WETH", Address::ZERO))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyRecorded { name, .. } if name == "WETH"));
        assert_eq!(store.get("WETH").unwrap().address, WETH);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let root = tempfile::tempdir().unwrap();

        let mut store = FileStore::open(root.path(), "arbitrum-sepolia").unwrap();
        assert!(store.records().is_empty());
        store.insert(DeploymentRecord::imported("WETH", WETH)).unwrap();
        assert!(root.path().join("arbitrum-sepolia/WETH.json").is_file());

        let reopened = FileStore::open(root.path(), "arbitrum-sepolia").unwrap();
        assert_eq!(reopened.get("WETH").unwrap().address, WETH);
        assert_eq!(reopened.records().len(), 1);

        let other = FileStore::open(root.path(), "sepolia").unwrap();
        assert!(other.get("WETH").is_none());
    }

    #[test]
    fn test_file_store_never_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(root.path(), "sepolia").unwrap();
        store.insert(DeploymentRecord::imported("WETH", WETH)).unwrap();

        assert!(store
            .insert(DeploymentRecord::imported("WETH", Address::ZERO))
            .is_err());

        let reopened = FileStore::open(root.path(), "sepolia").unwrap();
        assert_eq!(reopened.get("WETH").unwrap().address, WETH);
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("sepolia");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("WETH.json"), "{ not json").unwrap();

        assert!(matches!(
            FileStore::open(root.path(), "sepolia"),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_path_like_names_rejected() {
        let root = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(root.path(), "arbitrum-sepolia").unwrap();

        for name in ["../sepolia/EndpointV2", "a/b", "", "..", "WETH.json"] {
            let err = store
                .insert(DeploymentRecord::imported(name, WETH))
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(n) if n == name));
        }
        assert!(!root.path().join("sepolia").exists());
        assert!(store.records().is_empty());

        let mut memory = MemoryStore::new("sepolia");
        assert!(memory
            .insert(DeploymentRecord::imported("../WETH", WETH))
            .is_err());
    }

    #[test]
    fn test_misplaced_record_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(root.path(), "sepolia").unwrap();
        store.insert(DeploymentRecord::imported("WETH", WETH)).unwrap();

        let dir = root.path().join("sepolia");
        fs::rename(dir.join("WETH.json"), dir.join("EndpointV2.json")).unwrap();

        assert!(matches!(
            FileStore::open(root.path(), "sepolia"),
            Err(StoreError::MisplacedRecord { name, .. }) if name == "WETH"
        ));
    }
}
