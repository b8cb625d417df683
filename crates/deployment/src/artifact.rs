//! Compiled contract artifacts.
//!
//! Both Hardhat (`"bytecode": "0x…"`) and Foundry (`"bytecode": { "object": "0x…" }`)
//! artifact layouts are understood.

use alloy_primitives::Bytes;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("no artifact for `{name}` under {root}")]
    NotFound { name: String, root: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Interfaces and abstract contracts compile to empty bytecode
    #[error("artifact for `{0}` has no creation bytecode")]
    EmptyBytecode(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Debug, Deserialize)]
struct Artifact {
    bytecode: Bytecode,
}

/// Parse the creation bytecode out of an artifact document.
pub fn parse_bytecode(json: &str) -> Result<Bytes, serde_json::Error> {
    let artifact: Artifact = serde_json::from_str(json)?;
    Ok(match artifact.bytecode {
        Bytecode::Hex(code) | Bytecode::Object { object: code } => code,
    })
}

/// Artifact directory of a compiled project.
#[derive(Debug, Clone)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate `<Name>.json` directly under the root or in any directory below it.
    ///
    /// Directories are searched in name order; `build-info` is never searched.
    pub fn find(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        find_in(&self.root, &file_name)?.ok_or_else(|| ArtifactError::NotFound {
            name: name.to_string(),
            root: self.root.clone(),
        })
    }

    /// Creation bytecode of contract `name`.
    pub fn bytecode(&self, name: &str) -> Result<Bytes, ArtifactError> {
        let path = self.find(name)?;
        let contents = fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        let code = parse_bytecode(&contents)
            .map_err(|source| ArtifactError::Malformed { path, source })?;

        if code.is_empty() {
            return Err(ArtifactError::EmptyBytecode(name.to_string()));
        }
        Ok(code)
    }
}

fn find_in(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, ArtifactError> {
    let candidate = dir.join(file_name);
    if candidate.is_file() {
        return Ok(Some(candidate));
    }
    if !dir.is_dir() {
        return Ok(None);
    }

    let io_err = |source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut subdirs = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    subdirs.retain(|path| path.is_dir() && !path.ends_with("build-info"));
    subdirs.sort();

    for subdir in subdirs {
        if let Some(found) = find_in(&subdir, file_name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hardhat_artifact() {
        let code = parse_bytecode(r#"{"contractName":"A","bytecode":"0x6080","abi":[]}"#).unwrap();
        assert_eq!(code, Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn test_parse_foundry_artifact() {
        let code =
            parse_bytecode(r#"{"bytecode":{"object":"0x6080","linkReferences":{}}}"#).unwrap();
        assert_eq!(code, Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn test_parse_missing_bytecode() {
        assert!(parse_bytecode(r#"{"abi":[]}"#).is_err());
    }

    #[test]
    fn test_find_nested_artifact() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("contracts/RealitioHomeProxyLZ.sol");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("RealitioHomeProxyLZ.json"), r#"{"bytecode":"0x00"}"#).unwrap();

        let artifacts = Artifacts::new(root.path());
        assert_eq!(
            artifacts.find("RealitioHomeProxyLZ").unwrap(),
            nested.join("RealitioHomeProxyLZ.json")
        );
        assert_eq!(
            artifacts.bytecode("RealitioHomeProxyLZ").unwrap(),
            Bytes::from(vec![0x00])
        );
        assert!(matches!(
            artifacts.find("RealitioForeignProxyLZ"),
            Err(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("IProxy.json"), r#"{"bytecode":"0x"}"#).unwrap();

        assert!(matches!(
            Artifacts::new(root.path()).bytecode("IProxy"),
            Err(ArtifactError::EmptyBytecode(name)) if name == "IProxy"
        ));
    }
}
