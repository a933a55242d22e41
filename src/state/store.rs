use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An object the [`StateStore`] can persist per workspace.
pub trait Persistent: Serialize + DeserializeOwned {
    /// Logical name; combined with the workspace hash to form the file name.
    const STATE_KEY: &'static str;
    /// Bumped whenever the serialized shape changes. Snapshots with another
    /// version are discarded on load.
    const VERSION: u32;

    /// Post-load check. A snapshot that fails it is treated as absent.
    fn validate(&self) -> bool {
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why [`StateStore::try_load`] found no usable state.
#[derive(Debug)]
pub enum LoadMiss {
    /// Nothing has been saved for this workspace.
    Missing,
    /// The file exists but could not be read.
    Unreadable(io::Error),
    /// The file is not a state envelope of the expected shape.
    Corrupt(serde_json::Error),
    /// The snapshot was written by an incompatible version.
    VersionMismatch { found: u32, expected: u32 },
    /// The snapshot loaded but its validity check failed.
    Invalid,
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    version: u32,
    state: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u32,
    state: serde_json::Value,
}

/// Stores one versioned snapshot per (workspace, state key) in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    dir: PathBuf,
}

/// Stable identifier for a workspace root: hex SHA-256 of its path.
pub fn workspace_hash(workspace_root: &Path) -> String {
    let digest = Sha256::digest(workspace_root.to_string_lossy().as_bytes());
    format!("{digest:x}")
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the snapshot for `T` in `workspace_root`.
    pub fn path_for<T: Persistent>(&self, workspace_root: &Path) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            T::STATE_KEY,
            workspace_hash(workspace_root)
        ))
    }

    pub fn exists<T: Persistent>(&self, workspace_root: &Path) -> bool {
        self.path_for::<T>(workspace_root).exists()
    }

    /// Persist `value`, replacing any previous snapshot atomically.
    pub fn save<T: Persistent>(&self, workspace_root: &Path, value: &T) -> Result<(), StateError> {
        let path = self.path_for::<T>(workspace_root);
        let io_err = |source: io::Error| StateError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let json = serde_json::to_vec(&EnvelopeOut {
            version: T::VERSION,
            state: value,
        })?;

        let mut file = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Load the snapshot for `T`, reporting why none is usable.
    pub fn try_load<T: Persistent>(&self, workspace_root: &Path) -> Result<T, LoadMiss> {
        let path = self.path_for::<T>(workspace_root);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadMiss::Missing),
            Err(e) => return Err(LoadMiss::Unreadable(e)),
        };

        let envelope: EnvelopeIn = serde_json::from_slice(&bytes).map_err(LoadMiss::Corrupt)?;
        if envelope.version != T::VERSION {
            return Err(LoadMiss::VersionMismatch {
                found: envelope.version,
                expected: T::VERSION,
            });
        }

        let value: T = serde_json::from_value(envelope.state).map_err(LoadMiss::Corrupt)?;
        if !value.validate() {
            return Err(LoadMiss::Invalid);
        }
        Ok(value)
    }

    /// Load the snapshot for `T`, treating every failure as "no state".
    pub fn load<T: Persistent>(&self, workspace_root: &Path) -> Option<T> {
        self.load_where(workspace_root, |_: &T| true)
    }

    /// Like [`load`](Self::load), with an extra validity check that needs
    /// context the snapshot itself does not carry.
    pub fn load_where<T: Persistent>(
        &self,
        workspace_root: &Path,
        check: impl FnOnce(&T) -> bool,
    ) -> Option<T> {
        let loaded = self
            .try_load::<T>(workspace_root)
            .and_then(|value| if check(&value) { Ok(value) } else { Err(LoadMiss::Invalid) });

        match loaded {
            Ok(value) => Some(value),
            Err(LoadMiss::Missing) => None,
            Err(miss) => {
                tracing::debug!(
                    key = T::STATE_KEY,
                    workspace = %workspace_root.display(),
                    reason = ?miss,
                    "discarding persisted state"
                );
                None
            }
        }
    }

    /// Remove the snapshot for `T`. Returns whether one existed.
    pub fn delete<T: Persistent>(&self, workspace_root: &Path) -> Result<bool, StateError> {
        let path = self.path_for::<T>(workspace_root);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StateError::Io { path, source }),
        }
    }
}
