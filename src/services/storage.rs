//! # Local storage with explicit lease counting.
//!
//! Plugins keep their on-disk state under `<root>/<id>/<version>/`. Each
//! directory is handed out as a [`StorageLease`]:
//!
//! ```text
//! acquire(id, v) ─► refs += 1 ─► StorageLease
//! release(lease) ─► refs -= 1 ─┐
//! retire(id, v)  ─► retired    ├─► refs == 0 && retired ─► remove dir
//!                              ┘
//! ```
//!
//! Nothing is released on drop: a lease that is never passed back to
//! [`StorageService::release`] keeps its directory alive.
//!
//! Directory creation and removal happen under the slot lock, so a lease
//! handed out by `acquire` always points at an existing directory.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::StorageError;

/// Storage collaborator handed to plugins.
pub trait StorageService: Send + Sync {
    /// Root directory all leases live under.
    fn root(&self) -> &Path;

    /// Takes a reference on `<root>/<id>/<version>`, creating it if needed.
    fn acquire(&self, id: &str, version: &str) -> Result<StorageLease, StorageError>;

    /// Drops a reference taken by [`acquire`](StorageService::acquire).
    fn release(&self, lease: StorageLease) -> Result<(), StorageError>;

    /// Marks a version for deletion once its last reference is released.
    fn retire(&self, id: &str, version: &str) -> Result<(), StorageError>;
}

/// One counted reference to a storage directory.
#[derive(Debug)]
#[must_use = "a lease must be released to let a retired version go"]
pub struct StorageLease {
    id: String,
    version: String,
    path: PathBuf,
}

impl StorageLease {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory owned by this `(id, version)`.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Default)]
struct Slot {
    refs: usize,
    retired: bool,
}

/// Filesystem-backed [`StorageService`].
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
    slots: Mutex<HashMap<(String, String), Slot>>,
}

impl LocalStorage {
    /// Storage rooted at `root`. The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Current reference count of `(id, version)`.
    pub fn refs(&self, id: &str, version: &str) -> usize {
        self.lock()
            .get(&(id.to_string(), version.to_string()))
            .map_or(0, |s| s.refs)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dir(&self, id: &str, version: &str) -> Result<PathBuf, StorageError> {
        validate(id)?;
        validate(version)?;
        Ok(self.root.join(id).join(version))
    }

    fn remove_dir(path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "storage version removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl StorageService for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn acquire(&self, id: &str, version: &str) -> Result<StorageLease, StorageError> {
        let path = self.dir(id, version)?;

        let mut slots = self.lock();
        std::fs::create_dir_all(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let slot = slots
            .entry((id.to_string(), version.to_string()))
            .or_default();
        slot.refs += 1;
        // A fresh acquire revives a retired version.
        slot.retired = false;

        Ok(StorageLease {
            id: id.to_string(),
            version: version.to_string(),
            path,
        })
    }

    fn release(&self, lease: StorageLease) -> Result<(), StorageError> {
        let key = (lease.id, lease.version);
        let unknown = |key: (String, String)| StorageError::UnknownLease {
            id: key.0,
            version: key.1,
        };
        if !lease.path.starts_with(&self.root) {
            return Err(unknown(key));
        }

        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&key).filter(|s| s.refs > 0) else {
            return Err(unknown(key));
        };
        slot.refs -= 1;
        if slot.refs == 0 && slot.retired {
            slots.remove(&key);
            Self::remove_dir(&lease.path)?;
        }
        Ok(())
    }

    fn retire(&self, id: &str, version: &str) -> Result<(), StorageError> {
        let path = self.dir(id, version)?;
        let key = (id.to_string(), version.to_string());

        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.retired = true;
        if slot.refs == 0 {
            slots.remove(&key);
            Self::remove_dir(&path)?;
        }
        Ok(())
    }
}

fn validate(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
