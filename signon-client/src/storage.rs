//! Durable key-value storage for session artifacts.
//!
//! The controller only needs keyed `get`/`set`, so the port stays that small.
//! [`MemoryStore`] backs tests and embedders; [`FileStore`] keeps a JSON
//! document on disk readable only by its owner.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use shared::models::{Session, SessionUser};
use thiserror::Error;
use tracing::debug;

/// Key holding the raw session token.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Key holding the JSON-serialized user record.
pub const USER_KEY: &str = "user";

/// Errors raised by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read.
    #[error("failed to read session store {path}: {source}")]
    Read {
        /// Store location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The backing file could not be written.
    #[error("failed to write session store {path}: {source}")]
    Write {
        /// Store location.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("session store {path} is corrupt: {source}")]
    Corrupt {
        /// Store location.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The stored user record could not be encoded or decoded.
    #[error("stored user record is invalid: {0}")]
    InvalidUser(#[source] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Keyed string storage that survives the login flow.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Write session artifacts: the user always, then the token when present.
///
/// A failed user write leaves no token behind.
///
/// # Errors
/// Propagates the first storage failure.
pub fn persist_session(store: &dyn SessionStore, session: &Session) -> Result<(), StorageError> {
    let user = serde_json::to_string(&session.user).map_err(StorageError::InvalidUser)?;
    store.set(USER_KEY, &user)?;
    if let Some(token) = &session.token {
        store.set(AUTH_TOKEN_KEY, token)?;
    }
    Ok(())
}

/// Read back whatever session artifacts are stored.
///
/// Returns `None` when no user has been stored yet.
///
/// # Errors
/// Returns an error if the store cannot be read or the user record does not
/// decode.
pub fn load_session(store: &dyn SessionStore) -> Result<Option<Session>, StorageError> {
    let Some(raw_user) = store.get(USER_KEY)? else {
        return Ok(None);
    };
    let user: SessionUser = serde_json::from_str(&raw_user).map_err(StorageError::InvalidUser)?;
    let token = store.get(AUTH_TOKEN_KEY)?;
    Ok(Some(Session { token, user }))
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a JSON object in a single file.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) the store at `path`. Nothing touches the disk until the
    /// first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let serialized = serde_json::to_vec_pretty(entries).map_err(|err| write_err(err.into()))?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, serialized).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        fs::rename(&temp_path, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), entries = entries.len(), "session store written");
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }
}
