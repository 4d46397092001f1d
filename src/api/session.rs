//! Admin credentials and their persistence.
//!
//! The [`Session`] is handed to the API client explicitly; nothing here is
//! global. A [`CredentialStore`] keeps the credential pair across runs.

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>>;
    fn save(&self, credentials: &Credentials) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores credentials as JSON in a single file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Write next to the target and rename, so a crash never leaves half a file.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(credentials)?.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// Credentials stay usable even if a holder of the lock panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    stored: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        Ok(lock(&self.stored).clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        *lock(&self.stored) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.stored) = None;
        Ok(())
    }
}

/// Current admin credentials plus the store that persists them.
pub struct Session {
    credentials: Mutex<Option<Credentials>>,
    store: Box<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            credentials: Mutex::new(None),
            store,
        }
    }

    /// Start a session from whatever the store remembers.
    pub fn restore(store: Box<dyn CredentialStore>) -> Result<Self> {
        let remembered = store.load()?;
        if remembered.is_some() {
            tracing::debug!("Restored saved credentials");
        }
        Ok(Self {
            credentials: Mutex::new(remembered),
            store,
        })
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCredentialStore::new()))
    }

    pub fn login(&self, credentials: Credentials) -> Result<()> {
        self.store.save(&credentials)?;
        *lock(&self.credentials) = Some(credentials);
        Ok(())
    }

    /// Forget the credentials, in memory and in the store.
    pub fn logout(&self) -> Result<()> {
        *lock(&self.credentials) = None;
        self.store.clear()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        lock(&self.credentials).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.credentials).is_some()
    }
}
