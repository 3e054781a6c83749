use crate::error::ClientError;
use crate::models::identity::Identity;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

const TOKEN_FILE: &str = "access_token";
const AUTH_FILE: &str = "auth_state.json";

/// Auth record that survives a reload. Its presence is advisory: the first
/// failing authenticated call still evicts it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    pub identity: Option<Identity>,
    pub is_authenticated: bool,
}

/// Persistent client-side state: a single credential slot and the serialized
/// auth record, keyed separately.
///
/// Token writes are restricted to the login-success path; deletion to
/// logout and pipeline eviction. Everything else reads.
pub trait StateStore: Debug + Send + Sync {
    /// Last stored credential, if any. Absence is not an error.
    fn load_token(&self) -> Option<String>;
    fn store_token(&self, token: &str) -> Result<(), ClientError>;
    fn clear_token(&self) -> Result<(), ClientError>;

    fn load_auth(&self) -> Option<PersistedAuth>;
    fn store_auth(&self, auth: &PersistedAuth) -> Result<(), ClientError>;
    fn clear_auth(&self) -> Result<(), ClientError>;
}

/// Volatile store for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    token: Mutex<Option<String>>,
    auth: Mutex<Option<PersistedAuth>>,
}

impl StateStore for InMemoryStateStore {
    fn load_token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    fn store_token(&self, token: &str) -> Result<(), ClientError> {
        *lock(&self.token) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ClientError> {
        *lock(&self.token) = None;
        Ok(())
    }

    fn load_auth(&self) -> Option<PersistedAuth> {
        lock(&self.auth).clone()
    }

    fn store_auth(&self, auth: &PersistedAuth) -> Result<(), ClientError> {
        *lock(&self.auth) = Some(auth.clone());
        Ok(())
    }

    fn clear_auth(&self) -> Result<(), ClientError> {
        *lock(&self.auth) = None;
        Ok(())
    }
}

/// On-disk store, the browser-storage analog for a desktop shell.
#[derive(Debug)]
pub struct FileStateStore {
    directory: PathBuf,
}

impl FileStateStore {
    pub fn new(directory: PathBuf) -> Result<FileStateStore, ClientError> {
        fs::create_dir_all(&directory)?;
        Ok(FileStateStore { directory })
    }

    /// Store under the platform-local data directory.
    pub fn in_default_location() -> Result<FileStateStore, ClientError> {
        let base = dirs::data_local_dir().ok_or(ClientError::InvalidConfiguration)?;
        Self::new(base.join("tandem"))
    }

    fn path(&self, file: &str) -> PathBuf {
        self.directory.join(file)
    }

    fn remove(&self, file: &str) -> Result<(), ClientError> {
        match fs::remove_file(self.path(file)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

impl StateStore for FileStateStore {
    fn load_token(&self) -> Option<String> {
        let token = fs::read_to_string(self.path(TOKEN_FILE)).ok()?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }

    fn store_token(&self, token: &str) -> Result<(), ClientError> {
        fs::write(self.path(TOKEN_FILE), token)?;
        Ok(())
    }

    fn clear_token(&self) -> Result<(), ClientError> {
        self.remove(TOKEN_FILE)
    }

    fn load_auth(&self) -> Option<PersistedAuth> {
        let payload = fs::read_to_string(self.path(AUTH_FILE)).ok()?;
        match serde_json::from_str(&payload) {
            Ok(auth) => Some(auth),
            Err(error) => {
                warn!("discarding unreadable persisted auth state: {error}");
                None
            }
        }
    }

    fn store_auth(&self, auth: &PersistedAuth) -> Result<(), ClientError> {
        let payload = serde_json::to_string(auth)?;
        fs::write(self.path(AUTH_FILE), payload)?;
        Ok(())
    }

    fn clear_auth(&self) -> Result<(), ClientError> {
        self.remove(AUTH_FILE)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|error| error.into_inner())
}
