//! Session context: the bearer token and the logged-in profile.
//!
//! The token is persisted through a [`CredentialStore`] under a fixed name
//! and is only read on an explicit [`Session::init`].

use crate::models::UserProfile;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Fixed key the bearer token is stored under
pub const TOKEN_KEY: &str = "wisekey_token";

/// Persistence for a single bearer token
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Stores the token in `<dir>/wisekey_token`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// Process-local store, used in tests and for one-off sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "token store lock poisoned")
}

/// Token and profile for the current operator.
///
/// Store failures are logged and otherwise ignored; the in-memory token
/// stays authoritative for the running process.
pub struct Session {
    store: Box<dyn CredentialStore>,
    token: Option<String>,
    user: Option<UserProfile>,
    started_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(store: impl CredentialStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            token: None,
            user: None,
            started_at: None,
        }
    }

    /// Read the persisted token. Returns whether one was found.
    pub fn init(&mut self) -> bool {
        match self.store.load() {
            Ok(Some(token)) => {
                debug!("Restored saved token");
                self.token = Some(token);
                self.started_at = Some(Utc::now());
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("Could not read saved token: {}", err);
                false
            }
        }
    }

    /// Adopt a freshly issued token and persist it
    pub fn establish(&mut self, token: String) {
        if let Err(err) = self.store.save(&token) {
            warn!("Could not persist token: {}", err);
        }
        self.token = Some(token);
        self.user = None;
        self.started_at = Some(Utc::now());
    }

    pub fn set_user(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    /// Forget the token (in memory and in the store) and the profile
    pub fn logout(&mut self) {
        if let Err(err) = self.store.clear() {
            warn!("Could not clear saved token: {}", err);
        }
        self.token = None;
        self.user = None;
        self.started_at = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}
