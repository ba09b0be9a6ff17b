//! Session token storage.
//!
//! Stores the bearer token and the detected backend variant in
//! `<base>/session.json` with restricted permissions (0600).
//! Every mutation is written through to storage before returning.
//! Tokens are never logged.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::paths;
use crate::error::StoreError;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key holding the backend variant tag.
pub const VARIANT_KEY: &str = "backend_type";

/// Backend response-shape convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendVariant {
    /// `{message}` on register, `{token}` on login, todo endpoints, no `/api/me`.
    #[serde(rename = "worker_a")]
    A,
    /// `{token, user}` on register and login, `/api/me`, no todo endpoints.
    #[serde(rename = "worker_b")]
    B,
}

impl BackendVariant {
    /// Tag written to storage.
    pub fn tag(self) -> &'static str {
        match self {
            BackendVariant::A => "worker_a",
            BackendVariant::B => "worker_b",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BackendVariant::A => "Worker A",
            BackendVariant::B => "Worker B",
        }
    }

    pub fn supports_todos(self) -> bool {
        matches!(self, BackendVariant::A)
    }

    pub fn supports_profile(self) -> bool {
        matches!(self, BackendVariant::B)
    }
}

impl fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker_a" | "a" => Ok(BackendVariant::A),
            "worker_b" | "b" => Ok(BackendVariant::B),
            other => Err(format!(
                "Unknown backend '{other}' (expected worker_a or worker_b)"
            )),
        }
    }
}

/// How the backend variant in use was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// Detected from an earlier response and persisted. Sticky until reset.
    Stored(BackendVariant),
    /// Guessed from config or the base URL; never persisted.
    Assumed(BackendVariant),
}

impl Negotiated {
    pub fn variant(self) -> BackendVariant {
        match self {
            Negotiated::Stored(v) | Negotiated::Assumed(v) => v,
        }
    }

    pub fn is_detected(self) -> bool {
        matches!(self, Negotiated::Stored(_))
    }
}

/// Snapshot of the client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub variant: Negotiated,
}

impl Session {
    /// Reads the session from a store, assuming `fallback` if no variant was detected yet.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn load(store: &dyn TokenStore, fallback: BackendVariant) -> Result<Self, StoreError> {
        let variant = match store.get_variant()? {
            Some(stored) => Negotiated::Stored(stored),
            None => Negotiated::Assumed(fallback),
        };
        Ok(Self {
            token: store.get()?,
            variant,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Persistent key-value storage for the session.
///
/// Implementations must write every mutation through to their backing storage.
pub trait TokenStore: Send + Sync {
    /// Returns the stored bearer token.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Stores a bearer token, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Removes the bearer token. The backend variant is kept.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    fn clear(&self) -> Result<(), StoreError>;

    /// Returns the detected backend variant.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    fn get_variant(&self) -> Result<Option<BackendVariant>, StoreError>;

    /// Stores the detected backend variant.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    fn set_variant(&self, variant: BackendVariant) -> Result<(), StoreError>;

    /// Wipes token and variant.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    fn reset(&self) -> Result<(), StoreError>;
}

/// On-disk layout of the session file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "auth_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "backend_type", default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<BackendVariant>,
}

/// Session stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the todo-hive home.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record. Returns an empty record if the file doesn't exist.
    fn load(&self) -> Result<SessionRecord, StoreError> {
        if !self.path.exists() {
            return Ok(SessionRecord::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(SessionRecord::default());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Saves the record with restricted permissions (0600).
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(record).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut SessionRecord)) -> Result<(), StoreError> {
        let mut record = self.load()?;
        f(&mut record);
        self.save(&record)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.token)
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        self.update(|record| record.token = Some(token.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|record| record.token = None)
    }

    fn get_variant(&self) -> Result<Option<BackendVariant>, StoreError> {
        Ok(self.load()?.variant)
    }

    fn set_variant(&self, variant: BackendVariant) -> Result<(), StoreError> {
        self.update(|record| record.variant = Some(variant))
    }

    fn reset(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Session kept in a shared in-memory record.
///
/// Clones share the same record, so a clone handed to a client observes
/// every write made through another clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    record: Arc<Mutex<SessionRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    pub fn snapshot(&self) -> SessionRecord {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with<T>(&self, f: impl FnOnce(&mut SessionRecord) -> T) -> T {
        let mut guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.with(|record| record.token.clone()))
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        self.with(|record| record.token = Some(token.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.with(|record| record.token = None);
        Ok(())
    }

    fn get_variant(&self) -> Result<Option<BackendVariant>, StoreError> {
        Ok(self.with(|record| record.variant))
    }

    fn set_variant(&self, variant: BackendVariant) -> Result<(), StoreError> {
        self.with(|record| record.variant = Some(variant));
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.with(|record| *record = SessionRecord::default());
        Ok(())
    }
}

/// Masks a token for display, keeping only a short prefix.
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    format!("{prefix}...")
}
