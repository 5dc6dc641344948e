//! Persisted bearer-token storage.
//!
//! The browser dashboard keeps its token in local storage under a single
//! fixed key; access is synchronous and the token is read on every outgoing
//! request. `TokenStore` mirrors that contract: synchronous load/save/clear
//! of at most one token.

use std::path::PathBuf;
use std::sync::RwLock;

/// Synchronous single-token storage.
pub trait TokenStore: Send + Sync {
    /// Currently persisted token, if any.
    fn load(&self) -> Option<String>;

    /// Persist a token, replacing any previous one.
    fn save(&self, token: &str);

    /// Remove the persisted token.
    fn clear(&self);
}

/// In-memory token store, used by tests and as the default.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    fn save(&self, token: &str) {
        *self.token.write().unwrap() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap() = None;
    }
}

/// Token store backed by a single file on disk.
///
/// Persistence failures are logged and swallowed: losing the token only
/// costs the user a re-login, the same behavior as cleared browser storage.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    fn save(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(err) = std::fs::write(&self.path, token) {
            tracing::warn!(path = %self.path.display(), %err, "failed to persist token");
        }
    }

    fn clear(&self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %err, "failed to clear token");
            }
        }
    }
}
