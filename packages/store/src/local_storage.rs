//! # Browser `localStorage` token store
//!
//! [`LocalStorageStore`] is the [`TokenStore`] used on the **web platform**. It
//! reads and writes a single string item (default key `"auth_token"`) in the
//! window's `localStorage`.
//!
//! Storage can be unavailable (private browsing, sandboxed iframes, no window in
//! a worker). In that case reads return `None` and writes are logged and
//! dropped, which leaves the user signed out on the next load.

use web_sys::Storage;

use crate::token::{TokenStore, TOKEN_KEY};

/// `localStorage`-backed TokenStore for the web platform.
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
    key: String,
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorageStore {
    pub fn new() -> Self {
        Self::with_key(TOKEN_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl TokenStore for LocalStorageStore {
    fn load(&self) -> Option<String> {
        Self::storage()?.get_item(&self.key).ok().flatten()
    }

    fn save(&self, token: &str) {
        let Some(storage) = Self::storage() else {
            tracing::warn!(key = %self.key, "localStorage unavailable, token not persisted");
            return;
        };
        if storage.set_item(&self.key, token).is_err() {
            tracing::warn!(key = %self.key, "Failed to write token to localStorage");
        }
    }

    fn clear(&self) {
        if let Some(storage) = Self::storage() {
            if storage.remove_item(&self.key).is_err() {
                tracing::warn!(key = %self.key, "Failed to remove token from localStorage");
            }
        }
    }
}
