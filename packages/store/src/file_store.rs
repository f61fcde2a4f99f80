//! # Filesystem-backed token store
//!
//! [`FileStore`] keeps the auth token in a plain file on desktop platforms so a
//! session survives restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! └── auth_token        # the raw token string
//! ```
//!
//! ## Platform data directories
//!
//! [`FileStore::default_dir`] resolves to `<data_dir>/blueberrybooks`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/blueberrybooks/` |
//! | Linux | `~/.local/share/blueberrybooks/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\blueberrybooks\` |

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::token::{TokenStore, TOKEN_KEY};

/// Filesystem-backed TokenStore for desktop persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
    key: String,
}

impl FileStore {
    /// Store the token under `base` using the default [`TOKEN_KEY`] filename.
    pub fn new(base: PathBuf) -> Self {
        Self::with_key(base, TOKEN_KEY)
    }

    /// Store the token under `base` in a file named `key`.
    pub fn with_key(base: PathBuf, key: impl Into<String>) -> Self {
        Self {
            base,
            key: key.into(),
        }
    }

    /// Platform data directory for the application, falling back to the
    /// current directory when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blueberrybooks")
    }

    /// Path of the file holding the token.
    pub fn path(&self) -> PathBuf {
        self.base.join(&self.key)
    }
}

impl TokenStore for FileStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(self.path()) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "Failed to read token file");
                None
            }
        }
    }

    fn save(&self, token: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.base) {
            tracing::warn!(path = %self.base.display(), error = %e, "Failed to create token directory");
            return;
        }
        if let Err(e) = std::fs::write(self.path(), token) {
            tracing::warn!(path = %self.path().display(), error = %e, "Failed to write token file");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(self.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "Failed to remove token file");
            }
        }
    }
}
