//! Shared session constructor for all platforms.
//!
//! Picks the appropriate [`store::TokenStore`] for the target:
//! - **Web** (WASM + `web` feature): browser `localStorage` via [`store::LocalStorageStore`]
//! - **Desktop** (native): a token file via [`store::FileStore`]
//! - **WASM without `web`**: in-memory only, nothing survives a reload

use api::{ApiClient, Settings};
use store::TokenStore;

use crate::auth::AuthSession;

/// Create the platform-appropriate token store described by `settings`.
pub fn make_token_store(settings: &Settings) -> impl TokenStore {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        store::LocalStorageStore::with_key(settings.storage.token_key.clone())
    }
    #[cfg(all(target_arch = "wasm32", not(feature = "web")))]
    {
        let _ = settings;
        store::MemoryStore::new()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let base = settings
            .storage
            .data_dir
            .clone()
            .unwrap_or_else(store::FileStore::default_dir);
        store::FileStore::with_key(base, settings.storage.token_key.clone())
    }
}

/// Build the gateway client and restore the session persisted on this device.
pub fn connect(settings: &Settings) -> AuthSession<impl TokenStore> {
    tracing::debug!(base_url = %settings.base_url(), "Connecting to backend");
    AuthSession::restore(ApiClient::from_settings(settings, make_token_store(settings)))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use api::testing::fake_jwt;

    fn settings_in(dir: &std::path::Path) -> Settings {
        Settings::from_toml_str(&format!(
            "[api]\nbase_url = \"http://books.test/api\"\n[storage]\ndata_dir = {:?}\n",
            dir.display().to_string()
        ))
        .unwrap()
    }

    #[test]
    fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        let token = fake_jwt("dora", 3, 0);
        make_token_store(&settings).save(&token);
        assert!(dir.path().join("auth_token").exists());

        let session = connect(&settings);
        assert!(session.is_authenticated());
        assert_eq!(session.client().store().load(), Some(token));
        assert_eq!(session.user().unwrap().username, "dora");
        assert_eq!(session.client().base_url(), "http://books.test/api");
    }

    #[test]
    fn test_corrupt_token_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        std::fs::write(dir.path().join("auth_token"), "garbage").unwrap();

        let session = connect(&settings);
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("auth_token").exists());
    }
}
