use std::path::PathBuf;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Root of the REST API; endpoint paths are appended to it.
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory for the native token file. Platform data dir when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    pub token_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            token_key: store::TOKEN_KEY.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
}

impl Settings {
    /// Load settings from defaults, an optional `blueberry.toml` in the working
    /// directory, and `BLUEBERRY_`-prefixed environment variables
    /// (`BLUEBERRY_API__BASE_URL`, `BLUEBERRY_STORAGE__DATA_DIR`, ...).
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::defaults()?
            .add_source(
                File::with_name("blueberry")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("BLUEBERRY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document over the defaults. Environment is not consulted.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("storage.token_key", store::TOKEN_KEY)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::{remove_var, set_var};

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.base_url(), "http://localhost:8000/api");
        assert_eq!(settings.storage.token_key, "auth_token");
        assert!(settings.storage.data_dir.is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let settings = Settings::from_toml_str(
            r#"
            [api]
            base_url = "https://books.example.com/api/"

            [storage]
            data_dir = "/tmp/blueberry"
            "#,
        )
        .unwrap();
        assert_eq!(settings.base_url(), "https://books.example.com/api");
        assert_eq!(settings.storage.data_dir, Some(PathBuf::from("/tmp/blueberry")));
        assert_eq!(settings.storage.token_key, "auth_token");
    }

    #[test]
    fn test_env_overrides() {
        set_var("BLUEBERRY_API__BASE_URL", "http://10.0.0.2:9000/api");
        set_var("BLUEBERRY_STORAGE__TOKEN_KEY", "session_token");
        let settings = Settings::new();
        remove_var("BLUEBERRY_API__BASE_URL");
        remove_var("BLUEBERRY_STORAGE__TOKEN_KEY");

        let settings = settings.unwrap();
        assert_eq!(settings.base_url(), "http://10.0.0.2:9000/api");
        assert_eq!(settings.storage.token_key, "session_token");
        assert!(std::env::var("BLUEBERRY_API__BASE_URL").is_err());
    }
}
