//! Application-level configuration loading: token secret and store location.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BIGBRAIN_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured token secret.
const TOKEN_SECRET_ENV: &str = "BIGBRAIN_TOKEN_SECRET";
/// Environment variable that overrides the configured store path.
const STORE_PATH_ENV: &str = "BIGBRAIN_STORE_PATH";
/// Baked-in signing secret for development setups without a config file.
const DEFAULT_TOKEN_SECRET: &str = "bigbrain-dev-secret";
/// Default location of the durable entity store.
const DEFAULT_STORE_PATH: &str = "data/database.json";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    token_secret: String,
    store_path: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, applying environment
    /// overrides and falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(secret) = non_empty_env(TOKEN_SECRET_ENV) {
            config.token_secret = secret;
        }
        if let Some(store_path) = non_empty_env(STORE_PATH_ENV) {
            config.store_path = PathBuf::from(store_path);
        }

        if config.token_secret == DEFAULT_TOKEN_SECRET {
            warn!("using the built-in development token secret; issued tokens are forgeable");
        }

        config
    }

    /// Secret used to sign and verify admin bearer tokens.
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    /// Location of the durable entity store file.
    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token_secret: DEFAULT_TOKEN_SECRET.into(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    token_secret: Option<String>,
    store_path: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            token_secret: value.token_secret.unwrap_or(defaults.token_secret),
            store_path: value.store_path.unwrap_or(defaults.store_path),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read an environment variable, treating empty values as unset.
fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
