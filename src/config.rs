//! Configuration loading and persistence.
//!
//! Reads `config.json` from the config directory and layers environment
//! variables on top. The VAPID public key is the only setting the workflow
//! itself needs; the rest selects and addresses the backend.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants;
use crate::platform::ConfigReader;
use crate::vapid;

/// Configuration for pushsub.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Server public key (VAPID, base64url, no padding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapid_public_key: Option<String>,
    /// Backend base URL (e.g. `https://<project>.supabase.co`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    /// Backend API key (Supabase anon key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_key: Option<String>,
    /// Table receiving the subscription rows.
    #[serde(default = "default_table")]
    pub table: String,
    /// Push service base URL for locally minted endpoints.
    #[serde(default = "default_push_service_url")]
    pub push_service_url: String,
}

fn default_table() -> String {
    constants::DEFAULT_TABLE.to_string()
}

fn default_push_service_url() -> String {
    constants::DEFAULT_PUSH_SERVICE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vapid_public_key: None,
            backend_url: None,
            backend_key: None,
            table: default_table(),
            push_service_url: default_push_service_url(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `#[cfg(test)]` (unit tests): `$TMPDIR/pushsub-test`
    /// 2. `PUSHSUB_CONFIG_DIR` env var: explicit override
    /// 3. Default: platform config dir (macOS: ~/Library/Application Support/pushsub)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                std::env::temp_dir().join("pushsub-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(dir) = std::env::var(constants::CONFIG_DIR_ENV) {
                    PathBuf::from(dir)
                } else {
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("pushsub")
                }
            }
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Path of `config.json`.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(constants::CONFIG_FILE))
    }

    /// Path of the `FileStore` table.
    pub fn subscriptions_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(constants::SUBSCRIPTIONS_FILE))
    }

    /// Loads configuration from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_else(|e| {
                log::debug!("Using default config: {e:#}");
                Self::default()
            });
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads the file at `path` without env overrides. A missing file yields
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Stores `key` as the server key in the file at `path`, keeping the
    /// other settings there.
    ///
    /// Rejects keys `subscribe` could not send as an `applicationServerKey`.
    pub fn set_vapid_public_key(path: &Path, key: &str) -> Result<Self> {
        let key = key.trim();
        vapid::decode_public_key(key)?;

        let mut config = Self::load_from(path)?;
        config.vapid_public_key = Some(key.to_string());
        config.save_to(path)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `var`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var(constants::VAPID_PUBLIC_KEY_ENV)
            .or_else(|| var(constants::VITE_VAPID_PUBLIC_KEY_ENV))
        {
            self.vapid_public_key = Some(key);
        }

        if let Some(url) = var(constants::BACKEND_URL_ENV) {
            self.backend_url = Some(url);
        }

        if let Some(key) = var(constants::BACKEND_KEY_ENV) {
            self.backend_key = Some(key);
        }

        if let Some(table) = var(constants::TABLE_ENV).filter(|t| !t.is_empty()) {
            self.table = table;
        }

        if let Some(url) = var(constants::PUSH_SERVICE_URL_ENV).filter(|u| !u.is_empty()) {
            self.push_service_url = url;
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }
}

impl ConfigReader for Config {
    fn vapid_public_key(&self) -> Option<String> {
        self.vapid_public_key.clone().filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.table, "push_subscriptions");
        assert_eq!(config.push_service_url, "https://push.example");
        assert!(config.vapid_public_key().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("PUSHSUB_VAPID_PUBLIC_KEY", "BBBB"),
            ("PUSHSUB_BACKEND_URL", "https://abc.supabase.co"),
            ("PUSHSUB_BACKEND_KEY", "anon"),
            ("PUSHSUB_TABLE", "subs"),
        ]));

        assert_eq!(config.vapid_public_key().as_deref(), Some("BBBB"));
        assert_eq!(config.backend_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.backend_key.as_deref(), Some("anon"));
        assert_eq!(config.table, "subs");
    }

    #[test]
    fn test_vite_key_is_fallback_only() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("VITE_VAPID_PUBLIC_KEY", "vite")]));
        assert_eq!(config.vapid_public_key().as_deref(), Some("vite"));

        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("VITE_VAPID_PUBLIC_KEY", "vite"),
            ("PUSHSUB_VAPID_PUBLIC_KEY", "native"),
        ]));
        assert_eq!(config.vapid_public_key().as_deref(), Some("native"));
    }

    #[test]
    fn test_empty_key_reads_as_absent() {
        let config = Config {
            vapid_public_key: Some(String::new()),
            ..Config::default()
        };
        assert!(config.vapid_public_key().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"vapid_public_key":"BBBB"}"#).expect("parse");
        assert_eq!(config.vapid_public_key.as_deref(), Some("BBBB"));
        assert_eq!(config.table, "push_subscriptions");
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.json")).expect("load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_key_keeps_other_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"table":"subs"}"#).expect("seed");
        let key = vapid::VapidKeyPair::generate().public_key().to_string();

        let saved = Config::set_vapid_public_key(&path, &format!("  {key}\n")).expect("set key");
        assert_eq!(saved.vapid_public_key.as_deref(), Some(key.as_str()));

        let loaded = Config::load_from(&path).expect("reload");
        assert_eq!(loaded.vapid_public_key(), Some(key));
        assert_eq!(loaded.table, "subs");

        #[cfg(unix)]
        {
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_set_key_rejects_unusable_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        assert!(Config::set_vapid_public_key(&path, "BBBB").is_err());
        assert!(Config::set_vapid_public_key(&path, "not base64!").is_err());
        assert!(!path.exists());
    }
}
