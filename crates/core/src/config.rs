//! Account configuration store
//!
//! One TOML file per device, overridable through `WGCF_*` environment
//! variables.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::account::{DEFAULT_FILE_NAME, ENV_PREFIX};
use crate::crypto::{KeyError, PrivateKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize account config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{0} is not set")]
    MissingField(&'static str),

    #[error("{field} is not a valid key: {source}")]
    InvalidKey {
        field: &'static str,
        #[source]
        source: KeyError,
    },
}

/// Persisted account state for one registered device.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub device_id: String,
    pub access_token: String,
    pub private_key: String,
    pub license_key: Option<String>,
}

impl AccountConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_FILE_NAME)
    }

    /// Load from `path`, then apply `WGCF_*` environment overrides.
    /// A missing file is treated as an empty account.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(utf8_vars(std::env::vars_os()));
        Ok(config)
    }

    /// Load from `path` only, without looking at the environment.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no account config, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded account config");
        Ok(config)
    }

    /// Apply `(name, value)` pairs whose name carries the `WGCF_` prefix.
    /// Unknown names are ignored.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            let Some(field) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field {
                "DEVICE_ID" => self.device_id = value.into(),
                "ACCESS_TOKEN" => self.access_token = value.into(),
                "PRIVATE_KEY" => self.private_key = value.into(),
                "LICENSE_KEY" => self.license_key = Some(value.into()),
                _ => continue,
            }
            debug!(variable = name.as_ref(), "applied environment override");
        }
    }

    /// Write as TOML, readable and writable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string(self)?;
        crate::files::write_private(path, &content).map_err(io_err)?;
        info!(path = %path.display(), "saved account config");
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        !self.device_id.is_empty() && !self.access_token.is_empty()
    }

    pub fn has_private_key(&self) -> bool {
        !self.private_key.trim().is_empty()
    }

    /// Decode the stored private key. Whitespace around the value, as left by
    /// hand-edited files or shell exports, is ignored.
    pub fn private_key(&self) -> Result<PrivateKey, ConfigError> {
        if !self.has_private_key() {
            return Err(ConfigError::MissingField("private_key"));
        }
        PrivateKey::from_base64(self.private_key.trim()).map_err(|source| ConfigError::InvalidKey {
            field: "private_key",
            source,
        })
    }

    pub fn set_private_key(&mut self, key: &PrivateKey) {
        self.private_key = key.to_base64();
    }
}

/// Drop environment entries whose name or value is not valid UTF-8.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("device_id", &self.device_id)
            .field("has_access_token", &!self.access_token.is_empty())
            .field("has_private_key", &self.has_private_key())
            .field("has_license_key", &self.license_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyManager;

    #[test]
    fn test_missing_file_is_empty_account() {
        let dir = tempfile::tempdir().unwrap();
        let config = AccountConfig::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AccountConfig::default());
        assert!(!config.is_registered());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_FILE_NAME);
        let key = KeyManager::new().generate_private_key().unwrap();

        let mut config = AccountConfig {
            device_id: "device".to_string(),
            access_token: "token".to_string(),
            license_key: Some("license".to_string()),
            ..Default::default()
        };
        config.set_private_key(&key);
        config.save(&path).unwrap();

        let loaded = AccountConfig::load_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.is_registered());
        assert_eq!(loaded.private_key().unwrap(), key);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "device_id = \"abc\"\n").unwrap();

        let config = AccountConfig::load_file(&path).unwrap();
        assert_eq!(config.device_id, "abc");
        assert_eq!(config.license_key, None);
        assert!(!config.is_registered());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "device_id = [").unwrap();

        assert!(matches!(
            AccountConfig::load_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = AccountConfig {
            device_id: "from-file".to_string(),
            ..Default::default()
        };
        config.apply_overrides([
            ("WGCF_DEVICE_ID", "from-env"),
            ("WGCF_LICENSE_KEY", "lic"),
            ("WGCF_UNKNOWN", "ignored"),
            ("ACCESS_TOKEN", "no-prefix"),
        ]);

        assert_eq!(config.device_id, "from-env");
        assert_eq!(config.license_key.as_deref(), Some("lic"));
        assert!(config.access_token.is_empty());
    }

    #[test]
    fn test_private_key_ignores_surrounding_whitespace() {
        let key = KeyManager::new().generate_private_key().unwrap();
        let mut config = AccountConfig::default();
        config.apply_overrides([("WGCF_PRIVATE_KEY", format!("  {}\n", key.to_base64()))]);

        assert_eq!(config.private_key().unwrap(), key);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("WGCF_DEVICE_ID"), OsString::from("dev")),
            (OsString::from("WGCF_LICENSE_KEY"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![0xff, 0xfe]), OsString::from("value")),
        ];
        let mut config = AccountConfig::default();
        config.apply_overrides(utf8_vars(vars));

        assert_eq!(config.device_id, "dev");
        assert_eq!(config.license_key, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_with_non_utf8_variable_in_environment() {
        use std::os::unix::ffi::OsStringExt;

        let name = "WGCF_CONFIG_TEST_NON_UTF8";
        std::env::set_var(name, OsString::from_vec(vec![0xff, 0xfe]));
        let dir = tempfile::tempdir().unwrap();
        let result = AccountConfig::load(&dir.path().join("absent.toml"));
        std::env::remove_var(name);

        assert!(result.is_ok());
    }

    #[test]
    fn test_private_key_errors_name_the_field() {
        let empty = AccountConfig::default();
        assert!(matches!(
            empty.private_key(),
            Err(ConfigError::MissingField("private_key"))
        ));

        let bad = AccountConfig {
            private_key: "AAAA".to_string(),
            ..Default::default()
        };
        let err = bad.private_key().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidKey {
                field: "private_key",
                source: KeyError::InvalidKeyFormat { .. }
            }
        ));
        assert!(err.to_string().starts_with("private_key"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AccountConfig {
            access_token: "secret-token".to_string(),
            private_key: "secret-key".to_string(),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-token"));
        assert!(!printed.contains("secret-key"));
    }
}
