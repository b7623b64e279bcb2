pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file directly
pub const CONFIG_PATH_ENV: &str = "SHOTTY_CONFIG_PATH";

/// AWS profile used when none is given
pub const DEFAULT_PROFILE: &str = "snapshotalyzer";

/// Must equal `snapshotalyzer_cloud::DEFAULT_SNAPSHOT_DESCRIPTION`; the CLI tests check it
pub const DEFAULT_SNAPSHOT_DESCRIPTION: &str = "Created by Snapshotalyzer";

const CONFIG_FILE: &str = "config.yaml";

/// Snapshotalyzer settings
///
/// ```yaml
/// profile: snapshotalyzer
/// region: ap-northeast-1
/// snapshot_description: Created by Snapshotalyzer
/// wait:
///   poll_interval_secs: 15
///   max_attempts: 40
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// AWS profile name
    pub profile: Option<String>,
    /// Region; falls back to the profile or environment when absent
    pub region: Option<String>,
    /// Description attached to created snapshots
    pub snapshot_description: String,
    /// Polling used when waiting for stop/start to finish
    pub wait: WaitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Some(DEFAULT_PROFILE.to_string()),
            region: None,
            snapshot_description: DEFAULT_SNAPSHOT_DESCRIPTION.to_string(),
            wait: WaitSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitSettings {
    /// Seconds between checks
    pub poll_interval_secs: u64,
    /// Maximum number of checks
    pub max_attempts: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        // same as the EC2 waiters: every 15s, 40 times
        Self {
            poll_interval_secs: 15,
            max_attempts: 40,
        }
    }
}

impl Settings {
    /// Apply CLI flag overrides; `None` keeps the configured value
    pub fn with_overrides(mut self, profile: Option<String>, region: Option<String>) -> Self {
        if profile.is_some() {
            self.profile = profile;
        }
        if region.is_some() {
            self.region = region;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.wait.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "wait.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.snapshot_description.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "snapshot_description",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Snapshotalyzer config directory (~/.config/snapshotalyzer)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("snapshotalyzer");
    Ok(config_dir)
}

/// Locate the config file
///
/// Search order:
/// 1. `SHOTTY_CONFIG_PATH` (must exist once set)
/// 2. ~/.config/snapshotalyzer/config.yaml
///
/// Returns `None` when neither applies; callers fall back to defaults.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. explicit path from the environment
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        if !config_path.is_empty() {
            return Ok(Some(PathBuf::from(config_path)));
        }
    }

    // 2. per-user config file
    let global_config = get_config_dir()?.join(CONFIG_FILE);
    if global_config.exists() {
        return Ok(Some(global_config));
    }

    Ok(None)
}

/// Load settings, using defaults when no file exists
pub fn load() -> Result<Settings> {
    match find_config_file()? {
        Some(path) => load_from(&path),
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(Settings::default())
        }
    }
}

/// Load settings from an explicit path
pub fn load_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;

    // an empty file means defaults
    let settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    settings.validate()?;

    tracing::debug!("loaded config from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.profile.as_deref(), Some("snapshotalyzer"));
        assert_eq!(settings.region, None);
        assert_eq!(settings.snapshot_description, "Created by Snapshotalyzer");
        assert_eq!(settings.wait.poll_interval_secs, 15);
        assert_eq!(settings.wait.max_attempts, 40);
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "region: eu-west-1\nwait:\n  poll_interval_secs: 5\n").unwrap();

        let settings = load_from(&path).unwrap();

        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.wait.poll_interval_secs, 5);
        // unspecified keys keep their defaults
        assert_eq!(settings.wait.max_attempts, 40);
        assert_eq!(settings.profile.as_deref(), Some("snapshotalyzer"));
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_key_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "profle: typo\n").unwrap();

        let result = load_from(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_attempts_is_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "wait:\n  max_attempts: 0\n").unwrap();

        let result = load_from(&path);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "wait.max_attempts",
                ..
            })
        ));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_overrides(Some("prod".to_string()), None)
            .with_overrides(None, Some("us-west-2".to_string()));

        assert_eq!(settings.profile.as_deref(), Some("prod"));
        assert_eq!(settings.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "profile: custom\n").unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), || {
            assert_eq!(find_config_file().unwrap(), Some(config_path.clone()));
            assert_eq!(load().unwrap().profile.as_deref(), Some("custom"));
        });
    }

    #[test]
    #[serial]
    fn test_env_var_pointing_to_missing_file_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.yaml");

        temp_env::with_var(CONFIG_PATH_ENV, Some(&missing), || {
            assert!(matches!(load(), Err(ConfigError::Io(_))));
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_global_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("snapshotalyzer");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "region: ap-northeast-1\n").unwrap();

        temp_env::with_vars(
            [
                ("XDG_CONFIG_HOME", Some(temp_dir.path().as_os_str())),
                (CONFIG_PATH_ENV, None),
            ],
            || {
                let found = find_config_file().unwrap().unwrap();
                assert!(found.ends_with("snapshotalyzer/config.yaml"));
                assert_eq!(load().unwrap().region.as_deref(), Some("ap-northeast-1"));
            },
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_no_config_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();

        temp_env::with_vars(
            [
                ("XDG_CONFIG_HOME", Some(temp_dir.path().as_os_str())),
                (CONFIG_PATH_ENV, None),
            ],
            || {
                assert_eq!(find_config_file().unwrap(), None);
                assert_eq!(load().unwrap(), Settings::default());
            },
        );
    }
}
