// Configuration, resolved once at startup. Sources, lowest priority first:
// built-in defaults, the optional JSON file in the user's config dir,
// environment variables, then command-line overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const BATCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid value for {name}: '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    ZeroTimeout { name: &'static str },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub default_timeout: Duration,
    pub batch_timeout: Duration,
    pub export_dir: PathBuf,
}

/// Shape of `config.json`. Every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub batch_timeout_secs: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub batch_timeout_secs: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            batch_timeout: Duration::from_secs(BATCH_TIMEOUT_SECS),
            export_dir: PathBuf::from("."),
        }
    }
}

/// `<config_dir>/snakekv/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("snakekv").join("config.json"))
}

impl FileConfig {
    /// Read the file if it exists. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(parsed))
    }
}

impl Config {
    /// Resolve from the real environment and the default config file.
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match default_config_path() {
            Some(path) => FileConfig::load(&path)?,
            None => None,
        };
        Self::resolve(file, |name| std::env::var(name).ok(), overrides)
    }

    /// Layer the sources. `env` is a lookup so tests don't touch the
    /// process environment.
    pub fn resolve<F>(
        file: Option<FileConfig>,
        env: F,
        overrides: Overrides,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(url) = file.base_url {
                config.base_url = url;
            }
            if let Some(secs) = file.timeout_secs {
                config.default_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = file.batch_timeout_secs {
                config.batch_timeout = Duration::from_secs(secs);
            }
            if let Some(dir) = file.export_dir {
                config.export_dir = dir;
            }
        }

        if let Some(url) = env("SNAKEKV_API_URL") {
            config.base_url = url;
        }
        if let Some(secs) = parse_secs(&env, "SNAKEKV_TIMEOUT_SECS")? {
            config.default_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&env, "SNAKEKV_BATCH_TIMEOUT_SECS")? {
            config.batch_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = env("SNAKEKV_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        if let Some(url) = overrides.base_url {
            config.base_url = url;
        }
        if let Some(secs) = overrides.timeout_secs {
            config.default_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.batch_timeout_secs {
            config.batch_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = overrides.export_dir {
            config.export_dir = dir;
        }

        config.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&trimmed).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url,
                reason: "scheme must be http or https".to_string(),
            });
        }
        self.base_url = trimmed;

        if self.default_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout { name: "timeout" });
        }
        if self.batch_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout {
                name: "batch timeout",
            });
        }
        Ok(self)
    }
}

fn parse_secs<F>(env: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match env(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(None, env_of(&[]), Overrides::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_timeout, Duration::from_secs(10));
        assert_eq!(config.batch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn later_sources_win() {
        let file = FileConfig {
            base_url: Some("http://file:1/api".into()),
            timeout_secs: Some(3),
            batch_timeout_secs: Some(4),
            export_dir: Some(PathBuf::from("/from/file")),
        };
        let env = env_of(&[
            ("SNAKEKV_API_URL", "http://env:2/api/"),
            ("SNAKEKV_TIMEOUT_SECS", "5"),
        ]);
        let overrides = Overrides {
            timeout_secs: Some(7),
            ..Overrides::default()
        };

        let config = Config::resolve(Some(file), env, overrides).unwrap();
        assert_eq!(config.base_url, "http://env:2/api");
        assert_eq!(config.default_timeout, Duration::from_secs(7));
        assert_eq!(config.batch_timeout, Duration::from_secs(4));
        assert_eq!(config.export_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::resolve(
            None,
            env_of(&[("SNAKEKV_TIMEOUT_SECS", "soon")]),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let zero = Overrides {
            batch_timeout_secs: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            Config::resolve(None, env_of(&[]), zero),
            Err(ConfigError::ZeroTimeout { .. })
        ));

        let ftp = Overrides {
            base_url: Some("ftp://host/api".into()),
            ..Overrides::default()
        };
        assert!(matches!(
            Config::resolve(None, env_of(&[]), ftp),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn loads_optional_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(FileConfig::load(&path).unwrap(), None);

        std::fs::write(&path, r#"{"base_url": "http://10.0.0.2:8080/api", "timeout_secs": 2}"#)
            .unwrap();
        let loaded = FileConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://10.0.0.2:8080/api"));
        assert_eq!(loaded.timeout_secs, Some(2));
        assert_eq!(loaded.export_dir, None);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
