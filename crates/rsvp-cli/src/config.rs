use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CACHE_DIR: &str = "./.wedding-cache";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Optional JSON configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub api_base_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config (JSON): {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Values given on the command line or via environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

/// Effective settings after layering overrides over the file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<ConfigFile>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            api_base_url: overrides
                .api_base_url
                .or(file.api_base_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cache_dir: overrides
                .cache_dir
                .or(file.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            request_timeout: Duration::from_secs(
                overrides
                    .request_timeout_secs
                    .or(file.request_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_file_or_overrides() {
        let settings = Settings::resolve(Overrides::default(), None);
        assert_eq!(settings.api_base_url, DEFAULT_API_URL);
        assert_eq!(settings.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(
            settings.request_timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn overrides_beat_file_and_file_beats_defaults() {
        let file = ConfigFile {
            api_base_url: Some("https://file.example".into()),
            cache_dir: Some("/var/cache/wedding".into()),
            request_timeout_secs: None,
        };
        let overrides = Overrides {
            api_base_url: Some("https://cli.example".into()),
            ..Default::default()
        };

        let settings = Settings::resolve(overrides, Some(file));
        assert_eq!(settings.api_base_url, "https://cli.example");
        assert_eq!(settings.cache_dir, PathBuf::from("/var/cache/wedding"));
        assert_eq!(
            settings.request_timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn loads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_base_url":"https://api.example","request_timeout_secs":3}}"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("https://api.example"));
        assert_eq!(config.request_timeout_secs, Some(3));
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn reports_unreadable_and_malformed_files() {
        let missing = load_config_file(Path::new("/nonexistent/wedding.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
