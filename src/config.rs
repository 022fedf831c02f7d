use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_DIR: &str = "newsdesk";
const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Settings read from `config.toml`. Every field has a default, so a missing
/// file or a partial one is fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub log_dir: Option<PathBuf>,
    pub images: ImageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            log_dir: None,
            images: ImageSettings::default(),
        }
    }
}

/// How picked image files become an `src` for the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Inline `data:` URL.
    #[default]
    Embed,
    /// Copy into `upload_dir` and reference it below `base_url`.
    Upload,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub source: ImageSource,
    pub max_bytes: u64,
    pub upload_dir: PathBuf,
    pub base_url: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            source: ImageSource::Embed,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
            upload_dir: data_dir().join("uploads"),
            base_url: "http://localhost:8080/uploads".to_string(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from the platform config directory, or defaults when there is none.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("loads");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"https://api.example\"\n[images]\nsource = \"upload\"\nmax_bytes = 1024\n",
        )
        .expect("write");

        let config = Config::load(&path).expect("loads");
        assert_eq!(config.api_base_url, "https://api.example");
        assert_eq!(config.images.source, ImageSource::Upload);
        assert_eq!(config.images.max_bytes, 1024);
        assert_eq!(config.images.base_url, ImageSettings::default().base_url);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [").expect("write");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.log_dir = Some(dir.path().join("logs"));
        config.images.source = ImageSource::Upload;
        config.save(&path).expect("saves");
        assert_eq!(Config::load(&path).expect("loads"), config);
    }
}
