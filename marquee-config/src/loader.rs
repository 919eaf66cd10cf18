use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::Config;

pub const CONFIG_PATH_ENV: &str = "MARQUEE_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "MARQUEE_CONFIG_JSON";

const DEFAULT_CANDIDATES: &[&str] = &[
    "marquee.toml",
    "marquee.json",
    "config/marquee.toml",
    "config/marquee.json",
];

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration, in order of precedence:
    /// 1) `$MARQUEE_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$MARQUEE_CONFIG_JSON` (inline JSON),
    /// 3) the first default file found under the working directory,
    /// 4) built-in defaults.
    ///
    /// The result is validated before it is returned.
    pub fn load_from_env() -> Result<(Self, ConfigSource), ConfigLoadError> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from_env_in(&cwd)
    }

    /// [`Config::load_from_env`] with default files resolved against `dir`.
    pub fn load_from_env_in(dir: &Path) -> Result<(Self, ConfigSource), ConfigLoadError> {
        let (config, source) = Self::resolve(dir)?;
        config.validate()?;
        info!("configuration loaded from {:?}", source);
        Ok((config, source))
    }

    fn resolve(dir: &Path) -> Result<(Self, ConfigSource), ConfigLoadError> {
        if let Ok(path_str) = env::var(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str.trim());
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Ok(raw) = env::var(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let config = Self::parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok((config, ConfigSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file(dir) {
            let config = Self::load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents, &origin),
            Some("toml") | Some("tml") => Self::parse_toml(&contents, &origin),
            _ => Self::parse_from_str(&contents, &origin),
        }
    }

    /// Parse text of unknown format, trying TOML first and then JSON.
    pub fn parse_from_str(contents: &str, origin: &str) -> Result<Self, ConfigLoadError> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| ConfigLoadError::Parse {
                origin: origin.to_string(),
                message: format!("toml error: {toml_err}; json error: {json_err}"),
            })
        })
    }

    pub fn parse_toml(contents: &str, origin: &str) -> Result<Self, ConfigLoadError> {
        toml::from_str(contents).map_err(|err| ConfigLoadError::Parse {
            origin: origin.to_string(),
            message: err.to_string(),
        })
    }

    pub fn parse_json(raw: &str, origin: &str) -> Result<Self, ConfigLoadError> {
        serde_json::from_str(raw).map_err(|err| ConfigLoadError::Parse {
            origin: origin.to_string(),
            message: err.to_string(),
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigLoadError> {
        toml::to_string(self).map_err(|err| ConfigLoadError::Invalid(err.to_string()))
    }

    fn find_default_file(dir: &Path) -> Option<PathBuf> {
        let found = DEFAULT_CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .find(|path| path.is_file());
        if found.is_none() {
            debug!("no config file under {}, using defaults", dir.display());
        }
        found
    }
}
