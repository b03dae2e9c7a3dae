use std::path::Path;

use dbprofile_core::ProfileConfig;
use thiserror::Error;

/// Errors raised while loading the profile configuration file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Values given on the command line that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub sample_size: Option<usize>,
    pub distinct: bool,
    pub limit: Option<u64>,
    pub filter: Option<String>,
}

pub fn load_config(path: &Path) -> Result<ProfileConfig, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Toml {
        path: path.display().to_string(),
        source,
    })
}

/// Config file values (or defaults) with command line overrides applied.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ProfileConfig, SettingsError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ProfileConfig::default(),
    };

    if let Some(sample_size) = overrides.sample_size {
        config.sample_size = sample_size;
    }
    if overrides.distinct {
        config.distinct = true;
    }
    if overrides.limit.is_some() {
        config.limit = overrides.limit;
    }
    if overrides.filter.is_some() {
        config.filter = overrides.filter;
    }

    Ok(config)
}
