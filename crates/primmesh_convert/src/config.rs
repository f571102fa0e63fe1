//! # Pipeline Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! [convert]
//! detail = "highest"        # low | medium | high | highest
//!
//! [assets]
//! directory = "./assets"
//! workers = 2
//! texture_suffixes = ["_texture.jp2", "_texture.png", "_texture.tga"]
//! ```
//!
//! Every field has a default, so an empty file is a valid config.

use std::fs;
use std::path::Path;

use primmesh_assets::DirectorySourceConfig;
use primmesh_core::DetailLevel;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// `[convert]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Mesher quality for shape and sculpt primitives.
    pub detail: DetailLevel,
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Conversion settings.
    pub convert: ConvertSettings,
    /// Asset directory settings.
    pub assets: DirectorySourceConfig,
}

impl PipelineConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for bad syntax or unknown values,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`PipelineConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if a value has no TOML form.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        self.assets
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
