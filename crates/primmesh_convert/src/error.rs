//! # Conversion Error Types

use std::path::PathBuf;

use primmesh_assets::{EntityHandle, FetchError, MeshAssetError};
use thiserror::Error;

/// Errors reported by a [`Mesher`](crate::Mesher).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MesherError {
    /// The mesher cannot build this kind of shape.
    #[error("unsupported shape: {0}")]
    Unsupported(String),

    /// Tessellation failed.
    #[error("meshing failed: {0}")]
    Failed(String),

    /// The mesher panicked; the panic was contained.
    #[error("mesher panicked")]
    Panicked,
}

/// Why a primitive or linkset could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A dependent asset could not be fetched or decoded.
    #[error("asset fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A mesh asset could not be unpacked.
    #[error("mesh asset: {0}")]
    MeshAsset(#[from] MeshAssetError),

    /// The mesher failed.
    #[error(transparent)]
    Mesher(#[from] MesherError),

    /// A sculpt texture decoded to no pixels.
    #[error("sculpt texture {0} decoded to an empty bitmap")]
    EmptyBitmap(EntityHandle),

    /// One part of a linkset failed.
    #[error("part {index}: {source}")]
    Part {
        /// Position of the part in the input list.
        index: usize,
        /// What went wrong with it.
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// The underlying error with any part wrapper removed.
    #[must_use]
    pub fn root(&self) -> &ConvertError {
        match self {
            Self::Part { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for conversions.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors loading a [`PipelineConfig`](crate::PipelineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be written as TOML.
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config parsed but a value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;
