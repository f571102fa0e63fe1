//! # Asset Error Types
//!
//! Fetch failures, structured-data decode failures and mesh-asset failures.

use std::path::PathBuf;

use primmesh_core::LodTier;
use thiserror::Error;

use crate::handle::EntityHandle;

/// Errors decoding LLSD binary data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlsdError {
    /// Input ended inside a value.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where more data was needed.
        offset: usize,
    },

    /// Unknown type marker.
    #[error("unknown type marker 0x{marker:02x} at offset {offset}")]
    UnknownMarker {
        /// The marker byte.
        marker: u8,
        /// Byte offset of the marker.
        offset: usize,
    },

    /// Map key was not introduced with a key marker.
    #[error("expected map key at offset {offset}")]
    ExpectedKey {
        /// Byte offset of the offending byte.
        offset: usize,
    },

    /// Container was not closed with its end marker.
    #[error("missing closing '{expected}' at offset {offset}")]
    MissingTerminator {
        /// The expected closing character.
        expected: char,
        /// Byte offset where it was expected.
        offset: usize,
    },

    /// String or key was not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset of the string body.
        offset: usize,
    },

    /// Containers nested deeper than the decoder allows.
    #[error("nesting deeper than {limit} levels")]
    TooDeep {
        /// The nesting limit.
        limit: usize,
    },

    /// Value too long to encode with a 32-bit length.
    #[error("length {len} does not fit the 32-bit length field")]
    TooLarge {
        /// Offending length.
        len: usize,
    },
}

/// Result type for LLSD encoding and decoding.
pub type LlsdResult<T> = Result<T, LlsdError>;

/// Why a single mesh-asset segment could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// Header entry lacks a usable offset/size pair.
    #[error("bad segment descriptor: {0}")]
    BadDescriptor(String),

    /// Byte range falls outside the body.
    #[error("segment {offset}+{size} exceeds body of {body_len} bytes")]
    OutOfRange {
        /// Offset from the end of the header.
        offset: usize,
        /// Compressed size.
        size: usize,
        /// Body length.
        body_len: usize,
    },

    /// Decompression failed.
    #[error("inflate failed: {0}")]
    Inflate(String),

    /// Decompressed bytes were not LLSD.
    #[error("geometry record: {0}")]
    Llsd(#[from] LlsdError),

    /// LLSD decoded but did not describe geometry.
    #[error("malformed geometry: {0}")]
    Malformed(String),

    /// Segment decoded to no vertices.
    #[error("segment holds no geometry")]
    Empty,
}

/// Errors unpacking a mesh asset as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshAssetError {
    /// Header could not be decoded.
    #[error("mesh header: {0}")]
    Header(#[from] LlsdError),

    /// Header decoded to something other than a map.
    #[error("mesh header is {found}, expected a map")]
    HeaderNotMap {
        /// Kind of value actually found.
        found: &'static str,
    },

    /// A required tier was absent or unusable.
    #[error("mesh asset has no usable {0} segment")]
    MissingTier(LodTier),

    /// Authoring a mesh asset failed.
    #[error("cannot write mesh asset: {0}")]
    Write(String),
}

/// Result type for mesh-asset unpacking.
pub type MeshAssetResult<T> = Result<T, MeshAssetError>;

/// Errors delivered through a fetch's deferred result.
///
/// `Clone` so one failure can be reported to several waiting parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No asset with this handle.
    #[error("asset not found: {0}")]
    NotFound(EntityHandle),

    /// Reading the asset failed.
    #[error("I/O error fetching {handle}: {reason}")]
    Io {
        /// Requested asset.
        handle: EntityHandle,
        /// Underlying error text.
        reason: String,
    },

    /// Texture bytes could not be decoded to a bitmap.
    #[error("cannot decode texture {handle}: {reason}")]
    Decode {
        /// Requested texture.
        handle: EntityHandle,
        /// Decoder error text.
        reason: String,
    },

    /// Remote transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source stopped accepting requests.
    #[error("asset source is closed")]
    Closed,
}

/// Errors constructing an asset source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Asset directory could not be listed.
    #[error("cannot index asset directory {path}: {source}")]
    Index {
        /// Directory that was scanned.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be started.
    #[error("cannot start fetch worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// Configuration rejected.
    #[error("invalid source configuration: {0}")]
    InvalidConfig(String),
}

/// A texture decoder rejected its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);
