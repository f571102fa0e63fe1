//! # PRIMMESH Assets
//!
//! Everything between an asset handle and decoded geometry or pixels.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐      ┌────────────────────┐
//! │ AssetSource (trait)      │      │ mesh_asset         │
//! │  ├─ DirectoryAssetSource │ raw  │  LLSD header       │
//! │  └─ MemoryAssetSource    │─────▶│  zlib segments     │──▶ ExtendedPrimGroup
//! └──────────────────────────┘      │  per-tier decode   │
//!              │ texture            └────────────────────┘
//!              ▼
//!        TextureDecoder ──▶ Bitmap
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod directory;
pub mod error;
pub mod handle;
pub mod llsd;
pub mod mesh_asset;
pub mod source;

pub use directory::{DirectoryAssetSource, DirectorySourceConfig};
pub use error::{
    DecodeError, FetchError, LlsdError, LlsdResult, MeshAssetError, MeshAssetResult, SegmentError,
    SourceError,
};
pub use handle::EntityHandle;
pub use llsd::{decode_binary, LlsdValue};
pub use mesh_asset::{unpack, MeshAsset, MeshAssetWriter, SkippedSegment};
pub use source::{
    AssetSource, Bitmap, ImageDecoder, MemoryAssetSource, SourceStats, TextureAsset,
    TextureDecoder,
};
