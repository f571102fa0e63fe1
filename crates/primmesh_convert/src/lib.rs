//! # PRIMMESH Convert
//!
//! Turns primitive descriptors into multi-LOD faceted meshes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use primmesh_assets::{Bitmap, MemoryAssetSource};
//! use primmesh_convert::{Mesher, MesherError, PrimToMesh};
//! use primmesh_core::{DetailLevel, Face, FacetedMesh, LodTier, Primitive};
//!
//! struct Flat;
//!
//! impl Mesher for Flat {
//!     fn generate_faceted_mesh(&self, _: &Primitive, _: DetailLevel)
//!         -> Result<FacetedMesh, MesherError> {
//!         Ok(FacetedMesh::new(vec![Face::default()]))
//!     }
//!     fn generate_sculpt_mesh(&self, _: &Primitive, _: &Bitmap, _: DetailLevel)
//!         -> Result<FacetedMesh, MesherError> {
//!         Err(MesherError::Unsupported("sculpts".into()))
//!     }
//! }
//!
//! let converter = PrimToMesh::new(Arc::new(Flat));
//! let source = MemoryAssetSource::new();
//! let linkset = vec![Arc::new(Primitive::default()), Arc::new(Primitive::default())];
//!
//! let group = converter
//!     .create_all_meshes(linkset, &source, DetailLevel::Highest)
//!     .wait_timeout(Duration::from_secs(1))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(group.len(), 2);
//! assert!(group.get(0).unwrap().contains(LodTier::Lod1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod deadline;
pub mod error;
pub mod mesher;
pub mod prim_to_mesh;

pub use config::{ConvertSettings, PipelineConfig};
pub use deadline::{reject_after, Deadline};
pub use error::{ConfigError, ConfigResult, ConvertError, ConvertResult, MesherError};
pub use mesher::Mesher;
pub use prim_to_mesh::PrimToMesh;
