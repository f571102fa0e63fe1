//! # PRIMMESH Core
//!
//! Types shared by every stage of the primitive-to-mesh pipeline.
//!
//! ## Contents
//!
//! 1. **Deferred** - single-fire result cell, the pipeline's only sequencing tool
//! 2. **Primitive** - shape parameters, sculpt reference, material table
//! 3. **LodTier / DetailLevel** - fidelity tiers and mesher quality
//! 4. **ExtendedPrimGroup / EntityGroup** - conversion results
//! 5. **mesh_key** - content identity hash
//!
//! ## Example
//!
//! ```rust
//! use primmesh_core::{mesh_key_for, DetailLevel, Primitive};
//!
//! let a = Primitive::default();
//! let b = Primitive::default();
//! assert_eq!(
//!     mesh_key_for(&a, DetailLevel::Highest),
//!     mesh_key_for(&b, DetailLevel::Highest),
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod deferred;
pub mod hash;
pub mod lod;
pub mod math;
pub mod mesh;
pub mod prim;

pub use deferred::Deferred;
pub use hash::{mesh_key, mesh_key_for, HASHED_FACE_COUNT, MESH_KEY_SEED};
pub use lod::{DetailLevel, LodTier};
pub use math::{Vector2, Vector3};
pub use mesh::{EntityGroup, ExtendedPrim, ExtendedPrimGroup, Face, FacetedMesh, Vertex};
pub use prim::{
    Bumpiness, HoleType, PathCurve, Primitive, ProfileShape, SculptData, SculptType, ShapeParams,
    Shininess, TextureEntry, TextureFace, MAX_FACES,
};

pub use uuid::Uuid;
