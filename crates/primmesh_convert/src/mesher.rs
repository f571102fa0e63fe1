//! The tessellator seam.
//!
//! Shape and sculpt tessellation live outside this crate. The converter is
//! handed a [`Mesher`] and treats it as a pure function of its inputs.

use std::panic::{self, AssertUnwindSafe};

use primmesh_assets::Bitmap;
use primmesh_core::{DetailLevel, FacetedMesh, Primitive};
use tracing::error;

use crate::error::MesherError;

/// Turns primitive descriptors into faceted meshes.
pub trait Mesher: Send + Sync {
    /// Tessellates the parametric shape of `prim`.
    ///
    /// # Errors
    ///
    /// Any [`MesherError`]; it becomes the conversion's rejection.
    fn generate_faceted_mesh(
        &self,
        prim: &Primitive,
        detail: DetailLevel,
    ) -> Result<FacetedMesh, MesherError>;

    /// Builds a mesh from a sculpt map.
    ///
    /// # Errors
    ///
    /// Any [`MesherError`]; it becomes the conversion's rejection.
    fn generate_sculpt_mesh(
        &self,
        prim: &Primitive,
        sculpt: &Bitmap,
        detail: DetailLevel,
    ) -> Result<FacetedMesh, MesherError>;
}

/// Runs a mesher call, turning a panic into [`MesherError::Panicked`].
pub(crate) fn contain<F>(call: F) -> Result<FacetedMesh, MesherError>
where
    F: FnOnce() -> Result<FacetedMesh, MesherError>,
{
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|_| {
        error!("mesher panicked");
        Err(MesherError::Panicked)
    })
}
