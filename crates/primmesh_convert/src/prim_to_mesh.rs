//! # Primitive to Mesh Conversion
//!
//! Chooses how each primitive becomes geometry and gathers the parts of a
//! linkset back together.
//!
//! ## Paths
//!
//! ```text
//! sculpt reference?
//! ├── none          mesher.generate_faceted_mesh        → { Lod1 }   resolved now
//! ├── sculpt map    fetch_texture → generate_sculpt_mesh → { Lod1 }
//! └── mesh asset    fetch_raw_asset → unpack              → { Lod1, .. Lod4, Physics }
//! ```
//!
//! ## Linksets
//!
//! ```text
//! parts[0] ──▶ Deferred ──┐
//! parts[1] ──▶ Deferred ──┼──▶ slots[i] + remaining ──▶ EntityGroup (input order)
//! parts[2] ──▶ Deferred ──┘        (one mutex)
//! ```
//!
//! The first part to fail rejects the linkset and later results are
//! dropped.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use primmesh_assets::{mesh_asset, AssetSource, EntityHandle, TextureAsset};
use primmesh_core::{
    Deferred, DetailLevel, EntityGroup, ExtendedPrim, ExtendedPrimGroup, Primitive,
};
use tracing::{debug, debug_span, warn, Span};

use crate::error::ConvertError;
use crate::mesher::{contain, Mesher};

/// Shared progress of one linkset conversion.
struct Aggregate {
    slots: Vec<Option<ExtendedPrimGroup>>,
    remaining: usize,
    failed: bool,
}

/// Converts primitives into extended-prim groups.
pub struct PrimToMesh<M: ?Sized> {
    mesher: Arc<M>,
    span: Span,
}

impl<M: ?Sized> Clone for PrimToMesh<M> {
    fn clone(&self) -> Self {
        Self {
            mesher: Arc::clone(&self.mesher),
            span: self.span.clone(),
        }
    }
}

impl<M> PrimToMesh<M>
where
    M: Mesher + ?Sized + 'static,
{
    /// Creates a converter around `mesher`.
    #[must_use]
    pub fn new(mesher: Arc<M>) -> Self {
        Self {
            mesher,
            span: debug_span!("prim_to_mesh"),
        }
    }

    /// Replaces the span every conversion step is recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The injected mesher.
    #[must_use]
    pub fn mesher(&self) -> &Arc<M> {
        &self.mesher
    }

    /// Converts one primitive.
    ///
    /// Shape-only primitives settle before this returns and never touch
    /// `source`. Sculpted and mesh primitives settle when their fetch does.
    pub fn create_mesh_resource(
        &self,
        prim: Arc<Primitive>,
        source: &dyn AssetSource,
        detail: DetailLevel,
    ) -> Deferred<ExtendedPrimGroup, ConvertError> {
        let _entered = self.span.enter();

        let sculpt = prim.sculpt;
        match sculpt {
            None => {
                debug!(prim = %prim.id, "meshing parametric shape");
                let mesher = &self.mesher;
                match contain(|| mesher.generate_faceted_mesh(&prim, detail)) {
                    Ok(mesh) => Deferred::resolved(ExtendedPrimGroup::single(ExtendedPrim::new(
                        prim, mesh,
                    ))),
                    Err(e) => {
                        warn!(prim = %prim.id, error = %e, "shape meshing failed");
                        Deferred::failed(e.into())
                    }
                }
            }
            Some(sculpt) if sculpt.is_mesh() => {
                let handle = EntityHandle::new(sculpt.texture);
                debug!(prim = %prim.id, asset = %handle, "fetching mesh asset");
                self.mesh_asset_path(prim, handle, source)
            }
            Some(sculpt) => {
                let handle = EntityHandle::new(sculpt.texture);
                debug!(prim = %prim.id, texture = %handle, "fetching sculpt map");
                self.sculpt_path(prim, handle, source, detail)
            }
        }
    }

    fn sculpt_path(
        &self,
        prim: Arc<Primitive>,
        handle: EntityHandle,
        source: &dyn AssetSource,
        detail: DetailLevel,
    ) -> Deferred<ExtendedPrimGroup, ConvertError> {
        let result = Deferred::new();
        let on_texture = result.clone();
        let on_error = result.clone();
        let mesher = Arc::clone(&self.mesher);
        let span = self.span.clone();
        let error_span = self.span.clone();

        source
            .fetch_texture(&handle)
            .then(move |texture: TextureAsset| {
                let _entered = span.enter();
                if texture.bitmap.is_empty() {
                    warn!(prim = %prim.id, texture = %handle, "sculpt map is empty");
                    on_texture.reject(ConvertError::EmptyBitmap(handle));
                    return;
                }
                match contain(|| mesher.generate_sculpt_mesh(&prim, &texture.bitmap, detail)) {
                    Ok(mesh) => {
                        debug!(prim = %prim.id, faces = mesh.faces.len(), "sculpt meshed");
                        on_texture.resolve(ExtendedPrimGroup::single(ExtendedPrim::new(prim, mesh)));
                    }
                    Err(e) => {
                        warn!(prim = %prim.id, error = %e, "sculpt meshing failed");
                        on_texture.reject(e.into());
                    }
                }
            })
            .rejected(move |e| {
                let _entered = error_span.enter();
                warn!(texture = %handle, error = %e, "sculpt map fetch failed");
                on_error.reject(e.into());
            });

        result
    }

    fn mesh_asset_path(
        &self,
        prim: Arc<Primitive>,
        handle: EntityHandle,
        source: &dyn AssetSource,
    ) -> Deferred<ExtendedPrimGroup, ConvertError> {
        let result = Deferred::new();
        let on_bytes = result.clone();
        let on_error = result.clone();
        let span = self.span.clone();
        let error_span = self.span.clone();

        source
            .fetch_raw_asset(&handle)
            .then(move |bytes: Vec<u8>| {
                let _entered = span.enter();
                let id = prim.id;
                match mesh_asset::unpack(prim, &bytes) {
                    Ok(group) => {
                        debug!(prim = %id, tiers = group.len(), "mesh asset unpacked");
                        on_bytes.resolve(group);
                    }
                    Err(e) => {
                        warn!(prim = %id, asset = %handle, error = %e, "mesh asset unusable");
                        on_bytes.reject(e.into());
                    }
                }
            })
            .rejected(move |e| {
                let _entered = error_span.enter();
                warn!(asset = %handle, error = %e, "mesh asset fetch failed");
                on_error.reject(e.into());
            });

        result
    }

    /// Converts every part of a linkset.
    ///
    /// Resolves once all parts have, with groups in input order. Rejects
    /// with [`ConvertError::Part`] as soon as any part fails. An empty
    /// list resolves immediately with an empty group.
    pub fn create_all_meshes(
        &self,
        parts: Vec<Arc<Primitive>>,
        source: &dyn AssetSource,
        detail: DetailLevel,
    ) -> Deferred<EntityGroup, ConvertError> {
        let result = Deferred::new();
        let count = parts.len();
        if count == 0 {
            result.resolve(EntityGroup::default());
            return result;
        }

        let aggregate = Arc::new(Mutex::new(Aggregate {
            slots: (0..count).map(|_| None).collect(),
            remaining: count,
            failed: false,
        }));
        {
            let _entered = self.span.enter();
            debug!(parts = count, "converting linkset");
        }

        for (index, prim) in parts.into_iter().enumerate() {
            let on_part = result.clone();
            let on_error = result.clone();
            let done = Arc::clone(&aggregate);
            let failed = Arc::clone(&aggregate);
            let error_span = self.span.clone();

            self.create_mesh_resource(prim, source, detail)
                .then(move |group| {
                    let finished = {
                        let mut state = done.lock();
                        if state.failed {
                            return;
                        }
                        state.slots[index] = Some(group);
                        state.remaining -= 1;
                        (state.remaining == 0).then(|| mem::take(&mut state.slots))
                    };
                    if let Some(slots) = finished {
                        on_part.resolve(EntityGroup::new(slots.into_iter().flatten().collect()));
                    }
                })
                .rejected(move |e| {
                    {
                        let mut state = failed.lock();
                        if state.failed {
                            return;
                        }
                        state.failed = true;
                        state.slots.clear();
                    }
                    let _entered = error_span.enter();
                    warn!(part = index, error = %e, "linkset conversion failed");
                    on_error.reject(ConvertError::Part {
                        index,
                        source: Box::new(e),
                    });
                });
        }

        result
    }
}

impl<M: ?Sized> std::fmt::Debug for PrimToMesh<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimToMesh")
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}
