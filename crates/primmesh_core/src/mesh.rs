//! # Conversion Results
//!
//! ```text
//! EntityGroup            one linkset, parts in input order
//! └── ExtendedPrimGroup  one part, keyed by LodTier
//!     └── ExtendedPrim   source primitive + FacetedMesh
//!         └── Face       vertices + indices, linked to a material slot
//! ```

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::lod::LodTier;
use crate::math::{Vector2, Vector3};
use crate::prim::Primitive;

/// Interleaved mesh vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: Vector3,
    /// Unit normal (zero if the source carried none).
    pub normal: Vector3,
    /// Texture coordinate.
    pub tex_coord: Vector2,
}

/// One material face of a faceted mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    /// Index into the primitive's material table.
    pub id: usize,
    /// Vertex buffer.
    pub vertices: Vec<Vertex>,
    /// Triangle list into `vertices`.
    pub indices: Vec<u16>,
}

impl Face {
    /// Number of whole triangles in the index list.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer as raw bytes for upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Triangulated geometry with per-face material linkage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacetedMesh {
    /// Faces in material-slot order.
    pub faces: Vec<Face>,
}

impl FacetedMesh {
    /// Creates a mesh from faces.
    #[must_use]
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    /// Total vertices across faces.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.faces.iter().map(|f| f.vertices.len()).sum()
    }

    /// Total triangles across faces.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(Face::triangle_count).sum()
    }

    /// True when no face carries a vertex.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.iter().all(|f| f.vertices.is_empty())
    }
}

/// A primitive together with the mesh produced for it at one tier.
#[derive(Clone, Debug)]
pub struct ExtendedPrim {
    /// Source descriptor.
    pub primitive: Arc<Primitive>,
    /// Produced geometry.
    pub mesh: FacetedMesh,
}

impl ExtendedPrim {
    /// Pairs a primitive with its mesh.
    #[must_use]
    pub fn new(primitive: Arc<Primitive>, mesh: FacetedMesh) -> Self {
        Self { primitive, mesh }
    }
}

/// All tiers produced for one primitive.
///
/// Fixed table indexed by [`LodTier`]; an empty slot means the tier was not
/// requested or not available.
#[derive(Clone, Debug, Default)]
pub struct ExtendedPrimGroup {
    slots: [Option<ExtendedPrim>; LodTier::COUNT],
}

impl ExtendedPrimGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A group holding a single `Lod1` entry.
    #[must_use]
    pub fn single(prim: ExtendedPrim) -> Self {
        let mut group = Self::new();
        group.insert(LodTier::Lod1, prim);
        group
    }

    /// Stores `prim` at `tier`, returning whatever was there.
    pub fn insert(&mut self, tier: LodTier, prim: ExtendedPrim) -> Option<ExtendedPrim> {
        self.slots[tier.index()].replace(prim)
    }

    /// Entry for `tier`.
    #[must_use]
    pub fn get(&self, tier: LodTier) -> Option<&ExtendedPrim> {
        self.slots[tier.index()].as_ref()
    }

    /// True if `tier` is present.
    #[must_use]
    pub fn contains(&self, tier: LodTier) -> bool {
        self.slots[tier.index()].is_some()
    }

    /// Present tiers in [`LodTier::ALL`] order.
    #[must_use]
    pub fn tiers(&self) -> Vec<LodTier> {
        self.iter().map(|(tier, _)| tier).collect()
    }

    /// Present entries in [`LodTier::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (LodTier, &ExtendedPrim)> + '_ {
        LodTier::ALL
            .into_iter()
            .filter_map(move |tier| self.get(tier).map(|prim| (tier, prim)))
    }

    /// Most detailed visual tier present.
    #[must_use]
    pub fn best(&self) -> Option<(LodTier, &ExtendedPrim)> {
        LodTier::VISUAL
            .into_iter()
            .find_map(|tier| self.get(tier).map(|prim| (tier, prim)))
    }

    /// Number of present tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if no tier is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Converted parts of one linkset, in input order.
#[derive(Clone, Debug, Default)]
pub struct EntityGroup {
    parts: Vec<ExtendedPrimGroup>,
}

impl EntityGroup {
    /// Creates a group from parts already in input order.
    #[must_use]
    pub fn new(parts: Vec<ExtendedPrimGroup>) -> Self {
        Self { parts }
    }

    /// Part at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExtendedPrimGroup> {
        self.parts.get(index)
    }

    /// Parts in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExtendedPrimGroup> {
        self.parts.iter()
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True for an empty linkset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Unwraps into the part list.
    #[must_use]
    pub fn into_parts(self) -> Vec<ExtendedPrimGroup> {
        self.parts
    }
}

impl<'a> IntoIterator for &'a EntityGroup {
    type Item = &'a ExtendedPrimGroup;
    type IntoIter = std::slice::Iter<'a, ExtendedPrimGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> FacetedMesh {
        FacetedMesh::new(vec![Face {
            id: 0,
            vertices: vec![Vertex::default(); 3],
            indices: vec![0, 1, 2],
        }])
    }

    fn prim() -> ExtendedPrim {
        ExtendedPrim::new(Arc::new(Primitive::default()), triangle())
    }

    #[test]
    fn test_group_slots() {
        let mut group = ExtendedPrimGroup::new();
        assert!(group.is_empty());

        group.insert(LodTier::Lod3, prim());
        group.insert(LodTier::Physics, prim());
        group.insert(LodTier::Lod1, prim());

        assert_eq!(group.len(), 3);
        assert_eq!(
            group.tiers(),
            vec![LodTier::Physics, LodTier::Lod1, LodTier::Lod3]
        );
        assert!(!group.contains(LodTier::Lod2));
        assert_eq!(group.best().map(|(t, _)| t), Some(LodTier::Lod1));
    }

    #[test]
    fn test_insert_replaces() {
        let mut group = ExtendedPrimGroup::single(prim());
        assert!(group.insert(LodTier::Lod1, prim()).is_some());
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_mesh_counts() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
        assert_eq!(mesh.faces[0].vertex_bytes().len(), 3 * 32);
    }
}
