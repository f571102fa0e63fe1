//! # Mesh Asset Unpacker
//!
//! Splits a serialized mesh asset into one faceted mesh per LOD tier.
//!
//! ## Layout
//!
//! ```text
//! Mesh asset:
//! ├── Header (LLSD binary map, self-delimiting)
//! │   ├── "high_lod"       → { offset, size }     Lod1
//! │   ├── "medium_lod"     → { offset, size }     Lod2
//! │   ├── "low_lod"        → { offset, size }     Lod3
//! │   ├── "lowest_lod"     → { offset, size }     Lod4
//! │   ├── "physics_shape"  → { offset, size }     Physics
//! │   ├── "physics_mesh"   → { offset, size }     Physics
//! │   └── "physics_convex" → { offset, size }     Physics
//! └── Body: zlib segments, offsets relative to the end of the header
//! ```
//!
//! A LOD segment inflates to an LLSD array of submeshes. Submesh `i` feeds
//! material face `i`:
//!
//! ```text
//! { NoGeometry: true }                             empty slot
//! { Position:        binary  u16 LE x,y,z          quantized into PositionDomain
//!   PositionDomain:  { Min: [x,y,z], Max: [x,y,z] } default -0.5 .. 0.5
//!   Normal:          binary  u16 LE x,y,z          quantized into -1 .. 1
//!   TexCoord0:       binary  u16 LE u,v            quantized into TexCoord0Domain
//!   TexCoord0Domain: { Min: [u,v], Max: [u,v] }    default 0 .. 1
//!   TriangleList:    binary  u16 LE indices }
//! ```
//!
//! `physics_convex` inflates to a map holding `BoundingVerts` quantized into
//! `Min`/`Max` and becomes a single vertex-only face.
//!
//! Tiers are best effort: a damaged segment is skipped with a warning. Only a
//! missing `Lod1` rejects the asset when it is turned into a group.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use primmesh_core::{
    ExtendedPrim, ExtendedPrimGroup, Face, FacetedMesh, LodTier, Primitive, Vector2, Vector3,
    Vertex,
};
use tracing::{debug, warn};

use crate::error::{MeshAssetError, MeshAssetResult, SegmentError};
use crate::llsd::{decode_binary, LlsdValue};

/// Segment names and the tier each one fills, in precedence order.
pub const SEGMENTS: [(&str, LodTier); 7] = [
    ("high_lod", LodTier::Lod1),
    ("medium_lod", LodTier::Lod2),
    ("low_lod", LodTier::Lod3),
    ("lowest_lod", LodTier::Lod4),
    ("physics_shape", LodTier::Physics),
    ("physics_mesh", LodTier::Physics),
    ("physics_convex", LodTier::Physics),
];

/// Name of the convex-hull physics segment.
const CONVEX_SEGMENT: &str = "physics_convex";

/// Largest inflated segment accepted.
pub const MAX_SEGMENT_BYTES: usize = 64 * 1024 * 1024;

/// Quantization steps per axis.
const QUANTA: f32 = 65535.0;

const DEFAULT_POSITION_MIN: Vector3 = Vector3::new(-0.5, -0.5, -0.5);
const DEFAULT_POSITION_MAX: Vector3 = Vector3::new(0.5, 0.5, 0.5);
const NORMAL_MIN: Vector3 = Vector3::new(-1.0, -1.0, -1.0);
const NORMAL_MAX: Vector3 = Vector3::new(1.0, 1.0, 1.0);
const DEFAULT_UV_MIN: Vector2 = Vector2::new(0.0, 0.0);
const DEFAULT_UV_MAX: Vector2 = Vector2::new(1.0, 1.0);

/// A present segment that could not be used.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedSegment {
    /// Header key of the segment.
    pub name: &'static str,
    /// Tier it would have filled.
    pub tier: LodTier,
    /// Why it was skipped.
    pub reason: SegmentError,
}

/// A mesh asset split into per-tier meshes.
#[derive(Clone, Debug, Default)]
pub struct MeshAsset {
    meshes: [Option<FacetedMesh>; LodTier::COUNT],
    skipped: Vec<SkippedSegment>,
}

impl MeshAsset {
    /// Decodes every recognized segment of `data`.
    ///
    /// # Errors
    ///
    /// Fails only if the header itself is unreadable or not a map. Damaged
    /// segments are recorded in [`MeshAsset::skipped`].
    pub fn parse(data: &[u8]) -> MeshAssetResult<Self> {
        let (header, header_len) = decode_binary(data)?;
        if header.as_map().is_none() {
            return Err(MeshAssetError::HeaderNotMap {
                found: header.kind(),
            });
        }
        let body = &data[header_len..];

        let mut asset = Self::default();
        for (name, tier) in SEGMENTS {
            let Some(entry) = header.get(name) else {
                continue;
            };
            if asset.meshes[tier.index()].is_some() {
                debug!(segment = name, %tier, "tier already filled, ignoring segment");
                continue;
            }
            match decode_segment(name, body, entry) {
                Ok(mesh) => {
                    debug!(
                        segment = name,
                        %tier,
                        faces = mesh.faces.len(),
                        vertices = mesh.vertex_count(),
                        "decoded mesh segment"
                    );
                    asset.meshes[tier.index()] = Some(mesh);
                }
                Err(reason) => {
                    warn!(segment = name, %tier, error = %reason, "skipping mesh segment");
                    asset.skipped.push(SkippedSegment { name, tier, reason });
                }
            }
        }
        Ok(asset)
    }

    /// Mesh decoded for `tier`.
    #[must_use]
    pub fn mesh(&self, tier: LodTier) -> Option<&FacetedMesh> {
        self.meshes[tier.index()].as_ref()
    }

    /// Tiers that decoded, in [`LodTier::ALL`] order.
    #[must_use]
    pub fn tiers(&self) -> Vec<LodTier> {
        LodTier::ALL
            .into_iter()
            .filter(|tier| self.meshes[tier.index()].is_some())
            .collect()
    }

    /// Segments that were present but unusable.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedSegment] {
        &self.skipped
    }

    /// Pairs every decoded tier with `primitive`.
    ///
    /// # Errors
    ///
    /// [`MeshAssetError::MissingTier`] if `Lod1` did not decode.
    pub fn into_group(self, primitive: Arc<Primitive>) -> MeshAssetResult<ExtendedPrimGroup> {
        if self.meshes[LodTier::Lod1.index()].is_none() {
            return Err(MeshAssetError::MissingTier(LodTier::Lod1));
        }
        let mut group = ExtendedPrimGroup::new();
        for (tier, mesh) in LodTier::ALL.into_iter().zip(self.meshes) {
            if let Some(mesh) = mesh {
                group.insert(tier, ExtendedPrim::new(Arc::clone(&primitive), mesh));
            }
        }
        Ok(group)
    }
}

/// Unpacks `data` into a multi-tier group for `primitive`.
///
/// # Errors
///
/// See [`MeshAsset::parse`] and [`MeshAsset::into_group`].
pub fn unpack(primitive: Arc<Primitive>, data: &[u8]) -> MeshAssetResult<ExtendedPrimGroup> {
    MeshAsset::parse(data)?.into_group(primitive)
}

fn decode_segment(name: &str, body: &[u8], entry: &LlsdValue) -> Result<FacetedMesh, SegmentError> {
    let compressed = segment_bytes(body, entry)?;
    let inflated = inflate(compressed)?;
    let (record, _) = decode_binary(&inflated)?;
    let mesh = if name == CONVEX_SEGMENT {
        decode_convex(&record)?
    } else {
        decode_submeshes(&record)?
    };
    if mesh.is_empty() {
        return Err(SegmentError::Empty);
    }
    Ok(mesh)
}

fn descriptor_field(entry: &LlsdValue, key: &str) -> Result<usize, SegmentError> {
    let value = entry
        .get(key)
        .and_then(LlsdValue::as_integer)
        .ok_or_else(|| SegmentError::BadDescriptor(format!("missing integer '{key}'")))?;
    usize::try_from(value)
        .map_err(|_| SegmentError::BadDescriptor(format!("negative '{key}': {value}")))
}

fn segment_bytes<'a>(body: &'a [u8], entry: &LlsdValue) -> Result<&'a [u8], SegmentError> {
    let offset = descriptor_field(entry, "offset")?;
    let size = descriptor_field(entry, "size")?;
    if size == 0 {
        return Err(SegmentError::Empty);
    }
    offset
        .checked_add(size)
        .filter(|&end| end <= body.len())
        .map(|end| &body[offset..end])
        .ok_or(SegmentError::OutOfRange {
            offset,
            size,
            body_len: body.len(),
        })
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>, SegmentError> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .take(MAX_SEGMENT_BYTES as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| SegmentError::Inflate(e.to_string()))?;
    if out.len() > MAX_SEGMENT_BYTES {
        return Err(SegmentError::Inflate(format!(
            "inflated size exceeds {MAX_SEGMENT_BYTES} bytes"
        )));
    }
    Ok(out)
}

fn malformed(msg: impl Into<String>) -> SegmentError {
    SegmentError::Malformed(msg.into())
}

fn u16_values(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
}

fn binary_field<'a>(record: &'a LlsdValue, key: &str) -> Result<Option<&'a [u8]>, SegmentError> {
    match record.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_binary()
            .map(Some)
            .ok_or_else(|| malformed(format!("'{key}' is {}, expected binary", value.kind()))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn real_components<const N: usize>(value: &LlsdValue, what: &str) -> Result<[f32; N], SegmentError> {
    let items = value
        .as_array()
        .filter(|items| items.len() == N)
        .ok_or_else(|| malformed(format!("{what} must be an array of {N} numbers")))?;
    let mut out = [0.0f32; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item
            .as_real()
            .ok_or_else(|| malformed(format!("{what} holds a {}", item.kind())))? as f32;
    }
    Ok(out)
}

fn domain3(
    domain: Option<&LlsdValue>,
    default: (Vector3, Vector3),
) -> Result<(Vector3, Vector3), SegmentError> {
    let Some(domain) = domain else {
        return Ok(default);
    };
    let min = match domain.get("Min") {
        Some(v) => Vector3::from_array(real_components::<3>(v, "domain Min")?),
        None => default.0,
    };
    let max = match domain.get("Max") {
        Some(v) => Vector3::from_array(real_components::<3>(v, "domain Max")?),
        None => default.1,
    };
    Ok((min, max))
}

fn domain2(
    domain: Option<&LlsdValue>,
    default: (Vector2, Vector2),
) -> Result<(Vector2, Vector2), SegmentError> {
    let Some(domain) = domain else {
        return Ok(default);
    };
    let min = match domain.get("Min") {
        Some(v) => {
            let [u, v] = real_components::<2>(v, "domain Min")?;
            Vector2::new(u, v)
        }
        None => default.0,
    };
    let max = match domain.get("Max") {
        Some(v) => {
            let [u, v] = real_components::<2>(v, "domain Max")?;
            Vector2::new(u, v)
        }
        None => default.1,
    };
    Ok((min, max))
}

#[inline]
fn unit(q: u16) -> f32 {
    f32::from(q) / QUANTA
}

fn dequantize3(bytes: &[u8], min: Vector3, max: Vector3, what: &str) -> Result<Vec<Vector3>, SegmentError> {
    if bytes.len() % 6 != 0 {
        return Err(malformed(format!(
            "{what} holds {} bytes, not a whole number of xyz triples",
            bytes.len()
        )));
    }
    let values: Vec<u16> = u16_values(bytes).collect();
    Ok(values
        .chunks_exact(3)
        .map(|q| Vector3::lerp(min, max, Vector3::new(unit(q[0]), unit(q[1]), unit(q[2]))))
        .collect())
}

fn dequantize2(bytes: &[u8], min: Vector2, max: Vector2) -> Result<Vec<Vector2>, SegmentError> {
    if bytes.len() % 4 != 0 {
        return Err(malformed(format!(
            "TexCoord0 holds {} bytes, not a whole number of uv pairs",
            bytes.len()
        )));
    }
    let values: Vec<u16> = u16_values(bytes).collect();
    Ok(values
        .chunks_exact(2)
        .map(|q| Vector2::lerp(min, max, Vector2::new(unit(q[0]), unit(q[1]))))
        .collect())
}

fn decode_submeshes(record: &LlsdValue) -> Result<FacetedMesh, SegmentError> {
    let submeshes = record
        .as_array()
        .ok_or_else(|| malformed(format!("expected submesh array, found {}", record.kind())))?;

    let mut faces = Vec::with_capacity(submeshes.len());
    for (id, submesh) in submeshes.iter().enumerate() {
        if submesh.get("NoGeometry").and_then(LlsdValue::as_bool) == Some(true) {
            continue;
        }
        faces.push(decode_submesh(id, submesh)?);
    }
    Ok(FacetedMesh::new(faces))
}

fn decode_submesh(id: usize, submesh: &LlsdValue) -> Result<Face, SegmentError> {
    let position_bytes = binary_field(submesh, "Position")?
        .ok_or_else(|| malformed(format!("submesh {id} has no Position")))?;
    let (min, max) = domain3(
        submesh.get("PositionDomain"),
        (DEFAULT_POSITION_MIN, DEFAULT_POSITION_MAX),
    )?;
    let positions = dequantize3(position_bytes, min, max, "Position")?;

    let normals = match binary_field(submesh, "Normal")? {
        Some(bytes) => {
            let normals = dequantize3(bytes, NORMAL_MIN, NORMAL_MAX, "Normal")?;
            if normals.len() != positions.len() {
                return Err(malformed(format!(
                    "submesh {id}: {} normals for {} positions",
                    normals.len(),
                    positions.len()
                )));
            }
            Some(normals)
        }
        None => None,
    };

    let tex_coords = match binary_field(submesh, "TexCoord0")? {
        Some(bytes) => {
            let (uv_min, uv_max) = domain2(
                submesh.get("TexCoord0Domain"),
                (DEFAULT_UV_MIN, DEFAULT_UV_MAX),
            )?;
            let uvs = dequantize2(bytes, uv_min, uv_max)?;
            if uvs.len() != positions.len() {
                return Err(malformed(format!(
                    "submesh {id}: {} texture coordinates for {} positions",
                    uvs.len(),
                    positions.len()
                )));
            }
            Some(uvs)
        }
        None => None,
    };

    let index_bytes = binary_field(submesh, "TriangleList")?
        .ok_or_else(|| malformed(format!("submesh {id} has no TriangleList")))?;
    if index_bytes.len() % 6 != 0 {
        return Err(malformed(format!(
            "submesh {id}: TriangleList of {} bytes is not whole triangles",
            index_bytes.len()
        )));
    }
    let indices: Vec<u16> = u16_values(index_bytes).collect();
    if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= positions.len()) {
        return Err(malformed(format!(
            "submesh {id}: index {bad} out of range for {} vertices",
            positions.len()
        )));
    }

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: normals.as_ref().map_or(Vector3::ZERO, |n| n[i]),
            tex_coord: tex_coords.as_ref().map_or(Vector2::ZERO, |t| t[i]),
        })
        .collect();

    Ok(Face {
        id,
        vertices,
        indices,
    })
}

fn decode_convex(record: &LlsdValue) -> Result<FacetedMesh, SegmentError> {
    if record.as_map().is_none() {
        return Err(malformed(format!(
            "expected convex hull map, found {}",
            record.kind()
        )));
    }
    let points = match binary_field(record, "BoundingVerts")? {
        Some(bytes) => bytes,
        None => binary_field(record, "Positions")?
            .ok_or_else(|| malformed("convex hull has no BoundingVerts"))?,
    };
    let (min, max) = domain3(Some(record), (DEFAULT_POSITION_MIN, DEFAULT_POSITION_MAX))?;
    let vertices = dequantize3(points, min, max, "BoundingVerts")?
        .into_iter()
        .map(|position| Vertex {
            position,
            ..Vertex::default()
        })
        .collect();
    Ok(FacetedMesh::new(vec![Face {
        id: 0,
        vertices,
        indices: Vec::new(),
    }]))
}

// ============================================================================
// AUTHORING
// ============================================================================

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32, min: f32, max: f32) -> u16 {
    if max <= min {
        return 0;
    }
    (((value - min) / (max - min)).clamp(0.0, 1.0) * QUANTA).round() as u16
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn real_array(values: &[f32]) -> LlsdValue {
    LlsdValue::Array(values.iter().map(|&v| LlsdValue::Real(f64::from(v))).collect())
}

fn bounds(points: impl Iterator<Item = Vector3>) -> (Vector3, Vector3) {
    points.fold(
        (
            Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            Vector3::new(f32::MIN, f32::MIN, f32::MIN),
        ),
        |(lo, hi), p| {
            (
                Vector3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Vector3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        },
    )
}

fn quantize3(points: impl Iterator<Item = Vector3>, min: Vector3, max: Vector3) -> Vec<u8> {
    let mut out = Vec::new();
    for p in points {
        push_u16(&mut out, quantize(p.x, min.x, max.x));
        push_u16(&mut out, quantize(p.y, min.y, max.y));
        push_u16(&mut out, quantize(p.z, min.z, max.z));
    }
    out
}

fn domain_value(min: &[f32], max: &[f32]) -> LlsdValue {
    LlsdValue::map([("Min", real_array(min)), ("Max", real_array(max))])
}

fn encode_face(face: &Face) -> LlsdValue {
    if face.vertices.is_empty() {
        return LlsdValue::map([("NoGeometry", LlsdValue::Boolean(true))]);
    }
    let (min, max) = bounds(face.vertices.iter().map(|v| v.position));
    let positions = quantize3(face.vertices.iter().map(|v| v.position), min, max);
    let normals = quantize3(face.vertices.iter().map(|v| v.normal), NORMAL_MIN, NORMAL_MAX);

    let (uv_min, uv_max) = face.vertices.iter().fold(
        (Vector2::new(f32::MAX, f32::MAX), Vector2::new(f32::MIN, f32::MIN)),
        |(lo, hi), v| {
            (
                Vector2::new(lo.x.min(v.tex_coord.x), lo.y.min(v.tex_coord.y)),
                Vector2::new(hi.x.max(v.tex_coord.x), hi.y.max(v.tex_coord.y)),
            )
        },
    );
    let mut uvs = Vec::with_capacity(face.vertices.len() * 4);
    for v in &face.vertices {
        push_u16(&mut uvs, quantize(v.tex_coord.x, uv_min.x, uv_max.x));
        push_u16(&mut uvs, quantize(v.tex_coord.y, uv_min.y, uv_max.y));
    }

    let mut indices = Vec::with_capacity(face.indices.len() * 2);
    for &i in &face.indices {
        push_u16(&mut indices, i);
    }

    LlsdValue::map([
        ("Position", LlsdValue::Binary(positions)),
        (
            "PositionDomain",
            domain_value(&min.to_array(), &max.to_array()),
        ),
        ("Normal", LlsdValue::Binary(normals)),
        ("TexCoord0", LlsdValue::Binary(uvs)),
        (
            "TexCoord0Domain",
            domain_value(&[uv_min.x, uv_min.y], &[uv_max.x, uv_max.y]),
        ),
        ("TriangleList", LlsdValue::Binary(indices)),
    ])
}

/// Encodes `mesh` as a LOD geometry record.
///
/// Faces land at the submesh index given by their `id`; gaps are written as
/// `NoGeometry` slots.
#[must_use]
pub fn encode_lod(mesh: &FacetedMesh) -> LlsdValue {
    let slots = mesh.faces.iter().map(|f| f.id + 1).max().unwrap_or(0);
    let mut submeshes = vec![LlsdValue::map([("NoGeometry", LlsdValue::Boolean(true))]); slots];
    for face in &mesh.faces {
        submeshes[face.id] = encode_face(face);
    }
    LlsdValue::Array(submeshes)
}

/// Encodes a point cloud as a `physics_convex` record.
#[must_use]
pub fn encode_convex(points: &[Vector3]) -> LlsdValue {
    let (min, max) = bounds(points.iter().copied());
    LlsdValue::map([
        (
            "BoundingVerts",
            LlsdValue::Binary(quantize3(points.iter().copied(), min, max)),
        ),
        ("Min", real_array(&min.to_array())),
        ("Max", real_array(&max.to_array())),
    ])
}

/// Assembles a mesh asset from geometry records.
///
/// ```rust
/// use primmesh_assets::mesh_asset::{encode_lod, MeshAssetWriter};
/// use primmesh_core::FacetedMesh;
///
/// let mut writer = MeshAssetWriter::new();
/// writer.segment("high_lod", &encode_lod(&FacetedMesh::default())).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MeshAssetWriter {
    header: BTreeMap<String, LlsdValue>,
    body: Vec<u8>,
}

impl MeshAssetWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compresses `record` and appends it as segment `name`.
    ///
    /// # Errors
    ///
    /// [`MeshAssetError::Write`] if encoding or compression fails.
    pub fn segment(&mut self, name: &str, record: &LlsdValue) -> MeshAssetResult<&mut Self> {
        let encoded = record
            .to_binary()
            .map_err(|e| MeshAssetError::Write(e.to_string()))?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&encoded)
            .map_err(|e| MeshAssetError::Write(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| MeshAssetError::Write(e.to_string()))?;
        self.raw_segment(name, &compressed)
    }

    /// Appends `bytes` unchanged as segment `name`.
    ///
    /// # Errors
    ///
    /// [`MeshAssetError::Write`] if the body outgrows 32-bit offsets.
    pub fn raw_segment(&mut self, name: &str, bytes: &[u8]) -> MeshAssetResult<&mut Self> {
        let offset = i32::try_from(self.body.len())
            .map_err(|_| MeshAssetError::Write("body exceeds i32 offsets".into()))?;
        let size = i32::try_from(bytes.len())
            .map_err(|_| MeshAssetError::Write("segment exceeds i32 size".into()))?;
        self.header.insert(
            name.to_owned(),
            LlsdValue::map([("offset", offset.into()), ("size", size.into())]),
        );
        self.body.extend_from_slice(bytes);
        Ok(self)
    }

    /// Adds a non-segment header entry such as `version`.
    pub fn header_entry(&mut self, key: &str, value: LlsdValue) -> &mut Self {
        self.header.insert(key.to_owned(), value);
        self
    }

    /// Serializes header and body.
    ///
    /// # Errors
    ///
    /// [`MeshAssetError::Header`] if the header cannot be encoded.
    pub fn finish(self) -> MeshAssetResult<Vec<u8>> {
        let mut out = LlsdValue::Map(self.header).to_binary()?;
        out.extend_from_slice(&self.body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlsdError;
    use primmesh_core::Uuid;

    fn triangle(id: usize, z: f32) -> Face {
        let v = |x: f32, y: f32| Vertex {
            position: Vector3::new(x, y, z),
            normal: Vector3::new(0.0, 0.0, 1.0),
            tex_coord: Vector2::new(x, y),
        };
        Face {
            id,
            vertices: vec![v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)],
            indices: vec![0, 1, 2],
        }
    }

    fn lod(faces: Vec<Face>) -> LlsdValue {
        encode_lod(&FacetedMesh::new(faces))
    }

    fn prim() -> Arc<Primitive> {
        Arc::new(Primitive::new(Uuid::from_u128(9), Default::default()))
    }

    #[test]
    fn test_high_lod_only() {
        let mut writer = MeshAssetWriter::new();
        writer.segment("high_lod", &lod(vec![triangle(0, 0.0)])).unwrap();
        let data = writer.finish().unwrap();

        let group = unpack(prim(), &data).unwrap();
        assert_eq!(group.tiers(), vec![LodTier::Lod1]);
    }

    #[test]
    fn test_lod_and_physics_tiers() {
        let mut writer = MeshAssetWriter::new();
        writer
            .segment("high_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .segment("low_lod", &lod(vec![triangle(0, 0.5)]))
            .unwrap()
            .segment("physics_mesh", &lod(vec![triangle(0, 1.0)]))
            .unwrap();
        let data = writer.finish().unwrap();

        let primitive = prim();
        let group = unpack(Arc::clone(&primitive), &data).unwrap();
        assert_eq!(
            group.tiers(),
            vec![LodTier::Physics, LodTier::Lod1, LodTier::Lod3]
        );
        for (_, entry) in group.iter() {
            assert!(Arc::ptr_eq(&entry.primitive, &primitive));
        }
    }

    #[test]
    fn test_header_must_be_map() {
        let data = LlsdValue::Integer(1).to_binary().unwrap();
        assert_eq!(
            MeshAsset::parse(&data).unwrap_err(),
            MeshAssetError::HeaderNotMap { found: "integer" }
        );
    }

    #[test]
    fn test_unreadable_header() {
        assert!(matches!(
            MeshAsset::parse(&[]),
            Err(MeshAssetError::Header(LlsdError::UnexpectedEof { offset: 0 }))
        ));
    }

    #[test]
    fn test_corrupt_tier_is_skipped() {
        let mut writer = MeshAssetWriter::new();
        writer
            .segment("high_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .raw_segment("low_lod", b"definitely not zlib")
            .unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        assert_eq!(asset.tiers(), vec![LodTier::Lod1]);
        assert_eq!(asset.skipped().len(), 1);
        assert_eq!(asset.skipped()[0].name, "low_lod");
        assert!(matches!(asset.skipped()[0].reason, SegmentError::Inflate(_)));
    }

    #[test]
    fn test_missing_lod1_rejects_group() {
        let mut writer = MeshAssetWriter::new();
        writer
            .raw_segment("high_lod", b"garbage")
            .unwrap()
            .segment("medium_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap();
        let data = writer.finish().unwrap();

        assert_eq!(
            unpack(prim(), &data).unwrap_err(),
            MeshAssetError::MissingTier(LodTier::Lod1)
        );
    }

    #[test]
    fn test_segment_out_of_range() {
        let header = LlsdValue::map([(
            "high_lod",
            LlsdValue::map([
                ("offset", LlsdValue::Integer(10)),
                ("size", LlsdValue::Integer(10)),
            ]),
        )]);
        let mut data = header.to_binary().unwrap();
        data.extend_from_slice(&[0u8; 4]);

        let asset = MeshAsset::parse(&data).unwrap();
        assert_eq!(
            asset.skipped()[0].reason,
            SegmentError::OutOfRange {
                offset: 10,
                size: 10,
                body_len: 4
            }
        );
    }

    #[test]
    fn test_dequantized_positions() {
        let mut writer = MeshAssetWriter::new();
        writer.segment("high_lod", &lod(vec![triangle(0, 0.25)])).unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        let face = &asset.mesh(LodTier::Lod1).unwrap().faces[0];
        let expected = triangle(0, 0.25);
        for (got, want) in face.vertices.iter().zip(&expected.vertices) {
            assert!((got.position - want.position).length() < 1e-4);
            assert!((got.normal - want.normal).length() < 1e-4);
        }
        assert_eq!(face.indices, expected.indices);
    }

    #[test]
    fn test_empty_submesh_keeps_face_ids() {
        let mut writer = MeshAssetWriter::new();
        writer.segment("high_lod", &lod(vec![triangle(1, 0.0)])).unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        let mesh = asset.mesh(LodTier::Lod1).unwrap();
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.faces[0].id, 1);
    }

    #[test]
    fn test_index_out_of_range_is_malformed() {
        let mut bad = triangle(0, 0.0);
        bad.indices = vec![0, 1, 7];
        let mut writer = MeshAssetWriter::new();
        writer
            .segment("high_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .segment("medium_lod", &lod(vec![bad]))
            .unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        assert!(matches!(
            asset.skipped()[0].reason,
            SegmentError::Malformed(_)
        ));
    }

    #[test]
    fn test_convex_hull_is_vertex_only() {
        let points = [
            Vector3::new(-1.0, -1.0, -1.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 1.0, -1.0),
        ];
        let mut writer = MeshAssetWriter::new();
        writer
            .segment("high_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .segment("physics_convex", &encode_convex(&points))
            .unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        let hull = asset.mesh(LodTier::Physics).unwrap();
        assert_eq!(hull.faces.len(), 1);
        assert_eq!(hull.vertex_count(), 3);
        assert_eq!(hull.triangle_count(), 0);
        assert!((hull.faces[0].vertices[1].position - points[1]).length() < 1e-4);
    }

    #[test]
    fn test_first_physics_segment_wins() {
        let mut writer = MeshAssetWriter::new();
        writer
            .segment("high_lod", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .segment("physics_shape", &lod(vec![triangle(0, 0.0)]))
            .unwrap()
            .segment("physics_convex", &encode_convex(&[Vector3::ONE, Vector3::ZERO]))
            .unwrap();
        let data = writer.finish().unwrap();

        let asset = MeshAsset::parse(&data).unwrap();
        assert_eq!(asset.mesh(LodTier::Physics).unwrap().triangle_count(), 1);
        assert!(asset.skipped().is_empty());
    }
}
