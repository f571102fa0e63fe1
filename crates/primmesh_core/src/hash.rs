//! # Mesh Key - Content Identity Hash
//!
//! 64-bit djb2 hash over everything that makes two primitives produce the
//! same displayed mesh: shape parameters, scale, detail level, sculpt/mesh
//! reference and per-face material state.
//!
//! ## Byte Layout
//!
//! ```text
//! seed 5381
//! ├── shape    path curve, hollow, profile curve, path begin/end, scale,
//! │            shear, twist, twist begin, radius offset, taper, revolutions,
//! │            skew, profile begin/end, hollow
//! ├── scale    x, y, z                     (f32, little-endian)
//! ├── lod      detail value                (f32, little-endian)
//! ├── sculpt   16 UUID bytes               (only if present)
//! └── faces    for face 0..7 if populated: (only if a table is present)
//!              r g b a, repeat u/v, offset u/v, rotation, glow,
//!              bump, shiny, fullbright (1.0 | 0.5), glow, texture UUID
//! ```
//!
//! Every step is `acc = acc * 33 + byte` with wrapping arithmetic.
//! `u16` folds low byte then high byte. `f32` always folds its little-endian
//! bytes so the result does not depend on the host.
//!
//! Hollow and glow are each folded twice. Existing keys depend on that, so
//! it stays.
//!
//! Not a cryptographic hash.

use crate::lod::DetailLevel;
use crate::math::Vector3;
use crate::prim::{Primitive, ShapeParams, TextureFace};

/// Initial accumulator value.
pub const MESH_KEY_SEED: u64 = 5381;

/// Number of material faces folded into the key.
pub const HASHED_FACE_COUNT: usize = 7;

/// Full-bright sentinel folded for a full-bright face.
const FULLBRIGHT_ON: f32 = 1.0;

/// Full-bright sentinel folded for a normally lit face.
const FULLBRIGHT_OFF: f32 = 0.5;

/// Running djb2 accumulator.
#[derive(Clone, Copy, Debug)]
struct Djb2(u64);

impl Djb2 {
    #[inline]
    fn byte(&mut self, c: u8) {
        self.0 = (self.0 << 5).wrapping_add(self.0).wrapping_add(u64::from(c));
    }

    #[inline]
    fn signed(&mut self, c: i8) {
        self.byte(c.to_le_bytes()[0]);
    }

    #[inline]
    fn short(&mut self, c: u16) {
        let [lo, hi] = c.to_le_bytes();
        self.byte(lo);
        self.byte(hi);
    }

    #[inline]
    fn float(&mut self, c: f32) {
        self.bytes(&c.to_le_bytes());
    }

    #[inline]
    fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.byte(b);
        }
    }

    fn shape(&mut self, s: &ShapeParams) {
        self.byte(s.path_curve as u8);
        self.short(s.profile_hollow);
        self.byte(s.profile_curve());
        self.short(s.path_begin);
        self.short(s.path_end);
        self.byte(s.path_scale_x);
        self.byte(s.path_scale_y);
        self.signed(s.path_shear_x);
        self.signed(s.path_shear_y);
        self.signed(s.path_twist);
        self.signed(s.path_twist_begin);
        self.signed(s.path_radius_offset);
        self.signed(s.path_taper_x);
        self.signed(s.path_taper_y);
        self.byte(s.path_revolutions);
        self.signed(s.path_skew);
        self.short(s.profile_begin);
        self.short(s.profile_end);
        self.short(s.profile_hollow);
    }

    fn face(&mut self, face: &TextureFace) {
        self.bytes(&face.rgba);
        self.float(face.repeat_u);
        self.float(face.repeat_v);
        self.float(face.offset_u);
        self.float(face.offset_v);
        self.float(face.rotation);
        self.float(face.glow);
        self.byte(face.bump as u8);
        self.byte(face.shiny as u8);
        self.float(if face.fullbright {
            FULLBRIGHT_ON
        } else {
            FULLBRIGHT_OFF
        });
        self.float(face.glow);
        self.bytes(face.texture_id.as_bytes());
    }
}

/// Computes the mesh key of `prim` displayed at `scale` and detail `lod`.
///
/// `scale` is passed separately from `prim.scale` so callers can key a
/// primitive at a scale other than the one it was authored with.
#[must_use]
pub fn mesh_key(prim: &Primitive, scale: Vector3, lod: f32) -> u64 {
    let mut hash = Djb2(MESH_KEY_SEED);

    hash.shape(&prim.shape);

    hash.float(scale.x);
    hash.float(scale.y);
    hash.float(scale.z);

    hash.float(lod);

    if let Some(sculpt) = &prim.sculpt {
        hash.bytes(sculpt.texture.as_bytes());
    }

    if let Some(textures) = &prim.textures {
        for index in 0..HASHED_FACE_COUNT {
            if let Some(face) = textures.face(index) {
                hash.face(face);
            }
        }
    }

    hash.0
}

/// Mesh key of `prim` at its own scale and the given detail level.
#[must_use]
pub fn mesh_key_for(prim: &Primitive, detail: DetailLevel) -> u64 {
    mesh_key(prim, prim.scale, detail.as_hash_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::{Bumpiness, PathCurve, SculptData, SculptType, Shininess, TextureEntry};
    use uuid::Uuid;

    fn textured_box(fullbright: bool) -> Primitive {
        let mut entry = TextureEntry::default();
        entry.set_face(
            0,
            TextureFace {
                fullbright,
                texture_id: Uuid::from_u128(0x89556747_24cb_43ed_920b_47caed15465f),
                ..TextureFace::default()
            },
        );
        Primitive::new(Uuid::nil(), ShapeParams::default()).with_textures(entry)
    }

    #[test]
    fn test_step_is_djb2() {
        let mut hash = Djb2(MESH_KEY_SEED);
        hash.byte(b'a');
        assert_eq!(hash.0, 5381 * 33 + 97);
    }

    #[test]
    fn test_short_folds_low_then_high() {
        let mut a = Djb2(MESH_KEY_SEED);
        a.short(0x0102);
        let mut b = Djb2(MESH_KEY_SEED);
        b.byte(0x02);
        b.byte(0x01);
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn test_float_is_little_endian() {
        let mut a = Djb2(MESH_KEY_SEED);
        a.float(1.0);
        let mut b = Djb2(MESH_KEY_SEED);
        b.bytes(&[0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn test_accumulator_wraps() {
        let mut hash = Djb2(u64::MAX);
        hash.byte(0xff);
        assert_eq!(hash.0, u64::MAX.wrapping_mul(33).wrapping_add(0xff));
    }

    #[test]
    fn test_deterministic_for_defaults() {
        let a = Primitive::default();
        let b = Primitive::default();
        assert_eq!(
            mesh_key(&a, a.scale, 3.0),
            mesh_key(&b, b.scale, 3.0)
        );
        assert_eq!(mesh_key_for(&a, DetailLevel::Highest), mesh_key(&a, a.scale, 3.0));
    }

    #[test]
    fn test_default_box_golden_key() {
        // Stored keys depend on this exact value.
        let prim = Primitive::default();
        assert_eq!(
            mesh_key_for(&prim, DetailLevel::Highest),
            17_411_682_462_807_258_587
        );
    }

    #[test]
    fn test_shape_sensitivity() {
        let base = Primitive::default();
        let key = mesh_key_for(&base, DetailLevel::Highest);

        let mut curve = base.clone();
        curve.shape.path_curve = PathCurve::Circle;
        assert_ne!(mesh_key_for(&curve, DetailLevel::Highest), key);

        let mut hollow = base.clone();
        hollow.shape.profile_hollow = 1;
        assert_ne!(mesh_key_for(&hollow, DetailLevel::Highest), key);

        let mut twist = base.clone();
        twist.shape.path_twist = -1;
        assert_ne!(mesh_key_for(&twist, DetailLevel::Highest), key);
    }

    #[test]
    fn test_scale_and_lod_sensitivity() {
        let prim = Primitive::default();
        let key = mesh_key(&prim, Vector3::ONE, 3.0);
        assert_ne!(mesh_key(&prim, Vector3::new(1.0, 1.0, 2.0), 3.0), key);
        assert_ne!(mesh_key(&prim, Vector3::ONE, 2.0), key);
    }

    #[test]
    fn test_sculpt_reference_sensitivity() {
        let base = Primitive::default();
        let sculpted = base
            .clone()
            .with_sculpt(SculptData::sculpt(Uuid::from_u128(7), SculptType::Sphere));
        let other = base
            .clone()
            .with_sculpt(SculptData::sculpt(Uuid::from_u128(8), SculptType::Sphere));

        let key = mesh_key_for(&base, DetailLevel::Highest);
        assert_ne!(mesh_key_for(&sculpted, DetailLevel::Highest), key);
        assert_ne!(
            mesh_key_for(&sculpted, DetailLevel::Highest),
            mesh_key_for(&other, DetailLevel::Highest)
        );
    }

    #[test]
    fn test_material_sensitivity() {
        let lit = textured_box(false);
        let bright = textured_box(true);
        assert_ne!(
            mesh_key_for(&lit, DetailLevel::Highest),
            mesh_key_for(&bright, DetailLevel::Highest)
        );

        let mut glowing = lit.clone();
        if let Some(textures) = glowing.textures.as_mut() {
            let mut face = *textures.face(0).unwrap();
            face.glow = 0.2;
            textures.set_face(0, face);
        }
        assert_ne!(
            mesh_key_for(&lit, DetailLevel::Highest),
            mesh_key_for(&glowing, DetailLevel::Highest)
        );
    }

    fn dressed_box() -> Primitive {
        let mut entry = TextureEntry::default();
        entry.set_face(
            0,
            TextureFace {
                rgba: [10, 20, 30, 40],
                repeat_u: 2.0,
                repeat_v: 0.5,
                offset_u: 0.25,
                offset_v: -0.25,
                rotation: 1.5,
                glow: 0.2,
                bump: Bumpiness::Bark,
                shiny: Shininess::Medium,
                fullbright: true,
                texture_id: Uuid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677),
            },
        );
        entry.set_face(
            2,
            TextureFace {
                glow: 0.75,
                bump: Bumpiness::Brightness,
                shiny: Shininess::High,
                texture_id: Uuid::from_u128(0xaa),
                ..TextureFace::default()
            },
        );
        Primitive::default().with_textures(entry)
    }

    #[test]
    fn test_dressed_box_golden_key() {
        // Pins the face field order, including the second glow fold.
        assert_eq!(
            mesh_key_for(&dressed_box(), DetailLevel::Highest),
            16_005_786_105_318_920_160
        );
    }

    #[test]
    fn test_every_face_field_changes_key() {
        let base = dressed_box();
        let key = mesh_key_for(&base, DetailLevel::Highest);
        let edits: [(&str, fn(&mut TextureFace)); 8] = [
            ("color", |f| f.rgba[3] = 41),
            ("repeat", |f| f.repeat_v = 0.75),
            ("offset", |f| f.offset_u = 0.5),
            ("rotation", |f| f.rotation = -1.5),
            ("bump", |f| f.bump = Bumpiness::Bricks),
            ("shiny", |f| f.shiny = Shininess::Low),
            ("fullbright", |f| f.fullbright = false),
            ("texture", |f| f.texture_id = Uuid::from_u128(0xbb)),
        ];

        for (name, edit) in edits {
            let mut prim = base.clone();
            if let Some(textures) = prim.textures.as_mut() {
                let mut face = *textures.face(0).unwrap();
                edit(&mut face);
                textures.set_face(0, face);
            }
            assert_ne!(mesh_key_for(&prim, DetailLevel::Highest), key, "{name}");
        }
    }

    #[test]
    fn test_unpopulated_faces_are_skipped() {
        let bare = Primitive::default();
        let empty_table = Primitive::default().with_textures(TextureEntry::default());
        assert_eq!(
            mesh_key_for(&bare, DetailLevel::Highest),
            mesh_key_for(&empty_table, DetailLevel::Highest)
        );
    }

    #[test]
    fn test_eighth_face_is_not_hashed() {
        let mut a = TextureEntry::default();
        a.set_face(0, TextureFace::default());
        let mut b = a.clone();
        b.set_face(
            HASHED_FACE_COUNT,
            TextureFace {
                glow: 1.0,
                ..TextureFace::default()
            },
        );
        let pa = Primitive::default().with_textures(a);
        let pb = Primitive::default().with_textures(b);
        assert_eq!(
            mesh_key_for(&pa, DetailLevel::Highest),
            mesh_key_for(&pb, DetailLevel::Highest)
        );
    }
}
