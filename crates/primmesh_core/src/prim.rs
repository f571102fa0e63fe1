//! # Primitive Descriptors
//!
//! Parametric shape description of one object part, as handed over by the
//! scene reader. The pipeline only ever reads these.
//!
//! ## Quantized Shape Parameters
//!
//! Shape parameters are kept in the integer form used on the wire and in
//! scene files. The content hash folds these integers directly, so two
//! descriptors parsed from the same source always hash identically. Float
//! accessors are provided for meshers.
//!
//! | Field | Storage | Float value |
//! |-------|---------|-------------|
//! | begin / end / hollow | `u16` | `n * 0.00002` (end: `1 - n * 0.00002`) |
//! | path scale | `u8` | `(200 - n) * 0.01` |
//! | shear / taper / twist / skew / radius offset | `i8` | `n * 0.01` |
//! | revolutions | `u8` | `1 + n * 0.015` |

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math::Vector3;

/// Quantum used for begin/end/hollow cuts.
pub const CUT_QUANTA: f32 = 0.000_02;

/// Quantum used for scale, shear, taper, twist, skew and radius offset.
pub const SCALE_QUANTA: f32 = 0.01;

/// Quantum used for path revolutions.
pub const REV_QUANTA: f32 = 0.015;

/// Number of per-face material slots a texture entry can carry.
pub const MAX_FACES: usize = 8;

/// Path curve of the extrusion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PathCurve {
    /// Straight line (boxes, cylinders, prisms).
    #[default]
    Line = 0x10,
    /// Circle (spheres, tori, tubes, rings).
    Circle = 0x20,
    /// Alternate circle used by some legacy shapes.
    Circle2 = 0x30,
    /// Test curve.
    Test = 0x40,
    /// Flexible path.
    Flexible = 0x80,
}

/// Cross-section profile shape (low nibble of the profile curve byte).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProfileShape {
    /// Circle
    Circle = 0,
    /// Square
    #[default]
    Square = 1,
    /// Isosceles triangle
    IsoTriangle = 2,
    /// Equilateral triangle
    EqualTriangle = 3,
    /// Right triangle
    RightTriangle = 4,
    /// Half circle
    HalfCircle = 5,
}

/// Hollow shape (high nibble of the profile curve byte).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HoleType {
    /// Same as the profile
    #[default]
    Same = 0x00,
    /// Circle
    Circle = 0x10,
    /// Square
    Square = 0x20,
    /// Triangle
    Triangle = 0x30,
}

/// Shape parameter set of a primitive, in quantized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Extrusion path.
    pub path_curve: PathCurve,
    /// Cross-section shape.
    pub profile_shape: ProfileShape,
    /// Hollow shape.
    pub hole_type: HoleType,
    /// Path cut begin.
    pub path_begin: u16,
    /// Path cut end (0 means uncut).
    pub path_end: u16,
    /// Top size X.
    pub path_scale_x: u8,
    /// Top size Y.
    pub path_scale_y: u8,
    /// Top shear X.
    pub path_shear_x: i8,
    /// Top shear Y.
    pub path_shear_y: i8,
    /// Twist at end.
    pub path_twist: i8,
    /// Twist at begin.
    pub path_twist_begin: i8,
    /// Radius offset (tori, rings).
    pub path_radius_offset: i8,
    /// Taper X.
    pub path_taper_x: i8,
    /// Taper Y.
    pub path_taper_y: i8,
    /// Revolutions.
    pub path_revolutions: u8,
    /// Skew.
    pub path_skew: i8,
    /// Profile cut begin.
    pub profile_begin: u16,
    /// Profile cut end (0 means uncut).
    pub profile_end: u16,
    /// Hollow amount.
    pub profile_hollow: u16,
}

impl Default for ShapeParams {
    /// The default box.
    fn default() -> Self {
        Self {
            path_curve: PathCurve::Line,
            profile_shape: ProfileShape::Square,
            hole_type: HoleType::Same,
            path_begin: 0,
            path_end: 0,
            path_scale_x: 100,
            path_scale_y: 100,
            path_shear_x: 0,
            path_shear_y: 0,
            path_twist: 0,
            path_twist_begin: 0,
            path_radius_offset: 0,
            path_taper_x: 0,
            path_taper_y: 0,
            path_revolutions: 0,
            path_skew: 0,
            profile_begin: 0,
            profile_end: 0,
            profile_hollow: 0,
        }
    }
}

impl ShapeParams {
    /// Packed profile curve byte: shape in the low nibble, hole in the high.
    #[inline]
    #[must_use]
    pub const fn profile_curve(&self) -> u8 {
        self.profile_shape as u8 | self.hole_type as u8
    }

    /// Path cut begin in `[0, 1]`.
    #[must_use]
    pub fn path_begin_f32(&self) -> f32 {
        f32::from(self.path_begin) * CUT_QUANTA
    }

    /// Path cut end in `[0, 1]`.
    #[must_use]
    pub fn path_end_f32(&self) -> f32 {
        1.0 - f32::from(self.path_end) * CUT_QUANTA
    }

    /// Top size as `(x, y)`.
    #[must_use]
    pub fn path_scale_f32(&self) -> (f32, f32) {
        (
            (200.0 - f32::from(self.path_scale_x)) * SCALE_QUANTA,
            (200.0 - f32::from(self.path_scale_y)) * SCALE_QUANTA,
        )
    }

    /// Top shear as `(x, y)`.
    #[must_use]
    pub fn path_shear_f32(&self) -> (f32, f32) {
        (
            f32::from(self.path_shear_x) * SCALE_QUANTA,
            f32::from(self.path_shear_y) * SCALE_QUANTA,
        )
    }

    /// Taper as `(x, y)`.
    #[must_use]
    pub fn path_taper_f32(&self) -> (f32, f32) {
        (
            f32::from(self.path_taper_x) * SCALE_QUANTA,
            f32::from(self.path_taper_y) * SCALE_QUANTA,
        )
    }

    /// Twist as `(begin, end)`.
    #[must_use]
    pub fn path_twist_f32(&self) -> (f32, f32) {
        (
            f32::from(self.path_twist_begin) * SCALE_QUANTA,
            f32::from(self.path_twist) * SCALE_QUANTA,
        )
    }

    /// Radius offset.
    #[must_use]
    pub fn path_radius_offset_f32(&self) -> f32 {
        f32::from(self.path_radius_offset) * SCALE_QUANTA
    }

    /// Skew.
    #[must_use]
    pub fn path_skew_f32(&self) -> f32 {
        f32::from(self.path_skew) * SCALE_QUANTA
    }

    /// Revolutions (1.0 to about 4.0).
    #[must_use]
    pub fn path_revolutions_f32(&self) -> f32 {
        1.0 + f32::from(self.path_revolutions) * REV_QUANTA
    }

    /// Profile cut begin in `[0, 1]`.
    #[must_use]
    pub fn profile_begin_f32(&self) -> f32 {
        f32::from(self.profile_begin) * CUT_QUANTA
    }

    /// Profile cut end in `[0, 1]`.
    #[must_use]
    pub fn profile_end_f32(&self) -> f32 {
        1.0 - f32::from(self.profile_end) * CUT_QUANTA
    }

    /// Hollow in `[0, 1)`.
    #[must_use]
    pub fn profile_hollow_f32(&self) -> f32 {
        f32::from(self.profile_hollow) * CUT_QUANTA
    }
}

/// How a sculpt reference is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SculptType {
    /// Sculpt map stitched as a sphere.
    Sphere = 1,
    /// Sculpt map stitched as a torus.
    Torus = 2,
    /// Sculpt map stitched as a plane.
    Plane = 3,
    /// Sculpt map stitched as a cylinder.
    Cylinder = 4,
    /// Reference is a mesh asset, not a texture.
    Mesh = 5,
}

/// Sculpt or mesh override of a primitive's parametric shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SculptData {
    /// Texture (plain sculpt) or mesh asset (mesh sculpt) identifier.
    pub texture: Uuid,
    /// Interpretation of `texture`.
    pub kind: SculptType,
    /// Turn the surface inside out.
    pub invert: bool,
    /// Mirror along X.
    pub mirror: bool,
}

impl SculptData {
    /// A plain sculpt map of the given kind.
    #[must_use]
    pub const fn sculpt(texture: Uuid, kind: SculptType) -> Self {
        Self {
            texture,
            kind,
            invert: false,
            mirror: false,
        }
    }

    /// A mesh asset reference.
    #[must_use]
    pub const fn mesh(asset: Uuid) -> Self {
        Self::sculpt(asset, SculptType::Mesh)
    }

    /// True if the reference names a mesh asset.
    #[inline]
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        self.kind == SculptType::Mesh
    }
}

/// Bump mapping applied to a face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Bumpiness {
    /// No bump map
    #[default]
    None = 0,
    /// Brightness map
    Brightness = 1,
    /// Darkness map
    Darkness = 2,
    /// Wood grain
    Woodgrain = 3,
    /// Bark
    Bark = 4,
    /// Bricks
    Bricks = 5,
    /// Checker
    Checker = 6,
    /// Concrete
    Concrete = 7,
}

/// Shininess applied to a face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Shininess {
    /// Not shiny
    #[default]
    None = 0x00,
    /// Low
    Low = 0x40,
    /// Medium
    Medium = 0x80,
    /// High
    High = 0xC0,
}

/// Material state of one face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureFace {
    /// RGBA tint, one byte per channel.
    pub rgba: [u8; 4],
    /// Texture repeats across U.
    pub repeat_u: f32,
    /// Texture repeats across V.
    pub repeat_v: f32,
    /// Texture offset along U.
    pub offset_u: f32,
    /// Texture offset along V.
    pub offset_v: f32,
    /// Texture rotation in radians.
    pub rotation: f32,
    /// Glow intensity.
    pub glow: f32,
    /// Bump mapping.
    pub bump: Bumpiness,
    /// Shininess.
    pub shiny: Shininess,
    /// Ignore scene lighting.
    pub fullbright: bool,
    /// Diffuse texture.
    pub texture_id: Uuid,
}

impl Default for TextureFace {
    fn default() -> Self {
        Self {
            rgba: [255, 255, 255, 255],
            repeat_u: 1.0,
            repeat_v: 1.0,
            offset_u: 0.0,
            offset_v: 0.0,
            rotation: 0.0,
            glow: 0.0,
            bump: Bumpiness::None,
            shiny: Shininess::None,
            fullbright: false,
            texture_id: Uuid::nil(),
        }
    }
}

/// Face-indexed material table.
///
/// A face without an override falls back to the default face, if there is
/// one. A face with neither is unpopulated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureEntry {
    /// Material used by faces without an override.
    pub default_face: Option<TextureFace>,
    /// Per-face overrides.
    pub faces: [Option<TextureFace>; MAX_FACES],
}

impl TextureEntry {
    /// A table whose every face uses `face`.
    #[must_use]
    pub fn uniform(face: TextureFace) -> Self {
        Self {
            default_face: Some(face),
            faces: [None; MAX_FACES],
        }
    }

    /// Material for face `index`, if populated.
    #[must_use]
    pub fn face(&self, index: usize) -> Option<&TextureFace> {
        self.faces
            .get(index)
            .and_then(Option::as_ref)
            .or(self.default_face.as_ref())
    }

    /// Sets the override for face `index`. Out-of-range indices are ignored.
    pub fn set_face(&mut self, index: usize, face: TextureFace) {
        if let Some(slot) = self.faces.get_mut(index) {
            *slot = Some(face);
        }
    }
}

/// One object part: shape, scale, sculpt override and materials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Part identifier (used for logging only).
    pub id: Uuid,
    /// Parametric shape.
    pub shape: ShapeParams,
    /// Object scale in meters.
    pub scale: Vector3,
    /// Sculpt map or mesh asset override.
    pub sculpt: Option<SculptData>,
    /// Material table.
    pub textures: Option<TextureEntry>,
}

impl Default for Primitive {
    /// Half-meter default box with no materials.
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            shape: ShapeParams::default(),
            scale: Vector3::new(0.5, 0.5, 0.5),
            sculpt: None,
            textures: None,
        }
    }
}

impl Primitive {
    /// Creates a primitive with the given shape and unit scale.
    #[must_use]
    pub fn new(id: Uuid, shape: ShapeParams) -> Self {
        Self {
            id,
            shape,
            scale: Vector3::ONE,
            sculpt: None,
            textures: None,
        }
    }

    /// Builder-style sculpt override.
    #[must_use]
    pub fn with_sculpt(mut self, sculpt: SculptData) -> Self {
        self.sculpt = Some(sculpt);
        self
    }

    /// Builder-style material table.
    #[must_use]
    pub fn with_textures(mut self, textures: TextureEntry) -> Self {
        self.textures = Some(textures);
        self
    }

    /// Builder-style scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }
}
