//! Vector types shared by primitive descriptors and produced meshes.
//!
//! `#[repr(C)]` + `Pod` so vertex buffers can be handed to an uploader as
//! raw bytes.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D vector - scale, position, normal
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// Creates a new vector
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit scale
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Component-wise linear interpolation between `min` and `max`.
    #[must_use]
    pub fn lerp(min: Self, max: Self, t: Self) -> Self {
        Self::new(
            min.x + (max.x - min.x) * t.x,
            min.y + (max.y - min.y) * t.y,
            min.z + (max.z - min.z) * t.z,
        )
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// 2D vector - texture coordinates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector2 {
    /// U / X component
    pub x: f32,
    /// V / Y component
    pub y: f32,
}

impl Vector2 {
    /// Creates a new vector
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Component-wise linear interpolation between `min` and `max`.
    #[must_use]
    pub fn lerp(min: Self, max: Self, t: Self) -> Self {
        Self::new(min.x + (max.x - min.x) * t.x, min.y + (max.y - min.y) * t.y)
    }
}
