//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the decomposed [`Transform`] used for
//! hierarchy composition.

use std::fmt;
use std::str::FromStr;

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale decomposed, applied as T * R * S.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from all three parts
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Recover position, rotation and scale from an affine matrix without shear.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale = Vec3::new(
            Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude(),
            Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude(),
            Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude(),
        );

        let rotation_matrix = Matrix3::new(
            matrix.m11 / scale.x, matrix.m12 / scale.y, matrix.m13 / scale.z,
            matrix.m21 / scale.x, matrix.m22 / scale.y, matrix.m23 / scale.z,
            matrix.m31 / scale.x, matrix.m32 / scale.y, matrix.m33 / scale.z,
        );

        Self {
            position,
            rotation: Quat::from_matrix(&rotation_matrix),
            scale,
        }
    }

    /// Compose `child` under `self`: the result places `child` in the frame
    /// that `self` is expressed in.
    pub fn combine(&self, child: &Self) -> Self {
        let mut rotation = self.rotation * child.rotation;
        rotation.renormalize();

        Self {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Get the inverse transform. Exact for uniform scale.
    pub fn inverse(&self) -> Self {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_scale.component_mul(&(inv_rotation * -self.position));

        Self {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Build a rotation from Euler angles in degrees (x = roll, y = pitch, z = yaw).
pub fn quat_from_euler_degrees(angles: &Vec3) -> Quat {
    Quat::from_euler_angles(
        utils::deg_to_rad(angles.x),
        utils::deg_to_rad(angles.y),
        utils::deg_to_rad(angles.z),
    )
}

/// Euler angles of `rotation` in degrees, same axis order as [`quat_from_euler_degrees`].
pub fn euler_degrees(rotation: &Quat) -> Vec3 {
    let (roll, pitch, yaw) = rotation.euler_angles();
    Vec3::new(
        utils::rad_to_deg(roll),
        utils::rad_to_deg(pitch),
        utils::rad_to_deg(yaw),
    )
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

/// RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a colour from its four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linear blend towards `other` by `t`.
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            utils::lerp(self.r, other.r, t),
            utils::lerp(self.g, other.g, t),
            utils::lerp(self.b, other.b, t),
            utils::lerp(self.a, other.a, t),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parses `"r g b"` or `"r g b a"`; alpha defaults to 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let channels = s
            .split_whitespace()
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        match channels.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b, 1.0)),
            [r, g, b, a] => Ok(Self::new(*r, *g, *b, *a)),
            _ => Err(format!("expected 3 or 4 channels, got {}", channels.len())),
        }
    }
}
