//! Camera component
//!
//! Describes how the scene is viewed from its owner: projection kind, the
//! normalized viewport it draws into and its clear settings. The renderer
//! pairs [`Camera::projection_matrix`] with [`Camera::view_matrix`] built from
//! the owner's world transform.

use std::fmt;
use std::str::FromStr;

use crate::ecs::component::{
    component_state_accessors, parse_attribute, Attribute, AttributeError, Component, ComponentKind,
    ComponentState, ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::{utils, Color, Mat4, Transform};

/// Projection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Perspective projection with a vertical field of view
    #[default]
    Perspective,
    /// Orthographic projection over the unit square
    Ortho,
    /// Orthographic projection in surface pixels, origin bottom left
    OrthoScreen,
}

impl ViewMode {
    /// Canonical name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Ortho => "ortho",
            Self::OrthoScreen => "ortho_screen",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perspective" => Ok(Self::Perspective),
            "ortho" => Ok(Self::Ortho),
            "ortho_screen" => Ok(Self::OrthoScreen),
            _ => Err(()),
        }
    }
}

/// Region of the surface a camera draws into, as fractions of its size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Viewport {
    /// The whole surface
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Pixel rectangle (x, y, width, height) on a surface of the given size
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixels(&self, surface: (u32, u32)) -> (f32, f32, f32, f32) {
        let (w, h) = (surface.0 as f32, surface.1 as f32);
        (self.x * w, self.y * h, self.width * w, self.height * h)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ())?;
        match parts.as_slice() {
            [x, y, width, height] if *width > 0.0 && *height > 0.0 => Ok(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => Err(()),
        }
    }
}

/// Camera component
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    state: ComponentState,
    /// Projection kind
    pub view_mode: ViewMode,
    /// Normalized viewport
    pub viewport: Viewport,
    /// Vertical field of view in degrees (perspective only)
    pub fov: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Clear colour
    pub background: Color,
    /// Clear colour and depth before drawing
    pub clear: bool,
    /// Skybox texture drawn behind everything
    pub skybox: Option<String>,
    /// Name of an object to keep looking at
    pub target: Option<String>,
}

impl Camera {
    /// Default perspective camera
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            view_mode: ViewMode::Perspective,
            viewport: Viewport::FULL,
            fov: 45.0,
            near: 0.1,
            far: 200.0,
            background: Color::BLACK,
            clear: true,
            skybox: None,
            target: None,
        }
    }

    /// Switch to perspective projection
    pub fn set_perspective(&mut self, fov: f32, near: f32, far: f32) {
        self.view_mode = ViewMode::Perspective;
        self.fov = fov;
        self.near = near;
        self.far = far;
    }

    /// Switch to an orthographic projection
    pub fn set_ortho(&mut self, screen_space: bool, near: f32, far: f32) {
        self.view_mode = if screen_space {
            ViewMode::OrthoScreen
        } else {
            ViewMode::Ortho
        };
        self.near = near;
        self.far = far;
    }

    /// Projection for a surface of `surface` pixels
    pub fn projection_matrix(&self, surface: (u32, u32)) -> Mat4 {
        let (_, _, width, height) = self.viewport.to_pixels(surface);
        let (near, far) = if (self.far - self.near).abs() > f32::EPSILON {
            (self.near, self.far)
        } else {
            (self.near, self.near + 1.0)
        };

        match self.view_mode {
            ViewMode::Perspective => {
                let aspect = if width > 0.0 && height > 0.0 { width / height } else { 1.0 };
                Mat4::new_perspective(aspect, utils::deg_to_rad(self.fov.clamp(1.0, 179.0)), near, far)
            }
            ViewMode::Ortho => Mat4::new_orthographic(0.0, 1.0, 0.0, 1.0, near, far),
            ViewMode::OrthoScreen => Mat4::new_orthographic(0.0, width.max(1.0), 0.0, height.max(1.0), near, far),
        }
    }

    /// View matrix for a camera placed at `world`; scale is ignored
    pub fn view_matrix(world: &Transform) -> Mat4 {
        world.rotation.inverse().to_homogeneous() * Mat4::new_translation(&-world.position)
    }
}

impl Component for Camera {
    component_state_accessors!();

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("view_mode", "view_mode", self.view_mode),
            Attribute::new("viewport", "rect", self.viewport),
            Attribute::new("fov", "f32", self.fov),
            Attribute::new("near", "f32", self.near),
            Attribute::new("far", "f32", self.far),
            Attribute::new("background", "color", self.background),
            Attribute::new("clear", "bool", self.clear),
            Attribute::new("skybox", "string", self.skybox.as_deref().unwrap_or("")),
            Attribute::new("target", "string", self.target.as_deref().unwrap_or("")),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "view_mode" => self.view_mode = parse_attribute(name, value, "perspective|ortho|ortho_screen")?,
            "viewport" => self.viewport = parse_attribute(name, value, "rect `x y width height`")?,
            "fov" => self.fov = parse_attribute(name, value, "f32")?,
            "near" => self.near = parse_attribute(name, value, "f32")?,
            "far" => self.far = parse_attribute(name, value, "f32")?,
            "background" => self.background = parse_attribute(name, value, "color `r g b [a]`")?,
            "clear" => self.clear = parse_attribute(name, value, "bool")?,
            "skybox" => self.skybox = non_empty(value),
            "target" => self.target = non_empty(value),
            _ => return Err(AttributeError::unknown(ComponentKind::Camera, name)),
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ComponentType for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;

    fn new(owner: GameObjectId) -> Self {
        Self::with_owner(owner)
    }

    stored_in_slot!(camera);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Quat, Vec3};
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::with_owner(GameObjectId::default())
    }

    #[test]
    fn defaults_are_perspective() {
        let cam = camera();
        assert_eq!(cam.view_mode, ViewMode::Perspective);
        assert_relative_eq!(cam.fov, 45.0);
        assert_relative_eq!(cam.near, 0.1);
        assert_relative_eq!(cam.far, 200.0);
        assert_eq!(cam.background, Color::BLACK);
        assert!(cam.clear);
    }

    #[test]
    fn view_matrix_moves_world_into_camera_frame() {
        let world = Transform::new(
            Vec3::new(0.0, 0.0, 10.0),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 1.0, 1.0),
        );
        let view = Camera::view_matrix(&world);

        let eye = view.transform_point(&Point3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(eye.coords, Vec3::zeros(), epsilon = 1e-5);

        // A point one unit along the camera's forward axis ends up on -Z.
        let ahead = world.position + world.rotation * -Vec3::z();
        let ahead = view.transform_point(&Point3::from(ahead));
        assert_relative_eq!(ahead.coords, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn screen_ortho_maps_pixels_to_clip_space() {
        let mut cam = camera();
        cam.set_ortho(true, -1.0, 1.0);
        let proj = cam.projection_matrix((800, 600));

        let corner = proj.transform_point(&Point3::new(800.0, 600.0, 0.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn viewport_and_mode_attributes_parse() {
        let mut cam = camera();
        cam.set_attribute("view_mode", "ortho").unwrap();
        cam.set_attribute("viewport", "0 0 0.5 1").unwrap();
        cam.set_attribute("background", "0.2 0.3 0.4").unwrap();
        cam.set_attribute("target", "player").unwrap();

        assert_eq!(cam.view_mode, ViewMode::Ortho);
        assert_relative_eq!(cam.viewport.width, 0.5);
        assert_eq!(cam.background, Color::new(0.2, 0.3, 0.4, 1.0));
        assert_eq!(cam.target.as_deref(), Some("player"));

        assert!(cam.set_attribute("view_mode", "fisheye").is_err());
        assert!(cam.set_attribute("viewport", "0 0 0 1").is_err());
    }

    #[test]
    fn degenerate_surface_still_yields_finite_projection() {
        let cam = camera();
        let proj = cam.projection_matrix((0, 0));
        assert!(proj.iter().all(|v| v.is_finite()));
    }
}
