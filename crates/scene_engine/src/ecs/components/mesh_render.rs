//! Mesh render component

use crate::ecs::component::{
    component_state_accessors, parse_attribute, Attribute, AttributeError, Component, ComponentContext,
    ComponentKind, ComponentState, ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::{Color, Mat4};
use crate::render::MeshDraw;

/// Shader used when none is set explicitly
pub const DEFAULT_SHADER: &str = "__textureShader";

/// Draws a mesh with the owner's accumulated model-view matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRender {
    state: ComponentState,
    mesh: Option<String>,
    texture: Option<String>,
    shader: String,
    color: Color,
    apply_force: f32,
    /// Blend as transparent geometry
    pub transparent: bool,
    /// Cull back faces
    pub backface_culling: bool,
}

impl MeshRender {
    /// Mesh renderer with no mesh assigned
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            mesh: None,
            texture: None,
            shader: DEFAULT_SHADER.to_string(),
            color: Color::WHITE,
            apply_force: 0.0,
            transparent: false,
            backface_culling: true,
        }
    }

    /// Mesh resource name
    pub fn mesh(&self) -> Option<&str> {
        self.mesh.as_deref()
    }

    /// Assign the mesh to draw
    pub fn set_mesh(&mut self, mesh: impl Into<String>) {
        self.mesh = Some(mesh.into());
    }

    /// Texture resource name
    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    /// Assign a texture
    pub fn set_texture(&mut self, texture: impl Into<String>) {
        self.texture = Some(texture.into());
    }

    /// Shader program name
    pub fn shader(&self) -> &str {
        &self.shader
    }

    /// Assign the shader program
    pub fn set_shader(&mut self, shader: impl Into<String>) {
        self.shader = shader.into();
    }

    /// Tint colour
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Set the tint colour and how strongly it replaces the texture colour.
    pub fn set_color(&mut self, color: Color, apply_force: f32) {
        self.color = color;
        self.set_apply_force(apply_force);
    }

    /// Tint strength in `[0, 1]`
    pub const fn apply_force(&self) -> f32 {
        self.apply_force
    }

    /// Set the tint strength, clamped to `[0, 1]`
    pub fn set_apply_force(&mut self, apply_force: f32) {
        self.apply_force = if apply_force.is_nan() { 0.0 } else { apply_force.clamp(0.0, 1.0) };
    }
}

impl Component for MeshRender {
    component_state_accessors!();

    fn on_render(&mut self, ctx: &mut ComponentContext<'_, '_>, projection: &Mat4, model_view: &Mat4) {
        let Some(mesh) = &self.mesh else {
            return;
        };

        let draw = MeshDraw {
            owner: ctx.owner,
            mesh: mesh.clone(),
            texture: self.texture.clone(),
            shader: self.shader.clone(),
            color: self.color,
            apply_force: self.apply_force,
            transparent: self.transparent,
            backface_culling: self.backface_culling,
            projection: *projection,
            model_view: *model_view,
        };
        if let Err(e) = ctx.frame.renderer.draw_mesh(draw) {
            log::warn!("'{}': mesh draw failed: {}", ctx.owner_name, e);
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("mesh", "string", self.mesh().unwrap_or("")),
            Attribute::new("texture", "string", self.texture().unwrap_or("")),
            Attribute::new("shader", "string", &self.shader),
            Attribute::new("color", "color", self.color),
            Attribute::new("apply_force", "f32", self.apply_force),
            Attribute::new("transparent", "bool", self.transparent),
            Attribute::new("backface_culling", "bool", self.backface_culling),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "mesh" => self.set_mesh(value.trim()),
            "texture" => self.set_texture(value.trim()),
            "shader" => self.set_shader(value.trim()),
            "color" => self.color = parse_attribute(name, value, "color `r g b [a]`")?,
            "apply_force" => self.set_apply_force(parse_attribute(name, value, "f32")?),
            "transparent" => self.transparent = parse_attribute(name, value, "bool")?,
            "backface_culling" => self.backface_culling = parse_attribute(name, value, "bool")?,
            _ => return Err(AttributeError::unknown(ComponentKind::MeshRender, name)),
        }
        Ok(())
    }
}

impl ComponentType for MeshRender {
    const KIND: ComponentKind = ComponentKind::MeshRender;

    fn new(owner: GameObjectId) -> Self {
        Self::with_owner(owner)
    }

    stored_in_slot!(mesh_render);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_use_texture_shader() {
        let mesh = MeshRender::with_owner(GameObjectId::default());
        assert_eq!(mesh.shader(), DEFAULT_SHADER);
        assert_eq!(mesh.mesh(), None);
        assert_eq!(mesh.color(), Color::WHITE);
    }

    #[test]
    fn apply_force_is_clamped() {
        let mut mesh = MeshRender::with_owner(GameObjectId::default());
        mesh.set_color(Color::new(1.0, 0.0, 0.0, 1.0), 3.0);
        assert_relative_eq!(mesh.apply_force(), 1.0);

        mesh.set_apply_force(-0.5);
        assert_relative_eq!(mesh.apply_force(), 0.0);

        mesh.set_attribute("apply_force", "0.25").unwrap();
        assert_relative_eq!(mesh.apply_force(), 0.25);
    }

    #[test]
    fn string_attributes_assign_resources() {
        let mut mesh = MeshRender::with_owner(GameObjectId::default());
        mesh.set_attribute("mesh", "cube").unwrap();
        mesh.set_attribute("texture", "crate.png").unwrap();

        assert_eq!(mesh.mesh(), Some("cube"));
        assert_eq!(mesh.texture(), Some("crate.png"));
        assert!(mesh.set_attribute("transparent", "maybe").is_err());
    }
}
