//! GUI texture component
//!
//! A screen-space quad. The owner's world position gives its placement in
//! surface pixels, origin at the bottom left; the world scale stretches the
//! quad and the pixel offsets nudge it.

use crate::ecs::component::{
    component_state_accessors, parse_attribute, Attribute, AttributeError, Component, ComponentContext,
    ComponentKind, ComponentState, ComponentType,
};
use crate::ecs::GameObjectId;
use crate::foundation::math::{Color, Mat4, Transform};
use crate::render::GuiDraw;

/// GUI texture component
#[derive(Debug, Clone, PartialEq)]
pub struct GuiTexture {
    state: ComponentState,
    /// Texture resource name
    pub texture: Option<String>,
    /// Horizontal offset in pixels
    pub pixel_offset_x: i32,
    /// Vertical offset in pixels
    pub pixel_offset_y: i32,
    /// Width in pixels before scaling
    pub width: f32,
    /// Height in pixels before scaling
    pub height: f32,
    /// Tint colour
    pub color: Color,
    color_apply_force: f32,
}

impl GuiTexture {
    /// Empty 0x0 quad
    pub fn with_owner(owner: GameObjectId) -> Self {
        Self {
            state: ComponentState::new(owner),
            texture: None,
            pixel_offset_x: 0,
            pixel_offset_y: 0,
            width: 0.0,
            height: 0.0,
            color: Color::WHITE,
            color_apply_force: 0.0,
        }
    }

    /// Tint strength in `[0, 1]`
    pub const fn color_apply_force(&self) -> f32 {
        self.color_apply_force
    }

    /// Set the tint strength, clamped to `[0, 1]`
    pub fn set_color_apply_force(&mut self, force: f32) {
        self.color_apply_force = if force.is_nan() { 0.0 } else { force.clamp(0.0, 1.0) };
    }

    /// Pixel rectangle (x, y, width, height) when placed at `world`
    #[allow(clippy::cast_precision_loss)]
    pub fn screen_rect(&self, world: &Transform) -> (f32, f32, f32, f32) {
        (
            world.position.x + self.pixel_offset_x as f32,
            world.position.y + self.pixel_offset_y as f32,
            self.width * world.scale.x,
            self.height * world.scale.y,
        )
    }

    /// Whether the pixel `(x, y)` falls inside the quad placed at `world`
    pub fn hit_test(&self, world: &Transform, x: f32, y: f32) -> bool {
        let (left, bottom, width, height) = self.screen_rect(world);
        x >= left && x <= left + width && y >= bottom && y <= bottom + height
    }
}

impl Component for GuiTexture {
    component_state_accessors!();

    fn on_render(&mut self, ctx: &mut ComponentContext<'_, '_>, _projection: &Mat4, _model_view: &Mat4) {
        let Some(texture) = &self.texture else {
            return;
        };

        let (x, y, width, height) = self.screen_rect(ctx.world_transform);
        let draw = GuiDraw {
            owner: ctx.owner,
            texture: texture.clone(),
            color: self.color,
            x,
            y,
            width,
            height,
        };
        if let Err(e) = ctx.frame.renderer.draw_gui(draw) {
            log::warn!("'{}': gui draw failed: {}", ctx.owner_name, e);
        }
    }

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("texture", "string", self.texture.as_deref().unwrap_or("")),
            Attribute::new("pixel_offset_x", "i32", self.pixel_offset_x),
            Attribute::new("pixel_offset_y", "i32", self.pixel_offset_y),
            Attribute::new("width", "f32", self.width),
            Attribute::new("height", "f32", self.height),
            Attribute::new("color", "color", self.color),
            Attribute::new("color_apply_force", "f32", self.color_apply_force),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "texture" => {
                let value = value.trim();
                self.texture = (!value.is_empty()).then(|| value.to_string());
            }
            "pixel_offset_x" => self.pixel_offset_x = parse_attribute(name, value, "i32")?,
            "pixel_offset_y" => self.pixel_offset_y = parse_attribute(name, value, "i32")?,
            "width" => self.width = parse_attribute(name, value, "f32")?,
            "height" => self.height = parse_attribute(name, value, "f32")?,
            "color" => self.color = parse_attribute(name, value, "color `r g b [a]`")?,
            "color_apply_force" => self.set_color_apply_force(parse_attribute(name, value, "f32")?),
            _ => return Err(AttributeError::unknown(ComponentKind::GuiTexture, name)),
        }
        Ok(())
    }
}

impl ComponentType for GuiTexture {
    const KIND: ComponentKind = ComponentKind::GuiTexture;

    fn new(owner: GameObjectId) -> Self {
        Self::with_owner(owner)
    }

    stored_in_slot!(gui_texture);
}
