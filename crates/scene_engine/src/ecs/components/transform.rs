//! Local transform component
//!
//! Position, rotation and scale relative to the parent object. World space
//! values are composed on demand by [`World`](crate::ecs::World).

use crate::ecs::component::{
    component_state_accessors, format_vec3, parse_vec3, Attribute, AttributeError, Component, ComponentKind,
    ComponentState, ComponentType,
};
use crate::ecs::components::ComponentSet;
use crate::ecs::GameObjectId;
use crate::foundation::math::{euler_degrees, quat_from_euler_degrees, Mat4, Quat, Transform, Vec3};

/// Transform component, present on every object.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    state: ComponentState,
    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
}

impl TransformComponent {
    /// Identity transform owned by `owner`
    pub fn at_origin(owner: GameObjectId) -> Self {
        let identity = Transform::identity();
        Self {
            state: ComponentState::new(owner),
            position: identity.position,
            rotation: identity.rotation,
            scale: identity.scale,
        }
    }

    /// Local transform as a plain value
    pub fn local(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.scale)
    }

    /// Overwrite all three parts
    pub fn set_local(&mut self, local: &Transform) {
        self.position = local.position;
        self.rotation = local.rotation;
        self.scale = local.scale;
    }

    /// Local T * R * S matrix
    pub fn local_matrix(&self) -> Mat4 {
        self.local().to_matrix()
    }

    /// Move along the parent's axes
    pub fn translate(&mut self, delta: &Vec3) {
        self.position += delta;
    }

    /// Move along this object's own axes
    pub fn translate_local(&mut self, delta: &Vec3) {
        self.position += self.rotation * delta;
    }

    /// Set position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Rotate about the parent's axes by Euler angles in degrees
    pub fn rotate(&mut self, degrees: &Vec3) {
        self.rotation = quat_from_euler_degrees(degrees) * self.rotation;
        self.rotation.renormalize();
    }

    /// Rotate about this object's own axes by Euler angles in degrees
    pub fn rotate_local(&mut self, degrees: &Vec3) {
        self.rotation *= quat_from_euler_degrees(degrees);
        self.rotation.renormalize();
    }

    /// Set rotation from Euler angles in degrees
    pub fn set_angle(&mut self, degrees: &Vec3) {
        self.rotation = quat_from_euler_degrees(degrees);
    }

    /// Set rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Euler angles in degrees
    pub fn euler_angles(&self) -> Vec3 {
        euler_degrees(&self.rotation)
    }

    /// Multiply scale component-wise
    pub fn scale_by(&mut self, factor: &Vec3) {
        self.scale.component_mul_assign(factor);
    }

    /// Set scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Forward direction (-Z) in the parent's frame
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// Right direction (+X) in the parent's frame
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Up direction (+Y) in the parent's frame
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Turn so that [`Self::forward`] points at `target` (parent frame).
    ///
    /// Returns `false` and leaves the rotation alone when `target` is at the
    /// current position or straight along `up`.
    pub fn look_at(&mut self, target: &Vec3, up: &Vec3) -> bool {
        let backward = self.position - target;
        if backward.norm_squared() <= f32::EPSILON || backward.cross(up).norm_squared() <= f32::EPSILON {
            return false;
        }
        self.rotation = Quat::face_towards(&backward, up);
        true
    }
}

impl Component for TransformComponent {
    component_state_accessors!();

    fn attributes(&self) -> Vec<Attribute> {
        vec![
            Attribute::new("position", "vec3", format_vec3(&self.position)),
            Attribute::new("rotation", "vec3", format_vec3(&self.euler_angles())),
            Attribute::new("scale", "vec3", format_vec3(&self.scale)),
        ]
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), AttributeError> {
        match name {
            "position" => self.position = parse_vec3(name, value)?,
            "rotation" => self.set_angle(&parse_vec3(name, value)?),
            "scale" => self.scale = parse_vec3(name, value)?,
            _ => return Err(AttributeError::unknown(ComponentKind::Transform, name)),
        }
        Ok(())
    }
}

impl ComponentType for TransformComponent {
    const KIND: ComponentKind = ComponentKind::Transform;

    fn new(owner: GameObjectId) -> Self {
        Self::at_origin(owner)
    }

    fn slot(set: &ComponentSet) -> Option<&Self> {
        Some(&set.transform)
    }

    fn slot_mut(set: &mut ComponentSet) -> Option<&mut Self> {
        Some(&mut set.transform)
    }

    fn get_or_insert(set: &mut ComponentSet, _owner: GameObjectId) -> &mut Self {
        &mut set.transform
    }

    fn insert(_set: &mut ComponentSet, _owner: GameObjectId) -> bool {
        false
    }

    fn remove(_set: &mut ComponentSet) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform() -> TransformComponent {
        TransformComponent::at_origin(GameObjectId::default())
    }

    #[test]
    fn translate_local_follows_rotation() {
        let mut t = transform();
        t.set_angle(&Vec3::new(0.0, 90.0, 0.0));
        t.translate_local(&Vec3::new(0.0, 0.0, -1.0));

        assert_relative_eq!(t.position, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);

        t.translate(&Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(t.position, Vec3::new(-1.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn rotations_accumulate_and_stay_unit() {
        let mut t = transform();
        for _ in 0..360 {
            t.rotate(&Vec3::new(0.0, 1.0, 0.0));
            t.rotate_local(&Vec3::new(0.5, 0.0, 0.0));
        }
        assert_relative_eq!(t.rotation.quaternion().norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn set_angle_round_trips_euler() {
        let mut t = transform();
        t.set_angle(&Vec3::new(0.0, 45.0, 0.0));
        assert_relative_eq!(t.euler_angles(), Vec3::new(0.0, 45.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn scale_by_multiplies_components() {
        let mut t = transform();
        t.set_scale(Vec3::new(2.0, 1.0, 1.0));
        t.scale_by(&Vec3::new(0.5, 3.0, 1.0));
        assert_relative_eq!(t.scale, Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut t = transform();
        t.set_position(Vec3::new(0.0, 0.0, 10.0));
        assert!(t.look_at(&Vec3::new(5.0, 0.0, 10.0), &Vec3::y()));
        assert_relative_eq!(t.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(t.up(), Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn look_at_rejects_degenerate_targets() {
        let mut t = transform();
        let before = t.rotation;
        assert!(!t.look_at(&Vec3::zeros(), &Vec3::y()));
        assert!(!t.look_at(&Vec3::new(0.0, 4.0, 0.0), &Vec3::y()));
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn attributes_edit_parts() {
        let mut t = transform();
        t.set_attribute("position", "1 2 3").unwrap();
        t.set_attribute("scale", "2 2 2").unwrap();
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::new(2.0, 2.0, 2.0));

        assert!(matches!(
            t.set_attribute("skew", "1"),
            Err(AttributeError::Unknown { component: ComponentKind::Transform, .. })
        ));
        assert_eq!(t.attributes()[0].value, "1 2 3");
    }

    #[test]
    fn transform_slot_cannot_be_added_or_removed() {
        let mut set = ComponentSet::new(GameObjectId::default());
        assert!(!TransformComponent::insert(&mut set, GameObjectId::default()));
        assert!(!TransformComponent::remove(&mut set));
        assert!(TransformComponent::slot(&set).is_some());
    }
}
