//! Component trait, kinds and attribute editing
//!
//! Components form a closed set: each concrete type has one [`ComponentKind`]
//! and one slot in [`ComponentSet`]. The [`Component`] trait carries the phase
//! hooks (all no-ops by default) and the attribute interface used by the debug
//! console; [`ComponentType`] adds the static, slot-level operations.

use std::fmt;
use std::str::FromStr;

use crate::ecs::components::ComponentSet;
use crate::ecs::dispatch::Frame;
use crate::ecs::GameObjectId;
use crate::foundation::math::{Mat4, Transform, Vec3};

/// Identifies a component type. Discriminants are the stable numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    /// Abstract base; never stored
    Base = 0,
    /// [`Camera`](crate::ecs::components::Camera)
    Camera = 1,
    /// [`MeshRender`](crate::ecs::components::MeshRender)
    MeshRender = 2,
    /// [`ParticleEmitter`](crate::ecs::components::ParticleEmitter)
    ParticleEmitter = 3,
    /// [`GuiTexture`](crate::ecs::components::GuiTexture)
    GuiTexture = 4,
    /// [`AudioSource`](crate::ecs::components::AudioSource)
    AudioSource = 5,
    /// [`TransformComponent`](crate::ecs::components::TransformComponent)
    Transform = 6,
    /// Reserved test slot
    Probe1 = 7,
    /// Reserved test slot
    Probe2 = 8,
    /// Reserved test slot
    Probe3 = 9,
    /// Sentinel for unknown names and ids
    NotDefined = 10,
}

impl ComponentKind {
    /// Every kind that can be stored on an object, in dispatch order
    pub const STORABLE: [Self; 9] = [
        Self::Camera,
        Self::MeshRender,
        Self::ParticleEmitter,
        Self::GuiTexture,
        Self::AudioSource,
        Self::Transform,
        Self::Probe1,
        Self::Probe2,
        Self::Probe3,
    ];

    /// Stable numeric id
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Kind for a numeric id, [`Self::NotDefined`] when out of range
    pub const fn from_id(id: u8) -> Self {
        match id {
            0 => Self::Base,
            1 => Self::Camera,
            2 => Self::MeshRender,
            3 => Self::ParticleEmitter,
            4 => Self::GuiTexture,
            5 => Self::AudioSource,
            6 => Self::Transform,
            7 => Self::Probe1,
            8 => Self::Probe2,
            9 => Self::Probe3,
            _ => Self::NotDefined,
        }
    }

    /// Canonical string name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Camera => "camera",
            Self::MeshRender => "mesh_render",
            Self::ParticleEmitter => "particle_emitter",
            Self::GuiTexture => "gui_texture",
            Self::AudioSource => "audio_source",
            Self::Transform => "transform",
            Self::Probe1 => "probe1",
            Self::Probe2 => "probe2",
            Self::Probe3 => "probe3",
            Self::NotDefined => "not_defined",
        }
    }

    /// Kind for a canonical name, [`Self::NotDefined`] when unknown
    pub fn from_name(name: &str) -> Self {
        (0..Self::NotDefined.id())
            .map(Self::from_id)
            .find(|kind| kind.name() == name)
            .unwrap_or(Self::NotDefined)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enabled flag and owner back-reference carried by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentState {
    enabled: bool,
    owner: GameObjectId,
}

impl ComponentState {
    /// Enabled state owned by `owner`
    pub const fn new(owner: GameObjectId) -> Self {
        Self { enabled: true, owner }
    }
}

/// What a component hook sees of its owner and the running frame.
pub struct ComponentContext<'c, 'f> {
    /// Owning object
    pub owner: GameObjectId,
    /// Owner's name
    pub owner_name: &'c str,
    /// Owner's composed world transform
    pub world_transform: &'c Transform,
    /// Frame being dispatched
    pub frame: &'c mut Frame<'f>,
}

impl ComponentContext<'_, '_> {
    /// Owner's world position
    pub fn world_position(&self) -> Vec3 {
        self.world_transform.position
    }
}

/// One editable attribute as shown by the debug console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name
    pub name: &'static str,
    /// Human readable type, e.g. `"f32"` or `"vec3"`
    pub type_name: &'static str,
    /// Current value rendered as text
    pub value: String,
}

impl Attribute {
    /// Build an attribute row from any displayable value
    pub fn new(name: &'static str, type_name: &'static str, value: impl fmt::Display) -> Self {
        Self {
            name,
            type_name,
            value: value.to_string(),
        }
    }
}

/// Attribute editing errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// Component has no such attribute
    #[error("component `{component}` has no attribute `{attribute}`")]
    Unknown {
        /// Component that was asked
        component: ComponentKind,
        /// Requested attribute
        attribute: String,
    },

    /// Value text could not be parsed
    #[error("invalid value `{value}` for `{attribute}`: expected {expected}")]
    InvalidValue {
        /// Attribute being set
        attribute: String,
        /// Offending text
        value: String,
        /// Expected type
        expected: &'static str,
    },
}

impl AttributeError {
    /// Shorthand for [`AttributeError::Unknown`]
    pub fn unknown(component: ComponentKind, attribute: &str) -> Self {
        Self::Unknown {
            component,
            attribute: attribute.to_string(),
        }
    }
}

/// Parse `value` as `T`, reporting failures against `attribute`.
pub fn parse_attribute<T: FromStr>(attribute: &str, value: &str, expected: &'static str) -> Result<T, AttributeError> {
    value.trim().parse().map_err(|_| AttributeError::InvalidValue {
        attribute: attribute.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Parse `"x y z"` into a vector.
pub fn parse_vec3(attribute: &str, value: &str) -> Result<Vec3, AttributeError> {
    let invalid = || AttributeError::InvalidValue {
        attribute: attribute.to_string(),
        value: value.to_string(),
        expected: "vec3 `x y z`",
    };

    let parts = value
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(invalid()),
    }
}

/// Render a vector as `"x y z"`.
pub fn format_vec3(v: &Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

/// Behaviour shared by every component.
///
/// Hooks run only while the component is enabled and its owner is active.
pub trait Component: fmt::Debug {
    /// Kind of this component
    fn kind(&self) -> ComponentKind;

    /// Enabled flag and owner
    fn state(&self) -> &ComponentState;

    /// Mutable enabled flag and owner
    fn state_mut(&mut self) -> &mut ComponentState;

    /// Event phase hook
    fn on_event(&mut self, _ctx: &mut ComponentContext<'_, '_>) {}

    /// Input phase hook
    fn on_input(&mut self, _ctx: &mut ComponentContext<'_, '_>) {}

    /// Loop phase hook
    fn on_loop(&mut self, _ctx: &mut ComponentContext<'_, '_>) {}

    /// Render phase hook; `model_view` already includes the owner's local transform
    fn on_render(&mut self, _ctx: &mut ComponentContext<'_, '_>, _projection: &Mat4, _model_view: &Mat4) {}

    /// Editable attributes and their current values
    fn attributes(&self) -> Vec<Attribute> {
        Vec::new()
    }

    /// Set an attribute from its text form
    fn set_attribute(&mut self, name: &str, _value: &str) -> Result<(), AttributeError> {
        Err(AttributeError::unknown(self.kind(), name))
    }

    /// Whether hooks run
    fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// Set the enabled flag
    fn set_state(&mut self, enabled: bool) {
        self.state_mut().enabled = enabled;
    }

    /// Enable hooks
    fn enable(&mut self) {
        self.set_state(true);
    }

    /// Disable hooks
    fn disable(&mut self) {
        self.set_state(false);
    }

    /// Owning object
    fn owner(&self) -> GameObjectId {
        self.state().owner
    }
}

/// Static side of a concrete component type: its kind, construction and
/// where it lives inside a [`ComponentSet`].
pub trait ComponentType: Component + Sized {
    /// Kind tag of this type
    const KIND: ComponentKind;

    /// Fresh, enabled instance owned by `owner`
    fn new(owner: GameObjectId) -> Self;

    /// Stored instance, if any
    fn slot(set: &ComponentSet) -> Option<&Self>;

    /// Stored instance, if any
    fn slot_mut(set: &mut ComponentSet) -> Option<&mut Self>;

    /// Stored instance, constructing one first if the slot is empty
    fn get_or_insert(set: &mut ComponentSet, owner: GameObjectId) -> &mut Self;

    /// Store a fresh instance; `false` if one already exists
    fn insert(set: &mut ComponentSet, owner: GameObjectId) -> bool;

    /// Drop the stored instance; `false` if there was none or it cannot be removed
    fn remove(set: &mut ComponentSet) -> bool;
}

/// Implements the [`Component`] accessors every concrete type shares.
macro_rules! component_state_accessors {
    () => {
        fn kind(&self) -> $crate::ecs::component::ComponentKind {
            <Self as $crate::ecs::component::ComponentType>::KIND
        }

        fn state(&self) -> &$crate::ecs::component::ComponentState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut $crate::ecs::component::ComponentState {
            &mut self.state
        }
    };
}

pub(crate) use component_state_accessors;
