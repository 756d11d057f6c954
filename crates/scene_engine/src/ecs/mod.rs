//! Scene graph: game objects, components and phase dispatch
//!
//! Objects live in a [`World`] arena and are addressed by [`GameObjectId`].
//! Each object owns a transform plus at most one component per
//! [`ComponentKind`], and can hold named children.

pub mod component;
pub mod components;
pub mod dispatch;
pub mod entity;
pub mod registry;
pub mod world;

pub use component::{Attribute, AttributeError, Component, ComponentContext, ComponentKind, ComponentType};
pub use dispatch::{Frame, ObjectContext, Phase};
pub use entity::{Callback, CallbackSlot, GameObject, GameObjectId, ObjectFlags};
pub use registry::{is_valid_name, Registry, RegistryError};
pub use world::{HierarchyError, World};

#[cfg(test)]
mod tests;
