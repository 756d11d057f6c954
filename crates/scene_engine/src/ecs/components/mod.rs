//! Concrete component types and the per-object component set

use crate::ecs::component::{Component, ComponentKind};
use crate::ecs::GameObjectId;

/// Implements the slot half of [`ComponentType`](crate::ecs::ComponentType)
/// for a type stored in an optional [`ComponentSet`] field.
macro_rules! stored_in_slot {
    ($field:ident) => {
        fn slot(set: &$crate::ecs::components::ComponentSet) -> Option<&Self> {
            set.$field.as_ref()
        }

        fn slot_mut(set: &mut $crate::ecs::components::ComponentSet) -> Option<&mut Self> {
            set.$field.as_mut()
        }

        fn get_or_insert(
            set: &mut $crate::ecs::components::ComponentSet,
            owner: $crate::ecs::GameObjectId,
        ) -> &mut Self {
            set.$field.get_or_insert_with(|| Self::new(owner))
        }

        fn insert(set: &mut $crate::ecs::components::ComponentSet, owner: $crate::ecs::GameObjectId) -> bool {
            if set.$field.is_some() {
                return false;
            }
            set.$field = Some(Self::new(owner));
            true
        }

        fn remove(set: &mut $crate::ecs::components::ComponentSet) -> bool {
            set.$field.take().is_some()
        }
    };
}

pub mod audio_source;
pub mod camera;
pub mod gui_texture;
pub mod mesh_render;
pub mod particle_emitter;
pub mod probe;
pub mod transform;

pub use audio_source::{AudioSource, PlaybackState};
pub use camera::{Camera, ViewMode, Viewport};
pub use gui_texture::GuiTexture;
pub use mesh_render::MeshRender;
pub use particle_emitter::{Particle, ParticleEmitter, Span};
pub use probe::{Journal, Probe, Probe1, Probe2, Probe3};
pub use transform::TransformComponent;

/// Every component an object owns, one slot per kind.
///
/// The transform slot is always filled; all others start empty.
#[derive(Debug)]
pub struct ComponentSet {
    pub(crate) camera: Option<Camera>,
    pub(crate) mesh_render: Option<MeshRender>,
    pub(crate) particle_emitter: Option<ParticleEmitter>,
    pub(crate) gui_texture: Option<GuiTexture>,
    pub(crate) audio_source: Option<AudioSource>,
    pub(crate) transform: TransformComponent,
    pub(crate) probe1: Option<Probe1>,
    pub(crate) probe2: Option<Probe2>,
    pub(crate) probe3: Option<Probe3>,
}

impl ComponentSet {
    pub(crate) fn new(owner: GameObjectId) -> Self {
        Self {
            camera: None,
            mesh_render: None,
            particle_emitter: None,
            gui_texture: None,
            audio_source: None,
            transform: TransformComponent::at_origin(owner),
            probe1: None,
            probe2: None,
            probe3: None,
        }
    }

    /// Component of `kind`, if present
    pub fn get(&self, kind: ComponentKind) -> Option<&dyn Component> {
        match kind {
            ComponentKind::Camera => self.camera.as_ref().map(|c| c as &dyn Component),
            ComponentKind::MeshRender => self.mesh_render.as_ref().map(|c| c as &dyn Component),
            ComponentKind::ParticleEmitter => self.particle_emitter.as_ref().map(|c| c as &dyn Component),
            ComponentKind::GuiTexture => self.gui_texture.as_ref().map(|c| c as &dyn Component),
            ComponentKind::AudioSource => self.audio_source.as_ref().map(|c| c as &dyn Component),
            ComponentKind::Transform => Some(&self.transform),
            ComponentKind::Probe1 => self.probe1.as_ref().map(|c| c as &dyn Component),
            ComponentKind::Probe2 => self.probe2.as_ref().map(|c| c as &dyn Component),
            ComponentKind::Probe3 => self.probe3.as_ref().map(|c| c as &dyn Component),
            ComponentKind::Base | ComponentKind::NotDefined => None,
        }
    }

    /// Mutable component of `kind`, if present
    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut dyn Component> {
        match kind {
            ComponentKind::Camera => self.camera.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::MeshRender => self.mesh_render.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::ParticleEmitter => self.particle_emitter.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::GuiTexture => self.gui_texture.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::AudioSource => self.audio_source.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::Transform => Some(&mut self.transform),
            ComponentKind::Probe1 => self.probe1.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::Probe2 => self.probe2.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::Probe3 => self.probe3.as_mut().map(|c| c as &mut dyn Component),
            ComponentKind::Base | ComponentKind::NotDefined => None,
        }
    }

    /// Present kinds in dispatch order
    pub fn kinds(&self) -> Vec<ComponentKind> {
        ComponentKind::STORABLE
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect()
    }

    /// Number of present components, transform included
    pub fn len(&self) -> usize {
        self.kinds().len()
    }

    /// Never true: the transform is always present
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// All present components in dispatch order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn Component> + '_ {
        let Self {
            camera,
            mesh_render,
            particle_emitter,
            gui_texture,
            audio_source,
            transform,
            probe1,
            probe2,
            probe3,
        } = self;

        camera
            .as_mut()
            .map(|c| c as &mut dyn Component)
            .into_iter()
            .chain(mesh_render.as_mut().map(|c| c as &mut dyn Component))
            .chain(particle_emitter.as_mut().map(|c| c as &mut dyn Component))
            .chain(gui_texture.as_mut().map(|c| c as &mut dyn Component))
            .chain(audio_source.as_mut().map(|c| c as &mut dyn Component))
            .chain(std::iter::once(transform as &mut dyn Component))
            .chain(probe1.as_mut().map(|c| c as &mut dyn Component))
            .chain(probe2.as_mut().map(|c| c as &mut dyn Component))
            .chain(probe3.as_mut().map(|c| c as &mut dyn Component))
    }
}
