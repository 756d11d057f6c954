//! # Scene Engine
//!
//! A scene-graph runtime: named game objects arranged in a forest, each
//! owning a transform and a closed set of components, driven frame by frame
//! through the event, input, loop and render phases.
//!
//! ## Features
//!
//! - **Arena-backed hierarchy**: objects addressed by generational handles,
//!   cycles rejected, world transforms composed on demand
//! - **Name registry**: validated, unique names and sequential ids
//! - **Components**: camera, mesh renderer, particle emitter, GUI texture,
//!   audio source and test probes, dispatched through one trait
//! - **Headless backends**: rendering and audio are collaborator traits with
//!   null and recording implementations
//! - **Debug console**: inspect objects and edit attributes by name
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! let mut scene = SceneManager::new(SceneConfig::default());
//! scene.load_level("intro", |world| -> Result<(), RegistryError> {
//!     let cube = world.spawn("cube")?;
//!     if let Some(object) = world.get_mut(cube) {
//!         object.mesh_render().set_mesh("cube");
//!         object.set_behaviour_fn(|ctx| {
//!             let dt = ctx.time().delta;
//!             if let Some(transform) = ctx.transform_mut() {
//!                 transform.rotate(&Vec3::new(0.0, 90.0 * dt, 0.0));
//!             }
//!         });
//!     }
//!     Ok(())
//! })?;
//!
//! let mut renderer = NullRenderer::default();
//! let mut audio = NullAudio;
//! scene.run_frame(&mut renderer, &mut audio, &Mat4::identity(), &Mat4::identity());
//! # Ok::<(), RegistryError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod audio;
pub mod config;
pub mod core;
pub mod debug;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{AudioBackend, NullAudio, RecordingAudio},
        config::{Config, ConfigError},
        core::config::{ApplicationConfig, EngineConfig, SceneConfig},
        debug::{Console, ConsoleError},
        ecs::{
            components::{AudioSource, Camera, GuiTexture, MeshRender, ParticleEmitter, TransformComponent},
            CallbackSlot, Component, ComponentKind, ComponentType, Frame, GameObject, GameObjectId, ObjectContext,
            Phase, RegistryError, World,
        },
        foundation::{
            math::{Color, Mat4, Quat, Transform, Vec3},
            time::{FrameTime, Stopwatch, Timer},
        },
        input::{InputEvent, InputState, KeyCode, MouseButton},
        render::{NullRenderer, RecordingRenderer, RenderBackend},
        scene::{SceneManager, SceneStats},
    };
}
