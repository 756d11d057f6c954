//! Scene management
//!
//! The [`SceneManager`] owns the [`World`](crate::ecs::World) and drives it:
//! one call to [`SceneManager::run_frame`] dispatches the event, input, loop
//! and render phases over every root object, in that order.
//!
//! ## Level transitions
//!
//! ```text
//! load_level("two", build)
//!   destroy every root that is not preserved (subtrees included)
//!   build(&mut world)
//!   init every new object
//! ```

mod scene_manager;

pub use scene_manager::{SceneManager, SceneStats};
