//! Scene Manager - frame loop and level transitions

use crate::audio::AudioBackend;
use crate::core::config::SceneConfig;
use crate::ecs::{Frame, GameObjectId, Phase, World};
use crate::foundation::math::Mat4;
use crate::foundation::time::{FrameTime, Stopwatch, Timer};
use crate::input::{InputEvent, InputState};
use crate::render::RenderBackend;

/// Counters gathered while running frames
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneStats {
    /// Frames dispatched
    pub frames: u64,
    /// Completed level transitions
    pub levels_loaded: u32,
    /// Objects destroyed by level transitions
    pub objects_unloaded: usize,
    /// Live objects after the last frame
    pub objects: usize,
    /// Registered objects after the last frame
    pub registered: usize,
    /// Wall time of the last frame in microseconds
    pub last_frame_micros: u64,
}

/// Owns the world and runs frames over it
#[derive(Debug)]
pub struct SceneManager {
    world: World,
    input: InputState,
    timer: Timer,
    config: SceneConfig,
    stats: SceneStats,
    running: bool,
    level: Option<String>,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneManager {
    /// Create a manager with an empty world
    pub fn new(config: SceneConfig) -> Self {
        let timer = config.fixed_delta.map_or_else(Timer::new, Timer::fixed);
        log::debug!(
            "Scene manager created (max objects: {:?}, fixed delta: {:?})",
            config.max_objects,
            config.fixed_delta
        );

        Self {
            world: World::with_config(&config),
            input: InputState::new(),
            timer,
            config,
            stats: SceneStats::default(),
            running: true,
            level: None,
        }
    }

    /// The world
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Input that the next frame will see
    pub const fn input(&self) -> &InputState {
        &self.input
    }

    /// Input, mutably
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Queue an input event for the next frame. `Quit` stops the manager.
    pub fn push_input(&mut self, event: InputEvent) {
        if event == InputEvent::Quit {
            log::info!("Quit requested");
            self.running = false;
        }
        self.input.push(event);
    }

    /// Frame timer
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Counters so far
    pub const fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Name of the loaded level
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    /// Whether frames should keep running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Stop after the current frame
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Dispatch all four phases over every root, then clear the frame's
    /// input events.
    pub fn run_frame(
        &mut self,
        renderer: &mut dyn RenderBackend,
        audio: &mut dyn AudioBackend,
        projection: &Mat4,
        view: &Mat4,
    ) -> FrameTime {
        let time = self.timer.tick();
        let stopwatch = Stopwatch::start_new();

        {
            let mut frame = Frame::new(time, &self.input, renderer, audio);
            for phase in Phase::ALL {
                self.world.run_phase(phase, &mut frame, projection, view);
            }
        }
        self.input.begin_frame();

        self.stats.frames += 1;
        self.stats.objects = self.world.len();
        self.stats.registered = self.world.registered_count();
        self.stats.last_frame_micros = stopwatch.elapsed_micros();

        if self.config.log_frame_stats {
            log::debug!(
                "Frame {}: dt={:.4}s objects={} registered={} took={}us",
                time.frame,
                time.delta,
                self.stats.objects,
                self.stats.registered,
                self.stats.last_frame_micros
            );
        }
        time
    }

    /// Run a frame using the matrices of the camera on `camera`. Falls back
    /// to identity matrices when it has no camera.
    pub fn run_frame_with_camera(
        &mut self,
        camera: GameObjectId,
        renderer: &mut dyn RenderBackend,
        audio: &mut dyn AudioBackend,
    ) -> FrameTime {
        let (projection, view) = self
            .world
            .camera_matrices(camera, renderer.surface_size())
            .unwrap_or_else(|| {
                log::warn!("Object has no camera, rendering with identity matrices");
                (Mat4::identity(), Mat4::identity())
            });
        self.run_frame(renderer, audio, &projection, &view)
    }

    /// Destroy every parentless object that is not preserved, subtrees
    /// included. Returns how many roots were destroyed.
    pub fn unload_unpreserved(&mut self) -> usize {
        let doomed: Vec<GameObjectId> = self
            .world
            .iter()
            .filter(|(_, object)| object.parent().is_none() && !object.is_preserved())
            .map(|(id, _)| id)
            .collect();

        let destroyed = doomed
            .into_iter()
            .filter(|id| self.world.destroy(*id, true))
            .count();
        self.stats.objects_unloaded += destroyed;
        destroyed
    }

    /// Replace the current level: unload unpreserved roots, let `build`
    /// populate the world, then initialize everything new.
    pub fn load_level<R>(&mut self, name: impl Into<String>, build: impl FnOnce(&mut World) -> R) -> R {
        let name = name.into();
        let unloaded = self.unload_unpreserved();
        log::info!(
            "Loading level '{}' ({} roots unloaded, {} objects kept)",
            name,
            unloaded,
            self.world.len()
        );

        let result = build(&mut self.world);
        let initialized = self.world.init_all();
        log::debug!("Level '{}': {} objects initialized", name, initialized);

        self.level = Some(name);
        self.stats.levels_loaded += 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;
    use crate::ecs::components::{Journal, Probe1};
    use crate::render::{NullRenderer, RecordingRenderer};

    #[test]
    fn frame_runs_phases_in_order() {
        let mut scene = SceneManager::new(SceneConfig::new().with_fixed_delta(0.25));
        let journal = Journal::default();
        scene.load_level("test", |world| {
            let id = world.spawn("probe").unwrap();
            world
                .get_mut(id)
                .unwrap()
                .component_or_insert::<Probe1>()
                .attach_journal(journal.clone());
        });

        let time = scene.run_frame(
            &mut NullRenderer::default(),
            &mut RecordingAudio::new(),
            &Mat4::identity(),
            &Mat4::identity(),
        );

        assert_eq!(time.frame, 1);
        assert!((time.delta - 0.25).abs() < f32::EPSILON);
        assert_eq!(
            *journal.borrow(),
            vec![
                "probe:probe1:event".to_string(),
                "probe:probe1:input".to_string(),
                "probe:probe1:loop".to_string(),
                "probe:probe1:render".to_string(),
            ]
        );
        assert_eq!(scene.stats().frames, 1);
        assert_eq!(scene.stats().registered, 1);
    }

    #[test]
    fn level_transition_keeps_preserved_roots() {
        let mut scene = SceneManager::default();
        let (keep, child, drop) = scene.load_level("one", |world| {
            let keep = world.spawn("player").unwrap();
            let child = world.spawn("weapon").unwrap();
            world.add_child(keep, child);
            world.preserve(keep, false);
            let drop = world.spawn("enemy").unwrap();
            (keep, child, drop)
        });

        let spawned = scene.load_level("two", |world| world.spawn("door").unwrap());

        let world = scene.world();
        assert!(world.contains(keep));
        assert!(world.contains(child));
        assert!(!world.contains(drop));
        assert_eq!(world.find("enemy"), None);
        assert!(world.get(spawned).unwrap().is_initialized());
        assert_eq!(scene.level(), Some("two"));
        assert_eq!(scene.stats().levels_loaded, 2);
        assert_eq!(scene.stats().objects_unloaded, 1);
    }

    #[test]
    fn start_callbacks_run_once_when_the_level_loads() {
        let mut scene = SceneManager::default();
        let starts = Journal::default();
        let log = starts.clone();
        scene.load_level("one", move |world| {
            let id = world.spawn("hero").unwrap();
            world
                .get_mut(id)
                .unwrap()
                .set_start_fn(move |ctx| log.borrow_mut().push(format!("{:?}", ctx.time().frame)));
        });
        scene.run_frame(
            &mut NullRenderer::default(),
            &mut RecordingAudio::new(),
            &Mat4::identity(),
            &Mat4::identity(),
        );

        assert_eq!(*starts.borrow(), vec!["0".to_string()]);
    }

    #[test]
    fn quit_event_stops_the_manager() {
        let mut scene = SceneManager::default();
        assert!(scene.is_running());
        scene.push_input(InputEvent::Quit);
        assert!(!scene.is_running());
        assert!(scene.input().quit_requested());

        scene.run_frame(
            &mut NullRenderer::default(),
            &mut RecordingAudio::new(),
            &Mat4::identity(),
            &Mat4::identity(),
        );
        assert!(scene.input().events().is_empty());
    }

    #[test]
    fn camera_frame_submits_draws() {
        let mut scene = SceneManager::default();
        let camera = scene.load_level("one", |world| {
            let camera = world.spawn("camera").unwrap();
            world.get_mut(camera).unwrap().camera();
            let cube = world.spawn("cube").unwrap();
            world.get_mut(cube).unwrap().mesh_render().set_mesh("cube");
            camera
        });

        let mut renderer = RecordingRenderer::new();
        scene.run_frame_with_camera(camera, &mut renderer, &mut RecordingAudio::new());
        assert_eq!(renderer.meshes().count(), 1);
    }
}
