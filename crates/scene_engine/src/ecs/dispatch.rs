//! Phase dispatch
//!
//! Each phase walks the tree depth first. At every active node the enabled
//! components run in kind order, then the object's callback for the phase,
//! then the children in name order. The child list is read after the
//! callback, so children it adds are visited in the same pass.

use crate::audio::AudioBackend;
use crate::ecs::component::ComponentContext;
use crate::ecs::components::TransformComponent;
use crate::ecs::entity::{CallbackSlot, GameObject, GameObjectId};
use crate::ecs::world::World;
use crate::foundation::math::{Mat4, Transform};
use crate::foundation::time::FrameTime;
use crate::input::InputState;
use crate::render::RenderBackend;

/// Everything one frame's hooks may touch outside the world
pub struct Frame<'a> {
    /// Timing of this frame
    pub time: FrameTime,
    /// Input gathered for this frame
    pub input: &'a InputState,
    /// Draw submission
    pub renderer: &'a mut dyn RenderBackend,
    /// Voice control
    pub audio: &'a mut dyn AudioBackend,
}

impl<'a> Frame<'a> {
    /// Bundle the frame's services
    pub fn new(
        time: FrameTime,
        input: &'a InputState,
        renderer: &'a mut dyn RenderBackend,
        audio: &'a mut dyn AudioBackend,
    ) -> Self {
        Self {
            time,
            input,
            renderer,
            audio,
        }
    }
}

/// The four per-frame phases, in the order a frame runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Window and system events
    Event,
    /// Keyboard and pointer handling
    Input,
    /// Simulation step
    Loop,
    /// Draw submission
    Render,
}

impl Phase {
    /// All phases in frame order
    pub const ALL: [Self; 4] = [Self::Event, Self::Input, Self::Loop, Self::Render];

    const fn callback_slot(self) -> CallbackSlot {
        match self {
            Self::Event => CallbackSlot::Event,
            Self::Input => CallbackSlot::Input,
            Self::Loop => CallbackSlot::Behaviour,
            Self::Render => CallbackSlot::Render,
        }
    }
}

/// Handed to object callbacks: the owning object's handle plus mutable
/// access to the whole world.
pub struct ObjectContext<'a> {
    world: &'a mut World,
    id: GameObjectId,
    time: FrameTime,
    input: &'a InputState,
}

impl<'a> ObjectContext<'a> {
    pub(crate) fn new(world: &'a mut World, id: GameObjectId, time: FrameTime, input: &'a InputState) -> Self {
        Self { world, id, time, input }
    }

    /// Object the callback belongs to
    pub const fn id(&self) -> GameObjectId {
        self.id
    }

    /// Frame timing; zeroed for start callbacks
    pub const fn time(&self) -> FrameTime {
        self.time
    }

    /// Input of the current frame
    pub const fn input(&self) -> &InputState {
        self.input
    }

    /// The world
    pub fn world(&self) -> &World {
        self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// The owning object; `None` if the callback destroyed it
    pub fn object(&self) -> Option<&GameObject> {
        self.world.get(self.id)
    }

    /// The owning object, mutably
    pub fn object_mut(&mut self) -> Option<&mut GameObject> {
        self.world.get_mut(self.id)
    }

    /// Owner's local transform
    pub fn transform_mut(&mut self) -> Option<&mut TransformComponent> {
        self.object_mut().map(GameObject::transform_mut)
    }
}

/// Values threaded from a parent to its children
struct Inherited {
    world: Option<Transform>,
    model_view: Mat4,
}

impl World {
    /// Run the event phase for `id` and its subtree
    pub fn on_event(&mut self, id: GameObjectId, frame: &mut Frame<'_>) {
        self.dispatch_from(id, Phase::Event, frame, &Mat4::identity(), &Mat4::identity());
    }

    /// Run the input phase for `id` and its subtree
    pub fn on_input(&mut self, id: GameObjectId, frame: &mut Frame<'_>) {
        self.dispatch_from(id, Phase::Input, frame, &Mat4::identity(), &Mat4::identity());
    }

    /// Run the loop phase for `id` and its subtree
    pub fn on_loop(&mut self, id: GameObjectId, frame: &mut Frame<'_>) {
        self.dispatch_from(id, Phase::Loop, frame, &Mat4::identity(), &Mat4::identity());
    }

    /// Run the render phase for `id` and its subtree with the given camera
    /// matrices. Ancestors' transforms are folded into the model-view.
    pub fn on_render(&mut self, id: GameObjectId, frame: &mut Frame<'_>, projection: &Mat4, view: &Mat4) {
        self.dispatch_from(id, Phase::Render, frame, projection, view);
    }

    /// Run `phase` over every root in registry id order. The loop phase first
    /// stops voices left behind by audio sources dropped since the last frame.
    pub fn run_phase(&mut self, phase: Phase, frame: &mut Frame<'_>, projection: &Mat4, view: &Mat4) {
        if phase == Phase::Loop {
            self.stop_released_voices(&mut *frame.audio);
        }
        for root in self.roots() {
            self.dispatch_from(root, phase, frame, projection, view);
        }
    }

    fn dispatch_from(
        &mut self,
        id: GameObjectId,
        phase: Phase,
        frame: &mut Frame<'_>,
        projection: &Mat4,
        view: &Mat4,
    ) {
        let inherited = match self.parent_of(id).and_then(|parent| self.world_transform(parent)) {
            Some(world) => Inherited {
                model_view: view * world.to_matrix(),
                world: Some(world),
            },
            None => Inherited {
                world: None,
                model_view: *view,
            },
        };
        self.dispatch_node(id, phase, frame, projection, &inherited);
    }

    fn dispatch_node(
        &mut self,
        id: GameObjectId,
        phase: Phase,
        frame: &mut Frame<'_>,
        projection: &Mat4,
        inherited: &Inherited,
    ) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        if !object.is_active() {
            return;
        }

        let local = object.transform().local();
        let model_view = inherited.model_view * local.to_matrix();
        let world = match &inherited.world {
            Some(parent) => parent.combine(&local),
            None => local,
        };

        {
            let (name, components) = object.dispatch_parts();
            let mut ctx = ComponentContext {
                owner: id,
                owner_name: name,
                world_transform: &world,
                frame: &mut *frame,
            };
            for component in components.iter_mut().filter(|c| c.is_enabled()) {
                match phase {
                    Phase::Event => component.on_event(&mut ctx),
                    Phase::Input => component.on_input(&mut ctx),
                    Phase::Loop => component.on_loop(&mut ctx),
                    Phase::Render => component.on_render(&mut ctx, projection, &model_view),
                }
            }
        }

        let input = frame.input;
        self.run_callback(id, phase.callback_slot(), frame.time, input);

        let children: Vec<GameObjectId> = match self.objects.get(id) {
            Some(object) if object.is_active() => object.child_ids().collect(),
            _ => return,
        };
        let passed_down = Inherited {
            world: Some(world),
            model_view,
        };
        for child in children {
            self.dispatch_node(child, phase, frame, projection, &passed_down);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::ecs::components::{Journal, Probe1, Probe2};
    use crate::foundation::math::Vec3;
    use crate::render::NullRenderer;
    use approx::assert_relative_eq;

    fn journal() -> Journal {
        Journal::default()
    }

    fn object_with_probe(world: &mut World, name: &str, journal: &Journal) -> GameObjectId {
        let id = world.spawn(name).unwrap();
        world
            .get_mut(id)
            .unwrap()
            .component_or_insert::<Probe1>()
            .attach_journal(journal.clone());
        world.init(id);
        id
    }

    fn run(world: &mut World, phase: Phase) {
        let input = InputState::new();
        let mut renderer = NullRenderer::default();
        let mut audio = NullAudio;
        let mut frame = Frame::new(FrameTime::default(), &input, &mut renderer, &mut audio);
        world.run_phase(phase, &mut frame, &Mat4::identity(), &Mat4::identity());
    }

    #[test]
    fn components_then_callback_then_children() {
        let mut world = World::new();
        let log = journal();

        let root = object_with_probe(&mut world, "root", &log);
        world
            .get_mut(root)
            .unwrap()
            .component_or_insert::<Probe2>()
            .attach_journal(log.clone());
        let callback_log = log.clone();
        world.get_mut(root).unwrap().set_behaviour_fn(move |ctx| {
            let name = ctx.object().map(|o| o.name().to_string()).unwrap_or_default();
            callback_log.borrow_mut().push(format!("{name}:callback:loop"));
        });

        let kid = object_with_probe(&mut world, "kid", &log);
        assert!(world.add_child(root, kid));

        run(&mut world, Phase::Loop);

        assert_eq!(
            *log.borrow(),
            vec![
                "root:probe1:loop".to_string(),
                "root:probe2:loop".to_string(),
                "root:callback:loop".to_string(),
                "kid:probe1:loop".to_string(),
            ]
        );
    }

    #[test]
    fn inactive_subtrees_and_disabled_components_are_skipped() {
        let mut world = World::new();
        let log = journal();
        let root = object_with_probe(&mut world, "root", &log);
        let kid = object_with_probe(&mut world, "kid", &log);
        world.add_child(root, kid);

        world.disable(root, false);
        run(&mut world, Phase::Event);
        assert!(log.borrow().is_empty());

        world.enable(root, false);
        world.get_mut(root).unwrap().set_component_state::<Probe1>(false);
        run(&mut world, Phase::Event);
        assert_eq!(*log.borrow(), vec!["kid:probe1:event".to_string()]);
    }

    #[test]
    fn children_added_by_a_callback_run_in_the_same_pass() {
        let mut world = World::new();
        let log = journal();
        let root = object_with_probe(&mut world, "root", &log);
        let late = object_with_probe(&mut world, "late", &log);
        world.unregister(late).unwrap();

        world.get_mut(root).unwrap().set_input_fn(move |ctx| {
            let me = ctx.id();
            ctx.world_mut().add_child(me, late);
        });

        run(&mut world, Phase::Input);
        assert_eq!(
            *log.borrow(),
            vec!["root:probe1:input".to_string(), "late:probe1:input".to_string()]
        );
    }

    #[test]
    fn render_threads_model_view_down_the_tree() {
        let mut world = World::new();
        let log = journal();
        let root = object_with_probe(&mut world, "root", &log);
        let kid = object_with_probe(&mut world, "kid", &log);
        world.add_child(root, kid);

        world.get_mut(root).unwrap().transform_mut().position = Vec3::new(1.0, 0.0, 0.0);
        world.get_mut(kid).unwrap().transform_mut().position = Vec3::new(0.0, 2.0, 0.0);
        let view = Mat4::new_translation(&Vec3::new(0.0, 0.0, -10.0));

        let input = InputState::new();
        let mut renderer = NullRenderer::default();
        let mut audio = NullAudio;
        let mut frame = Frame::new(FrameTime::default(), &input, &mut renderer, &mut audio);
        world.run_phase(Phase::Render, &mut frame, &Mat4::identity(), &view);

        let probe = world.get(kid).unwrap().get_component::<Probe1>().unwrap();
        let model_view = probe.last_model_view.unwrap();
        let origin = model_view.transform_point(&crate::foundation::math::Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(1.0, 2.0, -10.0), epsilon = 1e-5);
        assert_relative_eq!(probe.last_world.as_ref().unwrap().position, Vec3::new(1.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn per_object_entry_includes_ancestor_transforms() {
        let mut world = World::new();
        let log = journal();
        let root = object_with_probe(&mut world, "root", &log);
        let kid = object_with_probe(&mut world, "kid", &log);
        world.add_child(root, kid);
        world.get_mut(root).unwrap().transform_mut().position = Vec3::new(0.0, 0.0, 3.0);

        let input = InputState::new();
        let mut renderer = NullRenderer::default();
        let mut audio = NullAudio;
        let mut frame = Frame::new(FrameTime::default(), &input, &mut renderer, &mut audio);
        world.on_loop(kid, &mut frame);

        let probe = world.get(kid).unwrap().get_component::<Probe1>().unwrap();
        assert_eq!(probe.loops, 1);
        assert_relative_eq!(probe.last_world.as_ref().unwrap().position, Vec3::new(0.0, 0.0, 3.0), epsilon = 1e-6);
        assert_eq!(world.get(root).unwrap().get_component::<Probe1>().unwrap().loops, 0);
    }

    #[test]
    fn callback_may_replace_itself() {
        let mut world = World::new();
        let id = world.spawn("swap").unwrap();
        world.init(id);
        let log = journal();

        let first_log = log.clone();
        let second_log = log.clone();
        world.get_mut(id).unwrap().set_event_fn(move |ctx| {
            first_log.borrow_mut().push("first".into());
            let second_log = second_log.clone();
            if let Some(object) = ctx.object_mut() {
                object.set_event_fn(move |_| second_log.borrow_mut().push("second".into()));
            }
        });

        run(&mut world, Phase::Event);
        run(&mut world, Phase::Event);
        assert_eq!(*log.borrow(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn callback_may_clear_itself() {
        let mut world = World::new();
        let id = world.spawn("once").unwrap();
        world.init(id);
        let log = journal();

        let runs = log.clone();
        world.get_mut(id).unwrap().set_behaviour_fn(move |ctx| {
            runs.borrow_mut().push("tick".into());
            assert!(ctx.object().unwrap().has_callback(CallbackSlot::Behaviour));
            if let Some(object) = ctx.object_mut() {
                object.clear_callback(CallbackSlot::Behaviour);
            }
        });

        run(&mut world, Phase::Loop);
        assert!(!world.get(id).unwrap().has_callback(CallbackSlot::Behaviour));
        run(&mut world, Phase::Loop);
        assert_eq!(*log.borrow(), vec!["tick".to_string()]);

        world.get_mut(id).unwrap().set_behaviour_fn(|_| {});
        run(&mut world, Phase::Loop);
        assert!(world.get(id).unwrap().has_callback(CallbackSlot::Behaviour));
    }

    #[test]
    fn callback_may_destroy_its_owner() {
        let mut world = World::new();
        let log = journal();
        let root = object_with_probe(&mut world, "root", &log);
        let kid = object_with_probe(&mut world, "kid", &log);
        world.add_child(root, kid);
        world.get_mut(root).unwrap().set_behaviour_fn(|ctx| {
            let me = ctx.id();
            ctx.world_mut().destroy(me, true);
        });

        run(&mut world, Phase::Loop);
        assert!(!world.contains(root));
        assert!(!world.contains(kid));
        assert_eq!(*log.borrow(), vec!["root:probe1:loop".to_string()]);
    }
}
