//! Game objects
//!
//! A [`GameObject`] is a named node owning a transform, at most one component
//! of each kind, optional behaviour callbacks and a name-keyed set of child
//! handles. Objects live in a [`World`](crate::ecs::World) arena and are
//! addressed through [`GameObjectId`] handles; anything that needs to see more
//! than one object (hierarchy edits, world transforms, dispatch) is a `World`
//! method.

use std::collections::BTreeMap;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::ecs::component::{Component, ComponentKind, ComponentType};
use crate::ecs::components::{
    AudioSource, Camera, ComponentSet, GuiTexture, MeshRender, ParticleEmitter, TransformComponent,
};
use crate::ecs::dispatch::ObjectContext;

new_key_type! {
    /// Handle to a game object stored in a [`World`](crate::ecs::World).
    pub struct GameObjectId;
}

bitflags! {
    /// Per-object hint flags. Stored and reported; no phase consults them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u8 {
        /// Object wants render hooks
        const RENDER = 0b0001;
        /// Object wants event hooks
        const EVENT = 0b0010;
        /// Object wants key hooks
        const KEY_EVENT = 0b0100;
        /// Object wants loop hooks
        const LOOP = 0b1000;
    }
}

/// Behaviour hook attached to an object.
pub type Callback = Box<dyn FnMut(&mut ObjectContext<'_>)>;

/// Which callback slot to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSlot {
    /// Once, when the object is initialized
    Start,
    /// Loop phase
    Behaviour,
    /// Event phase
    Event,
    /// Input phase
    Input,
    /// Render phase
    Render,
}

/// Contents of one callback slot.
///
/// `Running` marks a slot whose callback is out on loan to the dispatcher, so
/// a clear or a replacement issued from inside that callback wins over the
/// restore that follows it.
#[derive(Default)]
enum SlotState {
    #[default]
    Empty,
    Installed(Callback),
    Running,
}

#[derive(Default)]
struct Callbacks {
    start: SlotState,
    behaviour: SlotState,
    event: SlotState,
    input: SlotState,
    render: SlotState,
}

impl Callbacks {
    fn slot(&mut self, slot: CallbackSlot) -> &mut SlotState {
        match slot {
            CallbackSlot::Start => &mut self.start,
            CallbackSlot::Behaviour => &mut self.behaviour,
            CallbackSlot::Event => &mut self.event,
            CallbackSlot::Input => &mut self.input,
            CallbackSlot::Render => &mut self.render,
        }
    }

    const fn get(&self, slot: CallbackSlot) -> &SlotState {
        match slot {
            CallbackSlot::Start => &self.start,
            CallbackSlot::Behaviour => &self.behaviour,
            CallbackSlot::Event => &self.event,
            CallbackSlot::Input => &self.input,
            CallbackSlot::Render => &self.render,
        }
    }

    fn install(&mut self, slot: CallbackSlot, callback: Callback) {
        *self.slot(slot) = SlotState::Installed(callback);
    }
}

/// A named scene node.
pub struct GameObject {
    handle: GameObjectId,
    name: String,
    id: i32,
    enabled: bool,
    initialized: bool,
    preserve: bool,
    flags: ObjectFlags,
    components: ComponentSet,
    children: BTreeMap<String, GameObjectId>,
    parent: Option<GameObjectId>,
    callbacks: Callbacks,
    released_voice: bool,
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("initialized", &self.initialized)
            .field("preserve", &self.preserve)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl GameObject {
    pub(crate) fn new(handle: GameObjectId, name: String) -> Self {
        Self {
            handle,
            name,
            id: -1,
            enabled: false,
            initialized: false,
            preserve: false,
            flags: ObjectFlags::empty(),
            components: ComponentSet::new(handle),
            children: BTreeMap::new(),
            parent: None,
            callbacks: Callbacks::default(),
            released_voice: false,
        }
    }

    /// Arena handle of this object
    pub const fn handle(&self) -> GameObjectId {
        self.handle
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry id, `-1` while unregistered
    pub const fn id(&self) -> i32 {
        self.id
    }

    /// Whether the object holds a registry id
    pub const fn is_registered(&self) -> bool {
        self.id >= 0
    }

    /// Whether the object's own enabled flag is set
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether [`World::init`](crate::ecs::World::init) has run since creation or the last close
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialized and enabled: hooks and children are dispatched
    pub const fn is_active(&self) -> bool {
        self.initialized && self.enabled
    }

    /// Whether the object survives level transitions
    pub const fn is_preserved(&self) -> bool {
        self.preserve
    }

    /// Hint flags
    pub const fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Replace the hint flags
    pub fn set_flags(&mut self, flags: ObjectFlags) {
        self.flags = flags;
    }

    /// Parent handle, `None` for roots
    pub const fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    /// Direct child with the given name
    pub fn child(&self, name: &str) -> Option<GameObjectId> {
        self.children.get(name).copied()
    }

    /// Direct child at `index` in name order
    pub fn child_at(&self, index: usize) -> Option<GameObjectId> {
        self.children.values().nth(index).copied()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Direct children as (name, handle), in name order
    pub fn children(&self) -> impl Iterator<Item = (&str, GameObjectId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Direct child handles in name order
    pub fn child_ids(&self) -> impl Iterator<Item = GameObjectId> + '_ {
        self.children.values().copied()
    }

    /// Set the object's own enabled flag; use
    /// [`World::set_state`](crate::ecs::World::set_state) to cascade.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Set the object's own preserve flag
    pub fn set_preserve(&mut self, preserve: bool) {
        self.preserve = preserve;
    }

    // Components

    /// Local transform
    pub const fn transform(&self) -> &TransformComponent {
        &self.components.transform
    }

    /// Mutable local transform
    pub fn transform_mut(&mut self) -> &mut TransformComponent {
        &mut self.components.transform
    }

    /// Component of type `T`, if present
    pub fn get_component<T: ComponentType>(&self) -> Option<&T> {
        T::slot(&self.components)
    }

    /// Mutable component of type `T`, if present
    pub fn get_component_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        T::slot_mut(&mut self.components)
    }

    /// Whether a component of type `T` is present
    pub fn has_component<T: ComponentType>(&self) -> bool {
        T::slot(&self.components).is_some()
    }

    /// Component by kind, for name-driven tooling
    pub fn component(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.components.get(kind)
    }

    /// Mutable component by kind, for name-driven tooling
    pub fn component_mut(&mut self, kind: ComponentKind) -> Option<&mut dyn Component> {
        self.components.get_mut(kind)
    }

    /// Kinds of all present components in dispatch order
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.components.kinds()
    }

    /// Add a fresh `T`. Returns `false` if one is already present.
    pub fn add_component<T: ComponentType>(&mut self) -> bool {
        T::insert(&mut self.components, self.handle)
    }

    /// Remove the `T`. Returns `false` if absent; the transform is never removed.
    ///
    /// Removing an audio source whose voice is live queues a stop for the
    /// next loop phase.
    pub fn remove_component<T: ComponentType>(&mut self) -> bool {
        if T::KIND == ComponentKind::AudioSource {
            self.note_released_voice();
        }
        let removed = T::remove(&mut self.components);
        if !removed && T::KIND == ComponentKind::Transform {
            log::debug!("'{}': transform component cannot be removed", self.name);
        }
        removed
    }

    /// Enable or disable the `T`, if present.
    pub fn set_component_state<T: ComponentType>(&mut self, enabled: bool) -> bool {
        T::slot_mut(&mut self.components).map(|c| c.set_state(enabled)).is_some()
    }

    /// Enable or disable a component by kind, if present.
    pub fn set_component_state_by_kind(&mut self, kind: ComponentKind, enabled: bool) -> bool {
        self.components.get_mut(kind).map(|c| c.set_state(enabled)).is_some()
    }

    /// The `T`, created on first access
    pub fn component_or_insert<T: ComponentType>(&mut self) -> &mut T {
        T::get_or_insert(&mut self.components, self.handle)
    }

    /// Camera, created on first access
    pub fn camera(&mut self) -> &mut Camera {
        self.component_or_insert()
    }

    /// Mesh renderer, created on first access
    pub fn mesh_render(&mut self) -> &mut MeshRender {
        self.component_or_insert()
    }

    /// Particle emitter, created on first access
    pub fn particle_emitter(&mut self) -> &mut ParticleEmitter {
        self.component_or_insert()
    }

    /// GUI texture, created on first access
    pub fn gui_texture(&mut self) -> &mut GuiTexture {
        self.component_or_insert()
    }

    /// Audio source, created on first access
    pub fn audio_source(&mut self) -> &mut AudioSource {
        self.component_or_insert()
    }

    // Callbacks

    /// Run once when the object is initialized
    pub fn set_start_fn(&mut self, f: impl FnMut(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.install(CallbackSlot::Start, Box::new(f));
    }

    /// Run every loop phase
    pub fn set_behaviour_fn(&mut self, f: impl FnMut(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.install(CallbackSlot::Behaviour, Box::new(f));
    }

    /// Run every event phase
    pub fn set_event_fn(&mut self, f: impl FnMut(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.install(CallbackSlot::Event, Box::new(f));
    }

    /// Run every input phase
    pub fn set_input_fn(&mut self, f: impl FnMut(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.install(CallbackSlot::Input, Box::new(f));
    }

    /// Run every render phase
    pub fn set_render_fn(&mut self, f: impl FnMut(&mut ObjectContext<'_>) + 'static) {
        self.callbacks.install(CallbackSlot::Render, Box::new(f));
    }

    /// Drop the callback in `slot`. Called from the running callback itself,
    /// the callback is not reinstalled once it returns.
    pub fn clear_callback(&mut self, slot: CallbackSlot) {
        *self.callbacks.slot(slot) = SlotState::Empty;
    }

    /// Whether a callback is installed in `slot`, counting one that is running
    pub const fn has_callback(&self, slot: CallbackSlot) -> bool {
        !matches!(self.callbacks.get(slot), SlotState::Empty)
    }

    // Crate-internal state used by `World`

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<GameObjectId>) {
        self.parent = parent;
    }

    /// Insert a child entry, returning the handle it displaced.
    pub(crate) fn insert_child(&mut self, name: String, child: GameObjectId) -> Option<GameObjectId> {
        self.children.insert(name, child)
    }

    /// Remove the entry for `name` only if it points at `child`.
    pub(crate) fn remove_child_entry(&mut self, name: &str, child: GameObjectId) -> bool {
        if self.children.get(name) == Some(&child) {
            self.children.remove(name);
            true
        } else {
            false
        }
    }

    pub(crate) fn take_child(&mut self, name: &str) -> Option<GameObjectId> {
        self.children.remove(name)
    }

    pub(crate) fn take_children(&mut self) -> Vec<GameObjectId> {
        std::mem::take(&mut self.children).into_values().collect()
    }

    pub(crate) fn clear_components(&mut self) {
        self.note_released_voice();
        self.components = ComponentSet::new(self.handle);
    }

    fn note_released_voice(&mut self) {
        if self.components.audio_source.as_ref().is_some_and(AudioSource::has_voice) {
            self.released_voice = true;
        }
    }

    /// Whether a dropped audio source left a voice behind, clearing the mark.
    /// A source still attached with a live voice counts when `dropping` is set.
    pub(crate) fn take_released_voice(&mut self, dropping: bool) -> bool {
        if dropping {
            self.note_released_voice();
        }
        std::mem::take(&mut self.released_voice)
    }

    pub(crate) fn dispatch_parts(&mut self) -> (&str, &mut ComponentSet) {
        (&self.name, &mut self.components)
    }

    /// Lend the callback in `slot` out for a run, marking the slot running.
    pub(crate) fn take_callback(&mut self, slot: CallbackSlot) -> Option<Callback> {
        let entry = self.callbacks.slot(slot);
        match std::mem::take(entry) {
            SlotState::Installed(callback) => {
                *entry = SlotState::Running;
                Some(callback)
            }
            other => {
                *entry = other;
                None
            }
        }
    }

    /// Return a lent callback. Dropped if the run cleared or replaced it.
    pub(crate) fn restore_callback(&mut self, slot: CallbackSlot, callback: Callback) {
        let entry = self.callbacks.slot(slot);
        if matches!(entry, SlotState::Running) {
            *entry = SlotState::Installed(callback);
        }
    }
}
