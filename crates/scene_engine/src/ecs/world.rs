//! World: object arena, registry and hierarchy
//!
//! The world owns every [`GameObject`]. Parent/child links are stored as
//! handles on both ends and kept consistent here: a child appears in exactly
//! one parent's child map, its back-reference names that parent, and no
//! object is its own ancestor.

use slotmap::SlotMap;

use crate::audio::AudioBackend;
use crate::core::config::SceneConfig;
use crate::ecs::components::Camera;
use crate::ecs::dispatch::ObjectContext;
use crate::ecs::entity::{CallbackSlot, GameObject, GameObjectId};
use crate::ecs::registry::{is_valid_name, Registry, RegistryError};
use crate::foundation::math::{Mat4, Point3, Quat, Transform, Vec3};
use crate::foundation::time::FrameTime;
use crate::input::InputState;

/// Batch child insertion failed for some candidates
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{rejected} of {attempted} children rejected, first at index {first_index}")]
pub struct HierarchyError {
    /// Index of the first rejected candidate
    pub first_index: usize,
    /// Number of rejected candidates
    pub rejected: usize,
    /// Number of candidates
    pub attempted: usize,
}

/// Arena of game objects plus the name registry
#[derive(Debug, Default)]
pub struct World {
    pub(super) objects: SlotMap<GameObjectId, GameObject>,
    pub(super) registry: Registry,
    released_voices: Vec<GameObjectId>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world honouring the scene limits
    pub fn with_config(config: &SceneConfig) -> Self {
        Self {
            objects: SlotMap::with_key(),
            registry: config
                .max_objects
                .map_or_else(Registry::new, Registry::with_capacity_limit),
            released_voices: Vec::new(),
        }
    }

    // Creation and registration

    /// Create a detached, unregistered, uninitialized object.
    ///
    /// The name is validated only when the object is registered or renamed.
    pub fn create(&mut self, name: impl Into<String>) -> GameObjectId {
        let name = name.into();
        self.objects.insert_with_key(|handle| GameObject::new(handle, name))
    }

    /// Create and register an object in one step. Nothing is created on error.
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<GameObjectId, RegistryError> {
        let id = self.create(name);
        if let Err(e) = self.register(id) {
            self.objects.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Give the object a registry id, reserving its name.
    pub fn register(&mut self, id: GameObjectId) -> Result<i32, RegistryError> {
        let object = self.objects.get_mut(id).ok_or(RegistryError::UnknownObject)?;
        if object.is_registered() {
            log::warn!("Object '{}' is already registered", object.name());
            return Err(RegistryError::AlreadyRegistered(object.name().to_string()));
        }

        match self.registry.insert(object.name(), id) {
            Ok(registry_id) => {
                object.set_id(registry_id);
                log::trace!("Registered '{}' as #{}", object.name(), registry_id);
                Ok(registry_id)
            }
            Err(e) => {
                log::warn!("Registration rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Release the object's name and id. The object itself stays alive.
    pub fn unregister(&mut self, id: GameObjectId) -> Result<(), RegistryError> {
        let object = self.objects.get_mut(id).ok_or(RegistryError::UnknownObject)?;
        if !object.is_registered() {
            return Err(RegistryError::NotRegistered(object.name().to_string()));
        }
        self.registry.remove(object.name(), id);
        object.set_id(-1);
        Ok(())
    }

    /// Rename an object, keeping registry and parent lookups in sync.
    pub fn rename(&mut self, id: GameObjectId, new_name: &str) -> Result<(), RegistryError> {
        let object = self.objects.get(id).ok_or(RegistryError::UnknownObject)?;
        let old_name = object.name().to_string();
        let parent = object.parent();

        let result = if object.is_registered() {
            self.registry.rename(&old_name, new_name, id)
        } else if is_valid_name(new_name) {
            Ok(())
        } else {
            Err(RegistryError::InvalidName(new_name.to_string()))
        };
        if let Err(e) = result {
            log::warn!("Cannot rename '{}': {}", old_name, e);
            return Err(e);
        }
        if old_name == new_name {
            return Ok(());
        }

        if let Some(parent) = parent {
            self.rekey_child(parent, id, &old_name, new_name);
        }
        if let Some(object) = self.objects.get_mut(id) {
            object.set_name(new_name.to_string());
        }
        log::debug!("Renamed '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    fn rekey_child(&mut self, parent: GameObjectId, child: GameObjectId, old_name: &str, new_name: &str) {
        let Some(parent_object) = self.objects.get_mut(parent) else {
            return;
        };
        parent_object.remove_child_entry(old_name, child);
        if let Some(displaced) = parent_object.insert_child(new_name.to_string(), child) {
            self.detach_displaced(displaced, child, new_name);
        }
    }

    /// Clear the back-reference of a child whose map entry was overwritten.
    fn detach_displaced(&mut self, displaced: GameObjectId, replacement: GameObjectId, name: &str) {
        if displaced == replacement {
            return;
        }
        log::warn!("Child '{}' replaced by another object of the same name; old child detached", name);
        if let Some(object) = self.objects.get_mut(displaced) {
            object.set_parent(None);
        }
    }

    /// Detach, close and drop an object.
    ///
    /// With `recursive` the whole subtree is destroyed; otherwise direct
    /// children are detached first and survive as roots.
    pub fn destroy(&mut self, id: GameObjectId, recursive: bool) -> bool {
        if !self.objects.contains_key(id) {
            return false;
        }
        if !recursive {
            self.remove_children(id);
        }
        self.remove_parent(id);
        self.close(id);
        self.drop_object(id);
        true
    }

    fn drop_object(&mut self, id: GameObjectId) {
        if let Some(mut object) = self.objects.remove(id) {
            if object.take_released_voice(true) {
                self.released_voices.push(id);
            }
            if object.is_registered() {
                self.registry.remove(object.name(), id);
            }
            log::trace!("Dropped '{}'", object.name());
        }
    }

    /// Send `stop` for every voice whose audio source was dropped or closed
    /// since the last call. Returns how many stops went out.
    pub fn stop_released_voices(&mut self, audio: &mut dyn AudioBackend) -> usize {
        let mut released = std::mem::take(&mut self.released_voices);
        released.extend(
            self.objects
                .iter_mut()
                .filter_map(|(id, object)| object.take_released_voice(false).then_some(id)),
        );

        for &id in &released {
            if let Err(e) = audio.stop(id) {
                log::debug!("Stopping released voice failed: {}", e);
            }
        }
        released.len()
    }

    // Lifecycle

    /// Mark initialized and enabled, then run the start callback once.
    ///
    /// Returns `false` if the object is unknown or already initialized.
    pub fn init(&mut self, id: GameObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        if object.is_initialized() {
            return false;
        }
        object.set_initialized(true);
        object.set_enabled(true);
        log::trace!("Initialized '{}'", object.name());

        self.run_callback(id, CallbackSlot::Start, FrameTime::default(), InputState::empty());
        true
    }

    /// Initialize every object that is not initialized yet, registered
    /// objects first in id order. Returns how many were initialized.
    pub fn init_all(&mut self) -> usize {
        let mut pending: Vec<(bool, i32, GameObjectId)> = self
            .objects
            .iter()
            .filter(|(_, object)| !object.is_initialized())
            .map(|(id, object)| (!object.is_registered(), object.id(), id))
            .collect();
        pending.sort_by_key(|&(unregistered, registry_id, _)| (unregistered, registry_id));

        pending.into_iter().filter(|&(_, _, id)| self.init(id)).count()
    }

    /// Destroy all children and components and clear the initialized and
    /// enabled flags.
    ///
    /// The object keeps its name, registration and callbacks and can be
    /// initialized again; its transform is reset to identity.
    pub fn close(&mut self, id: GameObjectId) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        let children = object.take_children();
        object.clear_components();
        object.set_initialized(false);
        object.set_enabled(false);
        log::trace!("Closed '{}'", object.name());

        for child in children {
            self.close(child);
            self.drop_object(child);
        }
    }

    pub(crate) fn run_callback(
        &mut self,
        id: GameObjectId,
        slot: CallbackSlot,
        time: FrameTime,
        input: &InputState,
    ) {
        let Some(mut callback) = self.objects.get_mut(id).and_then(|o| o.take_callback(slot)) else {
            return;
        };

        callback(&mut ObjectContext::new(self, id, time, input));

        if let Some(object) = self.objects.get_mut(id) {
            object.restore_callback(slot, callback);
        }
    }

    // Lookup

    /// Object by handle
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutable object by handle
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Whether the handle refers to a live object
    pub fn contains(&self, id: GameObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Registered object by name
    pub fn find(&self, name: &str) -> Option<GameObjectId> {
        self.registry.lookup(name)
    }

    /// Registered object by registry id
    pub fn find_by_id(&self, registry_id: i32) -> Option<GameObjectId> {
        if registry_id < 0 {
            return None;
        }
        self.objects
            .iter()
            .find(|(_, object)| object.id() == registry_id)
            .map(|(id, _)| id)
    }

    /// Name of an object
    pub fn name_of(&self, id: GameObjectId) -> Option<&str> {
        self.objects.get(id).map(GameObject::name)
    }

    /// Live objects, registered or not
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects exist
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Registered objects
    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Name registry
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All objects in arena order
    pub fn iter(&self) -> impl Iterator<Item = (GameObjectId, &GameObject)> {
        self.objects.iter()
    }

    /// Registered objects without a parent, in registry id order
    pub fn roots(&self) -> Vec<GameObjectId> {
        let mut roots: Vec<(i32, GameObjectId)> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_registered() && object.parent().is_none())
            .map(|(id, object)| (object.id(), id))
            .collect();
        roots.sort_unstable_by_key(|&(registry_id, _)| registry_id);
        roots.into_iter().map(|(_, id)| id).collect()
    }

    // Hierarchy

    /// Parent of an object
    pub fn parent_of(&self, id: GameObjectId) -> Option<GameObjectId> {
        self.objects.get(id).and_then(GameObject::parent)
    }

    /// Direct child of `parent` by name
    pub fn child(&self, parent: GameObjectId, name: &str) -> Option<GameObjectId> {
        self.objects.get(parent).and_then(|p| p.child(name))
    }

    /// Direct child of `parent` at `index` in name order
    pub fn child_at(&self, parent: GameObjectId, index: usize) -> Option<GameObjectId> {
        self.objects.get(parent).and_then(|p| p.child_at(index))
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: GameObjectId, id: GameObjectId) -> bool {
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Every descendant of `id`, depth first, children in name order
    pub fn descendants(&self, id: GameObjectId) -> Vec<GameObjectId> {
        let mut out = Vec::new();
        let mut stack: Vec<GameObjectId> = self
            .objects
            .get(id)
            .map(|o| o.child_ids().collect())
            .unwrap_or_default();
        stack.reverse();

        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(object) = self.objects.get(next) {
                let before = stack.len();
                stack.extend(object.child_ids());
                stack[before..].reverse();
            }
        }
        out
    }

    /// Attach `child` under `parent`, keyed by the child's name.
    ///
    /// Rejected (returning `false`) when either handle is dead, when
    /// `child == parent` or when `child` is an ancestor of `parent`. A child
    /// attached elsewhere is moved. An existing child with the same name is
    /// replaced and detached.
    pub fn add_child(&mut self, parent: GameObjectId, child: GameObjectId) -> bool {
        if parent == child {
            log::debug!("Rejected adding an object as its own child");
            return false;
        }
        if !self.objects.contains_key(parent) {
            return false;
        }
        let Some(child_object) = self.objects.get(child) else {
            return false;
        };
        if self.is_ancestor(child, parent) {
            log::debug!("Rejected child '{}': would create a cycle", child_object.name());
            return false;
        }

        let name = child_object.name().to_string();
        if let Some(previous) = child_object.parent() {
            if let Some(previous_parent) = self.objects.get_mut(previous) {
                previous_parent.remove_child_entry(&name, child);
            }
        }

        let displaced = self
            .objects
            .get_mut(parent)
            .and_then(|p| p.insert_child(name.clone(), child));
        if let Some(displaced) = displaced {
            self.detach_displaced(displaced, child, &name);
        }
        if let Some(child_object) = self.objects.get_mut(child) {
            child_object.set_parent(Some(parent));
        }
        true
    }

    /// Attach every candidate, continuing past failures.
    pub fn add_children(&mut self, parent: GameObjectId, children: &[GameObjectId]) -> Result<(), HierarchyError> {
        let mut first_index = None;
        let mut rejected = 0;
        for (index, child) in children.iter().enumerate() {
            if !self.add_child(parent, *child) {
                first_index.get_or_insert(index);
                rejected += 1;
            }
        }

        match first_index {
            None => Ok(()),
            Some(first_index) => Err(HierarchyError {
                first_index,
                rejected,
                attempted: children.len(),
            }),
        }
    }

    /// Detach the child named `name`, returning it as a new root.
    pub fn remove_child(&mut self, parent: GameObjectId, name: &str) -> Option<GameObjectId> {
        let child = self.objects.get_mut(parent)?.take_child(name)?;
        if let Some(child_object) = self.objects.get_mut(child) {
            if child_object.parent() == Some(parent) {
                child_object.set_parent(None);
            }
        }
        Some(child)
    }

    /// Detach every child of `parent`, returning them.
    pub fn remove_children(&mut self, parent: GameObjectId) -> Vec<GameObjectId> {
        let children = self
            .objects
            .get_mut(parent)
            .map(GameObject::take_children)
            .unwrap_or_default();
        for child in &children {
            if let Some(child_object) = self.objects.get_mut(*child) {
                child_object.set_parent(None);
            }
        }
        children
    }

    /// Attach `child` under `parent`; same rules as [`Self::add_child`].
    pub fn set_parent(&mut self, child: GameObjectId, parent: GameObjectId) -> bool {
        self.add_child(parent, child)
    }

    /// Detach `child` from its parent. `false` if it had none.
    pub fn remove_parent(&mut self, child: GameObjectId) -> bool {
        let Some(object) = self.objects.get(child) else {
            return false;
        };
        let Some(parent) = object.parent() else {
            return false;
        };
        let name = object.name().to_string();

        let removed = self
            .objects
            .get_mut(parent)
            .is_some_and(|p| p.remove_child_entry(&name, child));
        if let Some(object) = self.objects.get_mut(child) {
            object.set_parent(None);
        }
        removed
    }

    // State

    /// Set the enabled flag, optionally for the whole subtree.
    pub fn set_state(&mut self, id: GameObjectId, enabled: bool, recursive: bool) {
        self.for_subtree(id, recursive, |object| object.set_enabled(enabled));
    }

    /// Enable an object
    pub fn enable(&mut self, id: GameObjectId, recursive: bool) {
        self.set_state(id, true, recursive);
    }

    /// Disable an object
    pub fn disable(&mut self, id: GameObjectId, recursive: bool) {
        self.set_state(id, false, recursive);
    }

    /// Set the preserve flag, optionally for the whole subtree.
    pub fn set_preserve(&mut self, id: GameObjectId, preserve: bool, recursive: bool) {
        self.for_subtree(id, recursive, |object| object.set_preserve(preserve));
    }

    /// Keep an object across level transitions
    pub fn preserve(&mut self, id: GameObjectId, recursive: bool) {
        self.set_preserve(id, true, recursive);
    }

    /// Let an object be unloaded at level transitions
    pub fn unpreserve(&mut self, id: GameObjectId, recursive: bool) {
        self.set_preserve(id, false, recursive);
    }

    fn for_subtree(&mut self, id: GameObjectId, recursive: bool, mut apply: impl FnMut(&mut GameObject)) {
        let mut targets = vec![id];
        if recursive {
            targets.extend(self.descendants(id));
        }
        for target in targets {
            if let Some(object) = self.objects.get_mut(target) {
                apply(object);
            }
        }
    }

    // World-space queries

    /// Transform composed from the root down to `id`.
    pub fn world_transform(&self, id: GameObjectId) -> Option<Transform> {
        let object = self.objects.get(id)?;
        let mut chain = vec![object.transform().local()];
        let mut current = object.parent();
        while let Some(parent) = current {
            let Some(parent_object) = self.objects.get(parent) else {
                break;
            };
            chain.push(parent_object.transform().local());
            current = parent_object.parent();
        }

        let mut chain = chain.into_iter().rev();
        let root = chain.next()?;
        Some(chain.fold(root, |acc, local| acc.combine(&local)))
    }

    /// World position
    pub fn world_position(&self, id: GameObjectId) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.position)
    }

    /// World rotation
    pub fn world_rotation(&self, id: GameObjectId) -> Option<Quat> {
        self.world_transform(id).map(|t| t.rotation)
    }

    /// World scale
    pub fn world_scale(&self, id: GameObjectId) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.scale)
    }

    /// World matrix
    pub fn world_matrix(&self, id: GameObjectId) -> Option<Mat4> {
        self.world_transform(id).map(|t| t.to_matrix())
    }

    /// Whether the world positions of `a` and `b` are closer than `distance`
    pub fn near_by(&self, a: GameObjectId, b: GameObjectId, distance: f32) -> bool {
        match (self.world_position(a), self.world_position(b)) {
            (Some(pa), Some(pb)) => (pa - pb).norm() < distance,
            _ => false,
        }
    }

    /// Whether the pixel `(x, y)` hits the object's GUI texture
    pub fn gui_hit_test(&self, id: GameObjectId, x: f32, y: f32) -> bool {
        let Some(gui) = self.objects.get(id).and_then(|o| o.get_component::<crate::ecs::components::GuiTexture>()) else {
            return false;
        };
        self.world_transform(id)
            .is_some_and(|world| gui.hit_test(&world, x, y))
    }

    /// Projection and view matrices of the camera on `id` for a surface of
    /// `surface` pixels. A camera with a `target` looks at that object.
    pub fn camera_matrices(&self, id: GameObjectId, surface: (u32, u32)) -> Option<(Mat4, Mat4)> {
        let camera = self.objects.get(id)?.get_component::<Camera>()?;
        let world = self.world_transform(id)?;

        let target = camera
            .target
            .as_deref()
            .and_then(|name| self.find(name))
            .and_then(|target| self.world_position(target))
            .filter(|target| (target - world.position).norm_squared() > f32::EPSILON);

        let view = match target {
            Some(target) => Mat4::look_at_rh(
                &Point3::from(world.position),
                &Point3::from(target),
                &(world.rotation * Vec3::y()),
            ),
            None => Camera::view_matrix(&world),
        };
        Some((camera.projection_matrix(surface), view))
    }
}
