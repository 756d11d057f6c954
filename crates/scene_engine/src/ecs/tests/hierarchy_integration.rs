//! Integration tests for the object hierarchy
//!
//! Parent/child links, cycle rejection, registry interaction and world
//! transform composition.

use crate::ecs::components::{Camera, MeshRender, TransformComponent};
use crate::ecs::{HierarchyError, RegistryError, World};
use crate::foundation::math::{quat_from_euler_degrees, Quat, Vec3};
use approx::assert_relative_eq;

fn spawn_all(world: &mut World, names: &[&str]) -> Vec<crate::ecs::GameObjectId> {
    names
        .iter()
        .map(|name| {
            let id = world.spawn(*name).unwrap();
            world.init(id);
            id
        })
        .collect()
}

#[test]
fn self_parenting_is_rejected() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["a"]);

    assert!(!world.add_child(ids[0], ids[0]));
    assert!(!world.set_parent(ids[0], ids[0]));
    assert_eq!(world.get(ids[0]).unwrap().child_count(), 0);
    assert_eq!(world.parent_of(ids[0]), None);
}

#[test]
fn cycles_never_form() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["a", "b", "c"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    assert!(world.add_child(a, b));
    assert!(world.add_child(b, c));

    assert!(!world.add_child(b, a));
    assert!(!world.add_child(c, a));
    assert!(world.is_ancestor(a, c));
    assert_eq!(world.parent_of(a), None);
    assert_eq!(world.child(a, "b"), Some(b));
    assert_eq!(world.descendants(a), vec![b, c]);
}

#[test]
fn reparenting_moves_the_child() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["left", "right", "ball"]);
    let (left, right, ball) = (ids[0], ids[1], ids[2]);

    world.add_child(left, ball);
    world.add_child(right, ball);

    assert_eq!(world.child(left, "ball"), None);
    assert_eq!(world.child(right, "ball"), Some(ball));
    assert_eq!(world.parent_of(ball), Some(right));
}

#[test]
fn same_name_child_is_replaced_and_detached() {
    let mut world = World::new();
    let parent = world.spawn("parent").unwrap();
    let first = world.create("twin");
    let second = world.create("twin");

    world.add_child(parent, first);
    world.add_child(parent, second);

    assert_eq!(world.child(parent, "twin"), Some(second));
    assert_eq!(world.parent_of(first), None);
    assert_eq!(world.get(parent).unwrap().child_count(), 1);
}

#[test]
fn add_children_reports_rejections_and_keeps_going() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["root", "x", "y"]);
    let (root, x, y) = (ids[0], ids[1], ids[2]);

    let result = world.add_children(x, &[root, y]);
    assert_eq!(result, Ok(()));

    let result = world.add_children(y, &[y, root, x]);
    assert_eq!(
        result,
        Err(HierarchyError {
            first_index: 0,
            rejected: 2,
            attempted: 3
        })
    );
    assert_eq!(world.parent_of(root), Some(y));
    assert_eq!(world.parent_of(x), None);
}

#[test]
fn remove_child_detaches_without_destroying() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["parent", "x"]);
    let (parent, x) = (ids[0], ids[1]);
    world.add_child(parent, x);
    world.get_mut(x).unwrap().mesh_render().set_mesh("cube");

    assert_eq!(world.remove_child(parent, "x"), Some(x));
    assert_eq!(world.child(parent, "x"), None);
    assert_eq!(world.remove_child(parent, "x"), None);

    let child = world.get(x).unwrap();
    assert!(child.is_initialized());
    assert!(child.is_enabled());
    assert!(child.has_component::<MeshRender>());
    assert_eq!(child.parent(), None);
}

#[test]
fn remove_children_and_remove_parent() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["p", "a", "b"]);
    world.add_children(ids[0], &ids[1..]).unwrap();

    assert!(world.remove_parent(ids[1]));
    assert!(!world.remove_parent(ids[1]));
    assert_eq!(world.remove_children(ids[0]), vec![ids[2]]);
    assert_eq!(world.get(ids[0]).unwrap().child_count(), 0);
    assert!(world.contains(ids[2]));
    assert_eq!(world.parent_of(ids[2]), None);
}

#[test]
fn child_index_follows_name_order() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["root", "zeta", "alpha", "mid"]);
    world.add_children(ids[0], &ids[1..]).unwrap();

    assert_eq!(world.child_at(ids[0], 0), Some(ids[2]));
    assert_eq!(world.child_at(ids[0], 1), Some(ids[3]));
    assert_eq!(world.child_at(ids[0], 2), Some(ids[1]));
    assert_eq!(world.child_at(ids[0], 3), None);
}

#[test]
fn root_world_transform_is_the_local_transform() {
    let mut world = World::new();
    let id = world.spawn("solo").unwrap();
    let rotation = Quat::from_euler_angles(0.3, -1.1, 0.7);
    {
        let transform = world.get_mut(id).unwrap().transform_mut();
        transform.position = Vec3::new(1.5, -2.0, 3.25);
        transform.rotation = rotation;
        transform.scale = Vec3::new(2.0, 0.5, 1.0);
    }

    assert_eq!(world.world_position(id), Some(Vec3::new(1.5, -2.0, 3.25)));
    assert_eq!(world.world_rotation(id), Some(rotation));
    assert_eq!(world.world_scale(id), Some(Vec3::new(2.0, 0.5, 1.0)));
}

#[test]
fn child_position_composes_with_parent() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["parent", "child"]);
    world.add_child(ids[0], ids[1]);
    world.get_mut(ids[0]).unwrap().transform_mut().set_position(Vec3::new(0.0, 0.0, 5.0));
    world.get_mut(ids[1]).unwrap().transform_mut().set_position(Vec3::new(1.0, 0.0, 0.0));

    assert_relative_eq!(world.world_position(ids[1]).unwrap(), Vec3::new(1.0, 0.0, 5.0));
}

#[test]
fn rotation_and_scale_propagate() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["parent", "child"]);
    world.add_child(ids[0], ids[1]);
    {
        let parent = world.get_mut(ids[0]).unwrap().transform_mut();
        parent.set_angle(&Vec3::new(0.0, 90.0, 0.0));
        parent.set_scale(Vec3::new(2.0, 2.0, 2.0));
    }
    world.get_mut(ids[1]).unwrap().transform_mut().set_position(Vec3::new(1.0, 0.0, 0.0));

    assert_relative_eq!(world.world_position(ids[1]).unwrap(), Vec3::new(0.0, 0.0, -2.0), epsilon = 1e-5);
    assert_relative_eq!(world.world_scale(ids[1]).unwrap(), Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-6);
    assert_relative_eq!(
        world.world_rotation(ids[1]).unwrap(),
        quat_from_euler_degrees(&Vec3::new(0.0, 90.0, 0.0)),
        epsilon = 1e-6
    );
    assert_relative_eq!(
        world.world_matrix(ids[1]).unwrap().transform_point(&crate::foundation::math::Point3::origin()).coords,
        Vec3::new(0.0, 0.0, -2.0),
        epsilon = 1e-5
    );
}

#[test]
fn near_by_is_strict() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["a", "b"]);
    world.get_mut(ids[1]).unwrap().transform_mut().set_position(Vec3::new(3.0, 4.0, 0.0));

    assert!(world.near_by(ids[0], ids[1], 5.1));
    assert!(!world.near_by(ids[0], ids[1], 5.0));
}

#[test]
fn invalid_names_never_register() {
    let mut world = World::new();
    for name in ["$money", "has space", "9lives", ""] {
        let id = world.create(name);
        assert_eq!(world.register(id), Err(RegistryError::InvalidName(name.to_string())));
        assert_eq!(world.get(id).unwrap().id(), -1);
        assert!(!world.get(id).unwrap().is_registered());
    }
    assert_eq!(world.registered_count(), 0);
    assert!(matches!(world.spawn("bad name"), Err(RegistryError::InvalidName(_))));
    assert_eq!(world.len(), 4);
}

#[test]
fn duplicate_and_repeat_registration() {
    let mut world = World::new();
    let first = world.spawn("cube").unwrap();
    assert_eq!(world.spawn("cube"), Err(RegistryError::DuplicateName("cube".into())));
    assert_eq!(world.register(first), Err(RegistryError::AlreadyRegistered("cube".into())));
    assert_eq!(world.find("cube"), Some(first));
    assert_eq!(world.find_by_id(0), Some(first));
}

#[test]
fn rename_rekeys_registry_and_parent() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["parent", "old", "taken"]);
    world.add_child(ids[0], ids[1]);

    assert_eq!(world.rename(ids[1], "taken"), Err(RegistryError::DuplicateName("taken".into())));
    assert_eq!(world.rename(ids[1], "bad-name"), Err(RegistryError::InvalidName("bad-name".into())));
    assert_eq!(world.rename(ids[1], "new"), Ok(()));

    assert_eq!(world.find("new"), Some(ids[1]));
    assert_eq!(world.find("old"), None);
    assert_eq!(world.child(ids[0], "new"), Some(ids[1]));
    assert_eq!(world.child(ids[0], "old"), None);
    assert_eq!(world.get(ids[1]).unwrap().id(), 1);
    assert_eq!(world.name_of(ids[1]), Some("new"));
}

#[test]
fn camera_target_drives_the_view() {
    let mut world = World::new();
    let ids = spawn_all(&mut world, &["cam", "focus"]);
    world.get_mut(ids[0]).unwrap().camera().target = Some("focus".into());
    world.get_mut(ids[0]).unwrap().transform_mut().set_position(Vec3::new(0.0, 0.0, 10.0));
    world.get_mut(ids[1]).unwrap().transform_mut().set_position(Vec3::new(5.0, 0.0, 0.0));

    let (_, view) = world.camera_matrices(ids[0], (800, 600)).unwrap();
    let focus = view.transform_point(&crate::foundation::math::Point3::new(5.0, 0.0, 0.0));
    assert_relative_eq!(focus.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(focus.y, 0.0, epsilon = 1e-5);
    assert!(focus.z < 0.0);

    assert!(world.camera_matrices(ids[1], (800, 600)).is_none());
    assert!(world.get(ids[0]).unwrap().has_component::<Camera>());
    assert!(world.get(ids[1]).unwrap().has_component::<TransformComponent>());
}
