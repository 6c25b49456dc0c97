//! Global transform tests
//!
//! Tests for:
//! - Local -> global matrix composition down the hierarchy
//! - Root pinned to identity
//! - Cache staleness contract (plain getters never recompute)
//! - Forced-recompute global setters and their round-trip property
//! - Node-to-node transforms
//! - Subtree refresh without hooks

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Affine3A, Quat, Vec3};
use scenetree::{NodeBehavior, NodeHandle, SceneTree};

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn quat_approx(a: Quat, b: Quat) -> bool {
    // double cover: q and -q are the same rotation
    (a.dot(b).abs() - 1.0).abs() < 1e-4
}

#[derive(Default)]
struct Widget;
impl NodeBehavior for Widget {}

/// root -> a (10, 0, 0) -> b (0, 5, 0)
fn nested_translation_tree() -> (SceneTree, NodeHandle, NodeHandle) {
    let mut tree = SceneTree::new();
    let a = tree.add_child::<Widget>(tree.root(), "a").unwrap();
    tree.set_position(a, Vec3::new(10.0, 0.0, 0.0));
    let b = tree.add_child::<Widget>(a, "b").unwrap();
    tree.set_position(b, Vec3::new(0.0, 5.0, 0.0));
    (tree, a, b)
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn global_position_composes_down_the_chain() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();

    assert_eq!(tree.global_position(a), Some(Vec3::new(10.0, 0.0, 0.0)));
    assert_eq!(tree.global_position(b), Some(Vec3::new(10.0, 5.0, 0.0)));
}

#[test]
fn global_matrix_equals_parent_global_times_local() {
    let mut tree = SceneTree::new();
    let a = tree.add_child::<Widget>(tree.root(), "a").unwrap();
    tree.node(a)
        .set_position(1.0, 2.0, 3.0)
        .set_rotation(Quat::from_rotation_y(FRAC_PI_4))
        .set_scale(2.0);
    let b = tree.add_child::<Widget>(a, "b").unwrap();
    tree.node(b)
        .set_position(0.0, 1.0, 0.0)
        .set_rotation(Quat::from_rotation_z(FRAC_PI_2));
    let c = tree.add_child::<Widget>(b, "c").unwrap();
    tree.node(c).set_position(4.0, 0.0, 0.0);

    tree.update();

    for handle in [a, b, c] {
        let node = tree.get(handle).unwrap();
        let parent_global = tree.global_matrix(node.parent().unwrap()).unwrap();
        let expected = parent_global * node.transform.local_matrix();
        assert!(
            node.global_matrix().abs_diff_eq(expected, EPSILON),
            "cache mismatch for {:?}",
            node.name()
        );
    }
}

#[test]
fn parent_global_inverse_is_maintained() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();

    let inv = tree.parent_global_inverse(b).unwrap();
    let expected = tree.global_matrix(a).unwrap().inverse();
    assert!(inv.abs_diff_eq(expected, EPSILON));
}

#[test]
fn root_stays_identity_even_when_poked() {
    let mut tree = SceneTree::new();
    let root = tree.root();

    // tree-level setters refuse the root
    tree.set_position(root, Vec3::ONE);
    assert_eq!(tree.position(root), Some(Vec3::ZERO));

    // direct pokes at the transform are undone by the next traversal
    tree.get_mut(root).unwrap().transform.set_position(Vec3::ONE);
    tree.update();
    assert_eq!(tree.global_matrix(root), Some(Affine3A::IDENTITY));
    assert_eq!(tree.position(root), Some(Vec3::ZERO));
}

#[test]
fn add_child_seeds_global_caches_immediately() {
    let mut tree = SceneTree::new();
    let a = tree.add_child::<Widget>(tree.root(), "a").unwrap();
    tree.set_position(a, Vec3::new(10.0, 0.0, 0.0));

    // no update() yet: the child computed its globals at attach time
    let b = tree.add_child::<Widget>(a, "b").unwrap();
    assert_eq!(tree.global_position(b), Some(Vec3::new(10.0, 0.0, 0.0)));
}

// ============================================================================
// Staleness contract
// ============================================================================

#[test]
fn plain_getters_do_not_recompute() {
    let (mut tree, a, _) = nested_translation_tree();
    tree.update();

    tree.set_position(a, Vec3::new(99.0, 0.0, 0.0));

    // cache still holds the last traversal's result
    assert_eq!(tree.global_position(a), Some(Vec3::new(10.0, 0.0, 0.0)));

    tree.update();
    assert_eq!(tree.global_position(a), Some(Vec3::new(99.0, 0.0, 0.0)));
}

// ============================================================================
// Forced-recompute global setters
// ============================================================================

#[test]
fn set_global_position_round_trips_without_traversal() {
    let mut tree = SceneTree::new();
    let parent = tree.add_child::<Widget>(tree.root(), "parent").unwrap();
    let child = tree.add_child::<Widget>(parent, "child").unwrap();

    // mutate the parent after the child attached, so every cached global
    // on the chain is stale when the setter runs
    tree.node(parent)
        .set_position(3.0, 4.0, 5.0)
        .set_rotation(Quat::from_rotation_z(FRAC_PI_2));

    // never called update(): the setter forces the ancestor recompute
    let target = Vec3::new(1.0, 2.0, 3.0);
    tree.set_global_position(child, target);
    assert!(
        vec3_approx(tree.global_position(child).unwrap(), target),
        "got {:?}",
        tree.global_position(child)
    );
}

#[test]
fn set_global_position_rebases_children_on_next_update() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();

    tree.set_global_position(a, Vec3::ZERO);
    assert_eq!(tree.global_position(a), Some(Vec3::ZERO));

    tree.update();
    assert_eq!(tree.global_position(b), Some(Vec3::new(0.0, 5.0, 0.0)));
}

#[test]
fn set_global_rotation_round_trips_under_rotated_parent() {
    let mut tree = SceneTree::new();
    let parent = tree.add_child::<Widget>(tree.root(), "parent").unwrap();
    tree.node(parent).set_rotation(Quat::from_rotation_z(FRAC_PI_2));
    let child = tree.add_child::<Widget>(parent, "child").unwrap();

    let target = Quat::from_rotation_x(FRAC_PI_4);
    tree.set_global_rotation(child, target);
    assert!(quat_approx(tree.global_rotation(child).unwrap(), target));
}

#[test]
fn set_global_scale_round_trips_under_scaled_parent() {
    let mut tree = SceneTree::new();
    let parent = tree.add_child::<Widget>(tree.root(), "parent").unwrap();
    tree.node(parent).set_scale(2.0);
    let child = tree.add_child::<Widget>(parent, "child").unwrap();

    tree.set_global_scale(child, Vec3::splat(6.0));
    assert!(vec3_approx(tree.global_scale(child).unwrap(), Vec3::splat(6.0)));
    assert!(vec3_approx(tree.scale(child).unwrap(), Vec3::splat(3.0)));
}

// ============================================================================
// Node-to-node transforms
// ============================================================================

#[test]
fn node_to_node_composes_to_identity() {
    let mut tree = SceneTree::new();
    let a = tree.add_child::<Widget>(tree.root(), "a").unwrap();
    tree.node(a)
        .set_position(1.0, 2.0, 3.0)
        .set_rotation(Quat::from_rotation_y(FRAC_PI_4));
    let b = tree.add_child::<Widget>(tree.root(), "b").unwrap();
    tree.node(b).set_position(-4.0, 0.0, 7.0).set_scale(2.0);
    tree.update();

    let ab = tree.node_to_node_transform(a, b).unwrap();
    let ba = tree.node_to_node_transform(b, a).unwrap();
    assert!((ab * ba).abs_diff_eq(Affine3A::IDENTITY, 1e-4));
}

#[test]
fn node_to_node_maps_local_points_across_branches() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();

    // b's origin sits at (0, 5, 0) in a's local space
    let m = tree.node_to_node_transform(b, a).unwrap();
    assert!(vec3_approx(m.transform_point3(Vec3::ZERO), Vec3::new(0.0, 5.0, 0.0)));

    // and a's origin at (0, -5, 0) in b's local space
    let m = tree.node_to_node_transform(a, b).unwrap();
    assert!(vec3_approx(m.transform_point3(Vec3::ZERO), Vec3::new(0.0, -5.0, 0.0)));
}

#[test]
fn node_to_node_with_stale_handle_is_none() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();
    tree.remove_child(a, b);

    assert!(tree.node_to_node_transform(a, b).is_none());
}

// ============================================================================
// Subtree refresh
// ============================================================================

#[test]
fn update_subtree_refreshes_descendants_without_hooks() {
    let (mut tree, a, b) = nested_translation_tree();
    tree.update();

    tree.set_position(a, Vec3::new(1.0, 0.0, 0.0));
    tree.update_subtree(a);

    assert_eq!(tree.global_position(a), Some(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(tree.global_position(b), Some(Vec3::new(1.0, 5.0, 0.0)));
}
