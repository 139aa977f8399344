use super::*;
use crate::foundation::core::{Rgba8, Size};
use crate::node::kind::NodeKind;

fn boxed(tree: &mut NodeTree, parent: NodeId, name: &str, w: f64, h: f64) -> NodeId {
    let id = tree.create_node(name, NodeKind::rect(Rgba8::BLACK));
    tree.node_mut(id).unwrap().set_size(Size::new(w, h));
    tree.add_child(parent, id).unwrap();
    id
}

fn top_of(tree: &NodeTree, id: NodeId) -> f64 {
    tree.node(id).unwrap().frame_in_parent().y0
}

fn scene() -> (NodeTree, NodeId) {
    let mut tree = NodeTree::new();
    let scene = tree.create_scene("scene", Size::new(400.0, 800.0), Rgba8::WHITE);
    (tree, scene)
}

#[test]
fn top_to_bottom_of_sibling_adds_margin() {
    let (mut tree, scene) = scene();
    let a = boxed(&mut tree, scene, "a", 200.0, 100.0);
    tree.node_mut(a)
        .unwrap()
        .set_position(Point::new(200.0, 100.0));
    assert_eq!(top_of(&tree, a), 50.0);

    let b = boxed(&mut tree, scene, "b", 50.0, 50.0);
    tree.add_constraint(b, Constraint::top_to_bottom_of("a", 10.0))
        .unwrap();
    assert_eq!(resolve_scene_layout(&mut tree, scene).unwrap(), 1);
    assert_eq!(top_of(&tree, b), 160.0);
    // Horizontal axis is untouched.
    assert_eq!(tree.node(b).unwrap().position().x, 0.0);
}

#[test]
fn parent_edges_use_parent_local_bounds() {
    let (mut tree, scene) = scene();
    let footer = boxed(&mut tree, scene, "footer", 100.0, 40.0);
    tree.set_constraints(
        footer,
        [
            Constraint::bottom_to_bottom_of(ConstraintTarget::Parent, 20.0),
            Constraint::end_to_end_of(ConstraintTarget::Parent, 0.0),
        ],
    )
    .unwrap();
    resolve_scene_layout(&mut tree, scene).unwrap();
    let frame = tree.node(footer).unwrap().frame_in_parent();
    assert_eq!(frame.y1, 780.0);
    assert_eq!(frame.x1, 400.0);
    assert_eq!(tree.node(footer).unwrap().position(), Point::new(350.0, 760.0));
}

#[test]
fn chains_resolve_in_dependency_order_regardless_of_declaration_order() {
    let (mut tree, scene) = scene();
    // c depends on b, b depends on a; c is declared first in tree order.
    let c = boxed(&mut tree, scene, "c", 10.0, 10.0);
    let b = boxed(&mut tree, scene, "b", 10.0, 20.0);
    let a = boxed(&mut tree, scene, "a", 10.0, 30.0);
    tree.add_constraint(a, Constraint::top_to_top_of(ConstraintTarget::Parent, 5.0))
        .unwrap();
    tree.add_constraint(b, Constraint::top_to_bottom_of("a", 5.0))
        .unwrap();
    tree.add_constraint(c, Constraint::top_to_bottom_of("b", 5.0))
        .unwrap();

    assert_eq!(resolve_scene_layout(&mut tree, scene).unwrap(), 3);
    assert_eq!(top_of(&tree, a), 5.0);
    assert_eq!(top_of(&tree, b), 40.0);
    assert_eq!(top_of(&tree, c), 65.0);
}

#[test]
fn two_constraints_on_one_axis_are_a_configuration_error() {
    let (mut tree, scene) = scene();
    boxed(&mut tree, scene, "a", 10.0, 10.0);
    let b = boxed(&mut tree, scene, "b", 10.0, 10.0);
    tree.add_constraint(b, Constraint::top_to_top_of("a", 0.0))
        .unwrap();
    tree.add_constraint(b, Constraint::top_to_bottom_of("a", 0.0))
        .unwrap();
    let err = resolve_scene_layout(&mut tree, scene).unwrap_err();
    assert!(err.is_configuration(), "{err}");
}

#[test]
fn cycles_fail_without_partial_layout() {
    let (mut tree, scene) = scene();
    let anchor = boxed(&mut tree, scene, "anchor", 10.0, 10.0);
    let a = boxed(&mut tree, scene, "a", 10.0, 10.0);
    let b = boxed(&mut tree, scene, "b", 10.0, 10.0);
    tree.add_constraint(anchor, Constraint::start_to_start_of(ConstraintTarget::Parent, 7.0))
        .unwrap();
    tree.add_constraint(a, Constraint::top_to_bottom_of("b", 0.0))
        .unwrap();
    tree.add_constraint(b, Constraint::top_to_bottom_of("a", 0.0))
        .unwrap();

    let err = resolve_scene_layout(&mut tree, scene).unwrap_err();
    match err {
        TrialkitError::Layout(msg) => {
            assert!(msg.contains("a") && msg.contains("b"), "{msg}");
        }
        other => panic!("expected layout error, got {other}"),
    }
    assert_eq!(tree.node(anchor).unwrap().position(), Point::ZERO);
}

#[test]
fn unknown_targets_are_not_found() {
    let (mut tree, scene) = scene();
    let b = boxed(&mut tree, scene, "b", 10.0, 10.0);
    tree.add_constraint(b, Constraint::top_to_top_of("ghost", 0.0))
        .unwrap();
    assert!(resolve_scene_layout(&mut tree, scene)
        .unwrap_err()
        .is_not_found());

    tree.set_constraints(b, [Constraint::top_to_top_of("b", 0.0)])
        .unwrap();
    assert!(resolve_scene_layout(&mut tree, scene)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn ancestor_targets_are_mapped_into_the_parent_space() {
    let (mut tree, scene) = scene();
    let panel = boxed(&mut tree, scene, "panel", 200.0, 200.0);
    tree.node_mut(panel)
        .unwrap()
        .set_position(Point::new(200.0, 300.0));
    let inner = tree.create_node("inner", NodeKind::Group);
    tree.add_child(panel, inner).unwrap();
    let dot = boxed(&mut tree, inner, "dot", 10.0, 10.0);
    tree.node_mut(inner)
        .unwrap()
        .set_position(Point::new(0.0, 50.0));
    tree.add_constraint(dot, Constraint::top_to_top_of("scene", 0.0))
        .unwrap();

    resolve_scene_layout(&mut tree, scene).unwrap();
    // Scene top (y = 0) is at y = -300 in panel space and -350 in inner space.
    assert_eq!(top_of(&tree, dot), -350.0);
    let abs = tree
        .convert_point_from_node(dot, Point::new(0.0, -5.0))
        .unwrap();
    assert!((abs.y - 0.0).abs() < 1e-9);
}

#[test]
fn replayed_constraint_sets_give_identical_layout() {
    let build = |constraints: Vec<Constraint>| {
        let (mut tree, scene) = scene();
        let a = boxed(&mut tree, scene, "a", 120.0, 60.0);
        tree.node_mut(a)
            .unwrap()
            .set_position(Point::new(100.0, 100.0));
        let b = boxed(&mut tree, scene, "b", 30.0, 30.0);
        tree.set_constraints(b, constraints).unwrap();
        resolve_scene_layout(&mut tree, scene).unwrap();
        (tree, b)
    };
    let declared = vec![
        Constraint::top_to_bottom_of("a", 12.0),
        Constraint::start_to_end_of("a", 4.0),
    ];
    let (tree1, b1) = build(declared.clone());
    let json = serde_json::to_string(&declared).unwrap();
    let restored: Vec<Constraint> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, declared);
    let (tree2, b2) = build(restored);
    assert_eq!(
        tree1.node(b1).unwrap().position(),
        tree2.node(b2).unwrap().position()
    );
}
