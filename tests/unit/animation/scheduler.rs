use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::{
    foundation::core::{Point, Rgba8, Size},
    node::kind::NodeKind,
};

struct Fixture {
    stage: Stage,
    scene: NodeId,
    a: NodeId,
    b: NodeId,
}

fn fixture() -> Fixture {
    let mut stage = Stage::new();
    let tree = stage.nodes_mut();
    let scene = tree.create_scene("scene", Size::new(400.0, 800.0), Rgba8::WHITE);
    let a = tree.create_node("a", NodeKind::Group);
    let b = tree.create_node("b", NodeKind::Group);
    tree.add_child(scene, a).unwrap();
    tree.add_child(scene, b).unwrap();
    Fixture { stage, scene, a, b }
}

fn x_of(stage: &Stage, node: NodeId) -> f64 {
    stage.nodes().node(node).unwrap().position().x
}

#[test]
fn scheduled_runs_wait_for_the_next_tick() {
    let mut f = fixture();
    let run = f
        .stage
        .run_action(f.a, Action::move_to(Point::new(10.0, 0.0), 0.0).unwrap())
        .unwrap();
    assert_eq!(f.stage.run_state(run), Some(RunState::Pending));
    assert_eq!(x_of(&f.stage, f.a), 0.0);
    assert!(f.stage.has_actions(f.a));

    assert_eq!(advance_actions(&mut f.stage, &[f.scene], 16.0), 1);
    assert_eq!(x_of(&f.stage, f.a), 10.0);
    assert_eq!(f.stage.run_state(run), Some(RunState::Completed));
    assert!(!f.stage.has_actions(f.a));
}

#[test]
fn runs_scheduled_from_a_callback_start_next_frame() {
    let mut f = fixture();
    let a = f.a;
    let follow_up = Action::move_to(Point::new(50.0, 0.0), 0.0).unwrap();
    f.stage
        .run_action(
            a,
            Action::custom(move |stage, node| {
                stage.run_action(node, follow_up.clone()).unwrap();
            }),
        )
        .unwrap();

    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(x_of(&f.stage, a), 0.0);
    assert!(f.stage.has_actions(a));
    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(x_of(&f.stage, a), 50.0);
}

#[test]
fn keyed_run_replaces_the_previous_one() {
    let mut f = fixture();
    let right = Action::move_to(Point::new(100.0, 0.0), 100.0).unwrap();
    let left = Action::move_to(Point::new(-100.0, 0.0), 100.0).unwrap();
    let first = f.stage.run_action_with_key(f.a, "slide", right).unwrap();
    let second = f.stage.run_action_with_key(f.a, "slide", left).unwrap();
    assert_eq!(f.stage.run_state(first), Some(RunState::Cancelled));
    advance_actions(&mut f.stage, &[f.scene], 50.0);
    assert_eq!(x_of(&f.stage, f.a), -50.0);
    assert_eq!(f.stage.run_state(second), Some(RunState::Running));
    assert!(f.stage.has_action(f.a, "slide"));
}

#[test]
fn remove_action_only_cancels_matching_key() {
    let mut f = fixture();
    let slow = Action::move_to(Point::new(100.0, 0.0), 100.0).unwrap();
    f.stage.run_action_with_key(f.a, "move", slow).unwrap();
    let fade_out = Action::fade_alpha_to(0.0, 100.0).unwrap();
    let fade = f.stage.run_action_with_key(f.a, "fade", fade_out).unwrap();
    advance_actions(&mut f.stage, &[f.scene], 50.0);

    assert!(f.stage.remove_action(f.a, "move"));
    assert!(!f.stage.remove_action(f.a, "move"));
    advance_actions(&mut f.stage, &[f.scene], 25.0);
    assert_eq!(x_of(&f.stage, f.a), 50.0);
    assert_eq!(f.stage.run_state(fade), Some(RunState::Running));
    assert!(!f.stage.has_action(f.a, "move"));
    assert!(f.stage.has_action(f.a, "fade"));
}

#[test]
fn cancel_from_a_callback_stops_later_runs_in_the_same_frame() {
    let mut f = fixture();
    let (a, b) = (f.a, f.b);
    let fired = Rc::new(Cell::new(false));
    let flag = fired.clone();
    let cancel_b = Action::custom(move |stage, _| {
        stage.remove_all_actions(b);
    });
    f.stage.run_action(a, cancel_b).unwrap();
    let doomed = f
        .stage
        .run_action(b, Action::custom(move |_, _| flag.set(true)))
        .unwrap();

    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert!(!fired.get());
    assert_eq!(f.stage.run_state(doomed), Some(RunState::Cancelled));
}

#[test]
fn a_run_can_cancel_itself_between_sequence_members() {
    let mut f = fixture();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    let run = f
        .stage
        .run_action(
            f.a,
            Action::sequence([
                Action::custom(move |stage, node| {
                    l1.borrow_mut().push("first");
                    stage.remove_all_actions(node);
                }),
                Action::custom(move |_, _| l2.borrow_mut().push("second")),
            ]),
        )
        .unwrap();

    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(f.stage.run_state(run), Some(RunState::Cancelled));
}

#[test]
fn runs_outside_the_processed_scenes_do_not_advance() {
    let mut f = fixture();
    let loose = f.stage.nodes_mut().create_node("loose", NodeKind::Group);
    let run = f
        .stage
        .run_action(loose, Action::move_to(Point::new(5.0, 0.0), 0.0).unwrap())
        .unwrap();
    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(f.stage.run_state(run), Some(RunState::Pending));

    f.stage.nodes_mut().add_child(f.scene, loose).unwrap();
    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(f.stage.run_state(run), Some(RunState::Completed));
}

#[test]
fn disposing_a_node_drops_its_runs() {
    let mut f = fixture();
    let run = f
        .stage
        .run_action(f.b, Action::wait(100.0).unwrap())
        .unwrap();
    f.stage.dispose_node(f.b).unwrap();
    assert_eq!(f.stage.run_state(run), Some(RunState::Cancelled));
    advance_actions(&mut f.stage, &[f.scene], 16.0);
    assert_eq!(f.stage.active_run_count(), 0);
    assert!(f.stage.run_action(f.b, Action::wait(1.0).unwrap()).is_err());
}
