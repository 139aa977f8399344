use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::{
    foundation::core::{Rgba8, Size},
    layout::constraint::{Constraint, ConstraintTarget},
    node::kind::NodeKind,
    render::backend::RecordingBackend,
    scene::transition::SlideDirection,
};

fn driver() -> FrameDriver {
    FrameDriver::new(EngineOpts::default()).unwrap()
}

fn scene(driver: &mut FrameDriver, name: &str) -> NodeId {
    let id = driver
        .stage_mut()
        .nodes_mut()
        .create_scene(name, Size::new(400.0, 800.0), Rgba8::WHITE);
    driver.add_scene(id).unwrap();
    id
}

fn x_of(driver: &FrameDriver, node: NodeId) -> f64 {
    driver.stage().nodes().node(node).unwrap().position().x
}

#[test]
fn scenes_must_be_registered_scene_nodes() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let tree = d.stage_mut().nodes_mut();
    let group = tree.create_node("group", NodeKind::Group);
    let loose = tree.create_scene("loose", Size::new(10.0, 10.0), Rgba8::WHITE);

    assert!(d.add_scene(group).unwrap_err().is_configuration());
    assert!(d.add_scene(menu).unwrap_err().is_configuration());
    assert!(
        d.present_scene(loose, Transition::None)
            .unwrap_err()
            .is_not_found()
    );
    assert_eq!(d.scene_state(loose), SceneState::Unregistered);
}

#[test]
fn immediate_present_swaps_scenes_and_fires_hooks() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    let log: Rc<RefCell<Vec<&str>>> = Rc::default();
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    let stage = d.stage_mut();
    stage.on_appear(menu, move |_, _| l1.borrow_mut().push("menu appear")).unwrap();
    stage.on_disappear(menu, move |_, _| l2.borrow_mut().push("menu disappear")).unwrap();
    stage.on_appear(game, move |_, _| l3.borrow_mut().push("game appear")).unwrap();

    d.present_scene(menu, Transition::None).unwrap();
    assert_eq!(d.scene_state(menu), SceneState::Active);
    d.present_scene(game, Transition::None).unwrap();
    assert_eq!(d.current_scene(), Some(game));
    assert_eq!(d.scene_state(menu), SceneState::Unregistered);
    assert_eq!(d.scene_state(game), SceneState::Active);
    assert_eq!(
        *log.borrow(),
        vec!["menu appear", "game appear", "menu disappear"]
    );

    assert!(d.remove_scene(game).is_err());
    d.remove_scene(menu).unwrap();
    assert!(!d.is_registered(menu));
}

#[test]
fn appear_hooks_run_before_the_first_layout_pass() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let title = d
        .stage_mut()
        .nodes_mut()
        .create_node("title", NodeKind::label("Trial"));
    {
        let tree = d.stage_mut().nodes_mut();
        tree.add_child(menu, title).unwrap();
        tree.node_mut(title).unwrap().set_size(Size::new(100.0, 40.0));
    }
    d.stage_mut()
        .on_appear(menu, move |stage, _| {
            stage
                .nodes_mut()
                .add_constraint(title, Constraint::top_to_top_of(ConstraintTarget::Parent, 30.0))
                .unwrap();
        })
        .unwrap();
    d.present_scene(menu, Transition::None).unwrap();

    let mut backend = RecordingBackend::new();
    d.advance(16.0, &mut backend).unwrap();
    assert_eq!(d.stage().nodes().node(title).unwrap().position().y, 50.0);
}

#[test]
fn slide_moves_both_scenes_then_settles() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    let mut backend = RecordingBackend::new();
    d.present_scene(menu, Transition::None).unwrap();
    d.advance(16.0, &mut backend).unwrap();

    let slide = Transition::slide(SlideDirection::Left, 300.0).unwrap();
    d.present_scene(game, slide).unwrap();
    assert!(d.is_transitioning());
    assert_eq!(d.scene_state(menu), SceneState::Disappearing);
    assert_eq!(d.scene_state(game), SceneState::Appearing);
    assert_eq!(x_of(&d, game), 400.0);

    let report = d.advance(150.0, &mut backend).unwrap();
    assert_eq!(x_of(&d, game), 200.0);
    assert_eq!(x_of(&d, menu), -200.0);
    assert_eq!(report.draw_commands, 2);
    assert_eq!(backend.last_frame()[0].node, menu);

    d.advance(150.0, &mut backend).unwrap();
    assert!(!d.is_transitioning());
    assert_eq!(d.scene_state(game), SceneState::Active);
    assert_eq!(d.scene_state(menu), SceneState::Unregistered);
    assert_eq!(x_of(&d, game), 0.0);
    assert_eq!(x_of(&d, menu), 0.0);
    assert_eq!(backend.last_frame().len(), 1);
}

#[test]
fn presenting_mid_transition_finishes_it_first() {
    let mut d = driver();
    let a = scene(&mut d, "a");
    let b = scene(&mut d, "b");
    let c = scene(&mut d, "c");
    let mut backend = RecordingBackend::new();
    d.present_scene(a, Transition::None).unwrap();
    let slide = Transition::slide(SlideDirection::Up, 200.0).unwrap();
    d.present_scene(b, slide).unwrap();
    d.advance(50.0, &mut backend).unwrap();

    d.present_scene(c, Transition::None).unwrap();
    assert!(!d.is_transitioning());
    assert_eq!(d.scene_state(a), SceneState::Unregistered);
    assert_eq!(d.scene_state(b), SceneState::Unregistered);
    assert_eq!(d.scene_state(c), SceneState::Active);
    assert_eq!(d.stage().nodes().node(b).unwrap().position(), Point::ZERO);
}

#[test]
fn input_is_dropped_while_transitioning() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    let mut backend = RecordingBackend::new();
    d.present_scene(menu, Transition::None).unwrap();
    let slide = Transition::slide(SlideDirection::Right, 100.0).unwrap();
    d.present_scene(game, slide).unwrap();

    d.dispatch_pointer(PointerInput::down(10.0, 10.0));
    assert_eq!(d.pending_input(), 1);
    let report = d.advance(16.0, &mut backend).unwrap();
    assert_eq!(report.events_dispatched, 0);
    assert_eq!(d.pending_input(), 0);
}

#[test]
fn present_requested_from_a_handler_applies_next_frame() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    let play = {
        let tree = d.stage_mut().nodes_mut();
        let play = tree.create_node("play", NodeKind::rect(Rgba8::BLACK));
        tree.add_child(menu, play).unwrap();
        let n = tree.node_mut(play).unwrap();
        n.set_size(Size::new(100.0, 100.0));
        n.set_position(Point::new(200.0, 400.0));
        n.set_user_interaction_enabled(true);
        play
    };
    d.stage_mut()
        .on_tap(play, move |stage, _| {
            stage.request_present(game, Transition::None).unwrap();
        })
        .unwrap();
    d.present_scene(menu, Transition::None).unwrap();

    let mut backend = RecordingBackend::new();
    d.dispatch_pointer(PointerInput::down(200.0, 400.0));
    d.dispatch_pointer(PointerInput::up(200.0, 400.0));
    let report = d.advance(16.0, &mut backend).unwrap();
    assert_eq!(report.events_dispatched, 1);
    assert_eq!(d.current_scene(), Some(menu));

    d.advance(16.0, &mut backend).unwrap();
    assert_eq!(d.current_scene(), Some(game));
    assert_eq!(d.scene_state(menu), SceneState::Unregistered);
}

#[test]
fn layout_errors_are_reported_per_frame() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let tree = d.stage_mut().nodes_mut();
    let orphan = tree.create_node("orphan", NodeKind::Group);
    tree.add_child(menu, orphan).unwrap();
    tree.add_constraint(orphan, Constraint::top_to_bottom_of("ghost", 0.0))
        .unwrap();
    d.present_scene(menu, Transition::None).unwrap();

    let mut backend = RecordingBackend::new();
    let report = d.advance(16.0, &mut backend).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.layout_errors[0].0, menu);
    // The frame still renders.
    assert_eq!(report.draw_commands, 1);
}

#[test]
fn deltas_are_clamped_before_use() {
    let opts = EngineOpts {
        max_frame_delta_ms: Some(50.0),
        ..EngineOpts::default()
    };
    let mut d = FrameDriver::new(opts).unwrap();
    let menu = scene(&mut d, "menu");
    d.present_scene(menu, Transition::None).unwrap();
    let run = d
        .stage_mut()
        .run_action(menu, Action::wait(80.0).unwrap())
        .unwrap();

    let mut backend = RecordingBackend::new();
    let report = d.advance(1000.0, &mut backend).unwrap();
    assert_eq!(report.delta_ms, 50.0);
    assert_eq!(d.stage().now_ms(), 50.0);
    assert!(d.stage().run_state(run).is_some_and(|s| !s.is_finished()));
    let report = d.advance(-3.0, &mut backend).unwrap();
    assert_eq!(report.delta_ms, 0.0);
    assert_eq!(report.frame, 2);
}

#[test]
fn disposing_the_current_scene_stops_drawing() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    d.present_scene(menu, Transition::None).unwrap();
    d.stage_mut().dispose_node(menu).unwrap();

    let mut backend = RecordingBackend::new();
    let report = d.advance(16.0, &mut backend).unwrap();
    assert_eq!(d.current_scene(), None);
    assert_eq!(report.draw_commands, 0);
    assert_eq!(backend.frames_rendered(), 1);
}

#[test]
fn presents_of_unregistered_scenes_fail_where_they_are_requested() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let loose = d
        .stage_mut()
        .nodes_mut()
        .create_scene("loose", Size::new(400.0, 800.0), Rgba8::WHITE);
    let refused: Rc<Cell<Option<bool>>> = Rc::default();
    let seen = refused.clone();
    d.stage_mut()
        .run_action(
            menu,
            Action::custom(move |stage, _| {
                seen.set(Some(stage.request_present(loose, Transition::None).is_err()));
            }),
        )
        .unwrap();
    d.present_scene(menu, Transition::None).unwrap();

    let mut backend = RecordingBackend::new();
    let report = d.advance(16.0, &mut backend).unwrap();
    assert_eq!(refused.get(), Some(true));
    assert!(report.is_clean());
    let report = d.advance(16.0, &mut backend).unwrap();
    assert!(report.is_clean());
    assert_eq!(d.current_scene(), Some(menu));
    assert_eq!(backend.frames_rendered(), 2);
}

#[test]
fn failed_requested_present_is_reported_and_the_frame_still_runs() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let loose = d
        .stage_mut()
        .nodes_mut()
        .create_scene("loose", Size::new(400.0, 800.0), Rgba8::WHITE);
    d.present_scene(menu, Transition::None).unwrap();
    // The stage believes `loose` is registered while the driver does not.
    d.stage_mut().registered_scenes.insert(loose);
    d.stage_mut().request_present(loose, Transition::None).unwrap();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    d.stage_mut()
        .run_action(menu, Action::custom(move |_, _| counter.set(counter.get() + 1)))
        .unwrap();

    let mut backend = RecordingBackend::new();
    let report = d.advance(16.0, &mut backend).unwrap();
    assert!(report.present_error.as_ref().is_some_and(|e| e.is_not_found()));
    assert!(!report.is_clean());
    assert_eq!(d.current_scene(), Some(menu));
    assert_eq!(fired.get(), 1);
    assert_eq!(report.draw_commands, 1);
    assert_eq!(d.stage().now_ms(), 16.0);
}

#[test]
fn layout_failure_in_the_outgoing_scene_spares_the_incoming_one() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    let (x, y, title) = {
        let tree = d.stage_mut().nodes_mut();
        let mut boxed = |parent: NodeId, name: &str, at: Point| {
            let id = tree.create_node(name, NodeKind::rect(Rgba8::BLACK));
            tree.add_child(parent, id).unwrap();
            let n = tree.node_mut(id).unwrap();
            n.set_size(Size::new(100.0, 40.0));
            n.set_position(at);
            id
        };
        let x = boxed(menu, "x", Point::new(100.0, 100.0));
        let y = boxed(menu, "y", Point::new(200.0, 300.0));
        let title = boxed(game, "title", Point::new(0.0, 0.0));
        tree.add_constraint(x, Constraint::top_to_bottom_of("y", 0.0))
            .unwrap();
        tree.add_constraint(y, Constraint::top_to_bottom_of("x", 0.0))
            .unwrap();
        tree.add_constraint(title, Constraint::top_to_top_of(ConstraintTarget::Parent, 30.0))
            .unwrap();
        (x, y, title)
    };
    let mut backend = RecordingBackend::new();
    d.present_scene(menu, Transition::None).unwrap();
    let slide = Transition::slide(SlideDirection::Left, 300.0).unwrap();
    d.present_scene(game, slide).unwrap();

    let report = d.advance(100.0, &mut backend).unwrap();
    assert!(d.is_transitioning());
    assert_eq!(report.layout_errors.len(), 1);
    assert_eq!(report.layout_errors[0].0, menu);
    let pos = |id| d.stage().nodes().node(id).unwrap().position();
    assert_eq!(pos(title).y, 50.0);
    assert_eq!(pos(x), Point::new(100.0, 100.0));
    assert_eq!(pos(y), Point::new(200.0, 300.0));
    // Both scenes still draw.
    assert_eq!(report.draw_commands, 5);
}

#[test]
fn disposed_scenes_are_unregistered_on_the_next_frame() {
    let mut d = driver();
    let menu = scene(&mut d, "menu");
    let game = scene(&mut d, "game");
    d.present_scene(menu, Transition::None).unwrap();
    d.stage_mut().dispose_node(game).unwrap();
    assert!(d.is_registered(game));

    let mut backend = RecordingBackend::new();
    d.advance(16.0, &mut backend).unwrap();
    assert!(!d.is_registered(game));
    assert_eq!(d.scene_state(game), SceneState::Unregistered);
    assert!(d.is_registered(menu));
    assert!(
        d.stage_mut()
            .request_present(game, Transition::None)
            .unwrap_err()
            .is_not_found()
    );
}
