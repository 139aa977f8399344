use crate::{
    animation::{
        action::Action,
        scheduler::{RunId, advance_actions},
    },
    foundation::{
        config::EngineOpts,
        core::Point,
        error::{TrialkitError, TrialkitResult},
    },
    input::{dispatch::InputDispatcher, event::PointerInput},
    layout::solver::resolve_scene_layout,
    node::id::NodeId,
    render::{
        backend::{RenderBackend, submit_frame},
        draw::emit_scene,
    },
    scene::{
        stage::{SceneHook, Stage},
        transition::{TRANSITION_KEY, Transition},
    },
};

/// Presentation state of a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneState {
    /// Not shown: never presented, or fully dismissed.
    Unregistered,
    /// Presented and transitioning in.
    Appearing,
    Active,
    /// Being replaced by another scene.
    Disappearing,
}

#[derive(Clone, Copy, Debug)]
struct SceneTransition {
    incoming: NodeId,
    outgoing: NodeId,
    run: RunId,
}

/// Outcome of one [`FrameDriver::advance`].
#[derive(Debug, Default)]
pub struct FrameReport {
    /// 1-based frame counter.
    pub frame: u64,
    /// Delta actually applied after clamping.
    pub delta_ms: f64,
    /// Scenes whose layout pass failed this frame, with the reason. Their nodes kept the
    /// positions they had before the pass.
    pub layout_errors: Vec<(NodeId, TrialkitError)>,
    /// A present requested through [`Stage::request_present`] that could not be applied.
    pub present_error: Option<TrialkitError>,
    pub actions_completed: usize,
    /// Handler invocations made while dispatching input.
    pub events_dispatched: usize,
    pub draw_commands: usize,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.layout_errors.is_empty() && self.present_error.is_none()
    }
}

/// Drives registered scenes frame by frame: presents, layout, actions, input, then drawing.
///
/// ```
/// use trialkit::{EngineOpts, FrameDriver, NodeKind, RecordingBackend, Rgba8, Size, Transition};
///
/// let mut driver = FrameDriver::new(EngineOpts::default()).unwrap();
/// let scene = driver
///     .stage_mut()
///     .nodes_mut()
///     .create_scene("intro", Size::new(400.0, 800.0), Rgba8::WHITE);
/// driver.add_scene(scene).unwrap();
/// driver.present_scene(scene, Transition::None).unwrap();
///
/// let mut backend = RecordingBackend::new();
/// let report = driver.advance(16.0, &mut backend).unwrap();
/// assert!(report.is_clean());
/// assert_eq!(backend.last_frame().len(), 1);
/// ```
pub struct FrameDriver {
    stage: Stage,
    opts: EngineOpts,
    scenes: Vec<(NodeId, SceneState)>,
    current: Option<NodeId>,
    transition: Option<SceneTransition>,
    input: InputDispatcher,
    frame_count: u64,
}

impl FrameDriver {
    pub fn new(opts: EngineOpts) -> TrialkitResult<Self> {
        opts.validate()?;
        Ok(Self {
            stage: Stage::new(),
            input: InputDispatcher::new(opts.drag_threshold),
            opts,
            scenes: Vec::new(),
            current: None,
            transition: None,
            frame_count: 0,
        })
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn current_scene(&self) -> Option<NodeId> {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Register a scene so it can be presented.
    pub fn add_scene(&mut self, scene: NodeId) -> TrialkitResult<()> {
        let node = self.stage.nodes().node(scene)?;
        if !node.is_scene() {
            return Err(TrialkitError::configuration(format!(
                "'{}' is a {}, not a scene",
                node.name(),
                node.kind().type_name()
            )));
        }
        if self.is_registered(scene) {
            return Err(TrialkitError::configuration(format!(
                "scene '{}' is already registered",
                node.name()
            )));
        }
        self.scenes.push((scene, SceneState::Unregistered));
        self.stage.registered_scenes.insert(scene);
        Ok(())
    }

    /// Unregister a scene that is not currently shown.
    pub fn remove_scene(&mut self, scene: NodeId) -> TrialkitResult<()> {
        let state = self.registered_state(scene)?;
        if state != SceneState::Unregistered {
            return Err(TrialkitError::configuration(
                "cannot remove a scene while it is shown",
            ));
        }
        self.scenes.retain(|(s, _)| *s != scene);
        self.stage.unregister_scene(scene);
        Ok(())
    }

    pub fn is_registered(&self, scene: NodeId) -> bool {
        self.scenes.iter().any(|(s, _)| *s == scene)
    }

    /// State of `scene`; unknown scenes report [`SceneState::Unregistered`].
    pub fn scene_state(&self, scene: NodeId) -> SceneState {
        self.registered_state(scene)
            .unwrap_or(SceneState::Unregistered)
    }

    fn registered_state(&self, scene: NodeId) -> TrialkitResult<SceneState> {
        self.scenes
            .iter()
            .find(|(s, _)| *s == scene)
            .map(|(_, st)| *st)
            .ok_or_else(|| TrialkitError::not_found(format!("scene {scene:?} is not registered")))
    }

    fn set_state(&mut self, scene: NodeId, state: SceneState) {
        if let Some(entry) = self.scenes.iter_mut().find(|(s, _)| *s == scene) {
            tracing::debug!(scene = ?scene, from = ?entry.1, to = ?state, "scene state");
            entry.1 = state;
        }
    }

    /// Make `scene` the current scene.
    ///
    /// The previous scene is deactivated right away; a transition still in progress is
    /// finished first. `on_appear` callbacks run before this returns, so they precede the
    /// scene's first layout pass.
    pub fn present_scene(&mut self, scene: NodeId, transition: Transition) -> TrialkitResult<()> {
        self.registered_state(scene)?;
        self.stage.nodes().node(scene)?;
        transition.validate()?;
        self.finish_transition();

        let prior = self.current.filter(|&p| p != scene && self.stage.nodes().contains(p));
        if let Some(p) = prior {
            self.set_state(p, SceneState::Disappearing);
        }
        self.current = Some(scene);
        self.set_state(scene, SceneState::Appearing);
        self.stage.fire_scene_hook(scene, SceneHook::Appear);

        match (transition, prior) {
            (
                Transition::Slide {
                    direction,
                    duration_ms,
                    ease,
                },
                Some(outgoing),
            ) if duration_ms > 0.0 => {
                let offset = direction.offset(self.opts.surface_size);
                self.place_scene(scene, Point::ZERO - offset);
                let incoming = Action::move_to(Point::ZERO, duration_ms)?.eased(ease);
                let leaving = Action::move_to(offset.to_point(), duration_ms)?.eased(ease);
                let run = self
                    .stage
                    .run_action_with_key(scene, TRANSITION_KEY, incoming)?;
                self.stage
                    .run_action_with_key(outgoing, TRANSITION_KEY, leaving)?;
                // Gestures in progress belong to the scene being replaced.
                self.input.reset();
                self.transition = Some(SceneTransition {
                    incoming: scene,
                    outgoing,
                    run,
                });
            }
            _ => {
                if let Some(p) = prior {
                    self.dismiss(p);
                }
                self.place_scene(scene, Point::ZERO);
                self.set_state(scene, SceneState::Active);
                if prior.is_some() {
                    self.input.reset();
                }
            }
        }
        Ok(())
    }

    fn place_scene(&mut self, scene: NodeId, position: Point) {
        if let Ok(node) = self.stage.nodes_mut().node_mut(scene) {
            node.set_position(position);
        }
    }

    fn dismiss(&mut self, scene: NodeId) {
        self.stage.remove_action(scene, TRANSITION_KEY);
        self.place_scene(scene, Point::ZERO);
        self.set_state(scene, SceneState::Unregistered);
        self.stage.fire_scene_hook(scene, SceneHook::Disappear);
    }

    /// Snap an in-progress transition to its end state.
    fn finish_transition(&mut self) {
        let Some(t) = self.transition.take() else {
            return;
        };
        self.stage.remove_action(t.incoming, TRANSITION_KEY);
        self.place_scene(t.incoming, Point::ZERO);
        self.set_state(t.incoming, SceneState::Active);
        self.dismiss(t.outgoing);
    }

    /// Queue raw pointer input for the next frame.
    pub fn dispatch_pointer(&mut self, input: PointerInput) {
        self.input.enqueue(input);
    }

    pub fn pending_input(&self) -> usize {
        self.input.pending()
    }

    /// Forget registered scenes whose nodes were disposed.
    fn prune_disposed_scenes(&mut self) {
        let Self { stage, scenes, .. } = self;
        scenes.retain(|&(scene, _)| {
            let alive = stage.nodes().contains(scene);
            if !alive {
                tracing::debug!(scene = ?scene, "unregistering disposed scene");
                stage.unregister_scene(scene);
            }
            alive
        });
    }

    /// Scenes processed this frame: the outgoing scene of a transition, then the current one.
    fn scenes_in_frame(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(2);
        if let Some(t) = self.transition {
            out.push(t.outgoing);
        }
        out.extend(self.current);
        out.retain(|&s| self.stage.nodes().contains(s));
        out
    }

    /// Run one frame of `delta_ms` milliseconds and draw it to `backend`.
    ///
    /// Layout failures and a requested present that cannot be applied end up in the report.
    /// Backend errors abort the frame.
    #[tracing::instrument(skip(self, backend), fields(frame = self.frame_count + 1))]
    pub fn advance(
        &mut self,
        delta_ms: f64,
        backend: &mut dyn RenderBackend,
    ) -> TrialkitResult<FrameReport> {
        let dt = self.opts.clamp_delta(delta_ms);
        self.frame_count += 1;
        self.stage.advance_clock(dt);
        let mut report = FrameReport {
            frame: self.frame_count,
            delta_ms: dt,
            ..FrameReport::default()
        };

        self.prune_disposed_scenes();
        if let Some((scene, transition)) = self.stage.take_pending_present()
            && let Err(err) = self.present_scene(scene, transition)
        {
            tracing::warn!(scene = ?scene, error = %err, "requested present failed");
            report.present_error = Some(err);
        }
        if self.current.is_some_and(|c| !self.stage.nodes().contains(c)) {
            tracing::warn!("current scene was disposed");
            self.current = None;
            self.transition = None;
        }

        let scenes = self.scenes_in_frame();
        for &scene in &scenes {
            if let Err(err) = resolve_scene_layout(self.stage.nodes_mut(), scene) {
                tracing::warn!(scene = ?scene, error = %err, "layout pass failed");
                report.layout_errors.push((scene, err));
            }
        }

        report.actions_completed = advance_actions(&mut self.stage, &scenes, dt);

        if let Some(t) = self.transition
            && self
                .stage
                .run_state(t.run)
                .is_none_or(|s| s.is_finished())
        {
            self.finish_transition();
        }

        match self.current {
            Some(scene) if self.transition.is_none() => {
                report.events_dispatched = self.input.drain(&mut self.stage, scene);
            }
            _ => {
                let dropped = self.input.reset();
                if dropped > 0 {
                    tracing::debug!(dropped, "dropped pointer input during transition");
                }
            }
        }

        let commands: Vec<_> = self
            .scenes_in_frame()
            .into_iter()
            .flat_map(|scene| emit_scene(self.stage.nodes(), scene))
            .collect();
        report.draw_commands = commands.len();
        submit_frame(backend, self.opts.surface_size, &commands)?;
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/driver.rs"]
mod tests;
