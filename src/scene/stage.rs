use std::collections::{HashMap, HashSet};

use crate::{
    animation::{
        action::Action,
        run::RunState,
        scheduler::{ActionScheduler, RunId},
    },
    foundation::core::Point,
    foundation::error::{TrialkitError, TrialkitResult},
    input::{
        dispatch::hit_test,
        event::{EventKind, PointerEvent},
        handlers::{EventHandlers, HandlerId},
    },
    node::{id::NodeId, store::NodeTree},
    scene::transition::Transition,
    timing::timers::Timers,
};

/// Callback fired when a scene appears or disappears.
pub type SceneCallback = Box<dyn FnMut(&mut Stage, NodeId)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SceneHook {
    Appear,
    Disappear,
}

/// Mutable engine state: the node tree plus everything attached to nodes.
///
/// Action callbacks and event handlers receive `&mut Stage`, so they can edit the tree,
/// schedule or cancel actions, register handlers, read timers and request scene changes.
#[derive(Default)]
pub struct Stage {
    pub(crate) nodes: NodeTree,
    pub(crate) actions: ActionScheduler,
    pub(crate) handlers: EventHandlers,
    scene_hooks: HashMap<(NodeId, SceneHook), Vec<SceneCallback>>,
    timers: Timers,
    clock_ms: f64,
    pending_present: Option<(NodeId, Transition)>,
    /// Scenes registered with the driver; kept in sync by `FrameDriver`.
    pub(crate) registered_scenes: HashSet<NodeId>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeTree {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeTree {
        &mut self.nodes
    }

    /// Engine clock: the sum of every (clamped) frame delta so far.
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    pub(crate) fn advance_clock(&mut self, delta_ms: f64) {
        self.clock_ms += delta_ms;
        self.timers.set_now(self.clock_ms);
    }

    // ---- actions ----

    /// Schedule `action` on `node`. It starts on the next frame.
    pub fn run_action(&mut self, node: NodeId, action: Action) -> TrialkitResult<RunId> {
        self.nodes.node(node)?;
        Ok(self.actions.schedule(node, None, action))
    }

    /// Like [`Self::run_action`], replacing any run on `node` already using `key`.
    pub fn run_action_with_key(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        action: Action,
    ) -> TrialkitResult<RunId> {
        self.nodes.node(node)?;
        Ok(self.actions.schedule(node, Some(key.into()), action))
    }

    /// Cancel `node`'s runs scheduled under `key`. Returns whether any was cancelled.
    pub fn remove_action(&mut self, node: NodeId, key: &str) -> bool {
        self.actions
            .cancel_matching(|n, k| n == node && k == Some(key))
            > 0
    }

    /// Cancel every run on `node`. Returns the number of runs cancelled.
    pub fn remove_all_actions(&mut self, node: NodeId) -> usize {
        self.actions.cancel_matching(|n, _| n == node)
    }

    pub fn has_actions(&self, node: NodeId) -> bool {
        self.actions.has_matching(|n, _| n == node)
    }

    pub fn has_action(&self, node: NodeId, key: &str) -> bool {
        self.actions.has_matching(|n, k| n == node && k == Some(key))
    }

    /// State of a run. Finished runs stay queryable for a while after they end.
    pub fn run_state(&self, run: RunId) -> Option<RunState> {
        self.actions.state_of(run)
    }

    pub fn active_run_count(&self) -> usize {
        self.actions.len()
    }

    // ---- input handlers ----

    pub fn on_event(
        &mut self,
        node: NodeId,
        kind: EventKind,
        handler: impl FnMut(&mut Stage, &mut PointerEvent) + 'static,
    ) -> TrialkitResult<HandlerId> {
        self.nodes.node(node)?;
        Ok(self.handlers.add(node, kind, Box::new(handler)))
    }

    pub fn on_tap(
        &mut self,
        node: NodeId,
        handler: impl FnMut(&mut Stage, &mut PointerEvent) + 'static,
    ) -> TrialkitResult<HandlerId> {
        self.on_event(node, EventKind::Tap, handler)
    }

    pub fn on_tap_down(
        &mut self,
        node: NodeId,
        handler: impl FnMut(&mut Stage, &mut PointerEvent) + 'static,
    ) -> TrialkitResult<HandlerId> {
        self.on_event(node, EventKind::TapDown, handler)
    }

    pub fn on_tap_up(
        &mut self,
        node: NodeId,
        handler: impl FnMut(&mut Stage, &mut PointerEvent) + 'static,
    ) -> TrialkitResult<HandlerId> {
        self.on_event(node, EventKind::TapUp, handler)
    }

    pub fn on_drag(
        &mut self,
        node: NodeId,
        handler: impl FnMut(&mut Stage, &mut PointerEvent) + 'static,
    ) -> TrialkitResult<HandlerId> {
        self.on_event(node, EventKind::Drag, handler)
    }

    pub fn remove_handler(&mut self, handler: HandlerId) -> bool {
        self.handlers.remove(handler)
    }

    /// Drop every handler of `node`. Handlers of `node` that have not run yet for the event
    /// being dispatched are skipped.
    pub fn remove_handlers(&mut self, node: NodeId) {
        self.handlers.clear_node(node);
    }

    pub fn has_handler(&self, node: NodeId, kind: EventKind) -> bool {
        self.handlers.has_handler(node, kind)
    }

    /// Topmost interactive node of `scene` under `point` (surface coordinates).
    pub fn hit_test(&self, scene: NodeId, point: Point) -> Option<NodeId> {
        hit_test(&self.nodes, scene, point)
    }

    // ---- scenes ----

    /// Register a callback fired each time `scene` starts appearing, before its first layout.
    pub fn on_appear(
        &mut self,
        scene: NodeId,
        callback: impl FnMut(&mut Stage, NodeId) + 'static,
    ) -> TrialkitResult<()> {
        self.add_scene_hook(scene, SceneHook::Appear, Box::new(callback))
    }

    /// Register a callback fired when `scene` stops being shown.
    pub fn on_disappear(
        &mut self,
        scene: NodeId,
        callback: impl FnMut(&mut Stage, NodeId) + 'static,
    ) -> TrialkitResult<()> {
        self.add_scene_hook(scene, SceneHook::Disappear, Box::new(callback))
    }

    fn add_scene_hook(
        &mut self,
        scene: NodeId,
        hook: SceneHook,
        callback: SceneCallback,
    ) -> TrialkitResult<()> {
        if !self.nodes.node(scene)?.is_scene() {
            return Err(TrialkitError::configuration(format!(
                "'{}' is not a scene",
                self.nodes.node(scene)?.name()
            )));
        }
        self.scene_hooks
            .entry((scene, hook))
            .or_default()
            .push(callback);
        Ok(())
    }

    pub(crate) fn fire_scene_hook(&mut self, scene: NodeId, hook: SceneHook) {
        let Some(mut callbacks) = self.scene_hooks.remove(&(scene, hook)) else {
            return;
        };
        for cb in &mut callbacks {
            cb(self, scene);
        }
        if self.nodes.contains(scene) {
            let slot = self.scene_hooks.entry((scene, hook)).or_default();
            let added = std::mem::replace(slot, callbacks);
            slot.extend(added);
        }
    }

    /// Ask the driver to present `scene` at the start of the next frame.
    ///
    /// A later request in the same frame replaces an earlier one. `scene` must already be
    /// registered with the driver.
    pub fn request_present(&mut self, scene: NodeId, transition: Transition) -> TrialkitResult<()> {
        if !self.nodes.node(scene)?.is_scene() {
            return Err(TrialkitError::configuration(format!(
                "'{}' is not a scene",
                self.nodes.node(scene)?.name()
            )));
        }
        if !self.registered_scenes.contains(&scene) {
            return Err(TrialkitError::not_found(format!(
                "scene {scene:?} is not registered"
            )));
        }
        transition.validate()?;
        self.pending_present = Some((scene, transition));
        Ok(())
    }

    pub(crate) fn take_pending_present(&mut self) -> Option<(NodeId, Transition)> {
        self.pending_present.take()
    }

    pub(crate) fn unregister_scene(&mut self, scene: NodeId) {
        self.registered_scenes.remove(&scene);
        if self.pending_present.is_some_and(|(s, _)| s == scene) {
            self.pending_present = None;
        }
    }

    /// Detach and free `id` with its subtree, cancelling their actions and dropping their
    /// handlers and scene callbacks.
    pub fn dispose_node(&mut self, id: NodeId) -> TrialkitResult<Vec<NodeId>> {
        let freed = self.nodes.dispose(id)?;
        for &n in &freed {
            self.actions.cancel_matching(|node, _| node == n);
            self.handlers.clear_node(n);
            self.scene_hooks.remove(&(n, SceneHook::Appear));
            self.scene_hooks.remove(&(n, SceneHook::Disappear));
        }
        Ok(freed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stage.rs"]
mod tests;
