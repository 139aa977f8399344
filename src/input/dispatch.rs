use std::collections::{HashMap, VecDeque};

use crate::{
    foundation::{
        core::{Affine, Point, invert_affine},
        error::TrialkitResult,
    },
    input::{
        event::{EventKind, PointerEvent, PointerInput, PointerPhase},
        handlers::invoke_handlers,
    },
    node::{id::NodeId, store::NodeTree, traverse::paint_order},
    scene::stage::Stage,
};

/// Topmost interactive node under `point`, given in the coordinate space `scene` lives in.
///
/// Children are tested before their parent, in reverse paint order. Hidden subtrees are skipped
/// entirely; nodes with interaction disabled are never hit but their children still can be.
pub(crate) fn hit_test(tree: &NodeTree, scene: NodeId, point: Point) -> Option<NodeId> {
    hit_node(tree, scene, Affine::IDENTITY, point)
}

fn hit_node(tree: &NodeTree, id: NodeId, parent: Affine, point: Point) -> Option<NodeId> {
    let node = tree.node(id).ok()?;
    if node.is_hidden() {
        return None;
    }
    let transform = parent * node.local_transform();
    for &child in paint_order(tree, id).iter().rev() {
        if let Some(hit) = hit_node(tree, child, transform, point) {
            return Some(hit);
        }
    }
    if node.is_user_interaction_enabled()
        && let Some(inv) = invert_affine(transform)
        && node.local_bounds().contains(inv * point)
    {
        return Some(id);
    }
    None
}

#[derive(Clone, Copy, Debug)]
struct Press {
    node: Option<NodeId>,
    origin: Point,
    last: Point,
    dragging: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct PointerState {
    press: Option<Press>,
    hovered: Option<NodeId>,
}

/// Queues raw pointer input and turns it into node events once per frame.
#[derive(Debug)]
pub(crate) struct InputDispatcher {
    queue: VecDeque<PointerInput>,
    pointers: HashMap<u32, PointerState>,
    drag_threshold: f64,
}

impl InputDispatcher {
    pub(crate) fn new(drag_threshold: f64) -> Self {
        Self {
            queue: VecDeque::new(),
            pointers: HashMap::new(),
            drag_threshold,
        }
    }

    pub(crate) fn enqueue(&mut self, input: PointerInput) {
        self.queue.push_back(input);
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Discard queued input and forget every gesture in progress.
    pub(crate) fn reset(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.pointers.clear();
        dropped
    }

    /// Dispatch every queued input against `scene`. Returns how many handler invocations ran.
    pub(crate) fn drain(&mut self, stage: &mut Stage, scene: NodeId) -> usize {
        let mut delivered = 0;
        while let Some(input) = self.queue.pop_front() {
            delivered += self.process(stage, scene, input);
        }
        delivered
    }

    fn process(&mut self, stage: &mut Stage, scene: NodeId, input: PointerInput) -> usize {
        let mut state = self.pointers.remove(&input.pointer_id).unwrap_or_default();
        let mut ctx = Delivery {
            scene,
            pointer_id: input.pointer_id,
            position: input.position,
            timestamp_ms: input.timestamp_ms.unwrap_or_else(|| stage.now_ms()),
            delivered: 0,
        };
        let keep = match input.phase {
            PointerPhase::Down => {
                let hit = hit_test(stage.nodes(), scene, input.position);
                update_hover(stage, &mut ctx, &mut state, hit);
                if let Some(node) = hit {
                    ctx.deliver(stage, node, EventKind::TapDown);
                }
                state.press = Some(Press {
                    node: hit,
                    origin: input.position,
                    last: input.position,
                    dragging: false,
                });
                true
            }
            PointerPhase::Move => {
                self.pointer_moved(stage, &mut ctx, &mut state);
                true
            }
            PointerPhase::Up => {
                let hit = hit_test(stage.nodes(), scene, input.position);
                if let Some(press) = state.press.take() {
                    if press.dragging
                        && let Some(node) = press.node
                    {
                        ctx.deliver(stage, node, EventKind::DragEnd);
                    }
                    if let Some(node) = hit {
                        ctx.deliver(stage, node, EventKind::TapUp);
                    }
                    if let Some(node) = press.node {
                        if !press.dragging && hit == Some(node) {
                            ctx.deliver(stage, node, EventKind::Tap);
                        }
                        ctx.deliver(stage, node, EventKind::TapUpAny);
                    }
                } else if let Some(node) = hit {
                    ctx.deliver(stage, node, EventKind::TapUp);
                }
                update_hover(stage, &mut ctx, &mut state, hit);
                true
            }
            PointerPhase::Leave => {
                if let Some(press) = state.press.take()
                    && press.dragging
                    && let Some(node) = press.node
                {
                    ctx.deliver(stage, node, EventKind::DragEnd);
                }
                if let Some(node) = state.hovered.take() {
                    ctx.deliver(stage, node, EventKind::PointerLeave);
                }
                false
            }
        };
        if keep {
            self.pointers.insert(input.pointer_id, state);
        }
        ctx.delivered
    }

    fn pointer_moved(&self, stage: &mut Stage, ctx: &mut Delivery, state: &mut PointerState) {
        let position = ctx.position;
        let hit = hit_test(stage.nodes(), ctx.scene, position);
        if let Some(press) = state.press.as_mut() {
            if let Some(node) = press.node {
                if !press.dragging && (position - press.origin).hypot() > self.drag_threshold {
                    press.dragging = true;
                    // Dragged nodes catch up with the travel below the threshold too.
                    press.last = press.origin;
                    ctx.deliver(stage, node, EventKind::DragStart);
                }
                if press.dragging {
                    if let Err(err) = follow_pointer(stage, node, press.last, position) {
                        tracing::debug!(node = ?node, error = %err, "dragged node stays put");
                    }
                    ctx.deliver(stage, node, EventKind::Drag);
                }
            }
            press.last = position;
        } else {
            update_hover(stage, ctx, state, hit);
        }
        if let Some(node) = hit {
            ctx.deliver(stage, node, EventKind::PointerMove);
        }
    }
}

/// Emit leave/enter when the node under a pointer changes.
fn update_hover(
    stage: &mut Stage,
    ctx: &mut Delivery,
    state: &mut PointerState,
    hit: Option<NodeId>,
) {
    if state.hovered == hit {
        return;
    }
    if let Some(old) = state.hovered {
        ctx.deliver(stage, old, EventKind::PointerLeave);
    }
    if let Some(new) = hit {
        ctx.deliver(stage, new, EventKind::PointerEnter);
    }
    state.hovered = hit;
}

/// Move a draggable node by the pointer delta expressed in its parent's space.
fn follow_pointer(stage: &mut Stage, node: NodeId, from: Point, to: Point) -> TrialkitResult<()> {
    let tree = stage.nodes();
    let n = tree.node(node)?;
    if !n.is_draggable() {
        return Ok(());
    }
    let Some(parent) = n.parent() else {
        return Ok(());
    };
    let delta = tree.convert_point_to_node(parent, to)? - tree.convert_point_to_node(parent, from)?;
    stage.nodes_mut().translate(node, delta)
}

struct Delivery {
    scene: NodeId,
    pointer_id: u32,
    position: Point,
    timestamp_ms: f64,
    delivered: usize,
}

impl Delivery {
    /// Deliver `kind` to `target`, then up the parent chain while propagation is allowed.
    fn deliver(&mut self, stage: &mut Stage, target: NodeId, kind: EventKind) {
        let scene_point = stage
            .nodes()
            .convert_point_to_node(self.scene, self.position)
            .unwrap_or(self.position);
        let mut event = PointerEvent {
            kind,
            target,
            current: target,
            point: Point::ZERO,
            scene_point,
            pointer_id: self.pointer_id,
            timestamp_ms: self.timestamp_ms,
            handled: false,
        };
        let mut current = Some(target);
        while let Some(node) = current {
            let Ok(point) = stage.nodes().convert_point_to_node(node, self.position) else {
                break;
            };
            event.current = node;
            event.point = point;
            if invoke_handlers(stage, node, &mut event) {
                self.delivered += 1;
            }
            if event.handled {
                break;
            }
            let Ok(n) = stage.nodes().node(node) else {
                break;
            };
            current = if n.propagates_events() {
                n.parent()
            } else {
                None
            };
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/dispatch.rs"]
mod tests;
