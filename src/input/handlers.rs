use std::collections::{HashMap, HashSet};

use crate::{
    input::event::{EventKind, PointerEvent},
    node::id::NodeId,
    scene::stage::Stage,
};

/// Event handler attached to a node.
pub type PointerHandler = Box<dyn FnMut(&mut Stage, &mut PointerEvent)>;

/// Handle returned when registering a handler, used to remove it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

pub(crate) struct HandlerEntry {
    id: HandlerId,
    handler: PointerHandler,
}

struct Taken {
    kind: EventKind,
    node: NodeId,
    ids: Vec<HandlerId>,
}

/// Per-kind handler registries keyed by node.
///
/// Handlers are moved out of the registry while they run so they can receive `&mut Stage`.
/// Removals requested meanwhile are remembered and applied when the handlers are put back.
#[derive(Default)]
pub(crate) struct EventHandlers {
    by_kind: [HashMap<NodeId, Vec<HandlerEntry>>; EventKind::COUNT],
    next_id: u64,
    taken: Vec<Taken>,
    removed: HashSet<HandlerId>,
    cleared: HashSet<NodeId>,
}

impl EventHandlers {
    pub(crate) fn add(
        &mut self,
        node: NodeId,
        kind: EventKind,
        handler: PointerHandler,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.by_kind[kind.index()]
            .entry(node)
            .or_default()
            .push(HandlerEntry { id, handler });
        id
    }

    pub(crate) fn remove(&mut self, id: HandlerId) -> bool {
        for map in &mut self.by_kind {
            for entries in map.values_mut() {
                if let Some(pos) = entries.iter().position(|e| e.id == id) {
                    entries.remove(pos);
                    return true;
                }
            }
        }
        if self.taken.iter().any(|t| t.ids.contains(&id)) {
            return self.removed.insert(id);
        }
        false
    }

    /// Drop every handler of `node`, including ones currently running.
    pub(crate) fn clear_node(&mut self, node: NodeId) {
        for map in &mut self.by_kind {
            map.remove(&node);
        }
        if self.taken.iter().any(|t| t.node == node) {
            self.cleared.insert(node);
        }
    }

    pub(crate) fn has_handler(&self, node: NodeId, kind: EventKind) -> bool {
        self.by_kind[kind.index()]
            .get(&node)
            .is_some_and(|v| !v.is_empty())
            || self
                .taken
                .iter()
                .any(|t| t.kind == kind && t.node == node && !self.cleared.contains(&node))
    }

    pub(crate) fn is_live(&self, node: NodeId, id: HandlerId) -> bool {
        !self.cleared.contains(&node) && !self.removed.contains(&id)
    }

    pub(crate) fn take(&mut self, node: NodeId, kind: EventKind) -> Option<Vec<HandlerEntry>> {
        let entries = self.by_kind[kind.index()].remove(&node)?;
        self.taken.push(Taken {
            kind,
            node,
            ids: entries.iter().map(|e| e.id).collect(),
        });
        Some(entries)
    }

    /// Put handlers back after [`Self::take`], ahead of any registered while they were out.
    pub(crate) fn restore(&mut self, node: NodeId, kind: EventKind, mut entries: Vec<HandlerEntry>) {
        if let Some(pos) = self
            .taken
            .iter()
            .position(|t| t.kind == kind && t.node == node)
        {
            self.taken.remove(pos);
        }
        if self.cleared.contains(&node) {
            entries.clear();
            if !self.taken.iter().any(|t| t.node == node) {
                self.cleared.remove(&node);
            }
        }
        entries.retain(|e| !self.removed.remove(&e.id));

        let map = &mut self.by_kind[kind.index()];
        if let Some(added) = map.remove(&node) {
            entries.extend(added);
        }
        if !entries.is_empty() {
            map.insert(node, entries);
        }
    }
}

/// Run `node`'s handlers for `event.kind`, in registration order.
///
/// Returns whether any handler ran.
pub(crate) fn invoke_handlers(stage: &mut Stage, node: NodeId, event: &mut PointerEvent) -> bool {
    let kind = event.kind;
    let Some(mut entries) = stage.handlers.take(node, kind) else {
        return false;
    };
    let mut ran = false;
    for entry in &mut entries {
        if !stage.handlers.is_live(node, entry.id) {
            continue;
        }
        (entry.handler)(stage, event);
        ran = true;
    }
    stage.handlers.restore(node, kind, entries);
    ran
}

#[cfg(test)]
#[path = "../../tests/unit/input/handlers.rs"]
mod tests;
