//! Arena storage for the node tree.

use smallvec::SmallVec;

use crate::foundation::core::{Affine, Point, Rect, Size, Transform2D, Vec2, invert_affine};
use crate::foundation::error::{TrialkitError, TrialkitResult};
use crate::layout::constraint::Constraint;

use super::id::NodeId;
use super::kind::NodeKind;
use super::traverse::Descendants;

/// A positioned, transformable element of the presentation tree.
///
/// Topology (parent, children, name) is owned by the [`NodeTree`] and only changes through
/// its methods. Visual properties are set directly through [`NodeTree::node_mut`].
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    position: Point,
    scale: f64,
    rotation: f64,
    alpha: f64,
    z_position: f64,
    size: Size,
    anchor_point: Point,
    user_interaction_enabled: bool,
    hidden: bool,
    draggable: bool,
    propagate_events: bool,
    pub(crate) constraints: SmallVec<[Constraint; 2]>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) attach_seq: u64,
}

impl Node {
    fn new(name: String, kind: NodeKind) -> Self {
        let anchor_point = if kind.is_scene() {
            Point::ZERO
        } else {
            Point::new(0.5, 0.5)
        };
        Self {
            name,
            kind,
            position: Point::ZERO,
            scale: 1.0,
            rotation: 0.0,
            alpha: 1.0,
            z_position: 0.0,
            size: Size::ZERO,
            anchor_point,
            user_interaction_enabled: false,
            hidden: false,
            draggable: false,
            propagate_events: false,
            constraints: SmallVec::new(),
            parent: None,
            children: Vec::new(),
            attach_seq: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn is_scene(&self) -> bool {
        self.kind.is_scene()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Rotation in radians, counter to the y-down axis (clockwise on screen).
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, radians: f64) {
        self.rotation = radians;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Sets the node's own opacity, clamped to `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn z_position(&self) -> f64 {
        self.z_position
    }

    pub fn set_z_position(&mut self, z: f64) {
        self.z_position = z;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Normalized point of the bounds that sits at `position`.
    pub fn anchor_point(&self) -> Point {
        self.anchor_point
    }

    pub fn set_anchor_point(&mut self, anchor: Point) {
        self.anchor_point = anchor;
    }

    pub fn is_user_interaction_enabled(&self) -> bool {
        self.user_interaction_enabled
    }

    pub fn set_user_interaction_enabled(&mut self, enabled: bool) {
        self.user_interaction_enabled = enabled;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Draggable nodes follow the pointer while a drag is in progress.
    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    /// When set, pointer events delivered to this node continue to its parent.
    pub fn propagates_events(&self) -> bool {
        self.propagate_events
    }

    pub fn set_propagate_events(&mut self, propagate: bool) {
        self.propagate_events = propagate;
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn text(&self) -> Option<&str> {
        self.kind.text()
    }

    /// Replace the text of a label node.
    pub fn set_text(&mut self, text: impl Into<String>) -> TrialkitResult<()> {
        match &mut self.kind {
            NodeKind::Label(l) => {
                l.text = text.into();
                Ok(())
            }
            other => Err(TrialkitError::configuration(format!(
                "node '{}' is a {}, not a label",
                self.name,
                other.type_name()
            ))),
        }
    }

    pub fn local_transform(&self) -> Affine {
        Transform2D::new(self.position.to_vec2(), self.rotation, self.scale).to_affine()
    }

    /// Bounds in the node's own coordinate space (origin at the anchor point).
    pub fn local_bounds(&self) -> Rect {
        let w = self.size.width;
        let h = self.size.height;
        let x0 = -self.anchor_point.x * w;
        let y0 = -self.anchor_point.y * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }

    /// Bounds as placed in the parent's space, ignoring rotation.
    pub(crate) fn frame_in_parent(&self) -> Rect {
        let s = self.scale.abs();
        let w = self.size.width * s;
        let h = self.size.height * s;
        let x0 = self.position.x - self.anchor_point.x * w;
        let y0 = self.position.y - self.anchor_point.y * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owner of every node, addressed by [`NodeId`] handles.
///
/// Freed slots are recycled; generation counters make stale handles fail lookups instead of
/// aliasing a new node.
#[derive(Clone, Debug, Default)]
pub struct NodeTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    next_attach_seq: u64,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node.
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let node = Node::new(name.into(), kind);
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeId {
                idx,
                generation: slot.generation,
            }
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId { idx, generation: 0 }
        }
    }

    /// Create a scene root sized to `size`, anchored at its top-left corner.
    pub fn create_scene(
        &mut self,
        name: impl Into<String>,
        size: Size,
        background: crate::foundation::core::Rgba8,
    ) -> NodeId {
        let id = self.create_node(name, NodeKind::scene(background));
        if let Ok(node) = self.node_mut(id) {
            node.set_size(size);
        }
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.idx as usize)
            .is_some_and(|s| s.generation == id.generation && s.node.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> TrialkitResult<&Node> {
        self.slots
            .get(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or_else(|| TrialkitError::not_found(format!("{id:?} is not a live node")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> TrialkitResult<&mut Node> {
        self.slots
            .get_mut(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or_else(|| TrialkitError::not_found(format!("{id:?} is not a live node")))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Fails without mutating the tree when `child` is a scene, already has a parent, is
    /// `parent` or one of its ancestors, or shares its name with an existing child.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> TrialkitResult<()> {
        let p = self.node(parent)?;
        let c = self.node(child)?;
        if c.is_scene() {
            return Err(TrialkitError::configuration(format!(
                "scene '{}' cannot be added as a child of '{}'",
                c.name, p.name
            )));
        }
        if let Some(existing) = c.parent {
            let existing_name = self.node(existing).map(Node::name).unwrap_or("?");
            return Err(TrialkitError::configuration(format!(
                "node '{}' already has parent '{existing_name}'",
                c.name
            )));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(TrialkitError::configuration(format!(
                "adding '{}' under '{}' would create a cycle",
                c.name, p.name
            )));
        }
        if self.child_named(parent, &c.name).is_some() {
            return Err(TrialkitError::configuration(format!(
                "'{}' already has a child named '{}'",
                p.name, c.name
            )));
        }

        self.next_attach_seq += 1;
        let seq = self.next_attach_seq;
        let c = self.node_mut(child)?;
        c.parent = Some(parent);
        c.attach_seq = seq;
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `child` from `parent`. The child keeps its subtree and properties.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> TrialkitResult<()> {
        if self.node(child)?.parent != Some(parent) {
            return Err(TrialkitError::not_found(format!(
                "'{}' is not a child of '{}'",
                self.node(child)?.name,
                self.node(parent)?.name
            )));
        }
        self.node_mut(parent)?.children.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    /// Detach `id` from its parent, if any.
    pub fn remove_from_parent(&mut self, id: NodeId) -> TrialkitResult<()> {
        match self.node(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Detach every child of `parent`, returning the detached handles in child order.
    pub fn remove_all_children(&mut self, parent: NodeId) -> TrialkitResult<Vec<NodeId>> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for &c in &children {
            if let Ok(node) = self.node_mut(c) {
                node.parent = None;
            }
        }
        Ok(children)
    }

    /// Detach `id` and free it together with its whole subtree.
    ///
    /// Returns every freed handle (root first). Nothing else attached to the freed nodes is
    /// touched; outside the crate [`crate::Stage::dispose_node`] is the way to free nodes.
    pub(crate) fn dispose(&mut self, id: NodeId) -> TrialkitResult<Vec<NodeId>> {
        self.remove_from_parent(id)?;
        let mut freed = vec![id];
        freed.extend(self.descendants(id));
        for &n in &freed {
            let slot = &mut self.slots[n.idx as usize];
            slot.node = None;
            self.free_list.push(n.idx);
        }
        Ok(freed)
    }

    /// Rename a node, keeping sibling names unique.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> TrialkitResult<()> {
        let name = name.into();
        if let Some(parent) = self.node(id)?.parent
            && self.child_named(parent, &name).is_some_and(|c| c != id)
        {
            return Err(TrialkitError::configuration(format!(
                "'{}' already has a child named '{name}'",
                self.node(parent)?.name
            )));
        }
        self.node_mut(id)?.name = name;
        Ok(())
    }

    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_ok_and(|n| n.name == name))
    }

    /// Lazy depth-first iteration over every node below `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// The unique descendant of `id` named `name`.
    pub fn descendant(&self, id: NodeId, name: &str) -> TrialkitResult<NodeId> {
        let mut matches = self
            .descendants(id)
            .filter(|&d| self.node(d).is_ok_and(|n| n.name == name));
        let Some(found) = matches.next() else {
            return Err(TrialkitError::not_found(format!(
                "no descendant named '{name}' under '{}'",
                self.node(id)?.name
            )));
        };
        if matches.next().is_some() {
            return Err(TrialkitError::configuration(format!(
                "more than one descendant named '{name}' under '{}'",
                self.node(id)?.name
            )));
        }
        Ok(found)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Topmost node of the chain containing `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// The scene `id` belongs to, if its root is a scene.
    pub fn scene_of(&self, id: NodeId) -> Option<NodeId> {
        let root = self.root_of(id);
        self.node(root).ok().filter(|n| n.is_scene()).map(|_| root)
    }

    /// Transform from `id`'s local space to its root's space, composed on demand.
    pub fn absolute_transform(&self, id: NodeId) -> TrialkitResult<Affine> {
        let mut t = self.node(id)?.local_transform();
        for a in self.ancestors(id) {
            t = self.node(a)?.local_transform() * t;
        }
        Ok(t)
    }

    /// Product of the node's alpha and every ancestor's alpha.
    pub fn absolute_alpha(&self, id: NodeId) -> TrialkitResult<f64> {
        let mut alpha = self.node(id)?.alpha;
        for a in self.ancestors(id) {
            alpha *= self.node(a)?.alpha;
        }
        Ok(alpha)
    }

    /// Whether the node or any ancestor is hidden.
    pub fn is_effectively_hidden(&self, id: NodeId) -> TrialkitResult<bool> {
        if self.node(id)?.hidden {
            return Ok(true);
        }
        Ok(self
            .ancestors(id)
            .any(|a| self.node(a).is_ok_and(|n| n.hidden)))
    }

    /// Map a point from the root's space into `id`'s local space.
    pub fn convert_point_to_node(&self, id: NodeId, point: Point) -> TrialkitResult<Point> {
        let inv = invert_affine(self.absolute_transform(id)?).ok_or_else(|| {
            TrialkitError::configuration(format!(
                "node '{}' has a degenerate transform",
                self.node(id).map(Node::name).unwrap_or("?")
            ))
        })?;
        Ok(inv * point)
    }

    /// Map a point from `id`'s local space into the root's space.
    pub fn convert_point_from_node(&self, id: NodeId, point: Point) -> TrialkitResult<Point> {
        Ok(self.absolute_transform(id)? * point)
    }

    /// Transform from `descendant`'s local space into `ancestor`'s local space.
    pub(crate) fn relative_transform(
        &self,
        descendant: NodeId,
        ancestor: NodeId,
    ) -> TrialkitResult<Affine> {
        let mut t = Affine::IDENTITY;
        let mut cur = descendant;
        while cur != ancestor {
            let node = self.node(cur)?;
            t = node.local_transform() * t;
            cur = node.parent.ok_or_else(|| {
                TrialkitError::not_found(format!(
                    "'{}' is not below the requested ancestor",
                    node.name
                ))
            })?;
        }
        Ok(t)
    }

    /// Offset a node's position by `delta` in its parent's space.
    pub(crate) fn translate(&mut self, id: NodeId, delta: Vec2) -> TrialkitResult<()> {
        let node = self.node_mut(id)?;
        node.position += delta;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/store.rs"]
mod tests;
