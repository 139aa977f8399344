use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::{
    foundation::core::{Point, Rect},
    foundation::error::{TrialkitError, TrialkitResult},
    layout::constraint::{Axis, Constraint, ConstraintTarget, Edge},
    node::{id::NodeId, store::NodeTree},
};

/// A constraint with its target resolved to a concrete node.
#[derive(Clone, Debug)]
struct BoundConstraint {
    constraint: Constraint,
    target: BoundTarget,
}

#[derive(Clone, Copy, Debug)]
enum BoundTarget {
    Sibling(NodeId),
    Parent(NodeId),
    /// Ancestor above the parent.
    Ancestor(NodeId),
}

#[derive(Debug)]
struct LayoutItem {
    id: NodeId,
    vertical: Option<BoundConstraint>,
    horizontal: Option<BoundConstraint>,
    deps: Vec<NodeId>,
}

/// Resolve every constrained node below `scene`.
///
/// Returns the number of nodes positioned. On error no node position is changed.
#[tracing::instrument(skip(tree))]
pub fn resolve_scene_layout(tree: &mut NodeTree, scene: NodeId) -> TrialkitResult<usize> {
    let items = collect_items(tree, scene)?;
    if items.is_empty() {
        return Ok(0);
    }
    let order = dependency_order(tree, &items)?;

    let mut saved: Vec<(NodeId, Point)> = Vec::with_capacity(order.len());
    for &i in &order {
        let item = &items[i];
        let before = tree.node(item.id)?.position();
        saved.push((item.id, before));
        if let Err(e) = apply_item(tree, item) {
            for (id, pos) in saved {
                if let Ok(node) = tree.node_mut(id) {
                    node.set_position(pos);
                }
            }
            return Err(e);
        }
    }
    Ok(order.len())
}

fn collect_items(tree: &NodeTree, scene: NodeId) -> TrialkitResult<Vec<LayoutItem>> {
    let mut items = Vec::new();
    for id in tree.descendants(scene) {
        let node = tree.node(id)?;
        if node.constraints().is_empty() {
            continue;
        }
        let mut vertical: Option<BoundConstraint> = None;
        let mut horizontal: Option<BoundConstraint> = None;
        let mut deps = Vec::new();
        for c in node.constraints() {
            let target = bind_target(tree, id, &c.target)?;
            let slot = match c.kind.axis() {
                Axis::Vertical => &mut vertical,
                Axis::Horizontal => &mut horizontal,
            };
            if let Some(prev) = slot {
                return Err(TrialkitError::configuration(format!(
                    "node '{}' declares {:?} and {:?} on the same axis",
                    node.name(),
                    prev.constraint.kind,
                    c.kind
                )));
            }
            match target {
                BoundTarget::Sibling(t) => deps.push(t),
                BoundTarget::Parent(_) => {}
                BoundTarget::Ancestor(a) => {
                    // Every node between the parent and the ancestor contributes its transform.
                    deps.extend(tree.ancestors(id).take_while(|&n| n != a));
                }
            }
            *slot = Some(BoundConstraint {
                constraint: c.clone(),
                target,
            });
        }
        items.push(LayoutItem {
            id,
            vertical,
            horizontal,
            deps,
        });
    }
    Ok(items)
}

fn bind_target(
    tree: &NodeTree,
    id: NodeId,
    target: &ConstraintTarget,
) -> TrialkitResult<BoundTarget> {
    let node = tree.node(id)?;
    let parent = node.parent().ok_or_else(|| {
        TrialkitError::configuration(format!(
            "constrained node '{}' has no parent",
            node.name()
        ))
    })?;
    match target {
        ConstraintTarget::Parent => Ok(BoundTarget::Parent(parent)),
        ConstraintTarget::Node(name) => {
            let sibling = tree
                .children(parent)
                .iter()
                .copied()
                .find(|&c| c != id && tree.node(c).is_ok_and(|n| n.name() == name));
            if let Some(s) = sibling {
                return Ok(BoundTarget::Sibling(s));
            }
            let ancestor = tree
                .ancestors(id)
                .find(|&a| tree.node(a).is_ok_and(|n| n.name() == name));
            match ancestor {
                Some(a) if a == parent => Ok(BoundTarget::Parent(a)),
                Some(a) => Ok(BoundTarget::Ancestor(a)),
                None if node.name() == name => Err(TrialkitError::configuration(format!(
                    "node '{name}' cannot be constrained to itself"
                ))),
                None => Err(TrialkitError::not_found(format!(
                    "constraint target '{name}' of '{}' is neither a sibling nor an ancestor",
                    node.name()
                ))),
            }
        }
    }
}

/// Deterministic topological order over `items` (indices). Ties resolve in tree order.
fn dependency_order(tree: &NodeTree, items: &[LayoutItem]) -> TrialkitResult<Vec<usize>> {
    let index: HashMap<NodeId, usize> = items.iter().enumerate().map(|(i, it)| (it.id, i)).collect();
    let mut indeg = vec![0u32; items.len()];
    let mut dependents = vec![Vec::<usize>::new(); items.len()];
    for (i, item) in items.iter().enumerate() {
        for dep in &item.deps {
            // Unconstrained nodes already sit at their stored position.
            if let Some(&d) = index.get(dep) {
                dependents[d].push(i);
                indeg[i] = indeg[i].saturating_add(1);
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indeg
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(items.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &dep in &dependents[i] {
            let d = &mut indeg[dep];
            *d = d.saturating_sub(1);
            if *d == 0 {
                ready.push(Reverse(dep));
            }
        }
    }

    if order.len() < items.len() {
        let names: Vec<String> = indeg
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > 0)
            .map(|(i, _)| {
                tree.node(items[i].id)
                    .map(|n| n.name().to_string())
                    .unwrap_or_default()
            })
            .collect();
        return Err(TrialkitError::layout(format!(
            "constraint cycle between nodes [{}]",
            names.join(", ")
        )));
    }
    Ok(order)
}

fn apply_item(tree: &mut NodeTree, item: &LayoutItem) -> TrialkitResult<()> {
    let mut position = tree.node(item.id)?.position();
    if let Some(bound) = &item.vertical {
        position.y = solve_axis(tree, item.id, bound)?;
    }
    if let Some(bound) = &item.horizontal {
        position.x = solve_axis(tree, item.id, bound)?;
    }
    tree.node_mut(item.id)?.set_position(position);
    Ok(())
}

/// New position coordinate along the constraint's axis, in the parent's space.
fn solve_axis(tree: &NodeTree, id: NodeId, bound: &BoundConstraint) -> TrialkitResult<f64> {
    let node = tree.node(id)?;
    let target_rect = target_rect(tree, id, bound.target)?;
    let kind = bound.constraint.kind;
    let margin = bound.constraint.margin;
    let anchor_edge = edge_of(target_rect, kind.target_edge());

    let frame = node.frame_in_parent();
    let anchor = node.anchor_point();
    Ok(match kind.source_edge() {
        Edge::Top => anchor_edge + margin + anchor.y * frame.height(),
        Edge::Bottom => anchor_edge - margin - (1.0 - anchor.y) * frame.height(),
        Edge::Start => anchor_edge + margin + anchor.x * frame.width(),
        Edge::End => anchor_edge - margin - (1.0 - anchor.x) * frame.width(),
    })
}

fn target_rect(tree: &NodeTree, id: NodeId, target: BoundTarget) -> TrialkitResult<Rect> {
    match target {
        BoundTarget::Sibling(s) => Ok(tree.node(s)?.frame_in_parent()),
        BoundTarget::Parent(p) => Ok(tree.node(p)?.local_bounds()),
        BoundTarget::Ancestor(a) => {
            let parent = tree
                .parent(id)
                .ok_or_else(|| TrialkitError::layout("constrained node lost its parent"))?;
            let to_ancestor = tree.relative_transform(parent, a)?;
            let from_ancestor =
                crate::foundation::core::invert_affine(to_ancestor).ok_or_else(|| {
                    TrialkitError::layout(format!(
                        "cannot map ancestor bounds into the parent of '{}': degenerate transform",
                        tree.node(id).map(|n| n.name()).unwrap_or("?")
                    ))
                })?;
            Ok(from_ancestor.transform_rect_bbox(tree.node(a)?.local_bounds()))
        }
    }
}

fn edge_of(rect: Rect, edge: Edge) -> f64 {
    match edge {
        Edge::Top => rect.y0,
        Edge::Bottom => rect.y1,
        Edge::Start => rect.x0,
        Edge::End => rect.x1,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/solver.rs"]
mod tests;
