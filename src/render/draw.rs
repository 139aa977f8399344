//! Draw-call emission.

use crate::{
    foundation::core::{Affine, Size},
    node::{
        id::NodeId,
        kind::{NodeKind, ShapeGeometry},
        store::NodeTree,
        traverse::paint_order,
    },
    render::backend::{DrawCommand, DrawPrimitive},
};

/// Append the draw commands for `root`'s subtree to `out`, in paint order.
///
/// Transforms and opacity are composed top-down; hidden subtrees and fully transparent
/// subtrees emit nothing. `parent` is the transform of the space `root` lives in.
fn emit_subtree(
    tree: &NodeTree,
    root: NodeId,
    parent: Affine,
    parent_opacity: f64,
    out: &mut Vec<DrawCommand>,
) {
    let Ok(node) = tree.node(root) else {
        return;
    };
    if node.is_hidden() {
        return;
    }
    let opacity = parent_opacity * node.alpha();
    if opacity <= 0.0 {
        return;
    }
    let transform = parent * node.local_transform();

    if let Some(primitive) = primitive_for(node.kind(), node.size()) {
        let origin = node.local_bounds().origin().to_vec2();
        out.push(DrawCommand {
            node: root,
            transform: transform * Affine::translate(origin),
            opacity,
            primitive,
        });
    }

    for child in paint_order(tree, root) {
        emit_subtree(tree, child, transform, opacity, out);
    }
}

/// Draw commands for a whole scene placed at its own position.
pub(crate) fn emit_scene(tree: &NodeTree, scene: NodeId) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    emit_subtree(tree, scene, Affine::IDENTITY, 1.0, &mut out);
    out
}

fn primitive_for(kind: &NodeKind, size: Size) -> Option<DrawPrimitive> {
    match kind {
        NodeKind::Scene { background } => {
            (!background.is_transparent()).then_some(DrawPrimitive::Background {
                color: *background,
                size,
            })
        }
        NodeKind::Shape(shape) => Some(match shape.geometry {
            ShapeGeometry::Rect { corner_radius } => DrawPrimitive::Rect {
                size,
                corner_radius,
                fill: shape.fill,
                stroke: shape.stroke,
            },
            ShapeGeometry::Circle { radius } => DrawPrimitive::Circle {
                radius,
                fill: shape.fill,
                stroke: shape.stroke,
            },
        }),
        NodeKind::Label(label) => Some(DrawPrimitive::Text {
            text: label.text.clone(),
            font: label.font,
            font_size: label.font_size,
            color: label.color,
        }),
        NodeKind::Sprite { image } => Some(DrawPrimitive::Image {
            handle: *image,
            size,
        }),
        NodeKind::Group => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/draw.rs"]
mod tests;
