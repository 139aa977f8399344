use crate::foundation::core::Rgba8;

/// Opaque font reference resolved by the host's asset manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FontHandle(pub u32);

/// Opaque image reference resolved by the host's asset manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub color: Rgba8,
    pub width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "geometry", rename_all = "snake_case")]
pub enum ShapeGeometry {
    /// Fills the node's bounds.
    Rect { corner_radius: f64 },
    /// Circle inscribed in the node's bounds.
    Circle { radius: f64 },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeProps {
    pub geometry: ShapeGeometry,
    pub fill: Option<Rgba8>,
    pub stroke: Option<Stroke>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabelProps {
    pub text: String,
    pub font: Option<FontHandle>,
    pub font_size: f64,
    pub color: Rgba8,
}

/// Per-kind payload of a node.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Root of a presentation state. Never a child.
    Scene { background: Rgba8 },
    Shape(ShapeProps),
    Label(LabelProps),
    Sprite { image: ImageHandle },
    /// Invisible container.
    Group,
}

impl NodeKind {
    pub fn scene(background: Rgba8) -> Self {
        Self::Scene { background }
    }

    pub fn rect(fill: Rgba8) -> Self {
        Self::Shape(ShapeProps {
            geometry: ShapeGeometry::Rect { corner_radius: 0.0 },
            fill: Some(fill),
            stroke: None,
        })
    }

    pub fn circle(radius: f64, fill: Rgba8) -> Self {
        Self::Shape(ShapeProps {
            geometry: ShapeGeometry::Circle { radius },
            fill: Some(fill),
            stroke: None,
        })
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(LabelProps {
            text: text.into(),
            font: None,
            font_size: 16.0,
            color: Rgba8::BLACK,
        })
    }

    pub fn sprite(image: ImageHandle) -> Self {
        Self::Sprite { image }
    }

    pub fn is_scene(&self) -> bool {
        matches!(self, Self::Scene { .. })
    }

    /// Stable lowercase name used in snapshots and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scene { .. } => "scene",
            Self::Shape(_) => "shape",
            Self::Label(_) => "label",
            Self::Sprite { .. } => "sprite",
            Self::Group => "group",
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Label(l) => Some(&l.text),
            _ => None,
        }
    }
}
