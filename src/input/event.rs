use crate::{foundation::core::Point, node::id::NodeId};

/// Phase of a raw pointer sample delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The pointer left the surface or the host cancelled the gesture.
    Leave,
}

/// Raw pointer input, in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerInput {
    pub pointer_id: u32,
    pub position: Point,
    pub phase: PointerPhase,
    #[serde(default)]
    pub timestamp_ms: Option<f64>,
}

impl PointerInput {
    pub fn new(pointer_id: u32, position: Point, phase: PointerPhase) -> Self {
        Self {
            pointer_id,
            position,
            phase,
            timestamp_ms: None,
        }
    }

    pub fn down(x: f64, y: f64) -> Self {
        Self::new(0, Point::new(x, y), PointerPhase::Down)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(0, Point::new(x, y), PointerPhase::Move)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(0, Point::new(x, y), PointerPhase::Up)
    }

    pub fn leave() -> Self {
        Self::new(0, Point::ZERO, PointerPhase::Leave)
    }

    pub fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    pub fn at_time(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// Kind of event delivered to node handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TapDown,
    /// Pointer released over the node.
    TapUp,
    /// Pointer released anywhere after pressing this node.
    TapUpAny,
    /// Pressed and released over the same node without dragging.
    Tap,
    PointerMove,
    DragStart,
    Drag,
    DragEnd,
    PointerEnter,
    PointerLeave,
}

impl EventKind {
    pub const COUNT: usize = 10;

    pub const ALL: [Self; Self::COUNT] = [
        Self::TapDown,
        Self::TapUp,
        Self::TapUpAny,
        Self::Tap,
        Self::PointerMove,
        Self::DragStart,
        Self::Drag,
        Self::DragEnd,
        Self::PointerEnter,
        Self::PointerLeave,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Event handed to a handler.
///
/// `point` is in the local space of `current`, the node whose handler is running; it is
/// recomputed as the event bubbles. Setting `handled` stops bubbling after the current node.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: EventKind,
    /// Node the event was originally delivered to.
    pub target: NodeId,
    pub current: NodeId,
    pub point: Point,
    pub scene_point: Point,
    pub pointer_id: u32,
    pub timestamp_ms: f64,
    pub handled: bool,
}
