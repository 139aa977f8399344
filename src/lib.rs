//! trialkit is a retained-mode 2D presentation engine for timed stimulus-and-response tasks.
//!
//! Callers build a tree of nodes inside scenes, anchor nodes to each other with edge
//! constraints, attach declarative actions, and react to pointer input. The host owns the
//! surface and the clock: it calls [`FrameDriver::advance`] once per frame with the elapsed
//! time and a [`RenderBackend`] that receives the resulting draw calls.
//!
//! # Frame pipeline
//!
//! 1. **Present**: apply scene changes requested from callbacks ([`Stage::request_present`])
//! 2. **Layout**: resolve constraints top-down ([`resolve_scene_layout`])
//! 3. **Actions**: advance every action run by the frame delta
//! 4. **Input**: hit-test queued pointer input and deliver events to node handlers
//! 5. **Draw**: emit one [`DrawCommand`] per visible node, in paint order
//!
//! Everything runs on the caller's thread. Callbacks receive `&mut Stage` and may change the
//! tree, schedule or cancel actions, and register handlers while a frame is in progress.
#![forbid(unsafe_code)]

mod animation;
mod foundation;
mod input;
mod layout;
mod node;
mod render;
mod scene;
mod timing;

pub use animation::action::{Action, CustomCallback};
pub use animation::ease::Ease;
pub use animation::run::RunState;
pub use animation::scheduler::RunId;
pub use foundation::config::EngineOpts;
pub use foundation::core::{Affine, Point, Rect, Rgba8, Size, Transform2D, Vec2, invert_affine};
pub use foundation::error::{TrialkitError, TrialkitResult};
pub use input::event::{EventKind, PointerEvent, PointerInput, PointerPhase};
pub use input::handlers::{HandlerId, PointerHandler};
pub use layout::constraint::{Axis, Constraint, ConstraintKind, ConstraintTarget, Edge};
pub use layout::solver::resolve_scene_layout;
pub use node::id::NodeId;
pub use node::kind::{
    FontHandle, ImageHandle, LabelProps, NodeKind, ShapeGeometry, ShapeProps, Stroke,
};
pub use node::store::{Node, NodeTree};
pub use node::traverse::Descendants;
pub use render::backend::{
    DrawCommand, DrawPrimitive, RecordingBackend, RenderBackend, submit_frame,
};
pub use scene::driver::{FrameDriver, FrameReport, SceneState};
pub use scene::snapshot::NodeSnapshot;
pub use scene::stage::{SceneCallback, Stage};
pub use scene::transition::{SlideDirection, Transition};
pub use timing::timers::Timers;
