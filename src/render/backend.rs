use crate::{
    foundation::core::{Affine, Rgba8, Size},
    foundation::error::TrialkitResult,
    node::{
        id::NodeId,
        kind::{FontHandle, ImageHandle, Stroke},
    },
};

/// What a [`DrawCommand`] paints.
///
/// Coordinates are relative to the top-left corner of the node's bounds. Circles are centered
/// in those bounds.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawPrimitive {
    /// Scene background covering the scene's bounds.
    Background { color: Rgba8, size: Size },
    Rect {
        size: Size,
        corner_radius: f64,
        fill: Option<Rgba8>,
        stroke: Option<Stroke>,
    },
    Circle {
        radius: f64,
        fill: Option<Rgba8>,
        stroke: Option<Stroke>,
    },
    Text {
        text: String,
        font: Option<FontHandle>,
        font_size: f64,
        color: Rgba8,
    },
    Image { handle: ImageHandle, size: Size },
}

/// One draw call issued to the host backend.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    /// Maps the primitive's local space to surface coordinates.
    pub transform: Affine,
    /// Product of the node's alpha and all its ancestors' alpha.
    pub opacity: f64,
    pub primitive: DrawPrimitive,
}

/// Host graphics backend.
///
/// The engine calls `begin_frame`, then `draw` once per command in paint order, then
/// `end_frame`. Errors abort the frame and are returned from [`crate::FrameDriver::advance`].
pub trait RenderBackend {
    fn begin_frame(&mut self, surface: Size) -> TrialkitResult<()> {
        let _ = surface;
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> TrialkitResult<()>;

    fn end_frame(&mut self) -> TrialkitResult<()> {
        Ok(())
    }
}

/// Issue one complete frame to `backend`.
pub fn submit_frame<B: RenderBackend + ?Sized>(
    backend: &mut B,
    surface: Size,
    commands: &[DrawCommand],
) -> TrialkitResult<()> {
    backend.begin_frame(surface)?;
    for cmd in commands {
        backend.draw(cmd)?;
    }
    backend.end_frame()
}

/// Backend that keeps the commands of the last frame, for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    current: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    surface: Size,
    frames_rendered: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands of the most recently completed frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn surface(&self) -> Size {
        self.surface
    }

    /// The last frame's command for `node`, if it was drawn.
    pub fn command_for(&self, node: NodeId) -> Option<&DrawCommand> {
        self.last_frame.iter().find(|c| c.node == node)
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, surface: Size) -> TrialkitResult<()> {
        self.surface = surface;
        self.current.clear();
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> TrialkitResult<()> {
        self.current.push(command.clone());
        Ok(())
    }

    fn end_frame(&mut self) -> TrialkitResult<()> {
        self.last_frame = std::mem::take(&mut self.current);
        self.frames_rendered += 1;
        Ok(())
    }
}
