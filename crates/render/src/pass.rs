use edgeview_common::OutputSize;

use crate::error::RenderError;
use crate::target::TargetHandle;

/// Work-group counts for a compute dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchSize {
    /// Smallest 2D grid of `tile`x`tile` groups that covers `size`. Edge groups
    /// may overhang the output; shaders bounds-check.
    pub fn covering(size: OutputSize, tile: u32) -> Self {
        Self {
            x: size.width.div_ceil(tile),
            y: size.height.div_ceil(tile),
            z: 1,
        }
    }
}

/// Sampler state used by the composite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// Nearest filtering, clamp-to-edge addressing.
    PointClamp,
}

/// Recording state of one frame's command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// No frame acquired.
    NoFrame,
    /// Frame acquired, no pass open.
    Idle,
    /// Scene geometry pass into the color buffer.
    Scene,
    /// Edge-detection compute pass.
    Edge { dispatched: bool },
    /// Full-screen composite pass into the presentation target.
    Composite { drawn: bool },
}

/// Enforces legal pass ordering for a backend.
///
/// `NoFrame -> Idle -> Scene -> Idle -> Edge -> Idle -> Composite -> Idle -> NoFrame`.
/// Any other transition is a caller bug and reported as
/// [`RenderError::OutOfOrder`] without changing state.
#[derive(Debug, Clone)]
pub struct PassTracker {
    state: PassState,
}

impl Default for PassTracker {
    fn default() -> Self {
        Self {
            state: PassState::NoFrame,
        }
    }
}

impl PassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    fn transition(
        &mut self,
        command: &'static str,
        from: impl FnOnce(PassState) -> Option<PassState>,
    ) -> Result<(), RenderError> {
        match from(self.state) {
            Some(next) => {
                self.state = next;
                Ok(())
            }
            None => Err(RenderError::OutOfOrder {
                command,
                state: self.state,
            }),
        }
    }

    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.transition("begin_frame", |s| {
            (s == PassState::NoFrame).then_some(PassState::Idle)
        })
    }

    pub fn begin_scene(&mut self) -> Result<(), RenderError> {
        self.transition("clear", |s| {
            (s == PassState::Idle).then_some(PassState::Scene)
        })
    }

    pub fn draw_mesh(&mut self) -> Result<(), RenderError> {
        self.transition("draw_mesh", |s| {
            (s == PassState::Scene).then_some(PassState::Scene)
        })
    }

    pub fn end_scene(&mut self) -> Result<(), RenderError> {
        self.transition("end_scene", |s| {
            (s == PassState::Scene).then_some(PassState::Idle)
        })
    }

    pub fn begin_edge(&mut self) -> Result<(), RenderError> {
        self.transition("begin_edge_pass", |s| {
            (s == PassState::Idle).then_some(PassState::Edge { dispatched: false })
        })
    }

    pub fn dispatch(&mut self) -> Result<(), RenderError> {
        self.transition("dispatch", |s| match s {
            PassState::Edge { .. } => Some(PassState::Edge { dispatched: true }),
            _ => None,
        })
    }

    pub fn end_edge(&mut self) -> Result<(), RenderError> {
        self.transition("end_edge_pass", |s| match s {
            PassState::Edge { .. } => Some(PassState::Idle),
            _ => None,
        })
    }

    pub fn begin_composite(&mut self) -> Result<(), RenderError> {
        self.transition("begin_composite_pass", |s| {
            (s == PassState::Idle).then_some(PassState::Composite { drawn: false })
        })
    }

    pub fn draw_fullscreen(&mut self) -> Result<(), RenderError> {
        self.transition("draw_fullscreen", |s| match s {
            PassState::Composite { .. } => Some(PassState::Composite { drawn: true }),
            _ => None,
        })
    }

    pub fn end_composite(&mut self) -> Result<(), RenderError> {
        self.transition("end_composite_pass", |s| match s {
            PassState::Composite { .. } => Some(PassState::Idle),
            _ => None,
        })
    }

    pub fn present(&mut self) -> Result<(), RenderError> {
        self.transition("present", |s| {
            (s == PassState::Idle).then_some(PassState::NoFrame)
        })
    }

    /// Drop whatever was being recorded, e.g. after device loss.
    pub fn abandon(&mut self) {
        self.state = PassState::NoFrame;
    }
}

/// The post-process command contract a backend must provide.
///
/// Each `begin_*` binds its inputs and outputs; the matching `end_*` unbinds
/// them. No binding survives from one pass into the next.
pub trait PassEncoder {
    /// Bind `color` as a readable texture and `edge` as a writable image.
    fn begin_edge_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
    ) -> Result<(), RenderError>;

    fn dispatch(&mut self, groups: DispatchSize) -> Result<(), RenderError>;

    fn end_edge_pass(&mut self) -> Result<(), RenderError>;

    /// Bind both buffers as sampled inputs and the presentation target as output.
    fn begin_composite_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
        sampler: SamplerKind,
    ) -> Result<(), RenderError>;

    /// Draw without vertex or index buffers; the vertex stage synthesizes positions.
    fn draw_fullscreen(&mut self, vertex_count: u32) -> Result<(), RenderError>;

    fn end_composite_pass(&mut self) -> Result<(), RenderError>;
}
