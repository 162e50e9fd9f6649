use std::fmt::Write as _;

use edgeview_common::{OutputSize, Rgba};

use crate::backend::{ColorFormat, FrameBackend, MeshDraw, MeshKind, ResourceFactory};
use crate::error::RenderError;
use crate::pass::{DispatchSize, PassEncoder, PassState, PassTracker, SamplerKind};
use crate::target::{PostProcessTargets, TargetHandle};

/// A command recorded by the [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    CreateDeviceResources,
    CreateSizeResources { size: OutputSize, generation: u64 },
    ReleaseResources,
    BeginFrame,
    Clear { color: Rgba },
    DrawMesh { mesh: MeshKind, tint: Rgba },
    EndScene,
    BindEdgeInputs { color: TargetHandle, edge: TargetHandle },
    Dispatch(DispatchSize),
    UnbindEdge,
    BindCompositeInputs {
        color: TargetHandle,
        edge: TargetHandle,
        sampler: SamplerKind,
    },
    DrawFullscreen { vertices: u32 },
    UnbindComposite,
    Present,
    AbortFrame,
}

/// GPU-free backend that validates and records every command.
///
/// Useful for tests, CLI traces and anywhere a frame needs to be inspected
/// without a device.
#[derive(Debug)]
pub struct HeadlessBackend {
    size: OutputSize,
    format: ColorFormat,
    generation: u64,
    device_ready: bool,
    size_ready: bool,
    tracker: PassTracker,
    commands: Vec<RenderCommand>,
    frames_presented: u64,
    device_failure: Option<String>,
}

impl HeadlessBackend {
    pub fn new(size: OutputSize) -> Self {
        Self {
            size,
            format: ColorFormat::Bgra8UnormSrgb,
            generation: 0,
            device_ready: false,
            size_ready: false,
            tracker: PassTracker::new(),
            commands: Vec::new(),
            frames_presented: 0,
            device_failure: None,
        }
    }

    /// Make `create_device_resources` fail with `reason`, as a broken shader would.
    pub fn with_device_failure(mut self, reason: impl Into<String>) -> Self {
        self.device_failure = Some(reason.into());
        self
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.device_ready && self.size_ready
    }

    /// Human-readable dump of the recorded commands.
    pub fn trace(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Headless trace ({}, generation={}, presented={}) ===",
            self.size, self.generation, self.frames_presented
        );
        for cmd in &self.commands {
            let line = match cmd {
                RenderCommand::CreateDeviceResources => "create device resources".to_string(),
                RenderCommand::CreateSizeResources { size, generation } => {
                    format!("create size resources {size} (generation {generation})")
                }
                RenderCommand::ReleaseResources => "release resources".to_string(),
                RenderCommand::BeginFrame => "begin frame".to_string(),
                RenderCommand::Clear { color } => format!(
                    "clear color=({:.2}, {:.2}, {:.2}, {:.2}) depth=1 stencil=0",
                    color.r, color.g, color.b, color.a
                ),
                RenderCommand::DrawMesh { mesh, tint } => format!(
                    "  draw {mesh:?} tint=({:.2}, {:.2}, {:.2})",
                    tint.r, tint.g, tint.b
                ),
                RenderCommand::EndScene => "end scene".to_string(),
                RenderCommand::BindEdgeInputs { .. } => {
                    "edge: bind color as texture, edge as storage".to_string()
                }
                RenderCommand::Dispatch(g) => format!("  dispatch {}x{}x{}", g.x, g.y, g.z),
                RenderCommand::UnbindEdge => "edge: unbind".to_string(),
                RenderCommand::BindCompositeInputs { sampler, .. } => {
                    format!("composite: bind color + edge, sampler {sampler:?}")
                }
                RenderCommand::DrawFullscreen { vertices } => {
                    format!("  draw fullscreen ({vertices} vertices)")
                }
                RenderCommand::UnbindComposite => "composite: unbind".to_string(),
                RenderCommand::Present => "present".to_string(),
                RenderCommand::AbortFrame => "abort frame".to_string(),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn check_target(&self, handle: TargetHandle) -> Result<(), RenderError> {
        if !self.size_ready {
            return Err(RenderError::ResourcesReleased);
        }
        handle.ensure_current(self.generation)
    }
}

impl ResourceFactory for HeadlessBackend {
    fn output_size(&self) -> OutputSize {
        self.size
    }

    fn color_format(&self) -> ColorFormat {
        self.format
    }

    fn resize_output(&mut self, size: OutputSize) -> Result<bool, RenderError> {
        if size == self.size {
            return Ok(false);
        }
        self.size = size;
        Ok(true)
    }

    fn create_device_resources(&mut self) -> Result<(), RenderError> {
        if let Some(reason) = &self.device_failure {
            return Err(RenderError::ResourceCreation {
                what: "edge detection shader",
                reason: reason.clone(),
            });
        }
        self.device_ready = true;
        self.commands.push(RenderCommand::CreateDeviceResources);
        Ok(())
    }

    fn create_size_resources(
        &mut self,
        size: OutputSize,
    ) -> Result<PostProcessTargets, RenderError> {
        if size.is_empty() {
            return Err(RenderError::ResourceCreation {
                what: "color buffer",
                reason: format!("zero-sized output {size}"),
            });
        }
        if !self.device_ready {
            return Err(RenderError::ResourceCreation {
                what: "color buffer",
                reason: "device resources have not been created".to_string(),
            });
        }
        self.generation += 1;
        self.size = size;
        self.size_ready = true;
        tracing::debug!(%size, generation = self.generation, "headless targets created");
        self.commands.push(RenderCommand::CreateSizeResources {
            size,
            generation: self.generation,
        });
        Ok(PostProcessTargets::new(self.generation, size))
    }

    fn release_resources(&mut self) {
        self.generation += 1;
        self.device_ready = false;
        self.size_ready = false;
        self.tracker.abandon();
        self.commands.push(RenderCommand::ReleaseResources);
        tracing::debug!(generation = self.generation, "headless resources released");
    }
}

impl FrameBackend for HeadlessBackend {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        if !self.is_ready() {
            return Err(RenderError::ResourcesReleased);
        }
        self.tracker.begin_frame()?;
        self.commands.push(RenderCommand::BeginFrame);
        Ok(())
    }

    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        self.tracker.begin_scene()?;
        self.commands.push(RenderCommand::Clear { color });
        Ok(())
    }

    fn draw_mesh(&mut self, draw: &MeshDraw) -> Result<(), RenderError> {
        self.tracker.draw_mesh()?;
        self.commands.push(RenderCommand::DrawMesh {
            mesh: draw.mesh,
            tint: draw.tint,
        });
        Ok(())
    }

    fn end_scene(&mut self) -> Result<(), RenderError> {
        self.tracker.end_scene()?;
        self.commands.push(RenderCommand::EndScene);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.tracker.present()?;
        self.frames_presented += 1;
        self.commands.push(RenderCommand::Present);
        Ok(())
    }

    fn abort_frame(&mut self) {
        if self.tracker.state() == PassState::NoFrame {
            return;
        }
        self.tracker.abandon();
        self.commands.push(RenderCommand::AbortFrame);
        tracing::debug!("frame aborted");
    }
}

impl PassEncoder for HeadlessBackend {
    fn begin_edge_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
    ) -> Result<(), RenderError> {
        self.check_target(color)?;
        self.check_target(edge)?;
        self.tracker.begin_edge()?;
        self.commands
            .push(RenderCommand::BindEdgeInputs { color, edge });
        Ok(())
    }

    fn dispatch(&mut self, groups: DispatchSize) -> Result<(), RenderError> {
        self.tracker.dispatch()?;
        self.commands.push(RenderCommand::Dispatch(groups));
        Ok(())
    }

    fn end_edge_pass(&mut self) -> Result<(), RenderError> {
        self.tracker.end_edge()?;
        self.commands.push(RenderCommand::UnbindEdge);
        Ok(())
    }

    fn begin_composite_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
        sampler: SamplerKind,
    ) -> Result<(), RenderError> {
        self.check_target(color)?;
        self.check_target(edge)?;
        self.tracker.begin_composite()?;
        self.commands.push(RenderCommand::BindCompositeInputs {
            color,
            edge,
            sampler,
        });
        Ok(())
    }

    fn draw_fullscreen(&mut self, vertex_count: u32) -> Result<(), RenderError> {
        self.tracker.draw_fullscreen()?;
        self.commands.push(RenderCommand::DrawFullscreen {
            vertices: vertex_count,
        });
        Ok(())
    }

    fn end_composite_pass(&mut self) -> Result<(), RenderError> {
        self.tracker.end_composite()?;
        self.commands.push(RenderCommand::UnbindComposite);
        Ok(())
    }
}
