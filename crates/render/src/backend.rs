use edgeview_common::{OutputSize, Rgba};
use glam::Mat4;

use crate::error::RenderError;
use crate::pass::PassEncoder;
use crate::target::PostProcessTargets;

/// Primitive meshes supplied by the backend's mesh provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Teapot,
    Cone,
    Tetrahedron,
}

/// Presentation color formats a backend may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba16Float,
}

impl ColorFormat {
    pub fn is_srgb(&self) -> bool {
        matches!(self, Self::Bgra8UnormSrgb | Self::Rgba8UnormSrgb)
    }
}

/// One mesh draw into the color buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshDraw {
    pub mesh: MeshKind,
    pub world: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
    pub tint: Rgba,
}

/// Creation and teardown of GPU-owned resources.
///
/// Device resources (shaders, pipelines, meshes, samplers) survive resizes.
/// Size resources (color, edge and depth buffers) are recreated on every
/// resize and hand back a fresh generation of target handles.
pub trait ResourceFactory {
    fn output_size(&self) -> OutputSize;

    fn color_format(&self) -> ColorFormat;

    /// Reconfigure the presentation output. Returns `false` when the size did
    /// not change and nothing needs recreating.
    fn resize_output(&mut self, size: OutputSize) -> Result<bool, RenderError>;

    fn create_device_resources(&mut self) -> Result<(), RenderError>;

    fn create_size_resources(
        &mut self,
        size: OutputSize,
    ) -> Result<PostProcessTargets, RenderError>;

    /// Drop every GPU-owned resource. Outstanding target handles become stale.
    fn release_resources(&mut self);
}

/// Per-frame recording and presentation.
pub trait FrameBackend: PassEncoder + ResourceFactory {
    /// Acquire the presentation target and start a command stream.
    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Clear the color buffer to `color` and depth/stencil to 1.0/0, and open
    /// the scene pass.
    fn clear(&mut self, color: Rgba) -> Result<(), RenderError>;

    fn draw_mesh(&mut self, draw: &MeshDraw) -> Result<(), RenderError>;

    /// Close the scene pass and release the color buffer as a render target.
    fn end_scene(&mut self) -> Result<(), RenderError>;

    /// Submit the command stream and show the frame.
    fn present(&mut self) -> Result<(), RenderError>;

    /// Throw away a partially recorded frame without presenting it. The next
    /// `begin_frame` starts from a clean state. Does nothing outside a frame.
    fn abort_frame(&mut self);
}

/// Device-lost / device-restored notifications, invoked by whoever owns the
/// device lifecycle.
pub trait DeviceNotify {
    /// Drop every reference to GPU-owned resources.
    fn on_device_lost(&mut self, factory: &mut dyn ResourceFactory);

    /// Recreate device and size resources and pick up the new handles.
    fn on_device_restored(
        &mut self,
        factory: &mut dyn ResourceFactory,
    ) -> Result<(), RenderError>;
}
