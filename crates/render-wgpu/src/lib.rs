//! wgpu backend for the edge-detection demo.
//!
//! Draws the scene into an off-screen color buffer, runs a Sobel compute
//! pass into an `Rgba16Float` edge buffer and composites both onto the
//! surface with a full-screen triangle pair.
//!
//! # Invariants
//! - Target handles are checked against the current resource generation.
//! - Shader and pipeline creation errors are returned, never panicked on.

mod gpu;
mod meshes;
mod shaders;

pub use gpu::WgpuBackend;
