//! Rendering adapter: backend-agnostic frame contracts and the post-process chain.
//!
//! # Invariants
//! - Edge detection completes before the composite pass reads the edge buffer;
//!   both are recorded in program order on one command stream.
//! - Every binding made for a pass is released before the next pass begins.
//! - Render target handles are generation-stamped; a handle that outlives a
//!   resize or device loss is rejected.
//!
//! The [`HeadlessBackend`] records commands instead of talking to a GPU. It is
//! what tests and the CLI drive; the wgpu backend implements the same traits.

mod backend;
mod error;
mod headless;
mod pass;
mod postprocess;
mod target;

pub use backend::{ColorFormat, DeviceNotify, FrameBackend, MeshDraw, MeshKind, ResourceFactory};
pub use error::RenderError;
pub use headless::{HeadlessBackend, RenderCommand};
pub use pass::{DispatchSize, PassEncoder, PassState, PassTracker, SamplerKind};
pub use postprocess::{EDGE_TILE_SIZE, FULLSCREEN_VERTEX_COUNT, PostProcessChain};
pub use target::{PostProcessTargets, TargetHandle, TargetSlot};
