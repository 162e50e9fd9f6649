use crate::error::RenderError;
use crate::pass::{DispatchSize, PassEncoder, SamplerKind};
use crate::target::PostProcessTargets;

/// Edge-detection work-group edge length, matching `@workgroup_size(16, 16)`.
pub const EDGE_TILE_SIZE: u32 = 16;

/// Two triangles covering the screen, synthesized in the vertex stage.
pub const FULLSCREEN_VERTEX_COUNT: u32 = 6;

/// Sobel post-process sequencing: edge detection, then composite.
///
/// Holds handles to the current color/edge targets. The handles are dropped on
/// [`release`](Self::release) and nothing runs until [`attach`](Self::attach)
/// hands over a fresh set.
#[derive(Debug, Default)]
pub struct PostProcessChain {
    targets: Option<PostProcessTargets>,
}

impl PostProcessChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, targets: PostProcessTargets) {
        tracing::debug!(
            size = %targets.size,
            generation = targets.generation(),
            "post-process targets attached"
        );
        self.targets = Some(targets);
    }

    /// Forget the current targets. Returns whether any were held.
    pub fn release(&mut self) -> bool {
        let had = self.targets.take().is_some();
        if had {
            tracing::debug!("post-process targets released");
        }
        had
    }

    pub fn targets(&self) -> Option<&PostProcessTargets> {
        self.targets.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.targets.is_some()
    }

    /// Work-group counts the next run will dispatch, if targets are attached.
    pub fn dispatch_size(&self) -> Option<DispatchSize> {
        self.targets
            .as_ref()
            .map(|t| DispatchSize::covering(t.size, EDGE_TILE_SIZE))
    }

    /// Record both stages. The scene must already be drawn into the color
    /// buffer and its pass closed.
    pub fn run<E: PassEncoder + ?Sized>(
        &self,
        encoder: &mut E,
    ) -> Result<DispatchSize, RenderError> {
        let targets = self.targets.as_ref().ok_or(RenderError::ResourcesReleased)?;
        let groups = DispatchSize::covering(targets.size, EDGE_TILE_SIZE);

        // Stage A: edge detection
        encoder.begin_edge_pass(targets.color, targets.edge)?;
        encoder.dispatch(groups)?;
        encoder.end_edge_pass()?;

        // Stage B: composite
        encoder.begin_composite_pass(targets.color, targets.edge, SamplerKind::PointClamp)?;
        encoder.draw_fullscreen(FULLSCREEN_VERTEX_COUNT)?;
        encoder.end_composite_pass()?;

        tracing::trace!(x = groups.x, y = groups.y, "post-process recorded");
        Ok(groups)
    }
}
