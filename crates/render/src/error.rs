use thiserror::Error;

use crate::pass::PassState;
use crate::target::TargetSlot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Shader, pipeline, texture or view creation failed. Fatal at startup.
    #[error("failed to create {what}: {reason}")]
    ResourceCreation { what: &'static str, reason: String },

    /// A target handle survived a resize or device loss.
    #[error("{slot:?} target from generation {handle} used, current generation is {current}")]
    StaleTarget {
        slot: TargetSlot,
        handle: u64,
        current: u64,
    },

    /// Resources were released and not yet recreated.
    #[error("render resources are released")]
    ResourcesReleased,

    /// A pass command was issued in the wrong order.
    #[error("{command} issued while {state:?}")]
    OutOfOrder {
        command: &'static str,
        state: PassState,
    },

    /// The presentation surface must be reconfigured and every GPU resource
    /// recreated.
    #[error("presentation surface lost or outdated")]
    SurfaceLost,

    #[error("surface error: {0}")]
    Surface(String),
}

impl RenderError {
    /// Errors the host answers with a device-lost / device-restored cycle
    /// instead of shutting down.
    pub fn is_surface_loss(&self) -> bool {
        matches!(self, Self::SurfaceLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lost_surfaces_trigger_recreation() {
        assert!(RenderError::SurfaceLost.is_surface_loss());
        assert!(!RenderError::Surface("timeout".into()).is_surface_loss());
        assert!(!RenderError::ResourcesReleased.is_surface_loss());
    }
}
