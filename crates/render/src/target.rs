use edgeview_common::OutputSize;

use crate::error::RenderError;

/// The two textures the post-process chain works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    /// Off-screen scene color, later sampled by both passes.
    Color,
    /// Edge mask written by the compute pass.
    Edge,
}

/// Reference to a render target owned by a backend.
///
/// The generation is bumped by the backend every time its size-dependent
/// resources are recreated or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle {
    pub slot: TargetSlot,
    pub generation: u64,
}

impl TargetHandle {
    pub fn ensure_current(self, current: u64) -> Result<(), RenderError> {
        if self.generation != current {
            return Err(RenderError::StaleTarget {
                slot: self.slot,
                handle: self.generation,
                current,
            });
        }
        Ok(())
    }
}

/// Handles to the color and edge buffers for one resource generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessTargets {
    pub color: TargetHandle,
    pub edge: TargetHandle,
    pub size: OutputSize,
}

impl PostProcessTargets {
    pub fn new(generation: u64, size: OutputSize) -> Self {
        Self {
            color: TargetHandle {
                slot: TargetSlot::Color,
                generation,
            },
            edge: TargetHandle {
                slot: TargetSlot::Edge,
                generation,
            },
            size,
        }
    }

    pub fn generation(&self) -> u64 {
        self.color.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_is_rejected() {
        let targets = PostProcessTargets::new(3, OutputSize::new(64, 64));
        assert!(targets.color.ensure_current(3).is_ok());
        assert_eq!(
            targets.edge.ensure_current(4),
            Err(RenderError::StaleTarget {
                slot: TargetSlot::Edge,
                handle: 3,
                current: 4,
            })
        );
    }
}
