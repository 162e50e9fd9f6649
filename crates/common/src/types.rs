use glam::Vec4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel dimensions of the presentation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("output size must be non-zero, got {width}x{height}")]
    Zero { width: u32, height: u32 },
}

impl OutputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build a size that is guaranteed to be usable as a render target extent.
    pub fn validated(width: u32, height: u32) -> Result<Self, SizeError> {
        if width == 0 || height == 0 {
            return Err(SizeError::Zero { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width over height. Zero heights are clamped to one pixel.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const ALICE_BLUE: Self = Self::new(0.941_176, 0.972_549, 1.0, 1.0);
    pub const CRIMSON: Self = Self::new(0.862_745, 0.078_431, 0.235_294, 1.0);
    pub const CADET_BLUE: Self = Self::new(0.372_549, 0.619_608, 0.627_451, 1.0);
    pub const CORNFLOWER_BLUE: Self = Self::new(0.392_157, 0.584_314, 0.929_412, 1.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Rgba> for Vec4 {
    fn from(c: Rgba) -> Self {
        Vec4::new(c.r, c.g, c.b, c.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            OutputSize::validated(0, 600),
            Err(SizeError::Zero {
                width: 0,
                height: 600
            })
        );
        assert!(OutputSize::validated(800, 600).is_ok());
    }

    #[test]
    fn aspect_ratio_tolerates_zero_height() {
        assert_eq!(OutputSize::new(1920, 1080).aspect_ratio(), 1920.0 / 1080.0);
        assert_eq!(OutputSize::new(10, 0).aspect_ratio(), 10.0);
    }

    #[test]
    fn named_colors_are_opaque() {
        for c in [
            Rgba::ALICE_BLUE,
            Rgba::CRIMSON,
            Rgba::CADET_BLUE,
            Rgba::CORNFLOWER_BLUE,
        ] {
            assert_eq!(c.a, 1.0);
        }
    }
}
