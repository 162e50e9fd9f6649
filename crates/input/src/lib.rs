//! Input sampling: discrete key states and a relative or absolute mouse.
//!
//! # Invariants
//! - The frame orchestrator consumes samples, never raw window events.
//! - Mouse `x`/`y` are deltas only while the mouse is in relative mode.

pub mod sampler;
pub mod state;

pub use sampler::{InputFrame, InputSampler, ScriptedInput};
pub use state::{Key, KeyboardState, MouseMode, MouseState};
