//! Shared types used across the edgeview workspace.
//!
//! # Invariants
//! - `OutputSize` is never zero in either dimension once validated.

pub mod types;

pub use types::{OutputSize, Rgba, SizeError};
