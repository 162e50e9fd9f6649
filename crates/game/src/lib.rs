//! Frame orchestrator for the edgeview demo.
//!
//! One frame is strictly sequential: sample input, update the camera, clear,
//! draw the scene, run the Sobel post-process chain, present.
//!
//! # Invariants
//! - Nothing is drawn before the first update has run.
//! - After device loss no frame is rendered until resources are restored.
//! - Exiting is reported through [`TickStatus`], never by the library itself.

pub mod config;
pub mod error;
pub mod game;
pub mod scene;
pub mod timer;

pub use config::GameConfig;
pub use error::GameError;
pub use game::{FrameOutcome, Game, SkipReason, TickStatus};
pub use scene::{Scene, SceneObject};
pub use timer::StepTimer;
