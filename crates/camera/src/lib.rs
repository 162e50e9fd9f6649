//! Free-flight camera for the edgeview demo.
//!
//! Movement and rotation operators mutate the basis and position and mark the
//! view dirty. The view matrix is rebuilt at most once per frame by
//! [`Camera::update_view_matrix`].
//!
//! # Invariants
//! - The view matrix is readable only while the view is clean.
//! - After a rebuild, {forward, right, up} is a right-handed orthonormal basis.
//! - Projection is independent of view dirtiness.

mod camera;

pub use camera::{Camera, CameraError};
