use std::path::PathBuf;

use edgeview_camera::CameraError;
use edgeview_common::SizeError;
use edgeview_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
