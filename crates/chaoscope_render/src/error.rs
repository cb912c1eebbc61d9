use chaoscope_core::CoreError;
use thiserror::Error;

/// Errors of the render surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The output target's extension is not a supported raster format.
    /// Reported before any rendering work is attempted.
    #[error("unsupported output format \"{0}\"; only png targets are accepted")]
    UnsupportedFormat(String),

    /// Writing a scene file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A core-side failure surfaced while assembling a scene.
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type RenderResult<T> = Result<T, RenderError>;
