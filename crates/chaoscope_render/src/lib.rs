//! Renderer-facing surface of the chaoscope workspace.
//!
//! The core crate only produces arrays; this crate assembles them into
//! serializable scenes, validates raster output targets (png is the only
//! supported raster format) and ships a JSON exporter that writes scene
//! files for an external rasterizer/viewer. No pixels are produced here.

pub mod error;
pub mod export;
pub mod scene;

pub use error::{RenderError, RenderResult};
pub use export::{export_frames, export_scatter, resolve_raster_target, JsonSceneExporter, SceneSink};
pub use scene::{FrameSeries, ScatterScene};
