use crate::error::{RenderError, RenderResult};
use crate::scene::{FrameSeries, ScatterScene};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Validates a raster output target.
///
/// An extensionless path gets `.png` appended; any extension other than
/// `png` fails with `UnsupportedFormat` before any rendering work starts.
pub fn resolve_raster_target(target: &str) -> RenderResult<PathBuf> {
    let path = Path::new(target);
    match path.extension() {
        None => Ok(path.with_extension("png")),
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(path.to_path_buf()),
        Some(ext) => Err(RenderError::UnsupportedFormat(
            ext.to_string_lossy().into_owned(),
        )),
    }
}

/// Seam for the actual rasterizer, which lives outside this workspace.
/// Implementations receive a target that has already been validated.
pub trait SceneSink {
    fn render_scatter(&mut self, scene: &ScatterScene, target: &Path) -> RenderResult<()>;
    fn render_frames(&mut self, series: &FrameSeries, target: &Path) -> RenderResult<()>;
}

/// Validates `target` and hands the scatter scene to the sink.
pub fn export_scatter(
    sink: &mut impl SceneSink,
    scene: &ScatterScene,
    target: &str,
) -> RenderResult<PathBuf> {
    let resolved = resolve_raster_target(target)?;
    sink.render_scatter(scene, &resolved)?;
    Ok(resolved)
}

/// Validates `target` and hands the frame series to the sink.
pub fn export_frames(
    sink: &mut impl SceneSink,
    series: &FrameSeries,
    target: &str,
) -> RenderResult<PathBuf> {
    let resolved = resolve_raster_target(target)?;
    sink.render_frames(series, &resolved)?;
    Ok(resolved)
}

/// Writes scene data as JSON next to the raster target, for the external
/// viewer that produces the actual image.
pub struct JsonSceneExporter {
    out_dir: PathBuf,
}

impl JsonSceneExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn write_json<T: Serialize>(&self, value: &T, target: &Path) -> RenderResult<()> {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string());
        let path = self.out_dir.join(format!("{stem}.json"));
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| RenderError::Serialization(err.to_string()))?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "scene written");
        Ok(())
    }
}

impl SceneSink for JsonSceneExporter {
    fn render_scatter(&mut self, scene: &ScatterScene, target: &Path) -> RenderResult<()> {
        self.write_json(scene, target)
    }

    fn render_frames(&mut self, series: &FrameSeries, target: &Path) -> RenderResult<()> {
        self.write_json(series, target)
    }
}
