use crate::config::atomic_rename;
use crate::model::SimulationConfig;
use crate::render::PixelCanvas;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use image::ImageFormat;
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

/// `venus-<frame>-<YYYYMMDD-HHMMSS>.png`
pub(crate) fn default_file_name<Tz>(config: &SimulationConfig, at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "venus-{}-{}.png",
        config.frame_name(),
        at.format("%Y%m%d-%H%M%S")
    )
}

/// Writes the canvas as a PNG. The file appears complete or not at all.
pub(crate) fn export_png(canvas: &PixelCanvas, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("png.tmp");
    canvas
        .to_rgb_image()
        .save_with_format(&tmp, ImageFormat::Png)
        .with_context(|| format!("encoding {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    log::info!(
        "exported {}x{} image to {}",
        canvas.w,
        canvas.h,
        path.display()
    );
    Ok(())
}

/// Reads an exported picture back for display.
pub(crate) fn load_png(path: &Path) -> Result<PixelCanvas> {
    let img = image::open(path)
        .with_context(|| format!("reading {}", path.display()))?
        .to_rgb8();
    Ok(PixelCanvas::from_rgb_image(&img))
}

pub(crate) fn resolve_output(
    explicit: Option<&Path>,
    export_dir: &Path,
    config: &SimulationConfig,
) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => export_dir.join(default_file_name(config, chrono::Local::now())),
    }
}
