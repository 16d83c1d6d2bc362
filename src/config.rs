use crate::model::{Preset, SimulationConfig};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) simulation: SimulationConfig,
    pub(crate) canvas_width: u32,
    pub(crate) canvas_height: u32,
    /// Nominal delay between simulated days.
    pub(crate) step_ms: u64,
    pub(crate) enable_color: bool,
    pub(crate) export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            canvas_width: 500,
            canvas_height: 500,
            step_ms: 20,
            enable_color: true,
            export_dir: None,
        }
    }
}

/// Command-line values that win over the settings file.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) preset: Option<Preset>,
    pub(crate) geocentric: Option<bool>,
    pub(crate) use_colors: Option<bool>,
    pub(crate) draw_earth: Option<bool>,
    pub(crate) draw_venus: Option<bool>,
    pub(crate) use_lines: Option<bool>,
    pub(crate) draw_sun: Option<bool>,
    pub(crate) leave_trail: Option<bool>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) step_ms: Option<u64>,
    pub(crate) no_color: bool,
}

impl Settings {
    /// Preset first, then individual flags, so `--preset heliocentric --draw-sun true` works.
    pub(crate) fn apply(&mut self, o: &Overrides) {
        if let Some(p) = o.preset {
            self.simulation = p.config();
        }
        let sim = &mut self.simulation;
        let flags = [
            (&mut sim.geocentric, o.geocentric),
            (&mut sim.use_colors, o.use_colors),
            (&mut sim.draw_earth, o.draw_earth),
            (&mut sim.draw_venus, o.draw_venus),
            (&mut sim.use_lines, o.use_lines),
            (&mut sim.draw_sun, o.draw_sun),
            (&mut sim.leave_trail, o.leave_trail),
        ];
        for (slot, value) in flags {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if let Some(w) = o.width {
            self.canvas_width = w;
        }
        if let Some(h) = o.height {
            self.canvas_height = h;
        }
        if let Some(ms) = o.step_ms {
            self.step_ms = ms;
        }
        if o.no_color {
            self.enable_color = false;
        }
        (self.canvas_width, self.canvas_height) = self.canvas_size();
    }

    /// Canvas dimensions, never smaller than one pixel so the picture can be exported.
    pub(crate) fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width.max(1), self.canvas_height.max(1))
    }
}

pub(crate) struct Paths {
    pub(crate) data_dir: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "venus-dance", "VenusDance")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("venus-dance.log"),
        data_dir: dir,
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let Ok(s) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("ignoring unreadable settings {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // Rename-over-existing fails on Windows.
    if to.exists() {
        if let Err(e) = fs::remove_file(to) {
            log::debug!("could not remove {} before rename: {}", to.display(), e);
        }
    }
    fs::rename(from, to)
        .with_context(|| format!("moving {} to {}", from.display(), to.display()))?;
    Ok(())
}
