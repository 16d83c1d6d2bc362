mod app;
mod config;
mod export;
mod input;
mod logging;
mod model;
mod render;
mod sim;

use anyhow::{Context, Result};
use clap::Parser;
use model::Preset;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "venus-dance")]
#[command(about = "Traces the dance of Venus over eight years, in the terminal or to a PNG", long_about = None)]
struct Args {
    /// Recommended flag set to start from
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Hold the Earth still (true) or the Sun (false)
    #[arg(long)]
    geocentric: Option<bool>,

    /// Distinct colours for Venus, Earth and the Sun
    #[arg(long)]
    use_colors: Option<bool>,

    #[arg(long)]
    draw_earth: Option<bool>,

    #[arg(long)]
    draw_venus: Option<bool>,

    /// Line from Earth to Venus every day
    #[arg(long)]
    use_lines: Option<bool>,

    #[arg(long)]
    draw_sun: Option<bool>,

    /// Keep previous days on screen
    #[arg(long)]
    leave_trail: Option<bool>,

    /// Canvas width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// milliseconds between simulated days
    #[arg(long)]
    step_ms: Option<u64>,

    /// White-only terminal output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Where to write the finished picture
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip the terminal and only export the picture
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Keep the merged options as the new defaults
    #[arg(long, default_value_t = false)]
    save_settings: bool,
}

impl Args {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            preset: self.preset,
            geocentric: self.geocentric,
            use_colors: self.use_colors,
            draw_earth: self.draw_earth,
            draw_venus: self.draw_venus,
            use_lines: self.use_lines,
            draw_sun: self.draw_sun,
            leave_trail: self.leave_trail,
            width: self.width,
            height: self.height,
            step_ms: self.step_ms,
            no_color: self.no_color,
        }
    }

    /// A headless run with an explicit output touches neither settings nor logs on disk.
    fn needs_data_dir(&self) -> bool {
        !(self.headless && self.output.is_some())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = if args.needs_data_dir() {
        Some(config::project_paths()?)
    } else {
        config::project_paths().ok()
    };
    let log_file = match (&paths, args.headless) {
        (Some(p), false) => Some(p.log_path.as_path()),
        _ => None,
    };
    logging::init(log_file)?;

    let mut settings = paths
        .as_ref()
        .map(|p| config::load_settings(&p.settings_path))
        .unwrap_or_default();
    settings.apply(&args.overrides());
    if args.save_settings {
        let p = paths.as_ref().context("no settings directory available")?;
        config::save_settings_atomic(&p.settings_path, &settings)?;
    }

    let export_dir = match (&settings.export_dir, &paths) {
        (Some(dir), _) => dir.clone(),
        (None, Some(p)) => p.data_dir.clone(),
        (None, None) => PathBuf::from("."),
    };
    let dest = app::Destination {
        explicit: args.output.clone(),
        export_dir,
    };

    if args.headless {
        let path = app::run_headless(&settings, &dest)?;
        println!("{}", path.display());
    } else if let Some(path) = app::run_live(settings, dest)? {
        println!("saved {}", path.display());
    }
    Ok(())
}
