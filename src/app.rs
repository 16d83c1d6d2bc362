use crate::config::Settings;
use crate::export::{export_png, load_png, resolve_output};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::model::{StepOutcome, TERMINAL_DAY};
use crate::render::{canvas_to_cells, draw_text, PixelCanvas, Surface, Terminal, Viewport};
use crate::sim::OrbitSimulator;
use anyhow::Result;
use crossterm::style::Color;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where the finished picture goes.
pub(crate) struct Destination {
    pub(crate) explicit: Option<PathBuf>,
    pub(crate) export_dir: PathBuf,
}

impl Destination {
    fn path(&self, settings: &Settings) -> PathBuf {
        resolve_output(
            self.explicit.as_deref(),
            &self.export_dir,
            &settings.simulation,
        )
    }
}

fn new_simulator(settings: &Settings) -> OrbitSimulator<PixelCanvas> {
    let (w, h) = settings.canvas_size();
    let sim = OrbitSimulator::new(settings.simulation, w, h, PixelCanvas::new(w, h));
    let st = sim.state();
    let fixed = st.body(sim.config().stationary());
    log::info!(
        "{} run on {}x{} canvas, {:?} fixed at ({:.1}, {:.1}), venus orbit {:.1}px",
        sim.config().frame_name(),
        w,
        h,
        fixed.kind,
        fixed.position.x,
        fixed.position.y,
        st.venus.position.distance(st.sun.position)
    );
    sim
}

/// Runs all eight years without a terminal and exports the result.
pub(crate) fn run_headless(settings: &Settings, dest: &Destination) -> Result<PathBuf> {
    let mut sim = new_simulator(settings);
    let steps = sim.run_to_completion();
    log::info!("finished after {} steps on day {}", steps, sim.day());
    let path = dest.path(settings);
    export_png(sim.surface(), &path)?;
    Ok(path)
}

/// Live view; returns the exported path, or `None` when cancelled early.
pub(crate) fn run_live(settings: Settings, dest: Destination) -> Result<Option<PathBuf>> {
    let mut app = App {
        driver: Driver::new(new_simulator(&settings)),
        term: Terminal::begin()?,
        settings,
        dest,
        finished: None,
    };
    let res = app.run();
    let ended = app.term.end();
    let saved = res?;
    ended?;
    Ok(saved)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Continue,
    /// The terminal day was drawn this frame; the host exports now.
    Completed,
    /// Quit before the run ended.
    Cancelled,
    /// A key was pressed while the finished picture was shown.
    Dismissed,
}

/// Per-frame rules of the live view, independent of any terminal.
pub(crate) struct Driver<S: Surface> {
    sim: OrbitSimulator<S>,
    paused: bool,
}

impl<S: Surface> Driver<S> {
    pub(crate) fn new(sim: OrbitSimulator<S>) -> Self {
        Self { sim, paused: false }
    }

    pub(crate) fn sim(&self) -> &OrbitSimulator<S> {
        &self.sim
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    /// Applies this frame's actions, then advances at most one day.
    /// A late frame delays the run; it never catches up by stepping twice.
    pub(crate) fn frame(&mut self, actions: &[Action]) -> FrameOutcome {
        let finished = self.sim.is_finished();
        for action in actions {
            match (action, finished) {
                (_, true) => return FrameOutcome::Dismissed,
                (Action::Quit, false) => {
                    log::info!("cancelled on day {}", self.sim.day());
                    return FrameOutcome::Cancelled;
                }
                (Action::TogglePause, false) => self.paused = !self.paused,
                (Action::Other, false) => {}
            }
        }

        if finished || self.paused {
            return FrameOutcome::Continue;
        }
        match self.sim.step() {
            StepOutcome::Continue => FrameOutcome::Continue,
            StepOutcome::Terminate => FrameOutcome::Completed,
        }
    }
}

struct App {
    settings: Settings,
    dest: Destination,
    driver: Driver<PixelCanvas>,
    term: Terminal,
    /// The exported picture, shown in place of the live canvas.
    finished: Option<(PixelCanvas, PathBuf)>,
}

impl App {
    fn run(&mut self) -> Result<Option<PathBuf>> {
        let step_dt = Duration::from_millis(self.settings.step_ms);

        loop {
            let frame_start = Instant::now();
            self.term.resize_if_needed()?;

            let actions: Vec<Action> = collect_input_nonblocking(step_dt)?
                .iter()
                .map(map_event_to_action)
                .collect();

            match self.driver.frame(&actions) {
                FrameOutcome::Cancelled => return Ok(None),
                FrameOutcome::Dismissed => return Ok(self.finished.take().map(|(_, p)| p)),
                FrameOutcome::Completed => self.finish()?,
                FrameOutcome::Continue => {}
            }

            self.render_frame()?;
            spin_sleep(step_dt, frame_start);
        }
    }

    fn finish(&mut self) -> Result<()> {
        let path = self.dest.path(&self.settings);
        export_png(self.driver.sim().surface(), &path)?;
        let image = load_png(&path)?;
        self.finished = Some((image, path));
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let bg = Color::Black;
        self.term.cur.clear(bg);

        let cols = self.term.cols;
        let rows = self.term.rows;
        let vp = Viewport {
            x: 0,
            y: 0,
            w: cols,
            h: rows.saturating_sub(1),
        };

        let sim = self.driver.sim();
        let canvas = match &self.finished {
            None => sim.surface(),
            Some((image, _)) => image,
        };
        canvas_to_cells(canvas, &mut self.term.cur, vp, self.settings.enable_color, bg);

        let status = match &self.finished {
            None => format!(
                " day {:>4} of {}  {}{}  [space] pause  [q] quit",
                sim.day(),
                TERMINAL_DAY.ceil() as u32,
                sim.config().frame_name(),
                if self.driver.is_paused() { "  (paused)" } else { "" }
            ),
            Some((_, path)) => status_saved(path),
        };
        draw_text(
            &mut self.term.cur,
            0,
            rows.saturating_sub(1),
            &status,
            Color::Grey,
            bg,
        );

        self.term.present(true)?;
        Ok(())
    }
}

fn status_saved(path: &Path) -> String {
    format!(" saved {}  [any key] exit", path.display())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
