use crate::model::{
    should_continue, Body, BodyKind, Point, SimulationConfig, SimulationState, StepOutcome,
    EARTH_AU_FROM_SUN, EARTH_PERIOD_DAYS, VENUS_AU_FROM_SUN, VENUS_PERIOD_DAYS,
};
use crate::render::{Pixel, Surface};

/// Dot radius for every body, in surface pixels.
const BODY_RADIUS: f64 = 1.0;

/// Earth and Venus on circular orbits, drawn one day at a time.
///
/// The simulator owns its drawing surface; the host decides when to call
/// [`OrbitSimulator::step`] and what to do with the surface once the run ends.
pub(crate) struct OrbitSimulator<S: Surface> {
    config: SimulationConfig,
    state: SimulationState,
    surface: S,
    finished: bool,
}

impl<S: Surface> OrbitSimulator<S> {
    pub(crate) fn new(config: SimulationConfig, width: u32, height: u32, mut surface: S) -> Self {
        let state = initial_state(&config, width, height);
        surface.clear(Pixel::BLACK);
        Self {
            config,
            state,
            surface,
            finished: false,
        }
    }

    pub(crate) fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> &SimulationState {
        &self.state
    }

    pub(crate) fn day(&self) -> u32 {
        self.state.day
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn surface(&self) -> &S {
        &self.surface
    }

    pub(crate) fn into_surface(self) -> S {
        self.surface
    }

    /// Advances one day, redraws, and reports whether another day follows.
    pub(crate) fn step(&mut self) -> StepOutcome {
        if self.finished {
            return StepOutcome::Terminate;
        }

        self.state.day += 1;
        let day = self.state.day;

        if self.config.geocentric {
            let earth = self.state.earth.position;
            self.state.sun.position = self.state.sun.orbit_position(earth, day);
        } else {
            let sun = self.state.sun.position;
            self.state.earth.position = self.state.earth.orbit_position(sun, day);
        }

        // Reads the Sun after it has moved for this day.
        let sun = self.state.sun.position;
        self.state.venus.position = self.state.venus.orbit_position(sun, day);

        self.render_pass();

        if should_continue(day) {
            StepOutcome::Continue
        } else {
            log::debug!("terminal day {} reached", day);
            self.finished = true;
            StepOutcome::Terminate
        }
    }

    /// Steps until the run ends; returns how many steps were taken.
    pub(crate) fn run_to_completion(&mut self) -> u32 {
        let mut steps = 0;
        while !self.finished {
            self.step();
            steps += 1;
        }
        steps
    }

    fn render_pass(&mut self) {
        let cfg = self.config;
        let st = &self.state;
        let tint = |c: Pixel| if cfg.use_colors { c } else { Pixel::WHITE };

        if !cfg.leave_trail {
            self.surface.clear(Pixel::BLACK);
        }
        if cfg.draw_venus {
            let p = st.venus.position;
            self.surface
                .draw_dot(p.x, p.y, BODY_RADIUS, tint(Pixel::LIGHT_YELLOW));
        }
        if cfg.draw_earth {
            let p = st.earth.position;
            self.surface
                .draw_dot(p.x, p.y, BODY_RADIUS, tint(Pixel::LIGHT_CYAN));
        }
        if cfg.draw_sun {
            let p = st.sun.position;
            self.surface
                .draw_dot(p.x, p.y, BODY_RADIUS, tint(Pixel::PURE_YELLOW));
        }
        if cfg.use_lines {
            let (e, v) = (st.earth.position, st.venus.position);
            self.surface.draw_line(e.x, e.y, v.x, v.y, Pixel::WHITE);
        }
    }
}

fn initial_state(config: &SimulationConfig, width: u32, height: u32) -> SimulationState {
    let radius = width as f64 / 2.0;
    let center = Point::new(width as f64 / 2.0, height as f64 / 2.0);

    let mut sun_venus = VENUS_AU_FROM_SUN * radius;
    let mut sun_earth = EARTH_AU_FROM_SUN * radius;

    let (sun, earth, venus) = if config.geocentric {
        // Shrink both orbits so the Sun's path plus Venus's fits the canvas.
        let span = sun_earth + sun_venus;
        if span > 0.0 {
            sun_earth *= radius / span;
            sun_venus *= radius / span;
        }
        let earth = center;
        let sun = earth.offset(0.0, sun_earth);
        let venus = sun.offset(0.0, -sun_venus);
        (sun, earth, venus)
    } else {
        let sun = center;
        (sun, sun.offset(0.0, sun_earth), sun.offset(0.0, sun_venus))
    };

    SimulationState {
        day: 0,
        sun: Body::new(BodyKind::Sun, sun, EARTH_PERIOD_DAYS, sun_earth),
        earth: Body::new(BodyKind::Earth, earth, EARTH_PERIOD_DAYS, sun_earth),
        venus: Body::new(BodyKind::Venus, venus, VENUS_PERIOD_DAYS, sun_venus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{orbit_angle, Preset};
    use crate::render::PixelCanvas;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Cmd {
        Clear(Pixel),
        Dot(f64, f64, f64, Pixel),
        Line(f64, f64, f64, f64, Pixel),
    }

    #[derive(Default)]
    struct Recorder {
        cmds: Vec<Cmd>,
    }

    impl Recorder {
        fn clears(&self) -> usize {
            self.cmds.iter().filter(|c| matches!(c, Cmd::Clear(_))).count()
        }
    }

    impl Surface for Recorder {
        fn clear(&mut self, color: Pixel) {
            self.cmds.push(Cmd::Clear(color));
        }
        fn draw_dot(&mut self, x: f64, y: f64, radius: f64, color: Pixel) {
            self.cmds.push(Cmd::Dot(x, y, radius, color));
        }
        fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Pixel) {
            self.cmds.push(Cmd::Line(x1, y1, x2, y2, color));
        }
    }

    fn everything(geocentric: bool) -> SimulationConfig {
        SimulationConfig {
            geocentric,
            use_colors: true,
            draw_earth: true,
            draw_venus: true,
            use_lines: true,
            draw_sun: true,
            leave_trail: false,
        }
    }

    fn sim(config: SimulationConfig) -> OrbitSimulator<Recorder> {
        OrbitSimulator::new(config, 500, 500, Recorder::default())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn geocentric_initial_layout() {
        let s = sim(Preset::Geocentric.config());
        let st = s.state();
        let d_earth = 250.0 * (1.0 / (1.0 + 0.723332));
        let d_venus = 250.0 * (0.723332 / (1.0 + 0.723332));

        assert_eq!(st.day, 0);
        assert_eq!(st.earth.position, Point::new(250.0, 250.0));
        assert!(close(st.sun.position.x, 250.0));
        assert!(close(st.sun.position.y, 250.0 + d_earth));
        assert!(close(st.venus.position.x, st.sun.position.x));
        assert!(close(st.venus.position.y, st.sun.position.y - d_venus));
    }

    #[test]
    fn heliocentric_initial_layout() {
        let s = sim(Preset::Heliocentric.config());
        let st = s.state();
        assert_eq!(st.sun.position, Point::new(250.0, 250.0));
        assert!(close(st.earth.position.y, 500.0));
        assert!(close(st.venus.position.y, 250.0 + 0.723332 * 250.0));
        assert!(close(st.earth.position.x, 250.0));
    }

    #[test]
    fn geocentric_distances_fit_radius() {
        let s = sim(Preset::Geocentric.config());
        let st = s.state();
        let total = st.sun.distance_from_primary + st.venus.distance_from_primary;
        assert!(close(total, 250.0));
    }

    #[test]
    fn heliocentric_distances_are_not_rescaled() {
        let s = sim(Preset::Heliocentric.config());
        let st = s.state();
        assert!(close(st.earth.distance_from_primary, 1.0 * 250.0));
        assert!(close(st.venus.distance_from_primary, 0.723332 * 250.0));
    }

    #[test]
    fn heliocentric_quarter_year() {
        let mut s = sim(Preset::Heliocentric.config());
        for _ in 0..91 {
            s.step();
        }
        let st = s.state();
        let sun = st.sun.position;
        let d = st.earth.distance_from_primary;
        let dx = st.earth.position.x - sun.x;
        let dy = st.earth.position.y - sun.y;
        assert!((dx - d).abs() < 0.01 * d);
        assert!(dy.abs() < 0.01 * d);
        let a = orbit_angle(EARTH_PERIOD_DAYS, 91);
        assert!(close(dx, a.sin() * d));
        assert!(close(dy, a.cos() * d));
    }

    #[test]
    fn exactly_one_body_stays_put() {
        for geocentric in [true, false] {
            let mut s = sim(everything(geocentric));
            let start = s.state().clone();
            for _ in 0..400 {
                s.step();
                let st = s.state();
                let (fixed, moving) = if geocentric {
                    (&st.earth, &st.sun)
                } else {
                    (&st.sun, &st.earth)
                };
                assert_eq!(fixed.position, start.body(fixed.kind).position);
                assert!(close(
                    moving.position.distance(fixed.position),
                    moving.distance_from_primary
                ));
                assert!(close(
                    st.venus.position.distance(st.sun.position),
                    st.venus.distance_from_primary
                ));
            }
        }
    }

    #[test]
    fn venus_follows_the_sun_of_the_same_day() {
        let mut s = sim(Preset::Geocentric.config());
        for _ in 0..37 {
            s.step();
        }
        let st = s.state();
        let expected = st.venus.orbit_position(st.sun.position, 37);
        assert_eq!(st.venus.position, expected);

        // The Sun one day earlier would put Venus somewhere else.
        let earlier_sun = st.sun.orbit_position(st.earth.position, 36);
        let stale = st.venus.orbit_position(earlier_sun, 37);
        assert!(stale.distance(st.venus.position) > 1.0);
    }

    #[test]
    fn run_lasts_2922_continues_then_terminates() {
        let mut s = OrbitSimulator::new(
            Preset::Geocentric.config(),
            500,
            500,
            PixelCanvas::new(500, 500),
        );
        let mut continues = 0;
        loop {
            match s.step() {
                StepOutcome::Continue => {
                    continues += 1;
                    assert!(s.day() <= 2922);
                }
                StepOutcome::Terminate => break,
            }
        }
        assert_eq!(continues, 2922);
        assert_eq!(s.day(), 2923);
        assert!(s.is_finished());

        assert_eq!(s.step(), StepOutcome::Terminate);
        assert_eq!(s.day(), 2923);
    }

    #[test]
    fn run_to_completion_counts_every_step() {
        let mut s = sim(Preset::Heliocentric.config());
        assert_eq!(s.run_to_completion(), 2923);
        assert_eq!(s.run_to_completion(), 0);
    }

    #[test]
    fn render_pass_order_and_colors() {
        let mut s = sim(everything(false));
        s.step();
        let st = s.state().clone();
        let (v, e, sun) = (st.venus.position, st.earth.position, st.sun.position);
        let cmds = &s.surface().cmds;
        assert_eq!(
            cmds.as_slice(),
            &[
                Cmd::Clear(Pixel::BLACK),
                Cmd::Clear(Pixel::BLACK),
                Cmd::Dot(v.x, v.y, 1.0, Pixel::LIGHT_YELLOW),
                Cmd::Dot(e.x, e.y, 1.0, Pixel::LIGHT_CYAN),
                Cmd::Dot(sun.x, sun.y, 1.0, Pixel::PURE_YELLOW),
                Cmd::Line(e.x, e.y, v.x, v.y, Pixel::WHITE),
            ]
        );
    }

    #[test]
    fn without_colors_everything_is_white() {
        let mut cfg = everything(true);
        cfg.use_colors = false;
        let mut s = sim(cfg);
        s.step();
        for c in &s.surface().cmds {
            match c {
                Cmd::Dot(.., p) | Cmd::Line(.., p) => assert_eq!(*p, Pixel::WHITE),
                Cmd::Clear(p) => assert_eq!(*p, Pixel::BLACK),
            }
        }
    }

    #[test]
    fn trail_controls_clearing() {
        let mut cfg = Preset::Geocentric.config();
        cfg.leave_trail = false;
        let mut s = sim(cfg);
        for _ in 0..10 {
            s.step();
        }
        assert_eq!(s.surface().clears(), 11);

        cfg.leave_trail = true;
        let mut s = sim(cfg);
        for _ in 0..10 {
            s.step();
        }
        assert_eq!(s.surface().clears(), 1);
        assert_eq!(s.into_surface().cmds[0], Cmd::Clear(Pixel::BLACK));
    }

    #[test]
    fn disabled_bodies_are_not_drawn() {
        let cfg = SimulationConfig {
            geocentric: true,
            use_colors: false,
            draw_earth: false,
            draw_venus: false,
            use_lines: false,
            draw_sun: false,
            leave_trail: true,
        };
        let mut s = sim(cfg);
        s.step();
        assert_eq!(s.surface().cmds, vec![Cmd::Clear(Pixel::BLACK)]);
    }

    #[test]
    fn zero_canvas_stays_finite() {
        for geocentric in [true, false] {
            let mut s = OrbitSimulator::new(everything(geocentric), 0, 0, PixelCanvas::new(0, 0));
            s.step();
            let st = s.state();
            for p in [st.sun.position, st.earth.position, st.venus.position] {
                assert_eq!(p, Point::new(0.0, 0.0));
            }
        }
    }

    #[test]
    fn trail_lands_on_the_canvas() {
        let mut s = OrbitSimulator::new(
            Preset::Geocentric.config(),
            200,
            200,
            PixelCanvas::new(200, 200),
        );
        s.run_to_completion();
        let canvas = s.into_surface();
        let lit = canvas.px.iter().filter(|p| **p != Pixel::BLACK).count();
        assert!(lit > 100);
        assert!(canvas.px.iter().all(|p| *p == Pixel::BLACK || *p == Pixel::WHITE));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn bodies_stay_on_their_circles(day in 1u32..2923, geocentric in any::<bool>()) {
            let mut s = sim(everything(geocentric));
            for _ in 0..day {
                s.step();
            }
            let st = s.state();
            let primary = if geocentric { st.earth.position } else { st.sun.position };
            let moving = if geocentric { &st.sun } else { &st.earth };
            prop_assert_eq!(moving.position, moving.orbit_position(primary, day));
            prop_assert_eq!(st.venus.position, st.venus.orbit_position(st.sun.position, day));
        }
    }
}
