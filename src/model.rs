use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/* -----------------------------
   Astronomical facts (circular orbits, ratios only)
------------------------------ */

pub(crate) const VENUS_AU_FROM_SUN: f64 = 0.723332;
pub(crate) const EARTH_AU_FROM_SUN: f64 = 1.000000;
pub(crate) const VENUS_PERIOD_DAYS: f64 = 224.701;
pub(crate) const EARTH_PERIOD_DAYS: f64 = 365.256;

pub(crate) const SIMULATED_YEARS: f64 = 8.0;
/// First day at which the run stops: 2922.048, never reached exactly.
pub(crate) const TERMINAL_DAY: f64 = EARTH_PERIOD_DAYS * SIMULATED_YEARS;

pub(crate) const RADIANS_PER_DEGREE: f64 = (2.0 * PI) / 360.0;

pub(crate) fn degrees_per_day(period_days: f64) -> f64 {
    (1.0 / period_days) * 360.0
}

/// Orbital angle in radians after `day` days of constant angular velocity.
pub(crate) fn orbit_angle(period_days: f64, day: u32) -> f64 {
    (day as f64 * degrees_per_day(period_days)) * RADIANS_PER_DEGREE
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub(crate) fn distance(self, o: Point) -> f64 {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/* -----------------------------
   Configuration flags
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationConfig {
    pub(crate) geocentric: bool,
    pub(crate) use_colors: bool,
    pub(crate) draw_earth: bool,
    pub(crate) draw_venus: bool,
    pub(crate) use_lines: bool,
    pub(crate) draw_sun: bool,
    pub(crate) leave_trail: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Preset::Geocentric.config()
    }
}

impl SimulationConfig {
    pub(crate) fn frame_name(&self) -> &'static str {
        if self.geocentric {
            "geocentric"
        } else {
            "heliocentric"
        }
    }

    /// The body that never moves in this reference frame.
    pub(crate) fn stationary(&self) -> BodyKind {
        if self.geocentric {
            BodyKind::Earth
        } else {
            BodyKind::Sun
        }
    }
}

/// Recommended flag sets for the two reference frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Preset {
    Geocentric,
    Heliocentric,
}

impl Preset {
    pub(crate) fn config(self) -> SimulationConfig {
        match self {
            Preset::Geocentric => SimulationConfig {
                geocentric: true,
                use_colors: false,
                draw_earth: false,
                draw_venus: true,
                use_lines: false,
                draw_sun: false,
                leave_trail: true,
            },
            Preset::Heliocentric => SimulationConfig {
                geocentric: false,
                use_colors: false,
                draw_earth: true,
                draw_venus: true,
                use_lines: true,
                draw_sun: false,
                leave_trail: true,
            },
        }
    }
}

/* -----------------------------
   Bodies and state
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BodyKind {
    Sun,
    Earth,
    Venus,
}

/// A body on a circular path around its primary.
///
/// In the geocentric frame the Sun carries Earth's period and distance, since
/// it appears to circle the Earth once a year.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) kind: BodyKind,
    pub(crate) position: Point,
    pub(crate) orbital_period_days: f64,
    pub(crate) distance_from_primary: f64,
}

impl Body {
    pub(crate) fn new(kind: BodyKind, position: Point, period: f64, distance: f64) -> Self {
        Self {
            kind,
            position,
            orbital_period_days: period,
            distance_from_primary: distance,
        }
    }

    pub(crate) fn angle_at(&self, day: u32) -> f64 {
        orbit_angle(self.orbital_period_days, day)
    }

    /// Position on the orbit around `primary` at `day`.
    pub(crate) fn orbit_position(&self, primary: Point, day: u32) -> Point {
        let a = self.angle_at(day);
        primary.offset(
            a.sin() * self.distance_from_primary,
            a.cos() * self.distance_from_primary,
        )
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SimulationState {
    pub(crate) day: u32,
    pub(crate) sun: Body,
    pub(crate) earth: Body,
    pub(crate) venus: Body,
}

impl SimulationState {
    pub(crate) fn body(&self, kind: BodyKind) -> &Body {
        match kind {
            BodyKind::Sun => &self.sun,
            BodyKind::Earth => &self.earth,
            BodyKind::Venus => &self.venus,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Continue,
    Terminate,
}

pub(crate) fn should_continue(day: u32) -> bool {
    (day as f64) < TERMINAL_DAY
}
