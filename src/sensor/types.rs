//! Value types produced by the sleep sensor simulator.
//!
//! A [`Reading`] is the unit delivered to the realtime webhook. Its JSON
//! shape is fixed: six snake_case fields, with the phase serialized under
//! `sleep_phase`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one simulated sleep cycle in minutes.
pub const SLEEP_CYCLE_MINUTES: u32 = 90;

/// Minutes spent in each sleep phase before moving to the next one.
pub const PHASE_SEGMENT_MINUTES: u32 = 30;

/// Simulated sleep stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepPhase {
    Awake,
    Light,
    Deep,
    Rem,
}

impl SleepPhase {
    /// Map elapsed sleep minutes onto the repeating light/deep/rem pattern.
    ///
    /// `[0,30)` is light, `[30,60)` deep and `[60,90)` rem, modulo 90.
    pub fn from_elapsed_minutes(elapsed_minutes: u32) -> Self {
        let cycle_position = elapsed_minutes % SLEEP_CYCLE_MINUTES;
        if cycle_position < PHASE_SEGMENT_MINUTES {
            SleepPhase::Light
        } else if cycle_position < 2 * PHASE_SEGMENT_MINUTES {
            SleepPhase::Deep
        } else {
            SleepPhase::Rem
        }
    }

    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepPhase::Awake => "awake",
            SleepPhase::Light => "light",
            SleepPhase::Deep => "deep",
            SleepPhase::Rem => "rem",
        }
    }

    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepPhase::Awake)
    }
}

impl fmt::Display for SleepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable snapshot of simulated sensor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub is_sleeping: bool,
    #[serde(rename = "sleep_phase")]
    pub phase: SleepPhase,
    /// Beats per minute
    pub heart_rate: u32,
    /// Breaths per minute
    pub respiration_rate: u32,
    pub movement_count: u32,
    /// Minutes since sleep started, 0 while awake
    pub elapsed_minutes: u32,
}

impl Reading {
    /// Number of complete sleep cycles behind this reading.
    pub fn estimated_cycles(&self) -> u32 {
        self.elapsed_minutes / SLEEP_CYCLE_MINUTES
    }
}

/// Mutable simulation state owned by the simulator.
///
/// `phase` is [`SleepPhase::Awake`] exactly when `is_sleeping` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorState {
    is_sleeping: bool,
    phase: SleepPhase,
    sleep_start: Option<NaiveDateTime>,
    elapsed_minutes: u32,
}

impl SensorState {
    /// Initial state at startup.
    pub fn awake() -> Self {
        Self {
            is_sleeping: false,
            phase: SleepPhase::Awake,
            sleep_start: None,
            elapsed_minutes: 0,
        }
    }

    /// A state that fell asleep at `sleep_start`.
    ///
    /// Elapsed minutes and phase are recomputed on the next reading.
    pub fn asleep_since(sleep_start: NaiveDateTime) -> Self {
        Self {
            is_sleeping: true,
            phase: SleepPhase::Light,
            sleep_start: Some(sleep_start),
            elapsed_minutes: 0,
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }

    pub fn phase(&self) -> SleepPhase {
        self.phase
    }

    pub fn sleep_start(&self) -> Option<NaiveDateTime> {
        self.sleep_start
    }

    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_minutes
    }

    pub(crate) fn fall_asleep(&mut self, now: NaiveDateTime) {
        self.is_sleeping = true;
        self.sleep_start = Some(now);
        self.elapsed_minutes = 0;
        self.phase = SleepPhase::Light;
    }

    /// Recompute elapsed minutes and phase from `sleep_start`.
    pub(crate) fn advance(&mut self, now: NaiveDateTime) {
        let Some(start) = self.sleep_start else {
            return;
        };
        // A clock stepping backwards clamps to zero rather than underflowing.
        let minutes = (now - start).num_seconds().max(0) / 60;
        self.elapsed_minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        self.phase = SleepPhase::from_elapsed_minutes(self.elapsed_minutes);
    }

    pub(crate) fn wake_up(&mut self) {
        self.is_sleeping = false;
        self.phase = SleepPhase::Awake;
        self.elapsed_minutes = 0;
        self.sleep_start = None;
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::awake()
    }
}

/// A flip of the sleep state observed while producing a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    FellAsleep { at: NaiveDateTime },
    WokeUp { at: NaiveDateTime, slept_minutes: u32 },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::FellAsleep { at } => {
                write!(f, "Sleep onset detected at {}", at.format("%H:%M"))
            }
            Transition::WokeUp { at, slept_minutes } => write!(
                f,
                "Wake-up detected at {} after {slept_minutes} minutes",
                at.format("%H:%M")
            ),
        }
    }
}
