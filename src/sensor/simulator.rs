//! Day/night sleep state machine.
//!
//! The simulator is asleep between 23:00 and 07:00 local time. While asleep
//! the phase follows a 90 minute light/deep/rem cycle measured from the
//! moment sleep started.

use crate::sensor::types::{Reading, SensorState, SleepPhase, Transition};
use crate::sensor::vitals::{PhaseProfile, VitalsSource};
use chrono::{Local, NaiveDateTime, Timelike};
use rand::rngs::ThreadRng;
use std::cell::Cell;

/// First hour of the night window.
pub const NIGHT_START_HOUR: u32 = 23;

/// First hour after the night window.
pub const NIGHT_END_HOUR: u32 = 7;

/// Whether `hour` (0-23) falls inside the simulated night.
pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Source of the current local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A manually driven clock.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Simulated sleep sensor producing one [`Reading`] per call.
pub struct SensorSimulator<C = SystemClock, V = ThreadRng> {
    state: SensorState,
    clock: C,
    vitals: V,
    pending_transition: Option<Transition>,
}

impl SensorSimulator {
    /// Create a simulator on the system clock with thread-local randomness.
    pub fn new() -> Self {
        Self::with_sources(SystemClock, rand::thread_rng())
    }
}

impl Default for SensorSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, V: VitalsSource> SensorSimulator<C, V> {
    /// Create a simulator with explicit time and randomness sources.
    pub fn with_sources(clock: C, vitals: V) -> Self {
        Self::with_state(SensorState::awake(), clock, vitals)
    }

    /// Create a simulator resuming from an existing state.
    pub fn with_state(state: SensorState, clock: C, vitals: V) -> Self {
        Self {
            state,
            clock,
            vitals,
            pending_transition: None,
        }
    }

    /// Produce a reading for the current time of the injected clock.
    pub fn tick(&mut self) -> Reading {
        let now = self.clock.now();
        self.next_reading(now)
    }

    /// Update the sleep state for `now` and draw fresh vitals.
    pub fn next_reading(&mut self, now: NaiveDateTime) -> Reading {
        if let Some(transition) = self.update_state(now) {
            self.pending_transition = Some(transition);
        }

        let profile = PhaseProfile::for_phase(self.state.phase());
        Reading {
            is_sleeping: self.state.is_sleeping(),
            phase: self.state.phase(),
            heart_rate: self.vitals.draw(profile.heart_rate),
            respiration_rate: self.vitals.draw(profile.respiration_rate),
            movement_count: self.vitals.draw(profile.movement_count),
            elapsed_minutes: self.state.elapsed_minutes(),
        }
    }

    /// Apply the phase transition rules for `now`.
    fn update_state(&mut self, now: NaiveDateTime) -> Option<Transition> {
        if is_night_hour(now.hour()) {
            let transition = if self.state.is_sleeping() {
                None
            } else {
                self.state.fall_asleep(now);
                Some(Transition::FellAsleep { at: now })
            };
            self.state.advance(now);
            transition
        } else if self.state.is_sleeping() {
            self.state.advance(now);
            let slept_minutes = self.state.elapsed_minutes();
            self.state.wake_up();
            Some(Transition::WokeUp {
                at: now,
                slept_minutes,
            })
        } else {
            None
        }
    }

    /// Take the transition produced by the most recent reading, if any.
    pub fn take_transition(&mut self) -> Option<Transition> {
        self.pending_transition.take()
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn phase(&self) -> SleepPhase {
        self.state.phase()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
