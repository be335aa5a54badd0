//! Sleep sensor simulation.
//!
//! This module contains:
//! - The reading and phase types sent to the webhook
//! - Phase-dependent vital sign bounds and the random draw seam
//! - The day/night state machine that produces readings

pub mod simulator;
pub mod types;
pub mod vitals;

// Re-export commonly used types
pub use simulator::{is_night_hour, Clock, FixedClock, SensorSimulator, SystemClock};
pub use types::{Reading, SensorState, SleepPhase, Transition, SLEEP_CYCLE_MINUTES};
pub use vitals::{PhaseProfile, VitalRange, VitalsSource};
