//! Phase-dependent bounds for the synthetic vital signs.
//!
//! Every field is drawn uniformly and independently from an inclusive
//! range chosen by the current [`SleepPhase`]. Respiration uses the same
//! range for all three sleep phases.

use crate::sensor::types::SleepPhase;
use rand::Rng;

/// Inclusive integer range for one vital sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalRange {
    pub min: u32,
    pub max: u32,
}

impl VitalRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ranges for all generated fields in a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProfile {
    pub heart_rate: VitalRange,
    pub respiration_rate: VitalRange,
    pub movement_count: VitalRange,
}

const AWAKE_RESPIRATION: VitalRange = VitalRange::new(16, 20);
const ASLEEP_RESPIRATION: VitalRange = VitalRange::new(12, 16);

impl PhaseProfile {
    pub const fn for_phase(phase: SleepPhase) -> Self {
        match phase {
            SleepPhase::Awake => Self {
                heart_rate: VitalRange::new(70, 85),
                respiration_rate: AWAKE_RESPIRATION,
                movement_count: VitalRange::new(10, 20),
            },
            SleepPhase::Light => Self {
                heart_rate: VitalRange::new(58, 68),
                respiration_rate: ASLEEP_RESPIRATION,
                movement_count: VitalRange::new(3, 8),
            },
            SleepPhase::Deep => Self {
                heart_rate: VitalRange::new(50, 60),
                respiration_rate: ASLEEP_RESPIRATION,
                movement_count: VitalRange::new(0, 2),
            },
            SleepPhase::Rem => Self {
                heart_rate: VitalRange::new(60, 70),
                respiration_rate: ASLEEP_RESPIRATION,
                movement_count: VitalRange::new(1, 5),
            },
        }
    }
}

/// Source of random draws for the simulator.
///
/// Implemented for every [`rand::Rng`], so `thread_rng()` or a seeded
/// `StdRng` can be plugged in directly.
pub trait VitalsSource {
    /// Draw a value in `range`, bounds included.
    fn draw(&mut self, range: VitalRange) -> u32;
}

impl<R: Rng> VitalsSource for R {
    fn draw(&mut self, range: VitalRange) -> u32 {
        self.gen_range(range.min..=range.max)
    }
}
