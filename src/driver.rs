//! The reporting loop.
//!
//! Each cycle reads the sensor, prints a summary, delivers the reading and
//! then waits for the configured interval. Shutdown is only honored between
//! cycles.

use crate::reporter::{Ack, Deliver, ReportError};
use crate::sensor::{Clock, Reading, SensorSimulator, Transition, VitalsSource};
use crate::stats::DeliveryStats;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of the end-of-cycle wait.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Shared stop request, set from the Ctrl+C handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route Ctrl+C to this flag.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || flag.request())
    }
}

/// Result of one reporting cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    pub iteration: u64,
    pub observed_at: NaiveDateTime,
    pub reading: Reading,
    /// Sleep state change caused by this reading, printed once before it
    pub transition: Option<Transition>,
    pub result: Result<Ack, ReportError>,
}

/// Drives a simulator and a reporter in lockstep.
pub struct Driver<C, V, D> {
    simulator: SensorSimulator<C, V>,
    reporter: D,
    interval: Duration,
    iteration: u64,
    stats: DeliveryStats,
}

impl<C: Clock, V: VitalsSource, D: Deliver> Driver<C, V, D> {
    pub fn new(simulator: SensorSimulator<C, V>, reporter: D, interval: Duration) -> Self {
        Self {
            simulator,
            reporter,
            interval,
            iteration: 0,
            stats: DeliveryStats::new(),
        }
    }

    /// Read, print and deliver one reading.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.iteration += 1;

        let observed_at = self.simulator.clock().now();
        let reading = self.simulator.next_reading(observed_at);
        let transition = self.simulator.take_transition();
        if let Some(transition) = &transition {
            println!("{transition}");
        }

        println!();
        println!("{}", format_reading(self.iteration, observed_at, &reading));

        let result = self.reporter.deliver(&reading);
        match &result {
            Ok(ack) => println!("{}", format_ack(ack)),
            Err(e) => {
                tracing::warn!(iteration = self.iteration, error = %e, "delivery failed");
                println!("Delivery failed: {e}");
            }
        }
        self.stats.record(&result);

        CycleOutcome {
            iteration: self.iteration,
            observed_at,
            reading,
            transition,
            result,
        }
    }

    /// Run cycles until `shutdown` is requested.
    pub fn run(&mut self, shutdown: &ShutdownFlag) {
        while !shutdown.is_requested() {
            self.run_cycle();

            if shutdown.is_requested() {
                break;
            }
            if !self.interval.is_zero() {
                println!();
                println!(
                    "Waiting {} seconds before the next report...",
                    self.interval.as_secs()
                );
            }
            if !wait_interval(self.interval, shutdown) {
                break;
            }
        }
        tracing::info!(cycles = self.iteration, "reporting loop stopped");
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    pub fn simulator(&self) -> &SensorSimulator<C, V> {
        &self.simulator
    }
}

/// Sleep for `interval`, waking early on shutdown.
///
/// Returns `false` if shutdown was requested during the wait.
pub fn wait_interval(interval: Duration, shutdown: &ShutdownFlag) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if shutdown.is_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(WAIT_SLICE.min(deadline - now));
    }
}

/// Human-readable summary of one reading.
pub fn format_reading(iteration: u64, observed_at: NaiveDateTime, reading: &Reading) -> String {
    format!(
        "[{}] Iteration #{}\n\
         State: {}\n\
         Phase: {}\n\
         Heart rate: {} bpm\n\
         Respiration: {} rpm\n\
         Movements: {}\n\
         Elapsed: {} minutes ({} cycles)",
        observed_at.format("%H:%M:%S"),
        iteration,
        if reading.is_sleeping { "asleep" } else { "awake" },
        reading.phase,
        reading.heart_rate,
        reading.respiration_rate,
        reading.movement_count,
        reading.elapsed_minutes,
        reading.estimated_cycles()
    )
}

fn format_ack(ack: &Ack) -> String {
    match &ack.message {
        Some(message) => format!("Data sent successfully: {message}"),
        None => "Data sent successfully".to_string(),
    }
}
