//! SleepyPillow sensor simulator.
//!
//! This library simulates a sleep-tracking sensor and reports synthetic
//! biometric readings to the SleepyPillow realtime webhook. It shows the
//! shape of data a real sensor integration would send.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SleepyPillow Sensor Simulator              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Simulator  │──▶│   Driver    │──▶│  Reporter   │──▶ HTTP│
//! │  │ (phase, HR) │   │ (interval)  │   │ (webhook)   │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         ▲                 │                                 │
//! │     Clock + Rng     DeliveryStats                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sleepy_sensor::{config::Config, reporter::BlockingReporter, sensor::SensorSimulator};
//!
//! let config = Config::load().unwrap_or_default();
//! let reporter = BlockingReporter::new(&config).expect("Failed to create reporter");
//!
//! let mut simulator = SensorSimulator::new();
//! let reading = simulator.tick();
//!
//! match reporter.report(&reading) {
//!     Ok(ack) => println!("sent: {:?}", ack.message),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod config;
pub mod driver;
pub mod reporter;
pub mod sensor;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, ConfigOverrides};
pub use driver::{CycleOutcome, Driver, ShutdownFlag};
pub use reporter::{Ack, BlockingReporter, Deliver, ReportError, Reporter};
pub use sensor::{Reading, SensorSimulator, SensorState, SleepPhase};
pub use stats::{DeliveryStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
