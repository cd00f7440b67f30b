//! # DAQ Peripheral Simulators
//!
//! Software stand-ins for the two chips on a strain-gauge acquisition node,
//! so firmware logic can be exercised without hardware.
//!
//! # Module Structure
//!
//! - [`esp32`] - ESP32-class SoC: GPIO, ADC/DAC, WiFi, BLE, timers, watchdog, power
//! - [`hx711`] - HX711-class 24-bit load-cell amplifier
//! - [`noise`] - Seedable Gaussian noise shared by both simulators
//! - [`scenario`] - Scripted acquisition loop used by the `daq_periph` binary
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     daq_periph (single crate)                 │
//! │  ┌────────────────┐                    ┌──────────────────┐   │
//! │  │ Esp32Simulator │                    │  Hx711Simulator  │   │
//! │  │  (uptime_us)   │                    │    (now_us)      │   │
//! │  └───────┬────────┘                    └────────┬─────────┘   │
//! │          │          ┌──────────────┐            │             │
//! │          └─────────►│ GaussianNoise│◄───────────┘             │
//! │                     │ (per owner)  │                          │
//! │                     └──────────────┘                          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The simulators never talk to each other; [`scenario`] wires them together
//! the way firmware on the node would.

#![deny(missing_docs)]

mod bank;
pub mod esp32;
pub mod hx711;
pub mod noise;
pub mod scenario;

// Re-export key types for convenience
pub use crate::esp32::{Esp32Simulator, Esp32Status};
pub use crate::hx711::{Hx711Simulator, Hx711Status};
pub use crate::noise::GaussianNoise;
pub use crate::scenario::{ScenarioError, ScenarioReport, run_scenario};
