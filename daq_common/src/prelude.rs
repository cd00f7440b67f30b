//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use daq_common::prelude::*;` and get
//! the most important types without listing individual paths.
//!
//! # Usage
//!
//! ```rust
//! use daq_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::periph::config::{Esp32Config, Hx711Config, SimConfig};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::periph::error::{BankKind, PeriphError, PeriphResult};

// ─── Peripheral Types ───────────────────────────────────────────────
pub use crate::periph::types::{
    Attenuation, DataRate, Gain, GpioLevel, GpioMode, Hx711Reading, PowerMode,
};

// ─── Bank Sizes ─────────────────────────────────────────────────────
pub use crate::periph::consts::{MAX_ADC_CHANNELS, MAX_DAC_CHANNELS, MAX_GPIOS, MAX_TIMERS};
