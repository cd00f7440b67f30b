//! Simulator configuration types.
//!
//! This module contains the configuration loaded from `sim.toml`:
//! - `SimConfig` - Top-level document
//! - `Esp32Config` - SoC defaults applied on `init`
//! - `Hx711Config` - Amplifier defaults applied on `init`
//!
//! Every field has a default, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::periph::consts::{
    DEFAULT_AMBIENT_TEMPERATURE, DEFAULT_BATTERY_CAPACITY_MAH, DEFAULT_CPU_FREQUENCY_MHZ,
    DEFAULT_TOTAL_HEAP, HX711_DEFAULT_NOISE_LEVEL,
};
use crate::periph::types::{DataRate, Gain};

/// Default function for cpu_frequency_mhz
fn default_cpu_frequency_mhz() -> u32 {
    DEFAULT_CPU_FREQUENCY_MHZ
}

/// Default function for total_heap_bytes
fn default_total_heap_bytes() -> u32 {
    DEFAULT_TOTAL_HEAP
}

/// Default function for ambient_temperature_c
fn default_ambient_temperature_c() -> f32 {
    DEFAULT_AMBIENT_TEMPERATURE
}

/// Default function for battery_capacity_mah
fn default_battery_capacity_mah() -> f32 {
    DEFAULT_BATTERY_CAPACITY_MAH
}

/// Default function for calibration_factor
fn default_calibration_factor() -> f32 {
    1.0
}

/// Default function for noise_level
fn default_noise_level() -> f32 {
    HX711_DEFAULT_NOISE_LEVEL
}

/// Top-level simulator configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "bench-01"
///
/// [esp32]
/// cpu_frequency_mhz = 160
/// noise_seed = 7
///
/// [hx711]
/// gain = 64
/// data_rate = "hz80"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Logging and instance identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// SoC simulator defaults.
    #[serde(default)]
    pub esp32: Esp32Config,

    /// Amplifier simulator defaults.
    #[serde(default)]
    pub hx711: Hx711Config,
}

impl SimConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.esp32.validate()?;
        self.hx711.validate()
    }
}

/// SoC simulator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Esp32Config {
    /// CPU clock in MHz.
    #[serde(default = "default_cpu_frequency_mhz")]
    pub cpu_frequency_mhz: u32,

    /// Total heap in bytes. Free heap starts equal to this.
    #[serde(default = "default_total_heap_bytes")]
    pub total_heap_bytes: u32,

    /// Die temperature after init in °C.
    #[serde(default = "default_ambient_temperature_c")]
    pub ambient_temperature_c: f32,

    /// Battery capacity in mAh used by the drain model.
    #[serde(default = "default_battery_capacity_mah")]
    pub battery_capacity_mah: f32,

    /// Seed for the analog noise generator. `None` seeds from OS entropy.
    #[serde(default)]
    pub noise_seed: Option<u64>,
}

impl Default for Esp32Config {
    fn default() -> Self {
        Self {
            cpu_frequency_mhz: default_cpu_frequency_mhz(),
            total_heap_bytes: default_total_heap_bytes(),
            ambient_temperature_c: default_ambient_temperature_c(),
            battery_capacity_mah: default_battery_capacity_mah(),
            noise_seed: None,
        }
    }
}

impl Esp32Config {
    /// Validate the SoC section.
    ///
    /// # Validation Rules
    /// 1. `cpu_frequency_mhz` > 0
    /// 2. `total_heap_bytes` > 0
    /// 3. `ambient_temperature_c` is finite
    /// 4. `battery_capacity_mah` is finite and > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cpu_frequency_mhz == 0 {
            return Err(ConfigError::ValidationError(
                "esp32.cpu_frequency_mhz must be greater than 0".to_string(),
            ));
        }
        if self.total_heap_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "esp32.total_heap_bytes must be greater than 0".to_string(),
            ));
        }
        if !self.ambient_temperature_c.is_finite() {
            return Err(ConfigError::ValidationError(
                "esp32.ambient_temperature_c must be finite".to_string(),
            ));
        }
        if !(self.battery_capacity_mah.is_finite() && self.battery_capacity_mah > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "esp32.battery_capacity_mah must be positive, got {}",
                self.battery_capacity_mah
            )));
        }
        Ok(())
    }
}

/// Amplifier simulator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hx711Config {
    /// Channel gain (32, 64 or 128).
    #[serde(default)]
    pub gain: Gain,

    /// Raw-to-strain scale factor.
    #[serde(default = "default_calibration_factor")]
    pub calibration_factor: f32,

    /// Noise level in [0, 1].
    #[serde(default = "default_noise_level")]
    pub noise_level: f32,

    /// Output data rate.
    #[serde(default)]
    pub data_rate: DataRate,

    /// Seed for the noise generator. `None` seeds from OS entropy.
    #[serde(default)]
    pub noise_seed: Option<u64>,
}

impl Default for Hx711Config {
    fn default() -> Self {
        Self {
            gain: Gain::default(),
            calibration_factor: default_calibration_factor(),
            noise_level: default_noise_level(),
            data_rate: DataRate::default(),
            noise_seed: None,
        }
    }
}

impl Hx711Config {
    /// Validate the amplifier section.
    ///
    /// # Validation Rules
    /// 1. `calibration_factor` is finite and non-zero
    /// 2. `noise_level` in [0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.calibration_factor.is_finite() || self.calibration_factor == 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "hx711.calibration_factor must be finite and non-zero, got {}",
                self.calibration_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err(ConfigError::ValidationError(format!(
                "hx711.noise_level must be in [0, 1], got {}",
                self.noise_level
            )));
        }
        Ok(())
    }
}
