//! Load, noise and temperature injection.

use std::f64::consts::TAU;

use daq_common::periph::consts::HX711_OFFSET_SCALE;
use daq_common::periph::error::{PeriphError, PeriphResult};
use tracing::{debug, trace};

use super::Hx711Simulator;
use crate::bank::ensure_finite;

/// Fundamental frequency of the vibration profile in Hz.
const VIBRATION_BASE_HZ: f64 = 0.1;
/// Harmonic frequency of the vibration profile in Hz.
const VIBRATION_HARMONIC_HZ: f64 = 0.5;
/// Relative amplitude of the harmonic.
const VIBRATION_HARMONIC_GAIN: f64 = 0.3;
/// Relative amplitude of the uniform jitter.
const VIBRATION_JITTER_GAIN: f64 = 0.1;

impl Hx711Simulator {
    /// Apply a static load in µε. Later reads center on it.
    pub fn simulate_load(&mut self, strain: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        ensure_finite("strain", strain)?;
        let raw = self.strain_to_raw(strain);
        self.offset = raw as f32 / HX711_OFFSET_SCALE;
        trace!("HX711 load {} ue -> offset {}", strain, self.offset);
        Ok(())
    }

    /// Set the noise level in [0, 1].
    pub fn simulate_noise(&mut self, level: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if !(0.0..=1.0).contains(&level) {
            return Err(PeriphError::InvalidArgument(format!(
                "noise level must be in [0, 1], got {level}"
            )));
        }
        self.noise_level = level;
        debug!("HX711 noise level -> {}", level);
        Ok(())
    }

    /// Set the chip temperature in °C.
    pub fn simulate_temperature_drift(&mut self, temperature: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        ensure_finite("temperature", temperature)?;
        self.temperature = temperature;
        debug!("HX711 temperature -> {:.1} °C", temperature);
        Ok(())
    }

    /// Apply the machine-vibration profile at the current virtual time.
    ///
    /// The injected strain is
    /// `amplitude * (sin(2π·0.1·t) + 0.3·sin(2π·0.5·t) + 0.1·(u - 0.5))`
    /// with `t` in seconds and `u` uniform in [0, 1). Returns that strain.
    pub fn simulate_dynamic_load(&mut self, amplitude: f32) -> PeriphResult<f32> {
        self.ensure_initialized()?;
        ensure_finite("amplitude", amplitude)?;

        let t = self.now_us as f64 / 1_000_000.0;
        let jitter = f64::from(self.noise.uniform()) - 0.5;
        let profile = (TAU * VIBRATION_BASE_HZ * t).sin()
            + VIBRATION_HARMONIC_GAIN * (TAU * VIBRATION_HARMONIC_HZ * t).sin()
            + VIBRATION_JITTER_GAIN * jitter;
        let strain = (f64::from(amplitude) * profile) as f32;

        self.simulate_load(strain)?;
        Ok(strain)
    }
}
