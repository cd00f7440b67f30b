//! HX711-class 24-bit load-cell amplifier simulator.
//!
//! The amplifier is modelled as an offset (the injected load) plus Gaussian
//! noise and a linear thermal drift around 25 °C, scaled by the channel gain
//! and clamped to the signed 24-bit range.
//!
//! Conversion cadence is tracked on a per-instance virtual clock advanced by
//! [`Hx711Simulator::advance_time_us`].

mod conversion;
mod load;

use daq_common::periph::config::Hx711Config;
use daq_common::periph::consts::HX711_REFERENCE_TEMPERATURE;
use daq_common::periph::error::{PeriphError, PeriphResult};
use daq_common::periph::types::{DataRate, Gain, Hx711Reading};
use serde::Serialize;
use tracing::{debug, info};

use crate::noise::GaussianNoise;

/// Serializable snapshot of the amplifier state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hx711Status {
    /// Initialized flag
    pub initialized: bool,
    /// Power-down flag
    pub powered_down: bool,
    /// Channel gain
    pub gain: Gain,
    /// Raw-to-strain scale factor
    pub calibration_factor: f32,
    /// Offset (load) in thousands of raw counts
    pub offset: f32,
    /// Noise level in [0, 1]
    pub noise_level: f32,
    /// Chip temperature in °C
    pub temperature: f32,
    /// Output data rate
    pub data_rate: DataRate,
    /// Samples per second
    pub sample_rate_hz: u32,
    /// Successful reads since init or reset
    pub sample_count: u32,
    /// Latest conversion
    pub last_reading: Hx711Reading,
}

/// HX711 load-cell amplifier simulator.
#[derive(Debug, Clone)]
pub struct Hx711Simulator {
    /// Defaults applied on init
    config: Hx711Config,
    initialized: bool,
    powered_down: bool,
    gain: Gain,
    calibration_factor: f32,
    offset: f32,
    noise_level: f32,
    sample_count: u32,
    /// Chip temperature in °C
    temperature: f32,
    data_rate: DataRate,
    conversion_time_us: u64,
    last_reading: Hx711Reading,
    /// Virtual clock
    now_us: u64,
    /// Readiness gate, `None` until the first conversion
    last_conversion_us: Option<u64>,
    noise: GaussianNoise,
}

impl Hx711Simulator {
    /// Create an uninitialized simulator.
    pub fn new(config: Hx711Config) -> Self {
        let noise = GaussianNoise::new(config.noise_seed);
        Self {
            config,
            initialized: false,
            powered_down: false,
            gain: Gain::G128,
            calibration_factor: 0.0,
            offset: 0.0,
            noise_level: 0.0,
            sample_count: 0,
            temperature: 0.0,
            data_rate: DataRate::default(),
            conversion_time_us: DataRate::default().conversion_time_us(),
            last_reading: Hx711Reading::default(),
            now_us: 0,
            last_conversion_us: None,
            noise,
        }
    }

    /// Zero the image, apply the configured channel settings and mark it initialized.
    pub fn init(&mut self) {
        *self = Self::new(self.config.clone());
        self.gain = self.config.gain;
        self.calibration_factor = self.config.calibration_factor;
        self.noise_level = self.config.noise_level;
        self.data_rate = self.config.data_rate;
        self.conversion_time_us = self.data_rate.conversion_time_us();
        self.temperature = HX711_REFERENCE_TEMPERATURE;
        self.initialized = true;

        debug!(
            "HX711 initialized: gain {}, cal {}, {:?}",
            self.gain.factor(),
            self.calibration_factor,
            self.data_rate
        );
    }

    /// Clear counters and the readiness gate. Channel settings are kept.
    pub fn reset(&mut self) {
        self.sample_count = 0;
        self.last_reading.data_ready = false;
        self.last_conversion_us = None;
        self.temperature = HX711_REFERENCE_TEMPERATURE;
        self.noise.reseed();
        debug!("HX711 reset");
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn ensure_initialized(&self) -> PeriphResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PeriphError::NotInitialized("hx711"))
        }
    }

    /// Advance the virtual clock.
    pub fn advance_time_us(&mut self, dt_us: u64) {
        self.now_us = self.now_us.saturating_add(dt_us);
    }

    /// Virtual clock in µs.
    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    // ─── Power ──────────────────────────────────────────────────────

    /// Enter power-down. Reads return neutral values until `power_up`.
    pub fn power_down(&mut self) {
        self.powered_down = true;
        debug!("HX711 powered down");
    }

    /// Leave power-down and reopen the readiness gate.
    pub fn power_up(&mut self) {
        self.powered_down = false;
        self.last_conversion_us = None;
        debug!("HX711 powered up");
    }

    /// Power-down flag.
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    // ─── Channel settings ───────────────────────────────────────────

    /// Select the channel gain.
    pub fn set_gain(&mut self, gain: Gain) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.gain = gain;
        debug!("HX711 gain -> {}", gain.factor());
        Ok(())
    }

    /// Current channel gain.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Set the raw-to-strain factor and the offset.
    ///
    /// # Errors
    ///
    /// Returns `PeriphError::InvalidArgument` if `factor` is zero or not
    /// finite, or `offset` is not finite.
    pub fn set_calibration(&mut self, factor: f32, offset: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if !factor.is_finite() || factor == 0.0 {
            return Err(PeriphError::InvalidArgument(format!(
                "calibration factor must be finite and non-zero, got {factor}"
            )));
        }
        if !offset.is_finite() {
            return Err(PeriphError::InvalidArgument(format!(
                "calibration offset must be finite, got {offset}"
            )));
        }
        self.calibration_factor = factor;
        self.offset = offset;
        debug!("HX711 calibration -> factor {}, offset {}", factor, offset);
        Ok(())
    }

    /// Raw-to-strain scale factor.
    pub fn calibration_factor(&self) -> f32 {
        self.calibration_factor
    }

    /// Offset in thousands of raw counts.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Select the output data rate.
    pub fn set_data_rate(&mut self, rate: DataRate) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.data_rate = rate;
        self.conversion_time_us = rate.conversion_time_us();
        debug!("HX711 data rate -> {:?}", rate);
        Ok(())
    }

    /// Minimum interval between conversions.
    pub fn conversion_time_us(&self) -> u64 {
        self.conversion_time_us
    }

    /// Samples per second, or 0 when uninitialized.
    pub fn get_sample_rate(&self) -> u32 {
        if !self.initialized || self.conversion_time_us == 0 {
            return 0;
        }
        u32::try_from(1_000_000 / self.conversion_time_us).unwrap_or(u32::MAX)
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Chip temperature, or 0.0 when uninitialized.
    pub fn get_temperature(&self) -> f32 {
        if self.initialized { self.temperature } else { 0.0 }
    }

    /// Successful reads since init or reset, or 0 when uninitialized.
    pub fn get_sample_count(&self) -> u32 {
        if self.initialized { self.sample_count } else { 0 }
    }

    /// Noise level in [0, 1].
    pub fn noise_level(&self) -> f32 {
        self.noise_level
    }

    /// Latest conversion.
    pub fn last_reading(&self) -> Hx711Reading {
        self.last_reading
    }

    /// Serializable state snapshot.
    pub fn status(&self) -> Hx711Status {
        Hx711Status {
            initialized: self.initialized,
            powered_down: self.powered_down,
            gain: self.gain,
            calibration_factor: self.calibration_factor,
            offset: self.offset,
            noise_level: self.noise_level,
            temperature: self.temperature,
            data_rate: self.data_rate,
            sample_rate_hz: self.get_sample_rate(),
            sample_count: self.sample_count,
            last_reading: self.last_reading,
        }
    }

    /// Log a status snapshot.
    pub fn print_status(&self) {
        let s = self.status();
        info!(
            "HX711: gain {}, cal {}, offset {:.4}, noise {:.3}, {:.1} °C, {} Hz, {} samples{}",
            s.gain.factor(),
            s.calibration_factor,
            s.offset,
            s.noise_level,
            s.temperature,
            s.sample_rate_hz,
            s.sample_count,
            if s.powered_down { " (powered down)" } else { "" }
        );
    }
}

impl Default for Hx711Simulator {
    fn default() -> Self {
        Self::new(Hx711Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Hx711Simulator {
        let mut sim = Hx711Simulator::new(Hx711Config {
            noise_seed: Some(5),
            ..Hx711Config::default()
        });
        sim.init();
        sim
    }

    #[test]
    fn test_init_defaults() {
        let sim = sim();
        assert!(sim.is_initialized());
        assert_eq!(sim.gain(), Gain::G128);
        assert_eq!(sim.calibration_factor(), 1.0);
        assert_eq!(sim.offset(), 0.0);
        assert_eq!(sim.noise_level(), 0.01);
        assert_eq!(sim.get_temperature(), 25.0);
        assert_eq!(sim.get_sample_rate(), 10);
    }

    #[test]
    fn test_uninitialized_accessors() {
        let mut sim = Hx711Simulator::default();
        assert_eq!(sim.get_temperature(), 0.0);
        assert_eq!(sim.get_sample_count(), 0);
        assert_eq!(sim.get_sample_rate(), 0);
        assert_eq!(sim.set_gain(Gain::G64), Err(PeriphError::NotInitialized("hx711")));
    }

    #[test]
    fn test_set_calibration_validation() {
        let mut sim = sim();
        assert!(sim.set_calibration(0.0, 1.0).is_err());
        assert!(sim.set_calibration(f32::NAN, 1.0).is_err());
        assert!(sim.set_calibration(2.0, f32::INFINITY).is_err());
        assert_eq!(sim.calibration_factor(), 1.0);

        sim.set_calibration(2.0, 0.5).unwrap();
        assert_eq!(sim.calibration_factor(), 2.0);
        assert_eq!(sim.offset(), 0.5);
    }

    #[test]
    fn test_data_rate_change() {
        let mut sim = sim();
        sim.set_data_rate(DataRate::Hz80).unwrap();
        assert_eq!(sim.conversion_time_us(), 12_500);
        assert_eq!(sim.get_sample_rate(), 80);
    }

    #[test]
    fn test_reset_keeps_channel_settings() {
        let mut sim = sim();
        sim.set_gain(Gain::G32).unwrap();
        sim.set_calibration(3.0, 0.0).unwrap();
        sim.simulate_temperature_drift(40.0).unwrap();
        sim.read_raw();
        assert_eq!(sim.get_sample_count(), 1);

        sim.reset();
        assert_eq!(sim.get_sample_count(), 0);
        assert!(!sim.last_reading().data_ready);
        assert_eq!(sim.get_temperature(), 25.0);
        assert_eq!(sim.gain(), Gain::G32);
        assert_eq!(sim.calibration_factor(), 3.0);
    }

    #[test]
    fn test_status_serializes_gain_as_number() {
        let sim = sim();
        let json = serde_json::to_value(sim.status()).unwrap();
        assert_eq!(json["gain"], 128);
        assert_eq!(json["data_rate"], "hz10");
        assert_eq!(json["sample_rate_hz"], 10);
    }
}
