//! Conversion, readiness gating and strain scaling.

use daq_common::periph::consts::{
    HX711_DRIFT_PER_DEGREE, HX711_MAX_VALUE, HX711_MIN_VALUE, HX711_OFFSET_SCALE,
    HX711_REFERENCE_TEMPERATURE, HX711_SELF_TEST_SAMPLES,
};
use daq_common::periph::types::Hx711Reading;
use tracing::{debug, trace, warn};

use super::Hx711Simulator;

/// Gain factor that leaves raw codes unscaled.
const UNITY_GAIN: f64 = 128.0;

fn clamp_raw(value: f64) -> i32 {
    value.clamp(f64::from(HX711_MIN_VALUE), f64::from(HX711_MAX_VALUE)) as i32
}

impl Hx711Simulator {
    fn can_sample(&self) -> bool {
        self.initialized && !self.powered_down
    }

    /// Whether a new conversion is available.
    ///
    /// Reports ready when no conversion has happened yet or when the
    /// conversion time has elapsed since the last one; a ready report marks
    /// a new conversion.
    pub fn is_ready(&mut self) -> bool {
        if !self.can_sample() {
            return false;
        }
        let ready = match self.last_conversion_us {
            None => true,
            Some(last) => self.now_us.saturating_sub(last) >= self.conversion_time_us,
        };
        if ready {
            self.last_conversion_us = Some(self.now_us);
        }
        ready
    }

    /// Take one conversion.
    ///
    /// Returns 0 without touching state while powered down or uninitialized.
    pub fn read_raw(&mut self) -> i32 {
        if !self.can_sample() {
            return 0;
        }

        let base = (self.offset * HX711_OFFSET_SCALE) as i32;
        let noise = self.noise.sample(self.noise_level * HX711_OFFSET_SCALE) as i32;
        let drift =
            ((self.temperature - HX711_REFERENCE_TEMPERATURE) * HX711_DRIFT_PER_DEGREE) as i32;
        let unscaled = base.saturating_add(noise).saturating_add(drift);
        let raw = clamp_raw(
            (f64::from(unscaled) * f64::from(self.gain.factor()) / UNITY_GAIN).trunc(),
        );

        self.sample_count = self.sample_count.saturating_add(1);
        self.last_reading = Hx711Reading {
            raw_value: raw,
            strain_value: self.raw_to_strain(raw),
            timestamp_us: self.now_us,
            data_ready: true,
        };
        self.last_conversion_us = Some(self.now_us);

        trace!("HX711 raw {} at {} us", raw, self.now_us);
        raw
    }

    /// Take one conversion and scale it to strain, or 0.0 while unavailable.
    pub fn read_strain(&mut self) -> f32 {
        if !self.can_sample() {
            return 0.0;
        }
        let raw = self.read_raw();
        self.raw_to_strain(raw)
    }

    /// Take one conversion and return the full reading, or the default
    /// reading while unavailable.
    pub fn read_complete(&mut self) -> Hx711Reading {
        if !self.can_sample() {
            return Hx711Reading::default();
        }
        self.read_raw();
        self.last_reading
    }

    /// `raw * factor - offset`, or 0.0 when uninitialized.
    pub fn raw_to_strain(&self, raw: i32) -> f32 {
        if !self.initialized {
            return 0.0;
        }
        raw as f32 * self.calibration_factor - self.offset
    }

    /// Nearest raw code for `strain`, clamped to the 24-bit range, or 0
    /// when uninitialized.
    pub fn strain_to_raw(&self, strain: f32) -> i32 {
        if !self.initialized {
            return 0;
        }
        let raw = f64::from(strain + self.offset) / f64::from(self.calibration_factor);
        clamp_raw(raw.round())
    }

    /// Take up to five ready-gated conversions; fails if any reads exactly 0.
    pub fn self_test(&mut self) -> bool {
        if !self.initialized {
            warn!("HX711 self-test skipped: not initialized");
            return false;
        }
        if self.powered_down {
            warn!("HX711 self-test skipped: powered down");
            return false;
        }

        for _ in 0..HX711_SELF_TEST_SAMPLES {
            if !self.is_ready() {
                continue;
            }
            if self.read_raw() == 0 {
                warn!("HX711 self-test failed: conversion returned 0");
                return false;
            }
        }
        debug!("HX711 self-test passed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_common::periph::config::Hx711Config;
    use daq_common::periph::types::Gain;

    fn quiet() -> Hx711Simulator {
        let mut sim = Hx711Simulator::new(Hx711Config {
            noise_seed: Some(21),
            ..Hx711Config::default()
        });
        sim.init();
        sim.simulate_noise(0.0).unwrap();
        sim
    }

    #[test]
    fn test_load_reads_back_as_strain() {
        let mut sim = quiet();
        sim.simulate_load(100.0).unwrap();
        assert_eq!(sim.read_raw(), 100);
        let strain = sim.read_strain();
        assert!((strain - 99.9).abs() < 1e-3, "strain {strain}");
    }

    #[test]
    fn test_thermal_drift() {
        let mut sim = quiet();
        sim.simulate_temperature_drift(35.0).unwrap();
        assert_eq!(sim.read_raw(), 100);
        sim.simulate_temperature_drift(20.0).unwrap();
        assert_eq!(sim.read_raw(), -50);
    }

    #[test]
    fn test_gain_scales_raw() {
        let mut sim = quiet();
        sim.simulate_load(1000.0).unwrap();
        assert_eq!(sim.read_raw(), 1000);
        sim.set_gain(Gain::G64).unwrap();
        assert_eq!(sim.read_raw(), 500);
        sim.set_gain(Gain::G32).unwrap();
        assert_eq!(sim.read_raw(), 250);
    }

    #[test]
    fn test_raw_clamped_to_24_bits() {
        let mut sim = quiet();
        sim.set_calibration(1.0, 1.0e6).unwrap();
        assert_eq!(sim.read_raw(), HX711_MAX_VALUE);
        sim.set_calibration(1.0, -1.0e6).unwrap();
        assert_eq!(sim.read_raw(), HX711_MIN_VALUE);
    }

    #[test]
    fn test_read_updates_last_reading() {
        let mut sim = quiet();
        sim.simulate_load(250.0).unwrap();
        sim.advance_time_us(1234);
        let reading = sim.read_complete();
        assert_eq!(reading.raw_value, 250);
        assert_eq!(reading.timestamp_us, 1234);
        assert!(reading.data_ready);
        assert_eq!(sim.last_reading(), reading);
        assert_eq!(sim.get_sample_count(), 1);
    }

    #[test]
    fn test_powered_down_reads_are_neutral() {
        let mut sim = quiet();
        sim.simulate_load(100.0).unwrap();
        sim.power_down();
        assert_eq!(sim.read_raw(), 0);
        assert_eq!(sim.read_strain(), 0.0);
        assert_eq!(sim.read_complete(), Hx711Reading::default());
        assert!(!sim.is_ready());
        assert_eq!(sim.get_sample_count(), 0);

        sim.power_up();
        assert!(sim.is_ready());
        assert_eq!(sim.read_raw(), 100);
    }

    #[test]
    fn test_readiness_gate() {
        let mut sim = quiet();
        assert!(sim.is_ready());
        sim.read_raw();
        assert!(!sim.is_ready());

        sim.advance_time_us(99_999);
        assert!(!sim.is_ready());
        sim.advance_time_us(1);
        assert!(sim.is_ready());
        assert!(!sim.is_ready());
    }

    #[test]
    fn test_strain_round_trip_rounds() {
        let mut sim = quiet();
        sim.set_calibration(0.5, 0.0).unwrap();
        assert_eq!(sim.strain_to_raw(10.2), 20);
        assert_eq!(sim.strain_to_raw(10.3), 21);
        assert_eq!(sim.strain_to_raw(-10.3), -21);
        assert_eq!(sim.strain_to_raw(1.0e9), HX711_MAX_VALUE);
    }

    #[test]
    fn test_uninitialized_conversions() {
        let mut sim = Hx711Simulator::default();
        assert_eq!(sim.read_raw(), 0);
        assert_eq!(sim.raw_to_strain(100), 0.0);
        assert_eq!(sim.strain_to_raw(100.0), 0);
        assert!(!sim.is_ready());
        assert!(!sim.self_test());
    }

    #[test]
    fn test_self_test() {
        let mut sim = quiet();
        // No load, no noise and no drift reads exactly 0.
        assert!(!sim.self_test());

        sim.reset();
        sim.simulate_load(500.0).unwrap();
        assert!(sim.self_test());
        assert_eq!(sim.get_sample_count(), 1);
    }
}
