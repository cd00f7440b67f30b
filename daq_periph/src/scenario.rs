//! Scripted firmware-like loop over both simulators.
//!
//! The loop mirrors a small acquisition node: the ESP32 polls a timer at the
//! amplifier data rate, samples the HX711 when a conversion is ready, streams
//! the strain over BLE and an analog output, monitors its own battery through
//! an ADC divider, and feeds the watchdog every step.

use daq_common::config::ConfigError;
use daq_common::periph::config::SimConfig;
use daq_common::periph::consts::DAC_REFERENCE_VOLTAGE;
use daq_common::periph::error::PeriphError;
use daq_common::periph::types::{GpioLevel, GpioMode, Hx711Reading};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::esp32::{Esp32Simulator, Esp32Status};
use crate::hx711::{Hx711Simulator, Hx711Status};

/// WiFi network joined at startup.
const SCENARIO_SSID: &str = "daq-lab";
/// WiFi password for [`SCENARIO_SSID`].
const SCENARIO_PASSWORD: &str = "strain-gauge";
/// Advertised BLE name.
const SCENARIO_BLE_NAME: &str = "daq-node";
/// Sample timer.
const SAMPLE_TIMER: u8 = 0;
/// Heartbeat LED pin.
const LED_PIN: u8 = 2;
/// ADC channel behind the battery divider.
const BATTERY_ADC: u8 = 0;
/// DAC channel carrying the strain signal.
const STRAIN_DAC: u8 = 0;
/// Watchdog timeout.
const WATCHDOG_TIMEOUT_MS: u32 = 1000;
/// Vibration amplitude in µε.
const LOAD_AMPLITUDE: f32 = 100.0;
/// Strain mapped to full DAC output.
const STRAIN_FULL_SCALE: f32 = 200.0;

/// Errors raised while running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Simulator operation failed
    #[error(transparent)]
    Periph(#[from] PeriphError),
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Steps executed
    pub steps: u32,
    /// Virtual time per step in µs
    pub step_us: u64,
    /// Amplifier readings taken
    pub samples: u32,
    /// Sample timer triggers
    pub timer_triggers: u32,
    /// Watchdog expiries observed
    pub watchdog_timeouts: u32,
    /// Smallest strain read
    pub min_strain: f32,
    /// Largest strain read
    pub max_strain: f32,
    /// Latest amplifier reading
    pub last_reading: Hx711Reading,
    /// Final SoC state
    pub esp32: Esp32Status,
    /// Final amplifier state
    pub hx711: Hx711Status,
}

/// Map a strain to the DAC output voltage, centered at half scale.
fn strain_to_dac_volts(strain: f32) -> f32 {
    let normalized = (strain / STRAIN_FULL_SCALE).clamp(-1.0, 1.0);
    (normalized + 1.0) / 2.0 * DAC_REFERENCE_VOLTAGE
}

fn bring_up(esp32: &mut Esp32Simulator, hx711: &mut Hx711Simulator) -> Result<(), PeriphError> {
    esp32.init();
    hx711.init();

    esp32.wifi_init(SCENARIO_SSID, SCENARIO_PASSWORD)?;
    esp32.wifi_connect()?;
    esp32.ble_init(SCENARIO_BLE_NAME)?;
    esp32.ble_start_advertising()?;
    esp32.ble_simulate_connect()?;

    let period_us = u32::try_from(hx711.conversion_time_us()).unwrap_or(u32::MAX);
    esp32.timer_init(SAMPLE_TIMER, period_us)?;
    esp32.timer_start(SAMPLE_TIMER)?;
    esp32.watchdog_init(WATCHDOG_TIMEOUT_MS)?;

    esp32.gpio_set_mode(LED_PIN, GpioMode::Output)?;
    esp32.adc_init(BATTERY_ADC)?;
    esp32.dac_init(STRAIN_DAC)?;

    if !esp32.self_test() {
        warn!("ESP32 self-test failed during bring-up");
    }
    debug!("Scenario bring-up complete");
    Ok(())
}

/// Run `steps` iterations of `step_us` each and report the final state.
///
/// # Errors
///
/// Returns `ScenarioError::Config` when the configuration fails validation
/// and `ScenarioError::Periph` when a simulator operation is rejected.
pub fn run_scenario(
    config: &SimConfig,
    steps: u32,
    step_us: u64,
) -> Result<ScenarioReport, ScenarioError> {
    config.validate()?;

    let mut esp32 = Esp32Simulator::new(config.esp32.clone());
    let mut hx711 = Hx711Simulator::new(config.hx711.clone());
    bring_up(&mut esp32, &mut hx711)?;

    info!(
        "Running {} steps of {} us ({} Hz sampling)",
        steps,
        step_us,
        hx711.get_sample_rate()
    );

    let mut samples = 0u32;
    let mut watchdog_timeouts = 0u32;
    let mut min_strain = f32::INFINITY;
    let mut max_strain = f32::NEG_INFINITY;
    let mut led = false;

    for _ in 0..steps {
        esp32.advance_time_us(step_us);
        hx711.advance_time_us(step_us);

        hx711.simulate_dynamic_load(LOAD_AMPLITUDE)?;

        if esp32.timer_check_trigger(SAMPLE_TIMER)? && hx711.is_ready() {
            let reading = hx711.read_complete();
            samples += 1;
            min_strain = min_strain.min(reading.strain_value);
            max_strain = max_strain.max(reading.strain_value);

            esp32.dac_write_voltage(STRAIN_DAC, strain_to_dac_volts(reading.strain_value))?;
            esp32.adc_simulate_input(BATTERY_ADC, esp32.battery_voltage() / 2.0)?;
            if esp32.ble_is_connected() {
                let payload = format!("{:.2}", reading.strain_value);
                esp32.ble_send_data(payload.as_bytes())?;
            }

            led = !led;
            esp32.gpio_write(LED_PIN, GpioLevel::from(led))?;
        }

        if esp32.watchdog_check_timeout() {
            watchdog_timeouts += 1;
        }
        esp32.watchdog_feed()?;
    }

    if samples == 0 {
        min_strain = 0.0;
        max_strain = 0.0;
    }

    esp32.print_status();
    hx711.print_status();
    info!(
        "Scenario done: {} samples, battery ADC {} ({:.3} V)",
        samples,
        esp32.adc_read_raw(BATTERY_ADC),
        esp32.adc_read_voltage(BATTERY_ADC)
    );

    Ok(ScenarioReport {
        steps,
        step_us,
        samples,
        timer_triggers: esp32.timer_trigger_count(SAMPLE_TIMER),
        watchdog_timeouts,
        min_strain,
        max_strain,
        last_reading: hx711.last_reading(),
        esp32: esp32.status(),
        hx711: hx711.status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.esp32.noise_seed = Some(1);
        config.hx711.noise_seed = Some(2);
        config
    }

    #[test]
    fn test_samples_follow_data_rate() {
        // 2 s of virtual time at 10 Hz.
        let report = run_scenario(&seeded_config(), 200, 10_000).unwrap();
        assert_eq!(report.timer_triggers, 20);
        assert_eq!(report.samples, 20);
        assert_eq!(report.hx711.sample_count, 20);
        assert_eq!(report.watchdog_timeouts, 0);
        assert!(report.esp32.wifi_connected);
        assert!(report.min_strain <= report.max_strain);
    }

    #[test]
    fn test_watchdog_expires_with_long_steps() {
        let report = run_scenario(&seeded_config(), 3, 2_000_000).unwrap();
        assert_eq!(report.watchdog_timeouts, 3);
    }

    #[test]
    fn test_seeded_runs_are_repeatable() {
        let a = run_scenario(&seeded_config(), 100, 10_000).unwrap();
        let b = run_scenario(&seeded_config(), 100, 10_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = seeded_config();
        config.hx711.noise_level = 3.0;
        assert!(matches!(
            run_scenario(&config, 1, 1000),
            Err(ScenarioError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_zero_steps() {
        let report = run_scenario(&seeded_config(), 0, 1000).unwrap();
        assert_eq!(report.samples, 0);
        assert_eq!(report.min_strain, 0.0);
        assert_eq!(report.esp32.uptime_us, 0);
    }

    #[test]
    fn test_strain_to_dac_volts() {
        assert!((strain_to_dac_volts(0.0) - 1.65).abs() < 1e-6);
        assert!((strain_to_dac_volts(500.0) - 3.3).abs() < 1e-6);
        assert!(strain_to_dac_volts(-500.0).abs() < 1e-6);
    }
}
