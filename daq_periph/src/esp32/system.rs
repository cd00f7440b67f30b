//! Diagnostics, heap, temperature and the power model.

use daq_common::periph::consts::{
    BATTERY_EMPTY_VOLTAGE, BATTERY_FULL_VOLTAGE, BLE_TX_CURRENT_MA, WIFI_TX_CURRENT_MA,
};
use daq_common::periph::error::PeriphResult;
use daq_common::periph::types::{GpioLevel, GpioMode, PowerMode};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::Esp32Simulator;
use crate::bank::ensure_finite;

/// GPIO used by the self-test output round trip.
const SELF_TEST_PIN: u8 = 2;
/// ADC channel used by the self-test conversion.
const SELF_TEST_ADC: u8 = 0;
/// Mid-scale voltage at 11 dB attenuation.
const SELF_TEST_VOLTS: f32 = 1.65;

/// Serializable snapshot of the SoC state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Esp32Status {
    /// Initialized flag
    pub initialized: bool,
    /// Virtual uptime in µs
    pub uptime_us: u64,
    /// CPU clock in MHz
    pub cpu_frequency_mhz: u32,
    /// Free heap in bytes
    pub free_heap: u32,
    /// Total heap in bytes
    pub total_heap: u32,
    /// Die temperature in °C
    pub temperature: f32,
    /// Power mode
    pub power_mode: PowerMode,
    /// Battery charge in percent
    pub battery_level: f32,
    /// Battery terminal voltage
    pub battery_voltage: f32,
    /// Supply current in mA
    pub current_draw_ma: f32,
    /// WiFi associated
    pub wifi_connected: bool,
    /// WiFi signal strength in dBm
    pub wifi_rssi: i8,
    /// Station address in dotted form
    pub wifi_ip: String,
    /// BLE advertising
    pub ble_advertising: bool,
    /// Connected BLE centrals
    pub ble_clients: u8,
    /// Watchdog armed
    pub watchdog_enabled: bool,
    /// Sleep request pending
    pub sleep_enabled: bool,
}

impl Esp32Simulator {
    /// Virtual uptime in µs.
    pub fn get_uptime_us(&self) -> u64 {
        self.uptime_us
    }

    /// Free heap in bytes.
    pub fn get_free_heap(&self) -> u32 {
        self.free_heap
    }

    /// Total heap in bytes.
    pub fn total_heap(&self) -> u32 {
        self.total_heap
    }

    /// CPU clock in MHz.
    pub fn cpu_frequency_mhz(&self) -> u32 {
        self.cpu_frequency_mhz
    }

    /// Die temperature in °C, 0.0 before init.
    pub fn get_temperature(&self) -> f32 {
        if !self.initialized {
            return 0.0;
        }
        self.temperature
    }

    /// Inject a die temperature.
    ///
    /// # Errors
    ///
    /// Fails when uninitialized or when `temperature` is not finite.
    pub fn simulate_temperature(&mut self, temperature: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        ensure_finite("temperature", temperature)?;
        self.temperature = temperature;
        debug!("ESP32 temperature -> {:.1} °C", temperature);
        Ok(())
    }

    /// Set free heap to `total - used`, saturating at 0.
    pub fn simulate_heap_usage(&mut self, used_bytes: u32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.free_heap = self.total_heap.saturating_sub(used_bytes);
        debug!("ESP32 heap: {} / {} bytes free", self.free_heap, self.total_heap);
        Ok(())
    }

    // ─── Power ──────────────────────────────────────────────────────

    /// Supply current for the current power mode and radio load.
    pub fn current_draw_ma(&self) -> f32 {
        let mut current = self.power_mode.base_current_ma();
        if self.wifi.connected {
            current += WIFI_TX_CURRENT_MA;
        }
        if self.ble.connected {
            current += BLE_TX_CURRENT_MA;
        }
        current
    }

    /// Battery charge in percent.
    pub fn battery_level(&self) -> f32 {
        self.battery_level
    }

    /// LiPo terminal voltage, linear between empty and full.
    pub fn battery_voltage(&self) -> f32 {
        BATTERY_EMPTY_VOLTAGE
            + self.battery_level / 100.0 * (BATTERY_FULL_VOLTAGE - BATTERY_EMPTY_VOLTAGE)
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Run a GPIO and ADC round trip on a scratch copy of the image.
    ///
    /// Caller state is never touched.
    pub fn self_test(&self) -> bool {
        if !self.initialized {
            warn!("ESP32 self-test skipped: not initialized");
            return false;
        }

        let mut scratch = self.clone();
        scratch.analog_noise_level = 0.0;
        match run_self_test(&mut scratch) {
            Ok(true) => {
                debug!("ESP32 self-test passed");
                true
            }
            Ok(false) => {
                warn!("ESP32 self-test failed: readback mismatch");
                false
            }
            Err(e) => {
                warn!("ESP32 self-test failed: {}", e);
                false
            }
        }
    }

    /// Serializable state snapshot.
    pub fn status(&self) -> Esp32Status {
        Esp32Status {
            initialized: self.initialized,
            uptime_us: self.uptime_us,
            cpu_frequency_mhz: self.cpu_frequency_mhz,
            free_heap: self.free_heap,
            total_heap: self.total_heap,
            temperature: self.temperature,
            power_mode: self.power_mode,
            battery_level: self.battery_level,
            battery_voltage: self.battery_voltage(),
            current_draw_ma: self.current_draw_ma(),
            wifi_connected: self.wifi.connected,
            wifi_rssi: self.wifi.rssi,
            wifi_ip: self.wifi_ip_addr().to_string(),
            ble_advertising: self.ble.advertising,
            ble_clients: self.ble.connected_clients,
            watchdog_enabled: self.watchdog.enabled,
            sleep_enabled: self.sleep_enabled,
        }
    }

    /// Log a status snapshot.
    pub fn print_status(&self) {
        let s = self.status();
        info!(
            "ESP32: up {} us, {} MHz, heap {}/{} B, {:.1} °C, {:?}",
            s.uptime_us, s.cpu_frequency_mhz, s.free_heap, s.total_heap, s.temperature, s.power_mode
        );
        info!(
            "ESP32 power: battery {:.1} % ({:.2} V), draw {:.1} mA",
            s.battery_level, s.battery_voltage, s.current_draw_ma
        );
        info!(
            "ESP32 radio: WiFi {} ({} dBm, {}), BLE advertising {} with {} clients",
            if s.wifi_connected { "up" } else { "down" },
            s.wifi_rssi,
            s.wifi_ip,
            s.ble_advertising,
            s.ble_clients
        );
    }
}

fn run_self_test(sim: &mut Esp32Simulator) -> PeriphResult<bool> {
    sim.gpio_set_mode(SELF_TEST_PIN, GpioMode::Output)?;
    sim.gpio_write(SELF_TEST_PIN, GpioLevel::High)?;
    let high = sim.gpio_read(SELF_TEST_PIN) == GpioLevel::High;
    sim.gpio_write(SELF_TEST_PIN, GpioLevel::Low)?;
    let low = sim.gpio_read(SELF_TEST_PIN) == GpioLevel::Low;

    sim.adc_init(SELF_TEST_ADC)?;
    sim.adc_simulate_input(SELF_TEST_ADC, SELF_TEST_VOLTS)?;
    let raw = sim.adc_read_raw(SELF_TEST_ADC);

    Ok(high && low && (2047..=2049).contains(&raw))
}
