//! ESP32-class SoC peripheral simulator.
//!
//! `Esp32Simulator` holds the full register image of the SoC: GPIO, ADC,
//! DAC, WiFi, BLE, timers, watchdog, power and diagnostics. Operations are
//! split across submodules by peripheral; all of them are inherent methods
//! on the one struct.
//!
//! Time never flows on its own. The caller advances the virtual uptime with
//! [`Esp32Simulator::advance_time_us`]; timers, the watchdog and the battery
//! model all read that clock.

mod analog;
mod gpio;
mod radio;
mod system;
mod timer;
mod watchdog;

pub use analog::{AdcChannel, DacChannel};
pub use gpio::GpioPin;
pub use radio::{BleState, WifiState};
pub use system::Esp32Status;
pub use timer::TimerUnit;
pub use watchdog::WatchdogState;

use daq_common::periph::config::Esp32Config;
use daq_common::periph::consts::{MAX_ADC_CHANNELS, MAX_DAC_CHANNELS, MAX_GPIOS, MAX_TIMERS};
use daq_common::periph::error::{PeriphError, PeriphResult};
use daq_common::periph::types::PowerMode;
use tracing::debug;

use crate::noise::GaussianNoise;

/// Microseconds per hour, for mAh accounting.
const US_PER_HOUR: f64 = 3_600_000_000.0;

/// ESP32 SoC simulator.
#[derive(Debug, Clone)]
pub struct Esp32Simulator {
    /// Defaults applied on init
    config: Esp32Config,
    /// Initialized flag
    initialized: bool,
    /// Virtual uptime
    uptime_us: u64,
    cpu_frequency_mhz: u32,
    free_heap: u32,
    total_heap: u32,
    /// Die temperature in °C
    temperature: f32,
    power_mode: PowerMode,
    /// Battery charge in percent
    battery_level: f32,
    /// Analog noise level in [0, 1]
    analog_noise_level: f32,
    sleep_enabled: bool,
    sleep_duration_us: u64,
    wifi: WifiState,
    ble: BleState,
    gpios: [GpioPin; MAX_GPIOS],
    adcs: [AdcChannel; MAX_ADC_CHANNELS],
    dacs: [DacChannel; MAX_DAC_CHANNELS],
    timers: [TimerUnit; MAX_TIMERS],
    watchdog: WatchdogState,
    noise: GaussianNoise,
}

impl Esp32Simulator {
    /// Create an uninitialized, zero-filled simulator.
    pub fn new(config: Esp32Config) -> Self {
        let noise = GaussianNoise::new(config.noise_seed);
        Self {
            config,
            initialized: false,
            uptime_us: 0,
            cpu_frequency_mhz: 0,
            free_heap: 0,
            total_heap: 0,
            temperature: 0.0,
            power_mode: PowerMode::Active,
            battery_level: 0.0,
            analog_noise_level: 0.0,
            sleep_enabled: false,
            sleep_duration_us: 0,
            wifi: WifiState::default(),
            ble: BleState::default(),
            gpios: [GpioPin::default(); MAX_GPIOS],
            adcs: [AdcChannel::default(); MAX_ADC_CHANNELS],
            dacs: [DacChannel::default(); MAX_DAC_CHANNELS],
            timers: [TimerUnit::default(); MAX_TIMERS],
            watchdog: WatchdogState::default(),
            noise,
        }
    }

    /// Zero-fill the image, apply the configured defaults and mark it initialized.
    pub fn init(&mut self) {
        *self = Self::new(self.config.clone());
        self.cpu_frequency_mhz = self.config.cpu_frequency_mhz;
        self.total_heap = self.config.total_heap_bytes;
        self.free_heap = self.total_heap;
        self.temperature = self.config.ambient_temperature_c;
        self.battery_level = 100.0;
        self.initialized = true;

        debug!(
            "ESP32 initialized: {} MHz, {} bytes heap, {:.1} °C",
            self.cpu_frequency_mhz, self.total_heap, self.temperature
        );
    }

    /// Restore the freshly-initialized state, including the noise sequence.
    pub fn reset(&mut self) {
        debug!("ESP32 reset");
        self.init();
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Configuration applied on init.
    pub fn config(&self) -> &Esp32Config {
        &self.config
    }

    pub(crate) fn ensure_initialized(&self) -> PeriphResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PeriphError::NotInitialized("esp32"))
        }
    }

    // ─── Sleep ──────────────────────────────────────────────────────

    /// Record a deep-sleep request. Does not block or advance time.
    pub fn deep_sleep(&mut self, duration_us: u64) -> PeriphResult<()> {
        self.enter_sleep(PowerMode::DeepSleep, duration_us)
    }

    /// Record a light-sleep request. Does not block or advance time.
    pub fn light_sleep(&mut self, duration_us: u64) -> PeriphResult<()> {
        self.enter_sleep(PowerMode::LightSleep, duration_us)
    }

    fn enter_sleep(&mut self, mode: PowerMode, duration_us: u64) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.sleep_enabled = true;
        self.sleep_duration_us = duration_us;
        self.power_mode = mode;
        debug!("ESP32 entering {:?} for {} us", mode, duration_us);
        Ok(())
    }

    /// Return to active mode.
    pub fn wake(&mut self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.sleep_enabled = false;
        self.power_mode = PowerMode::Active;
        debug!("ESP32 awake");
        Ok(())
    }

    /// Current power mode.
    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    /// Whether a sleep request is pending.
    pub fn sleep_enabled(&self) -> bool {
        self.sleep_enabled
    }

    /// Duration of the last sleep request.
    pub fn sleep_duration_us(&self) -> u64 {
        self.sleep_duration_us
    }

    // ─── Time ───────────────────────────────────────────────────────

    /// Advance the virtual clock and drain the battery for the elapsed interval.
    pub fn advance_time_us(&mut self, dt_us: u64) {
        self.uptime_us = self.uptime_us.saturating_add(dt_us);

        if self.initialized && self.config.battery_capacity_mah > 0.0 {
            let used_mah = f64::from(self.current_draw_ma()) * dt_us as f64 / US_PER_HOUR;
            let used_pct = used_mah / f64::from(self.config.battery_capacity_mah) * 100.0;
            self.battery_level = (f64::from(self.battery_level) - used_pct).max(0.0) as f32;
        }
    }
}
