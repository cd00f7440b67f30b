//! Peripheral constants.
//!
//! This module contains bank sizes, converter ranges and the physical
//! defaults applied when a simulator is initialized.

use static_assertions::const_assert;

/// Service name used when no configuration file is supplied.
pub const SIM_SERVICE_NAME: &str = "daq-sim";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/daq/sim.toml";

// ─── Banks ──────────────────────────────────────────────────────────

/// Number of GPIO pins
pub const MAX_GPIOS: usize = 48;

/// Number of ADC channels
pub const MAX_ADC_CHANNELS: usize = 20;

/// Number of DAC channels
pub const MAX_DAC_CHANNELS: usize = 2;

/// Number of hardware timers
pub const MAX_TIMERS: usize = 4;

// Bank indices are carried as `u8`.
const_assert!(MAX_GPIOS <= u8::MAX as usize);
const_assert!(MAX_ADC_CHANNELS <= u8::MAX as usize);
const_assert!(MAX_DAC_CHANNELS <= u8::MAX as usize);
const_assert!(MAX_TIMERS <= u8::MAX as usize);

// ─── ADC / DAC ──────────────────────────────────────────────────────

/// ADC resolution in codes (12 bit)
pub const ADC_RESOLUTION: u16 = 4096;

/// Largest ADC code
pub const ADC_MAX_CODE: u16 = ADC_RESOLUTION - 1;

/// Analog sample threshold for a High digital read (half of full scale)
pub const ADC_DIGITAL_THRESHOLD: u16 = ADC_RESOLUTION / 2;

/// Largest DAC code (8 bit)
pub const DAC_MAX_CODE: u8 = u8::MAX;

/// DAC output voltage at full code
pub const DAC_REFERENCE_VOLTAGE: f32 = 3.3;

/// Analog noise sigma as a fraction of full scale per unit of noise level
pub const ADC_NOISE_FRACTION: f32 = 0.01;

// ─── Radio ──────────────────────────────────────────────────────────

/// Maximum WiFi SSID length in bytes
pub const WIFI_MAX_SSID: usize = 32;

/// Maximum WiFi password length in bytes
pub const WIFI_MAX_PASSWORD: usize = 64;

/// Maximum BLE device name length in bytes
pub const BLE_MAX_NAME: usize = 32;

/// Maximum simultaneously connected BLE clients
pub const BLE_MAX_CLIENTS: u8 = 3;

/// Default BLE service UUID (16 bit)
pub const BLE_SERVICE_UUID: u16 = 0xFFE0;

/// Default BLE characteristic UUID (16 bit)
pub const BLE_CHARACTERISTIC_UUID: u16 = 0xFFE1;

/// Address assigned on WiFi connect
pub const WIFI_SIM_IP: [u8; 4] = [192, 168, 1, 100];

/// Gateway assigned on WiFi connect
pub const WIFI_SIM_GATEWAY: [u8; 4] = [192, 168, 1, 1];

/// Subnet mask assigned on WiFi connect
pub const WIFI_SIM_SUBNET: [u8; 4] = [255, 255, 255, 0];

/// Channel assigned on WiFi connect
pub const WIFI_SIM_CHANNEL: u8 = 6;

/// RSSI assigned on WiFi connect (dBm)
pub const WIFI_SIM_RSSI: i8 = -45;

// ─── System ─────────────────────────────────────────────────────────

/// Default CPU frequency in MHz
pub const DEFAULT_CPU_FREQUENCY_MHZ: u32 = 240;

/// Default total heap in bytes (320 KiB)
pub const DEFAULT_TOTAL_HEAP: u32 = 320 * 1024;

/// Default die / ambient temperature in °C
pub const DEFAULT_AMBIENT_TEMPERATURE: f32 = 25.0;

/// Default battery capacity in mAh
pub const DEFAULT_BATTERY_CAPACITY_MAH: f32 = 2000.0;

/// LiPo voltage at 0 % charge
pub const BATTERY_EMPTY_VOLTAGE: f32 = 3.0;

/// LiPo voltage at 100 % charge
pub const BATTERY_FULL_VOLTAGE: f32 = 4.2;

/// Additional current while WiFi is connected (mA)
pub const WIFI_TX_CURRENT_MA: f32 = 170.0;

/// Additional current while BLE is connected (mA)
pub const BLE_TX_CURRENT_MA: f32 = 12.0;

/// Base current in active mode (mA)
pub const ACTIVE_CURRENT_MA: f32 = 240.0;

/// Base current in light sleep (mA)
pub const LIGHT_SLEEP_CURRENT_MA: f32 = 0.8;

/// Base current in deep sleep (mA)
pub const DEEP_SLEEP_CURRENT_MA: f32 = 0.005;

// ─── HX711 ──────────────────────────────────────────────────────────

/// Largest 24-bit signed amplifier code
pub const HX711_MAX_VALUE: i32 = (1 << 23) - 1;

/// Smallest 24-bit signed amplifier code
pub const HX711_MIN_VALUE: i32 = -(1 << 23);

/// Reference temperature for thermal drift (°C)
pub const HX711_REFERENCE_TEMPERATURE: f32 = 25.0;

/// Raw counts of drift per °C away from the reference
pub const HX711_DRIFT_PER_DEGREE: f32 = 10.0;

/// Scale between offset units and raw counts
pub const HX711_OFFSET_SCALE: f32 = 1000.0;

/// Default noise level
pub const HX711_DEFAULT_NOISE_LEVEL: f32 = 0.01;

/// Number of readings taken by the amplifier self-test
pub const HX711_SELF_TEST_SAMPLES: usize = 5;

const_assert!(HX711_MIN_VALUE < 0 && HX711_MAX_VALUE > 0);
