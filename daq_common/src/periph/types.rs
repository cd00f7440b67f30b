//! Peripheral enums and records.
//!
//! This module defines the closed sets of modes and settings the simulators
//! accept, plus the amplifier reading record:
//! - `GpioMode` / `GpioLevel` - Pin configuration and logic level
//! - `Attenuation` - ADC input range selection
//! - `Gain` / `DataRate` - Amplifier channel settings
//! - `PowerMode` - SoC power state
//! - `Hx711Reading` - Latest amplifier conversion

use serde::{Deserialize, Serialize};

use crate::periph::consts::{
    ACTIVE_CURRENT_MA, DEEP_SLEEP_CURRENT_MA, LIGHT_SLEEP_CURRENT_MA,
};
use crate::periph::error::{PeriphError, PeriphResult};

// ─── GPIO ───────────────────────────────────────────────────────────

/// GPIO pin mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpioMode {
    /// Floating digital input
    #[default]
    Input,
    /// Push-pull digital output
    Output,
    /// Digital input with pull-up
    InputPullup,
    /// Digital input with pull-down
    InputPulldown,
    /// Analog input
    Analog,
}

impl GpioMode {
    /// Whether the mode accepts a pull resistor.
    pub const fn is_input_capable(self) -> bool {
        matches!(self, Self::Input | Self::InputPullup | Self::InputPulldown)
    }
}

/// Digital logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioLevel {
    /// Logic 0
    #[default]
    Low,
    /// Logic 1
    High,
}

impl From<bool> for GpioLevel {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

// ─── ADC ────────────────────────────────────────────────────────────

/// ADC input attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attenuation {
    /// 0 dB, 1.1 V full scale
    Db0,
    /// 2.5 dB, 1.5 V full scale
    Db2_5,
    /// 6 dB, 2.2 V full scale
    Db6,
    /// 11 dB, 3.3 V full scale
    #[default]
    Db11,
}

impl Attenuation {
    /// Input voltage mapped to the top ADC code.
    pub const fn full_scale_volts(self) -> f32 {
        match self {
            Self::Db0 => 1.1,
            Self::Db2_5 => 1.5,
            Self::Db6 => 2.2,
            Self::Db11 => 3.3,
        }
    }
}

// ─── Amplifier ──────────────────────────────────────────────────────

/// HX711 channel gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gain {
    /// Channel B, gain 32
    G32,
    /// Channel A, gain 64
    G64,
    /// Channel A, gain 128
    #[default]
    G128,
}

impl Gain {
    /// Numeric gain factor.
    pub const fn factor(self) -> u8 {
        match self {
            Self::G32 => 32,
            Self::G64 => 64,
            Self::G128 => 128,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = PeriphError;

    fn try_from(value: u8) -> PeriphResult<Self> {
        match value {
            32 => Ok(Self::G32),
            64 => Ok(Self::G64),
            128 => Ok(Self::G128),
            other => Err(PeriphError::InvalidArgument(format!(
                "gain must be 32, 64 or 128, got {other}"
            ))),
        }
    }
}

impl From<Gain> for u8 {
    fn from(gain: Gain) -> Self {
        gain.factor()
    }
}

/// HX711 output data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataRate {
    /// 10 samples per second
    #[default]
    Hz10,
    /// 80 samples per second
    Hz80,
}

impl DataRate {
    /// Minimum interval between conversions.
    pub const fn conversion_time_us(self) -> u64 {
        match self {
            Self::Hz10 => 100_000,
            Self::Hz80 => 12_500,
        }
    }
}

/// Latest amplifier conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Hx711Reading {
    /// 24-bit signed raw code
    pub raw_value: i32,
    /// Calibrated strain in µε
    pub strain_value: f32,
    /// Virtual time of the conversion in µs
    pub timestamp_us: u64,
    /// Conversion completed and unread
    pub data_ready: bool,
}

// ─── Power ──────────────────────────────────────────────────────────

/// SoC power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    /// CPU running
    #[default]
    Active,
    /// CPU paused, RAM retained
    LightSleep,
    /// RTC only
    DeepSleep,
}

impl PowerMode {
    /// Base supply current before radio load.
    pub const fn base_current_ma(self) -> f32 {
        match self {
            Self::Active => ACTIVE_CURRENT_MA,
            Self::LightSleep => LIGHT_SLEEP_CURRENT_MA,
            Self::DeepSleep => DEEP_SLEEP_CURRENT_MA,
        }
    }
}

// ─── Bounded strings ────────────────────────────────────────────────

/// Copy `value` into a fixed-capacity string of `1..=N` bytes.
///
/// # Errors
///
/// Returns `PeriphError::InvalidArgument` when `value` is empty (and
/// `allow_empty` is false) or longer than `N` bytes.
pub fn bounded_string<const N: usize>(
    what: &str,
    value: &str,
    allow_empty: bool,
) -> PeriphResult<heapless::String<N>> {
    if value.is_empty() && !allow_empty {
        return Err(PeriphError::InvalidArgument(format!(
            "{what} cannot be empty"
        )));
    }
    if value.len() > N {
        return Err(PeriphError::InvalidArgument(format!(
            "{what} exceeds {N} bytes ({} given)",
            value.len()
        )));
    }
    let mut out = heapless::String::new();
    out.push_str(value)
        .map_err(|_| PeriphError::InvalidArgument(format!("{what} exceeds {N} bytes")))?;
    Ok(out)
}
