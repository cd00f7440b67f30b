//! GPIO bank.

use daq_common::periph::consts::{ADC_DIGITAL_THRESHOLD, ADC_MAX_CODE};
use daq_common::periph::error::{BankKind, PeriphError, PeriphResult};
use daq_common::periph::types::{GpioLevel, GpioMode};
use tracing::{debug, trace};

use super::Esp32Simulator;
use crate::bank::{slot, slot_mut};

/// Per-pin register image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioPin {
    /// Configured mode
    pub mode: GpioMode,
    /// Digital level
    pub level: GpioLevel,
    /// Last analog sample (0..=4095)
    pub analog_value: u16,
    /// Interrupt enable flag (never delivered)
    pub interrupt_enabled: bool,
    /// Pull-up resistor enabled
    pub pullup: bool,
    /// Pull-down resistor enabled
    pub pulldown: bool,
}

impl Esp32Simulator {
    /// Set the pin mode and the pull flags that belong to it.
    pub fn gpio_set_mode(&mut self, pin: u8, mode: GpioMode) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let gpio = slot_mut(&mut self.gpios, BankKind::Gpio, pin)?;

        gpio.mode = mode;
        gpio.pullup = mode == GpioMode::InputPullup;
        gpio.pulldown = mode == GpioMode::InputPulldown;
        match mode {
            GpioMode::InputPullup => gpio.level = GpioLevel::High,
            GpioMode::InputPulldown => gpio.level = GpioLevel::Low,
            _ => {}
        }

        debug!("GPIO{} mode -> {:?}", pin, mode);
        Ok(())
    }

    /// Drive an output pin.
    ///
    /// # Errors
    ///
    /// Fails on an invalid pin or when the pin is not in `Output` mode.
    pub fn gpio_write(&mut self, pin: u8, level: GpioLevel) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let gpio = slot_mut(&mut self.gpios, BankKind::Gpio, pin)?;
        if gpio.mode != GpioMode::Output {
            return Err(PeriphError::PreconditionFailed(format!(
                "GPIO{pin} is in {:?} mode, not Output",
                gpio.mode
            )));
        }
        gpio.level = level;
        trace!("GPIO{} <- {:?}", pin, level);
        Ok(())
    }

    /// Read a pin. Analog pins are quantized at half of ADC full scale; an
    /// invalid pin reads `Low`.
    pub fn gpio_read(&self, pin: u8) -> GpioLevel {
        let Ok(gpio) = slot(&self.gpios, BankKind::Gpio, pin) else {
            return GpioLevel::Low;
        };
        match gpio.mode {
            GpioMode::Analog => GpioLevel::from(gpio.analog_value >= ADC_DIGITAL_THRESHOLD),
            _ => gpio.level,
        }
    }

    /// Enable or disable the pull-up. Enabling clears the pull-down.
    pub fn gpio_enable_pullup(&mut self, pin: u8, enable: bool) -> PeriphResult<()> {
        self.set_pull(pin, enable, true)
    }

    /// Enable or disable the pull-down. Enabling clears the pull-up.
    pub fn gpio_enable_pulldown(&mut self, pin: u8, enable: bool) -> PeriphResult<()> {
        self.set_pull(pin, enable, false)
    }

    fn set_pull(&mut self, pin: u8, enable: bool, up: bool) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let gpio = slot_mut(&mut self.gpios, BankKind::Gpio, pin)?;
        if !gpio.mode.is_input_capable() {
            return Err(PeriphError::PreconditionFailed(format!(
                "GPIO{pin} is in {:?} mode, pulls need an input mode",
                gpio.mode
            )));
        }

        let pulled_mode = if up {
            GpioMode::InputPullup
        } else {
            GpioMode::InputPulldown
        };

        if enable {
            gpio.pullup = up;
            gpio.pulldown = !up;
            gpio.mode = pulled_mode;
            gpio.level = GpioLevel::from(up);
        } else {
            if up {
                gpio.pullup = false;
            } else {
                gpio.pulldown = false;
            }
            if gpio.mode == pulled_mode {
                gpio.mode = GpioMode::Input;
            }
        }

        debug!(
            "GPIO{} pull-{} {}",
            pin,
            if up { "up" } else { "down" },
            if enable { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Record the interrupt enable flag.
    pub fn gpio_set_interrupt(&mut self, pin: u8, enable: bool) -> PeriphResult<()> {
        self.ensure_initialized()?;
        slot_mut(&mut self.gpios, BankKind::Gpio, pin)?.interrupt_enabled = enable;
        Ok(())
    }

    /// Drive an input pin from outside the chip.
    ///
    /// # Errors
    ///
    /// Fails on an invalid pin or an `Output` pin.
    pub fn gpio_simulate_input(&mut self, pin: u8, level: GpioLevel) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let gpio = slot_mut(&mut self.gpios, BankKind::Gpio, pin)?;
        if gpio.mode == GpioMode::Output {
            return Err(PeriphError::PreconditionFailed(format!(
                "GPIO{pin} is an output"
            )));
        }
        gpio.level = level;
        trace!("GPIO{} driven {:?}", pin, level);
        Ok(())
    }

    /// Store an analog sample on an `Analog` pin, clamped to the ADC range.
    pub fn gpio_simulate_analog(&mut self, pin: u8, raw: u16) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let gpio = slot_mut(&mut self.gpios, BankKind::Gpio, pin)?;
        if gpio.mode != GpioMode::Analog {
            return Err(PeriphError::PreconditionFailed(format!(
                "GPIO{pin} is not in Analog mode"
            )));
        }
        gpio.analog_value = raw.min(ADC_MAX_CODE);
        Ok(())
    }

    /// Snapshot of one pin.
    pub fn gpio_pin(&self, pin: u8) -> Option<GpioPin> {
        slot(&self.gpios, BankKind::Gpio, pin).ok().copied()
    }
}
