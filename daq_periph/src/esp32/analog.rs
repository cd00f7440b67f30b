//! ADC and DAC banks.

use daq_common::periph::consts::{
    ADC_MAX_CODE, ADC_NOISE_FRACTION, ADC_RESOLUTION, DAC_MAX_CODE, DAC_REFERENCE_VOLTAGE,
};
use daq_common::periph::error::{BankKind, PeriphError, PeriphResult};
use daq_common::periph::types::Attenuation;
use tracing::{debug, trace};

use super::Esp32Simulator;
use crate::bank::{ensure_finite, slot, slot_mut};

/// Per-channel ADC state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcChannel {
    /// Channel enabled by `adc_init`
    pub enabled: bool,
    /// Resolution in codes
    pub resolution: u16,
    /// Input attenuation
    pub attenuation: Attenuation,
    /// Last raw code
    pub raw_value: u16,
    /// Voltage for the last raw code
    pub voltage: f32,
}

impl Default for AdcChannel {
    fn default() -> Self {
        Self {
            enabled: false,
            resolution: ADC_RESOLUTION,
            attenuation: Attenuation::default(),
            raw_value: 0,
            voltage: 0.0,
        }
    }
}

impl AdcChannel {
    fn code_to_volts(&self, code: u16) -> f32 {
        f32::from(code) * self.attenuation.full_scale_volts() / f32::from(self.resolution)
    }
}

/// Per-channel DAC state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DacChannel {
    /// Channel enabled by `dac_init`
    pub enabled: bool,
    /// Last 8-bit code
    pub value: u8,
    /// Output voltage for the last code
    pub voltage: f32,
}

fn dac_code_to_volts(code: u8) -> f32 {
    f32::from(code) * DAC_REFERENCE_VOLTAGE / f32::from(DAC_MAX_CODE)
}

impl Esp32Simulator {
    // ─── ADC ────────────────────────────────────────────────────────

    /// Enable an ADC channel at the default attenuation.
    pub fn adc_init(&mut self, channel: u8) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let adc = slot_mut(&mut self.adcs, BankKind::Adc, channel)?;
        *adc = AdcChannel {
            enabled: true,
            ..AdcChannel::default()
        };
        debug!("ADC{} enabled", channel);
        Ok(())
    }

    /// Select the input range of an enabled channel.
    pub fn adc_set_attenuation(&mut self, channel: u8, attenuation: Attenuation) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let adc = slot_mut(&mut self.adcs, BankKind::Adc, channel)?;
        if !adc.enabled {
            return Err(PeriphError::NotInitialized("adc channel"));
        }
        adc.attenuation = attenuation;
        adc.voltage = adc.code_to_volts(adc.raw_value);
        debug!("ADC{} attenuation -> {:?}", channel, attenuation);
        Ok(())
    }

    /// Last raw code, or 0 for an invalid or disabled channel.
    pub fn adc_read_raw(&self, channel: u8) -> u16 {
        match slot(&self.adcs, BankKind::Adc, channel) {
            Ok(adc) if adc.enabled => adc.raw_value,
            _ => 0,
        }
    }

    /// Voltage of the last raw code, or 0.0 for an invalid or disabled channel.
    pub fn adc_read_voltage(&self, channel: u8) -> f32 {
        match slot(&self.adcs, BankKind::Adc, channel) {
            Ok(adc) if adc.enabled => adc.code_to_volts(adc.raw_value),
            _ => 0.0,
        }
    }

    /// Inject an input voltage and store its quantized code.
    ///
    /// When analog noise is configured, a Gaussian deviate with sigma
    /// `level * 1 % * full_scale` is added before quantizing.
    pub fn adc_simulate_input(&mut self, channel: u8, volts: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        ensure_finite("ADC input voltage", volts)?;

        let full_scale = {
            let adc = slot(&self.adcs, BankKind::Adc, channel)?;
            if !adc.enabled {
                return Err(PeriphError::NotInitialized("adc channel"));
            }
            adc.attenuation.full_scale_volts()
        };

        let noisy = if self.analog_noise_level > 0.0 {
            let sigma = self.analog_noise_level * ADC_NOISE_FRACTION * full_scale;
            volts + self.noise.sample(sigma)
        } else {
            volts
        };

        let code = (noisy * f32::from(ADC_RESOLUTION) / full_scale)
            .round()
            .clamp(0.0, f32::from(ADC_MAX_CODE)) as u16;

        let adc = slot_mut(&mut self.adcs, BankKind::Adc, channel)?;
        adc.raw_value = code;
        adc.voltage = adc.code_to_volts(code);
        trace!("ADC{} <- {:.4} V = {}", channel, volts, code);
        Ok(())
    }

    /// Set the analog noise level in [0, 1].
    pub fn simulate_noise(&mut self, level: f32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if !(0.0..=1.0).contains(&level) {
            return Err(PeriphError::InvalidArgument(format!(
                "noise level must be in [0, 1], got {level}"
            )));
        }
        self.analog_noise_level = level;
        debug!("ESP32 analog noise level -> {}", level);
        Ok(())
    }

    /// Current analog noise level.
    pub fn analog_noise_level(&self) -> f32 {
        self.analog_noise_level
    }

    /// Snapshot of one ADC channel.
    pub fn adc_channel(&self, channel: u8) -> Option<AdcChannel> {
        slot(&self.adcs, BankKind::Adc, channel).ok().copied()
    }

    // ─── DAC ────────────────────────────────────────────────────────

    /// Enable a DAC channel.
    pub fn dac_init(&mut self, channel: u8) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let dac = slot_mut(&mut self.dacs, BankKind::Dac, channel)?;
        *dac = DacChannel {
            enabled: true,
            ..DacChannel::default()
        };
        debug!("DAC{} enabled", channel);
        Ok(())
    }

    /// Write an 8-bit code to an enabled channel.
    pub fn dac_write(&mut self, channel: u8, value: u8) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let dac = slot_mut(&mut self.dacs, BankKind::Dac, channel)?;
        if !dac.enabled {
            return Err(PeriphError::NotInitialized("dac channel"));
        }
        dac.value = value;
        dac.voltage = dac_code_to_volts(value);
        trace!("DAC{} <- {}", channel, value);
        Ok(())
    }

    /// Write the code nearest to `volts`, clamped to the DAC range.
    pub fn dac_write_voltage(&mut self, channel: u8, volts: f32) -> PeriphResult<()> {
        ensure_finite("DAC output voltage", volts)?;
        let code = (volts * f32::from(DAC_MAX_CODE) / DAC_REFERENCE_VOLTAGE)
            .round()
            .clamp(0.0, f32::from(DAC_MAX_CODE)) as u8;
        self.dac_write(channel, code)
    }

    /// Last code and voltage of an enabled channel.
    pub fn dac_read(&self, channel: u8) -> Option<(u8, f32)> {
        match slot(&self.dacs, BankKind::Dac, channel) {
            Ok(dac) if dac.enabled => Some((dac.value, dac.voltage)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_common::periph::config::Esp32Config;

    fn sim() -> Esp32Simulator {
        let mut sim = Esp32Simulator::new(Esp32Config {
            noise_seed: Some(99),
            ..Esp32Config::default()
        });
        sim.init();
        sim
    }

    #[test]
    fn test_adc_mid_scale() {
        let mut sim = sim();
        sim.adc_init(0).unwrap();
        sim.adc_simulate_input(0, 1.65).unwrap();
        let raw = sim.adc_read_raw(0);
        assert!((2047..=2049).contains(&raw), "raw {raw}");
        assert!((sim.adc_read_voltage(0) - 1.65).abs() < 3.3 / 4096.0);
    }

    #[test]
    fn test_adc_clamps() {
        let mut sim = sim();
        sim.adc_init(3).unwrap();
        sim.adc_simulate_input(3, 10.0).unwrap();
        assert_eq!(sim.adc_read_raw(3), 4095);
        sim.adc_simulate_input(3, -1.0).unwrap();
        assert_eq!(sim.adc_read_raw(3), 0);
    }

    #[test]
    fn test_adc_attenuation_range() {
        let mut sim = sim();
        sim.adc_init(1).unwrap();
        sim.adc_set_attenuation(1, Attenuation::Db0).unwrap();
        sim.adc_simulate_input(1, 0.55).unwrap();
        assert_eq!(sim.adc_read_raw(1), 2048);
        sim.adc_simulate_input(1, 1.5).unwrap();
        assert_eq!(sim.adc_read_raw(1), 4095);
    }

    #[test]
    fn test_adc_attenuation_needs_enabled_channel() {
        let mut sim = sim();
        assert_eq!(
            sim.adc_set_attenuation(3, Attenuation::Db0),
            Err(PeriphError::NotInitialized("adc channel"))
        );
        assert_eq!(sim.adc_channel(3), Some(AdcChannel::default()));

        sim.adc_init(3).unwrap();
        assert_eq!(sim.adc_channel(3).unwrap().attenuation, Attenuation::Db11);
        sim.adc_set_attenuation(3, Attenuation::Db6).unwrap();
        assert_eq!(sim.adc_channel(3).unwrap().attenuation, Attenuation::Db6);
    }

    #[test]
    fn test_adc_uninitialized_channel() {
        let mut sim = sim();
        assert_eq!(
            sim.adc_simulate_input(5, 1.0),
            Err(PeriphError::NotInitialized("adc channel"))
        );
        assert_eq!(sim.adc_read_raw(5), 0);
        assert_eq!(sim.adc_read_voltage(5), 0.0);
        assert!(sim.adc_init(20).is_err());
        assert_eq!(sim.adc_read_raw(20), 0);
    }

    #[test]
    fn test_adc_noise_stays_near_input() {
        let mut sim = sim();
        sim.adc_init(0).unwrap();
        sim.simulate_noise(1.0).unwrap();
        for _ in 0..100 {
            sim.adc_simulate_input(0, 1.65).unwrap();
            let raw = i32::from(sim.adc_read_raw(0));
            // sigma is 33 mV, about 41 codes; 6 sigma bound.
            assert!((raw - 2048).abs() < 250, "raw {raw}");
        }
    }

    #[test]
    fn test_simulate_noise_range() {
        let mut sim = sim();
        assert!(sim.simulate_noise(1.5).is_err());
        assert!(sim.simulate_noise(-0.1).is_err());
        assert!(sim.simulate_noise(f32::NAN).is_err());
        assert_eq!(sim.analog_noise_level(), 0.0);
    }

    #[test]
    fn test_dac_write() {
        let mut sim = sim();
        assert_eq!(
            sim.dac_write(0, 128),
            Err(PeriphError::NotInitialized("dac channel"))
        );
        sim.dac_init(0).unwrap();
        sim.dac_write(0, 255).unwrap();
        let (code, volts) = sim.dac_read(0).unwrap();
        assert_eq!(code, 255);
        assert!((volts - 3.3).abs() < 1e-5);
        assert!(sim.dac_init(2).is_err());
    }

    #[test]
    fn test_dac_write_voltage() {
        let mut sim = sim();
        sim.dac_init(1).unwrap();
        sim.dac_write_voltage(1, 1.0).unwrap();
        assert_eq!(sim.dac_read(1).unwrap().0, 77);
        sim.dac_write_voltage(1, 5.0).unwrap();
        assert_eq!(sim.dac_read(1).unwrap().0, 255);
        sim.dac_write_voltage(1, -2.0).unwrap();
        assert_eq!(sim.dac_read(1).unwrap().0, 0);
    }
}
