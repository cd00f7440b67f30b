//! Hardware timer bank.
//!
//! Timers are polled: `timer_check_trigger` compares the virtual uptime with
//! the last trigger and fires at most once per call.

use daq_common::periph::error::{BankKind, PeriphError, PeriphResult};
use tracing::{debug, trace};

use super::Esp32Simulator;
use crate::bank::{slot, slot_mut};

/// Per-timer state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerUnit {
    /// Timer period in µs
    pub period_us: u32,
    /// Timer configured by `timer_init`
    pub configured: bool,
    /// Armed
    pub enabled: bool,
    /// Re-arm after firing
    pub auto_reload: bool,
    /// Uptime of the last trigger (or of `timer_start`)
    pub last_trigger_us: u64,
    /// Triggers since init
    pub trigger_count: u32,
}

impl Esp32Simulator {
    /// Configure a timer. It stays stopped with auto-reload on.
    pub fn timer_init(&mut self, timer_id: u8, period_us: u32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if period_us == 0 {
            return Err(PeriphError::InvalidArgument(
                "timer period must be greater than 0".to_string(),
            ));
        }
        let timer = slot_mut(&mut self.timers, BankKind::Timer, timer_id)?;
        *timer = TimerUnit {
            period_us,
            configured: true,
            auto_reload: true,
            ..TimerUnit::default()
        };
        debug!("Timer{} configured: {} us", timer_id, period_us);
        Ok(())
    }

    fn configured_timer(&mut self, timer_id: u8) -> PeriphResult<&mut TimerUnit> {
        self.ensure_initialized()?;
        let timer = slot_mut(&mut self.timers, BankKind::Timer, timer_id)?;
        if timer.configured {
            Ok(timer)
        } else {
            Err(PeriphError::NotInitialized("timer"))
        }
    }

    /// Arm a timer from the current uptime.
    pub fn timer_start(&mut self, timer_id: u8) -> PeriphResult<()> {
        let now = self.uptime_us;
        let timer = self.configured_timer(timer_id)?;
        timer.enabled = true;
        timer.last_trigger_us = now;
        debug!("Timer{} started at {} us", timer_id, now);
        Ok(())
    }

    /// Disarm a timer.
    pub fn timer_stop(&mut self, timer_id: u8) -> PeriphResult<()> {
        self.configured_timer(timer_id)?.enabled = false;
        debug!("Timer{} stopped", timer_id);
        Ok(())
    }

    /// Choose whether the timer re-arms after firing.
    pub fn timer_set_auto_reload(&mut self, timer_id: u8, auto_reload: bool) -> PeriphResult<()> {
        self.configured_timer(timer_id)?.auto_reload = auto_reload;
        Ok(())
    }

    /// Poll a timer. Returns `true` when it fired during this call.
    pub fn timer_check_trigger(&mut self, timer_id: u8) -> PeriphResult<bool> {
        let now = self.uptime_us;
        let timer = self.configured_timer(timer_id)?;
        if !timer.enabled {
            return Ok(false);
        }
        if now.saturating_sub(timer.last_trigger_us) < u64::from(timer.period_us) {
            return Ok(false);
        }

        timer.trigger_count = timer.trigger_count.saturating_add(1);
        timer.last_trigger_us = now;
        if !timer.auto_reload {
            timer.enabled = false;
        }
        trace!("Timer{} fired (count {})", timer_id, timer.trigger_count);
        Ok(true)
    }

    /// Number of triggers since init, or 0 for an invalid timer.
    pub fn timer_trigger_count(&self, timer_id: u8) -> u32 {
        slot(&self.timers, BankKind::Timer, timer_id)
            .map(|timer| timer.trigger_count)
            .unwrap_or(0)
    }

    /// Snapshot of one timer.
    pub fn timer(&self, timer_id: u8) -> Option<TimerUnit> {
        slot(&self.timers, BankKind::Timer, timer_id).ok().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_common::periph::config::Esp32Config;

    fn sim() -> Esp32Simulator {
        let mut sim = Esp32Simulator::new(Esp32Config::default());
        sim.init();
        sim
    }

    #[test]
    fn test_timer_auto_reload() {
        let mut sim = sim();
        sim.timer_init(0, 1000).unwrap();
        sim.timer_start(0).unwrap();

        sim.advance_time_us(999);
        assert!(!sim.timer_check_trigger(0).unwrap());

        sim.advance_time_us(1);
        assert!(sim.timer_check_trigger(0).unwrap());
        assert_eq!(sim.timer_trigger_count(0), 1);
        assert!(!sim.timer_check_trigger(0).unwrap());

        sim.advance_time_us(1000);
        assert!(sim.timer_check_trigger(0).unwrap());
        assert_eq!(sim.timer_trigger_count(0), 2);
    }

    #[test]
    fn test_one_shot_disarms() {
        let mut sim = sim();
        sim.timer_init(1, 500).unwrap();
        sim.timer_set_auto_reload(1, false).unwrap();
        sim.timer_start(1).unwrap();

        sim.advance_time_us(500);
        assert!(sim.timer_check_trigger(1).unwrap());
        assert!(!sim.timer(1).unwrap().enabled);

        sim.advance_time_us(500);
        assert!(!sim.timer_check_trigger(1).unwrap());
        assert_eq!(sim.timer_trigger_count(1), 1);
    }

    #[test]
    fn test_timer_stopped_never_fires() {
        let mut sim = sim();
        sim.timer_init(2, 10).unwrap();
        sim.advance_time_us(100);
        assert!(!sim.timer_check_trigger(2).unwrap());

        sim.timer_start(2).unwrap();
        sim.timer_stop(2).unwrap();
        sim.advance_time_us(100);
        assert!(!sim.timer_check_trigger(2).unwrap());
    }

    #[test]
    fn test_timer_invalid_arguments() {
        let mut sim = sim();
        assert!(matches!(
            sim.timer_init(0, 0),
            Err(PeriphError::InvalidArgument(_))
        ));
        assert!(matches!(
            sim.timer_init(4, 1000),
            Err(PeriphError::InvalidIndex { .. })
        ));
        assert_eq!(
            sim.timer_start(3),
            Err(PeriphError::NotInitialized("timer"))
        );
        assert_eq!(sim.timer_trigger_count(9), 0);
    }
}
