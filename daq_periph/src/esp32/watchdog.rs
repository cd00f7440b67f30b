//! Task watchdog.
//!
//! The watchdog only reports expiry. Resetting the chip is left to the caller.

use daq_common::periph::error::{PeriphError, PeriphResult};
use tracing::{debug, warn};

use super::Esp32Simulator;

/// Watchdog registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchdogState {
    /// Armed
    pub enabled: bool,
    /// Timeout in ms
    pub timeout_ms: u32,
    /// Uptime of the last feed in µs
    pub last_feed_us: u64,
}

impl WatchdogState {
    fn expired(&self, now_us: u64) -> bool {
        self.enabled
            && now_us.saturating_sub(self.last_feed_us) > u64::from(self.timeout_ms) * 1000
    }
}

impl Esp32Simulator {
    /// Arm the watchdog and feed it now.
    pub fn watchdog_init(&mut self, timeout_ms: u32) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if timeout_ms == 0 {
            return Err(PeriphError::InvalidArgument(
                "watchdog timeout must be greater than 0".to_string(),
            ));
        }
        self.watchdog = WatchdogState {
            enabled: true,
            timeout_ms,
            last_feed_us: self.uptime_us,
        };
        debug!("Watchdog armed: {} ms", timeout_ms);
        Ok(())
    }

    /// Record a feed at the current uptime.
    pub fn watchdog_feed(&mut self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.watchdog.last_feed_us = self.uptime_us;
        Ok(())
    }

    /// Disarm the watchdog.
    pub fn watchdog_disable(&mut self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.watchdog.enabled = false;
        debug!("Watchdog disabled");
        Ok(())
    }

    /// Whether the armed watchdog has gone unfed for longer than its timeout.
    pub fn watchdog_check_timeout(&self) -> bool {
        let expired = self.watchdog.expired(self.uptime_us);
        if expired {
            warn!(
                "Watchdog timeout: {} us since last feed (limit {} ms)",
                self.uptime_us.saturating_sub(self.watchdog.last_feed_us),
                self.watchdog.timeout_ms
            );
        }
        expired
    }

    /// Watchdog snapshot.
    pub fn watchdog(&self) -> WatchdogState {
        self.watchdog
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
    fn test_watchdog_expires_and_feeds() {
        let mut sim = sim();
        sim.watchdog_init(50).unwrap();

        sim.advance_time_us(50_000);
        assert!(!sim.watchdog_check_timeout());

        sim.advance_time_us(10_000);
        assert!(sim.watchdog_check_timeout());

        sim.watchdog_feed().unwrap();
        assert!(!sim.watchdog_check_timeout());
    }

    #[test]
    fn test_watchdog_disabled_never_expires() {
        let mut sim = sim();
        sim.advance_time_us(10_000_000);
        assert!(!sim.watchdog_check_timeout());

        sim.watchdog_init(1).unwrap();
        sim.watchdog_disable().unwrap();
        sim.advance_time_us(10_000);
        assert!(!sim.watchdog_check_timeout());
    }

    #[test]
    fn test_watchdog_feed_and_disable_require_init() {
        let mut sim = Esp32Simulator::new(Esp32Config::default());
        sim.advance_time_us(1_000);
        assert_eq!(sim.watchdog_feed(), Err(PeriphError::NotInitialized("esp32")));
        assert_eq!(
            sim.watchdog_disable(),
            Err(PeriphError::NotInitialized("esp32"))
        );
        assert_eq!(sim.watchdog(), WatchdogState::default());
    }

    #[test]
    fn test_watchdog_zero_timeout_rejected() {
        let mut sim = sim();
        assert!(sim.watchdog_init(0).is_err());
        assert!(!sim.watchdog().enabled);
    }
}
