//! WiFi and BLE radio state.
//!
//! Only the connection bookkeeping is modelled: credentials, flags, RSSI and
//! the synthesized address block. No frames are exchanged.

use std::net::Ipv4Addr;

use daq_common::periph::consts::{
    BLE_CHARACTERISTIC_UUID, BLE_MAX_CLIENTS, BLE_MAX_NAME, BLE_SERVICE_UUID, WIFI_MAX_PASSWORD,
    WIFI_MAX_SSID, WIFI_SIM_CHANNEL, WIFI_SIM_GATEWAY, WIFI_SIM_IP, WIFI_SIM_RSSI,
    WIFI_SIM_SUBNET,
};
use daq_common::periph::error::{PeriphError, PeriphResult};
use daq_common::periph::types::bounded_string;
use tracing::{debug, trace};

use super::Esp32Simulator;

/// WiFi station state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiState {
    /// Network name
    pub ssid: heapless::String<WIFI_MAX_SSID>,
    /// Network password
    pub password: heapless::String<WIFI_MAX_PASSWORD>,
    /// Credentials loaded by `wifi_init`
    pub enabled: bool,
    /// Associated with the access point
    pub connected: bool,
    /// Signal strength in dBm
    pub rssi: i8,
    /// Radio channel
    pub channel: u8,
    /// Station address
    pub ip_address: u32,
    /// Gateway address
    pub gateway: u32,
    /// Subnet mask
    pub subnet: u32,
}

/// BLE peripheral state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BleState {
    /// Advertised device name
    pub device_name: heapless::String<BLE_MAX_NAME>,
    /// Stack enabled by `ble_init`
    pub enabled: bool,
    /// Advertising in progress
    pub advertising: bool,
    /// At least one central connected
    pub connected: bool,
    /// Number of connected centrals
    pub connected_clients: u8,
    /// Primary service UUID
    pub service_uuid: u16,
    /// Data characteristic UUID
    pub characteristic_uuid: u16,
    /// Bytes sent since init
    pub bytes_sent: u64,
}

impl Esp32Simulator {
    // ─── WiFi ───────────────────────────────────────────────────────

    /// Store the station credentials and enable WiFi.
    ///
    /// # Errors
    ///
    /// Returns `PeriphError::InvalidArgument` for an empty or over-long SSID
    /// or an over-long password. State is unchanged on error.
    pub fn wifi_init(&mut self, ssid: &str, password: &str) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let ssid = bounded_string::<WIFI_MAX_SSID>("SSID", ssid, false)?;
        let password = bounded_string::<WIFI_MAX_PASSWORD>("password", password, true)?;

        self.wifi = WifiState {
            ssid,
            password,
            enabled: true,
            ..WifiState::default()
        };
        debug!("WiFi configured for SSID {:?}", self.wifi.ssid.as_str());
        Ok(())
    }

    /// Associate with the configured network.
    pub fn wifi_connect(&mut self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if !self.wifi.enabled {
            return Err(PeriphError::NotInitialized("wifi"));
        }
        self.wifi.connected = true;
        self.wifi.ip_address = u32::from(Ipv4Addr::from(WIFI_SIM_IP));
        self.wifi.gateway = u32::from(Ipv4Addr::from(WIFI_SIM_GATEWAY));
        self.wifi.subnet = u32::from(Ipv4Addr::from(WIFI_SIM_SUBNET));
        self.wifi.channel = WIFI_SIM_CHANNEL;
        self.wifi.rssi = WIFI_SIM_RSSI;
        debug!(
            "WiFi connected to {:?} as {}",
            self.wifi.ssid.as_str(),
            self.wifi_ip_addr()
        );
        Ok(())
    }

    /// Drop the association and clear the address block.
    pub fn wifi_disconnect(&mut self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if !self.wifi.enabled {
            return Err(PeriphError::NotInitialized("wifi"));
        }
        self.wifi.connected = false;
        self.wifi.ip_address = 0;
        self.wifi.gateway = 0;
        self.wifi.subnet = 0;
        debug!("WiFi disconnected");
        Ok(())
    }

    /// Whether WiFi is associated.
    pub fn wifi_is_connected(&self) -> bool {
        self.wifi.connected
    }

    /// Signal strength in dBm.
    pub fn wifi_get_rssi(&self) -> i8 {
        self.wifi.rssi
    }

    /// Station address as a big-endian `u32`.
    pub fn wifi_get_ip(&self) -> u32 {
        self.wifi.ip_address
    }

    /// Station address.
    pub fn wifi_ip_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.wifi.ip_address)
    }

    /// Inject a signal strength regardless of connection state.
    pub fn simulate_wifi_signal(&mut self, rssi: i8) -> PeriphResult<()> {
        self.ensure_initialized()?;
        self.wifi.rssi = rssi;
        trace!("WiFi RSSI -> {} dBm", rssi);
        Ok(())
    }

    /// WiFi state snapshot.
    pub fn wifi(&self) -> &WifiState {
        &self.wifi
    }

    // ─── BLE ────────────────────────────────────────────────────────

    /// Set the device name and enable the BLE stack.
    pub fn ble_init(&mut self, device_name: &str) -> PeriphResult<()> {
        self.ensure_initialized()?;
        let device_name = bounded_string::<BLE_MAX_NAME>("BLE device name", device_name, false)?;

        self.ble = BleState {
            device_name,
            enabled: true,
            service_uuid: BLE_SERVICE_UUID,
            characteristic_uuid: BLE_CHARACTERISTIC_UUID,
            ..BleState::default()
        };
        debug!("BLE enabled as {:?}", self.ble.device_name.as_str());
        Ok(())
    }

    fn ensure_ble_enabled(&self) -> PeriphResult<()> {
        self.ensure_initialized()?;
        if self.ble.enabled {
            Ok(())
        } else {
            Err(PeriphError::NotInitialized("ble"))
        }
    }

    /// Start advertising.
    pub fn ble_start_advertising(&mut self) -> PeriphResult<()> {
        self.ensure_ble_enabled()?;
        self.ble.advertising = true;
        debug!("BLE advertising started");
        Ok(())
    }

    /// Stop advertising.
    pub fn ble_stop_advertising(&mut self) -> PeriphResult<()> {
        self.ensure_ble_enabled()?;
        self.ble.advertising = false;
        debug!("BLE advertising stopped");
        Ok(())
    }

    /// Send a notification to connected centrals.
    ///
    /// # Errors
    ///
    /// Fails when no central is connected or `data` is empty.
    pub fn ble_send_data(&mut self, data: &[u8]) -> PeriphResult<()> {
        self.ensure_ble_enabled()?;
        if !self.ble.connected {
            return Err(PeriphError::PreconditionFailed(
                "BLE has no connected client".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(PeriphError::InvalidArgument(
                "BLE payload cannot be empty".to_string(),
            ));
        }
        self.ble.bytes_sent = self.ble.bytes_sent.saturating_add(data.len() as u64);
        trace!("BLE sent {} bytes", data.len());
        Ok(())
    }

    /// Whether at least one central is connected.
    pub fn ble_is_connected(&self) -> bool {
        self.ble.connected
    }

    /// Accept a central connection.
    ///
    /// Needs the device to be advertising or already connected. Connecting
    /// stops advertising.
    pub fn ble_simulate_connect(&mut self) -> PeriphResult<()> {
        self.ensure_ble_enabled()?;
        if !self.ble.advertising && !self.ble.connected {
            return Err(PeriphError::PreconditionFailed(
                "BLE is not advertising".to_string(),
            ));
        }
        if self.ble.connected_clients >= BLE_MAX_CLIENTS {
            return Err(PeriphError::PreconditionFailed(format!(
                "BLE already has {BLE_MAX_CLIENTS} clients"
            )));
        }
        self.ble.connected_clients += 1;
        self.ble.connected = true;
        self.ble.advertising = false;
        debug!("BLE client connected ({} total)", self.ble.connected_clients);
        Ok(())
    }

    /// Drop one central. Advertising resumes when the last one leaves.
    pub fn ble_simulate_disconnect(&mut self) -> PeriphResult<()> {
        self.ensure_ble_enabled()?;
        if self.ble.connected_clients == 0 {
            return Err(PeriphError::PreconditionFailed(
                "BLE has no connected client".to_string(),
            ));
        }
        self.ble.connected_clients -= 1;
        if self.ble.connected_clients == 0 {
            self.ble.connected = false;
            self.ble.advertising = true;
        }
        debug!("BLE client disconnected ({} left)", self.ble.connected_clients);
        Ok(())
    }

    /// BLE state snapshot.
    pub fn ble(&self) -> &BleState {
        &self.ble
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
    fn test_wifi_connect_cycle() {
        let mut sim = sim();
        assert_eq!(sim.wifi_connect(), Err(PeriphError::NotInitialized("wifi")));

        sim.wifi_init("lab-net", "secret").unwrap();
        sim.wifi_connect().unwrap();
        assert!(sim.wifi_is_connected());
        assert_eq!(sim.wifi_get_rssi(), -45);
        assert_eq!(sim.wifi_ip_addr(), Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(sim.wifi().channel, 6);
        assert_eq!(Ipv4Addr::from(sim.wifi().subnet), Ipv4Addr::new(255, 255, 255, 0));

        sim.wifi_disconnect().unwrap();
        assert!(!sim.wifi_is_connected());
        assert_eq!(sim.wifi_get_ip(), 0);
    }

    #[test]
    fn test_wifi_init_length_limits() {
        let mut sim = sim();
        let long_ssid = "s".repeat(33);
        let long_password = "p".repeat(65);

        assert!(sim.wifi_init("", "x").is_err());
        assert!(sim.wifi_init(&long_ssid, "x").is_err());
        assert!(sim.wifi_init("net", &long_password).is_err());
        assert!(!sim.wifi().enabled);

        sim.wifi_init(&"s".repeat(32), &"p".repeat(64)).unwrap();
        assert!(sim.wifi().enabled);
        assert_eq!(sim.wifi().ssid.len(), 32);
    }

    #[test]
    fn test_wifi_signal_injection() {
        let mut sim = sim();
        sim.simulate_wifi_signal(-80).unwrap();
        assert_eq!(sim.wifi_get_rssi(), -80);
    }

    #[test]
    fn test_wifi_signal_requires_init() {
        let mut sim = Esp32Simulator::new(Esp32Config::default());
        assert_eq!(
            sim.simulate_wifi_signal(-90),
            Err(PeriphError::NotInitialized("esp32"))
        );
        assert_eq!(sim.wifi_get_rssi(), 0);
    }

    #[test]
    fn test_ble_requires_init() {
        let mut sim = sim();
        assert_eq!(
            sim.ble_start_advertising(),
            Err(PeriphError::NotInitialized("ble"))
        );
        assert!(sim.ble_init("").is_err());
        assert!(sim.ble_init(&"n".repeat(33)).is_err());
    }

    #[test]
    fn test_ble_client_bookkeeping() {
        let mut sim = sim();
        sim.ble_init("daq-node").unwrap();
        assert_eq!(sim.ble().service_uuid, 0xFFE0);
        assert!(sim.ble_simulate_connect().is_err());

        sim.ble_start_advertising().unwrap();
        sim.ble_simulate_connect().unwrap();
        assert!(sim.ble_is_connected());
        assert!(!sim.ble().advertising);

        sim.ble_simulate_connect().unwrap();
        sim.ble_simulate_connect().unwrap();
        assert!(sim.ble_simulate_connect().is_err());
        assert_eq!(sim.ble().connected_clients, 3);

        for _ in 0..3 {
            sim.ble_simulate_disconnect().unwrap();
        }
        assert!(!sim.ble_is_connected());
        assert!(sim.ble().advertising);
        assert!(sim.ble_simulate_disconnect().is_err());
    }

    #[test]
    fn test_ble_send_data() {
        let mut sim = sim();
        sim.ble_init("daq-node").unwrap();
        assert!(matches!(
            sim.ble_send_data(b"hi"),
            Err(PeriphError::PreconditionFailed(_))
        ));

        sim.ble_start_advertising().unwrap();
        sim.ble_simulate_connect().unwrap();
        assert!(matches!(
            sim.ble_send_data(&[]),
            Err(PeriphError::InvalidArgument(_))
        ));
        sim.ble_send_data(b"strain=12.5").unwrap();
        assert_eq!(sim.ble().bytes_sent, 11);
    }
}
