//! Simulated WiFi station
//!
//! Commands complete immediately and post their outcome to [`EVENTS`], the
//! way the vendor driver posts to its event loop. `main` drains the channel
//! into the connection manager.

use core::net::Ipv4Addr;

use badge_core::wifi::{
    AccessPoint, AuthThreshold, Bssid, IpInfo, PhyModes, ScanConfig, StationConfig, StationError,
    StationEvent, WifiStation,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::debug;

/// Driver events waiting to be delivered to the manager.
pub static EVENTS: Channel<CriticalSectionRawMutex, StationEvent, 16> = Channel::new();

/// Disconnect reason reported for a wrong password.
const REASON_AUTH_FAIL: u8 = 202;
/// Disconnect reason reported when the SSID is not in range.
const REASON_NO_AP_FOUND: u8 = 201;

/// A network visible to the simulated radio.
pub struct SimNetwork {
    pub ssid: &'static str,
    pub password: &'static str,
    pub bssid: [u8; 6],
    pub channel: u8,
    pub rssi: i8,
    pub auth: AuthThreshold,
}

pub struct SimStation {
    networks: Vec<SimNetwork>,
    started: bool,
    config: Option<StationConfig>,
    /// Association attempts that fail before the network accepts us.
    flaky_attempts: u8,
    attempts: u8,
}

impl SimStation {
    pub fn new(networks: Vec<SimNetwork>) -> Self {
        Self {
            networks,
            started: false,
            config: None,
            flaky_attempts: 0,
            attempts: 0,
        }
    }

    /// Make the next `count` association attempts fail before one succeeds.
    pub fn set_flaky_attempts(&mut self, count: u8) {
        self.flaky_attempts = count;
        self.attempts = 0;
    }

    fn post(event: StationEvent) {
        debug!("station event: {:?}", event);
        if EVENTS.try_send(event).is_err() {
            debug!("station event queue full, dropping {:?}", event);
        }
    }

    fn associate(&mut self) -> StationEvent {
        let Some(config) = &self.config else {
            return StationEvent::Disconnected {
                reason: REASON_NO_AP_FOUND,
            };
        };

        let Some(index) = self
            .networks
            .iter()
            .position(|network| network.ssid == config.ssid())
        else {
            return StationEvent::Disconnected {
                reason: REASON_NO_AP_FOUND,
            };
        };

        let password = match config {
            StationConfig::Personal { credentials, .. } => credentials.password.as_str(),
            StationConfig::Enterprise(credentials) => credentials.password.as_str(),
        };
        if self.networks[index].password != password {
            return StationEvent::Disconnected {
                reason: REASON_AUTH_FAIL,
            };
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts <= self.flaky_attempts {
            return StationEvent::Disconnected {
                reason: REASON_AUTH_FAIL,
            };
        }

        StationEvent::GotIp(IpInfo {
            ip: Ipv4Addr::new(192, 168, 4, 20 + index as u8),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 4, 1),
        })
    }
}

impl WifiStation for SimStation {
    async fn set_station_mode(&mut self) -> Result<(), StationError> {
        Ok(())
    }

    async fn configure(&mut self, config: &StationConfig) -> Result<(), StationError> {
        if config.ssid().is_empty() {
            return Err(StationError::InvalidConfig);
        }
        self.config = Some(config.clone());
        Ok(())
    }

    async fn disable_11b_rates(&mut self) -> Result<(), StationError> {
        Ok(())
    }

    async fn start(&mut self) -> Result<(), StationError> {
        self.started = true;
        Self::post(StationEvent::Started);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), StationError> {
        if !self.started {
            return Err(StationError::NotStarted);
        }
        self.started = false;
        Self::post(StationEvent::Stopped);
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), StationError> {
        if !self.started {
            return Err(StationError::NotStarted);
        }
        let outcome = self.associate();
        Self::post(outcome);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), StationError> {
        if !self.started {
            return Err(StationError::NotStarted);
        }
        Ok(())
    }

    async fn scan(&mut self, config: &ScanConfig) -> Result<Vec<AccessPoint>, StationError> {
        if !self.started {
            return Err(StationError::NotStarted);
        }

        let mut found: Vec<AccessPoint> = self
            .networks
            .iter()
            .filter(|network| config.channel.is_none_or(|channel| channel == network.channel))
            .map(|network| AccessPoint {
                bssid: Bssid(network.bssid),
                ssid: String::try_from(network.ssid).unwrap_or_default(),
                channel: network.channel,
                rssi: network.rssi,
                auth: Some(network.auth),
                phy: PhyModes {
                    b: true,
                    g: true,
                    n: true,
                },
            })
            .collect();
        found.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        Ok(found)
    }
}
