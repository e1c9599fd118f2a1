//! Contract with the vendor WiFi station driver

use alloc::vec::Vec;

use thiserror_no_std::Error;

use super::types::{AccessPoint, AuthThreshold, EnterpriseCredentials, IpInfo, PersonalCredentials};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationError {
    #[error("station is not started")]
    NotStarted,
    #[error("WiFi driver is not initialized")]
    NotInitialized,
    #[error("out of memory")]
    NoMemory,
    #[error("invalid configuration")]
    InvalidConfig,
    #[error("operation timed out")]
    Timeout,
    #[error("internal driver error {0}")]
    Internal(i32),
}

/// Configuration applied before starting the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationConfig {
    Personal {
        credentials: PersonalCredentials,
        auth: AuthThreshold,
    },
    Enterprise(EnterpriseCredentials),
}

impl StationConfig {
    pub fn ssid(&self) -> &str {
        match self {
            StationConfig::Personal { credentials, .. } => credentials.ssid.as_str(),
            StationConfig::Enterprise(credentials) => credentials.ssid.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// `None` scans every channel.
    pub channel: Option<u8>,
    pub active: bool,
    pub show_hidden: bool,
}

impl ScanConfig {
    /// Active scan for visible access points on all channels.
    pub const ALL_CHANNELS: Self = Self {
        channel: None,
        active: true,
        show_hidden: false,
    };
}

/// Notifications delivered by the driver's event dispatch context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEvent {
    Started,
    Stopped,
    Disconnected { reason: u8 },
    GotIp(IpInfo),
}

/// Station-mode operations of the vendor networking stack.
///
/// Calls initiate work and return; outcomes arrive later as
/// [`StationEvent`]s. `scan` is the exception and blocks until the scan
/// completes.
pub trait WifiStation {
    fn set_station_mode(&mut self) -> impl Future<Output = Result<(), StationError>>;

    fn configure(
        &mut self,
        config: &StationConfig,
    ) -> impl Future<Output = Result<(), StationError>>;

    /// Stop the station from using 802.11b rates.
    fn disable_11b_rates(&mut self) -> impl Future<Output = Result<(), StationError>>;

    fn start(&mut self) -> impl Future<Output = Result<(), StationError>>;

    fn stop(&mut self) -> impl Future<Output = Result<(), StationError>>;

    fn connect(&mut self) -> impl Future<Output = Result<(), StationError>>;

    fn disconnect(&mut self) -> impl Future<Output = Result<(), StationError>>;

    /// Returns [`StationError::NotStarted`] when the station is not running.
    fn scan(
        &mut self,
        config: &ScanConfig,
    ) -> impl Future<Output = Result<Vec<AccessPoint>, StationError>>;
}
