//! Station-mode adapter over the esp-radio WiFi controller

use alloc::vec::Vec;

use badge_core::wifi::{
    AccessPoint, AuthThreshold, Bssid, EnterpriseCredentials, Phase2Method, PhyModes,
    ScanConfig, StationConfig, StationError, WifiStation,
};
use esp_radio::wifi::{
    AccessPointInfo, AuthMethod, ClientConfig, EapClientConfig, InternalWifiError, ModeConfig,
    ScanConfig as RadioScanConfig, TtlsPhase2Method, WifiController, WifiError,
};
use heapless::String;
use log::debug;

/// `wifi_interface_t` value of the station interface.
const WIFI_IF_STA: u32 = 0;
/// `esp_err_t` success.
const ESP_OK: i32 = 0;
/// `esp_err_t` generic failure.
const ESP_FAIL: i32 = -1;

unsafe extern "C" {
    /// Part of the WiFi driver blob linked in by esp-radio.
    fn esp_wifi_config_11b_rate(ifx: u32, disable: bool) -> i32;
}

pub struct EspStation {
    controller: WifiController<'static>,
}

impl EspStation {
    pub fn new(controller: WifiController<'static>) -> Self {
        Self { controller }
    }

    fn is_started(&self) -> Result<bool, StationError> {
        self.controller.is_started().map_err(station_error)
    }
}

fn station_error(error: WifiError) -> StationError {
    match error {
        WifiError::NotInitialized => StationError::NotInitialized,
        WifiError::InternalError(InternalWifiError::NoMem) => StationError::NoMemory,
        WifiError::InternalError(InternalWifiError::NotStarted) => StationError::NotStarted,
        WifiError::InternalError(
            InternalWifiError::InvalidArg
            | InternalWifiError::InvalidSsid
            | InternalWifiError::InvalidPassword,
        ) => StationError::InvalidConfig,
        WifiError::InternalError(InternalWifiError::Timeout) => StationError::Timeout,
        other => {
            debug!("WiFi driver error: {:?}", other);
            StationError::Internal(ESP_FAIL)
        }
    }
}

fn auth_method(auth: AuthThreshold) -> AuthMethod {
    match auth {
        AuthThreshold::Open => AuthMethod::None,
        AuthThreshold::Wep => AuthMethod::Wep,
        AuthThreshold::WpaPersonal => AuthMethod::Wpa,
        AuthThreshold::Wpa2Personal => AuthMethod::Wpa2Personal,
        AuthThreshold::WpaWpa2Personal => AuthMethod::WpaWpa2Personal,
        AuthThreshold::Wpa3Personal => AuthMethod::Wpa3Personal,
        AuthThreshold::Wpa2Wpa3Personal => AuthMethod::Wpa2Wpa3Personal,
        AuthThreshold::Wpa2Enterprise => AuthMethod::Wpa2Enterprise,
    }
}

fn auth_threshold(method: AuthMethod) -> Option<AuthThreshold> {
    Some(match method {
        AuthMethod::None => AuthThreshold::Open,
        AuthMethod::Wep => AuthThreshold::Wep,
        AuthMethod::Wpa => AuthThreshold::WpaPersonal,
        AuthMethod::Wpa2Personal => AuthThreshold::Wpa2Personal,
        AuthMethod::WpaWpa2Personal => AuthThreshold::WpaWpa2Personal,
        AuthMethod::Wpa3Personal => AuthThreshold::Wpa3Personal,
        AuthMethod::Wpa2Wpa3Personal => AuthThreshold::Wpa2Wpa3Personal,
        AuthMethod::Wpa2Enterprise => AuthThreshold::Wpa2Enterprise,
        _ => return None,
    })
}

fn phase2_method(method: Phase2Method) -> TtlsPhase2Method {
    match method {
        Phase2Method::Eap => TtlsPhase2Method::Eap,
        Phase2Method::MsChapV2 => TtlsPhase2Method::Mschapv2,
        Phase2Method::MsChap => TtlsPhase2Method::Mschap,
        Phase2Method::Pap => TtlsPhase2Method::Pap,
        Phase2Method::Chap => TtlsPhase2Method::Chap,
    }
}

fn enterprise_config(credentials: &EnterpriseCredentials) -> ModeConfig {
    // The anonymous identity is sent in the clear; the real one only inside the tunnel
    ModeConfig::EapClient(
        EapClientConfig::default()
            .with_ssid(credentials.ssid.as_str().into())
            .with_auth_method(AuthMethod::Wpa2Enterprise)
            .with_identity(credentials.anonymous_identity.as_str().into())
            .with_username(credentials.identity.as_str().into())
            .with_password(credentials.password.as_str().into())
            .with_ttls_phase2_method(phase2_method(credentials.phase2)),
    )
}

fn access_point(info: &AccessPointInfo) -> AccessPoint {
    AccessPoint {
        bssid: Bssid(info.bssid),
        ssid: String::try_from(info.ssid.as_str()).unwrap_or_default(),
        channel: info.channel,
        rssi: info.signal_strength,
        auth: info.auth_method.and_then(auth_threshold),
        // Scan records from esp-radio do not carry the PHY capabilities
        phy: PhyModes::default(),
    }
}

impl WifiStation for EspStation {
    async fn set_station_mode(&mut self) -> Result<(), StationError> {
        self.controller
            .set_config(&ModeConfig::Client(ClientConfig::default()))
            .map_err(station_error)
    }

    async fn configure(&mut self, config: &StationConfig) -> Result<(), StationError> {
        let mode = match config {
            StationConfig::Personal { credentials, auth } => ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(credentials.ssid.as_str().into())
                    .with_password(credentials.password.as_str().into())
                    .with_auth_method(auth_method(*auth)),
            ),
            StationConfig::Enterprise(credentials) => enterprise_config(credentials),
        };
        self.controller.set_config(&mode).map_err(station_error)
    }

    async fn disable_11b_rates(&mut self) -> Result<(), StationError> {
        // SAFETY: plain configuration call into the driver, no pointers are passed
        let code = unsafe { esp_wifi_config_11b_rate(WIFI_IF_STA, true) };
        if code == ESP_OK {
            Ok(())
        } else {
            Err(StationError::Internal(code))
        }
    }

    async fn start(&mut self) -> Result<(), StationError> {
        self.controller.start_async().await.map_err(station_error)
    }

    async fn stop(&mut self) -> Result<(), StationError> {
        if !self.is_started()? {
            return Err(StationError::NotStarted);
        }
        self.controller.stop_async().await.map_err(station_error)
    }

    async fn connect(&mut self) -> Result<(), StationError> {
        self.controller.connect().map_err(station_error)
    }

    async fn disconnect(&mut self) -> Result<(), StationError> {
        self.controller.disconnect().map_err(station_error)
    }

    async fn scan(&mut self, config: &ScanConfig) -> Result<Vec<AccessPoint>, StationError> {
        if !self.is_started()? {
            return Err(StationError::NotStarted);
        }

        let mut scan = RadioScanConfig::default().with_show_hidden(config.show_hidden);
        if let Some(channel) = config.channel {
            scan = scan.with_channel(channel);
        }

        let found = self
            .controller
            .scan_with_config_async(scan)
            .await
            .map_err(station_error)?;
        Ok(found.iter().map(access_point).collect())
    }
}
