//! Value types shared by the station driver and the connection manager

use core::fmt;
use core::net::Ipv4Addr;

use heapless::String;
use serde::{Deserialize, Serialize};

pub const SSID_MAX_LEN: usize = 32;
pub const PASSWORD_MAX_LEN: usize = 64;
pub const IDENTITY_MAX_LEN: usize = 128;

/// Copy `value` into a bounded string, cutting at the last char boundary
/// that fits.
pub(crate) fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut end = value.len().min(N);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::new();
    // Cannot fail: `end <= N`
    let _ = out.push_str(&value[..end]);
    out
}

/// Weakest authentication mode the station accepts from an access point.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AuthThreshold {
    Open,
    Wep,
    WpaPersonal,
    #[default]
    Wpa2Personal,
    WpaWpa2Personal,
    Wpa3Personal,
    Wpa2Wpa3Personal,
    Wpa2Enterprise,
}

/// Inner authentication method of an EAP-TTLS tunnel.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase2Method {
    Eap,
    #[default]
    MsChapV2,
    MsChap,
    Pap,
    Chap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalCredentials {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
}

impl PersonalCredentials {
    /// SSID and password longer than the radio accepts are truncated.
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: truncated(ssid),
            password: truncated(password),
        }
    }
}

/// WPA2-Enterprise (EAP-TTLS) credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterpriseCredentials {
    pub ssid: String<SSID_MAX_LEN>,
    pub identity: String<IDENTITY_MAX_LEN>,
    pub anonymous_identity: String<IDENTITY_MAX_LEN>,
    pub password: String<IDENTITY_MAX_LEN>,
    pub phase2: Phase2Method,
}

impl EnterpriseCredentials {
    pub fn new(
        ssid: &str,
        identity: &str,
        anonymous_identity: &str,
        password: &str,
        phase2: Phase2Method,
    ) -> Self {
        Self {
            ssid: truncated(ssid),
            identity: truncated(identity),
            anonymous_identity: truncated(anonymous_identity),
            password: truncated(password),
            phase2,
        }
    }
}

/// Address configuration acquired from DHCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpInfo {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bssid(pub [u8; 6]);

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// 802.11 PHY modes advertised by an access point.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhyModes {
    pub b: bool,
    pub g: bool,
    pub n: bool,
}

impl fmt::Display for PhyModes {
    /// Renders as ` 11b/g/n` (only the supported letters), or nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !(self.b || self.g || self.n) {
            return Ok(());
        }
        f.write_str(" 11")?;
        let mut first = true;
        for (enabled, name) in [(self.b, "b"), (self.g, "g"), (self.n, "n")] {
            if !enabled {
                continue;
            }
            if !first {
                f.write_str("/")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub bssid: Bssid,
    pub ssid: String<SSID_MAX_LEN>,
    pub channel: u8,
    pub rssi: i8,
    pub auth: Option<AuthThreshold>,
    pub phy: PhyModes,
}

impl AccessPoint {
    pub fn strength(&self) -> SignalStrength {
        SignalStrength::from_rssi(self.rssi)
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AP {} {} rssi={}{}",
            self.bssid, self.ssid, self.rssi, self.phy
        )
    }
}

/// RSSI above which a link is very good.
pub const RSSI_THRESHOLD_VERY_GOOD: i8 = -67;
/// RSSI above which a link is good.
pub const RSSI_THRESHOLD_GOOD: i8 = -70;
/// RSSI above which a link is merely bad; at or below it is very bad.
pub const RSSI_THRESHOLD_BAD: i8 = -80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalStrength {
    VeryBad,
    Bad,
    Good,
    VeryGood,
}

impl SignalStrength {
    /// Classify a signal strength. Thresholds are exclusive lower bounds of
    /// the higher band, so a value on a threshold falls into the lower band.
    pub const fn from_rssi(rssi: i8) -> Self {
        if rssi > RSSI_THRESHOLD_VERY_GOOD {
            SignalStrength::VeryGood
        } else if rssi > RSSI_THRESHOLD_GOOD {
            SignalStrength::Good
        } else if rssi > RSSI_THRESHOLD_BAD {
            SignalStrength::Bad
        } else {
            SignalStrength::VeryBad
        }
    }
}
