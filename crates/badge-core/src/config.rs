//! Network provisioning
//!
//! Credentials are provisioned as a postcard-encoded [`NetworkConfig`]. The
//! decoded config borrows its strings from the encoded buffer.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::wifi::{
    AuthThreshold, EnterpriseCredentials, PersonalCredentials, Phase2Method, RetryLimit,
    StationConfig,
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct NetworkConfig<'a> {
    pub ssid: &'a str,
    /// Network password, or the enterprise account password.
    pub password: &'a str,
    pub auth: AuthThreshold,
    pub max_retries: RetryLimit,
    pub enterprise: Option<EnterpriseConfig<'a>>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct EnterpriseConfig<'a> {
    pub identity: &'a str,
    pub anonymous_identity: &'a str,
    pub phase2: Phase2Method,
}

impl<'a> NetworkConfig<'a> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Whether any credentials were provisioned at all.
    pub fn is_provisioned(&self) -> bool {
        !self.ssid.is_empty()
    }

    pub fn station_config(&self) -> StationConfig {
        match &self.enterprise {
            Some(enterprise) => StationConfig::Enterprise(EnterpriseCredentials::new(
                self.ssid,
                enterprise.identity,
                enterprise.anonymous_identity,
                self.password,
                enterprise.phase2,
            )),
            None => StationConfig::Personal {
                credentials: PersonalCredentials::new(self.ssid, self.password),
                auth: self.auth,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unprovisioned() {
        let config = NetworkConfig::default();
        assert!(!config.is_provisioned());
        assert_eq!(config.max_retries, RetryLimit::Limited(3));
    }

    #[test]
    fn test_decode_borrows_from_buffer() {
        let config = NetworkConfig {
            ssid: "badge-net",
            password: "hunter22",
            auth: AuthThreshold::WpaWpa2Personal,
            max_retries: RetryLimit::Unlimited,
            enterprise: None,
        };
        let bytes = config.to_bytes().unwrap();
        let decoded = NetworkConfig::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, config);
        assert!(decoded.is_provisioned());
    }

    #[test]
    fn test_truncated_buffer_is_rejected() {
        let bytes = NetworkConfig {
            ssid: "badge-net",
            ..Default::default()
        }
        .to_bytes()
        .unwrap();

        assert!(NetworkConfig::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn test_personal_station_config() {
        let config = NetworkConfig {
            ssid: "badge-net",
            password: "hunter22",
            auth: AuthThreshold::Wpa3Personal,
            ..Default::default()
        };

        assert_eq!(
            config.station_config(),
            StationConfig::Personal {
                credentials: PersonalCredentials::new("badge-net", "hunter22"),
                auth: AuthThreshold::Wpa3Personal,
            }
        );
    }

    #[test]
    fn test_enterprise_station_config() {
        let config = NetworkConfig {
            ssid: "campus",
            password: "secret",
            enterprise: Some(EnterpriseConfig {
                identity: "user@example.org",
                anonymous_identity: "anonymous@example.org",
                phase2: Phase2Method::Pap,
            }),
            ..Default::default()
        };

        let StationConfig::Enterprise(credentials) = config.station_config() else {
            panic!("expected enterprise config");
        };
        assert_eq!(credentials.identity.as_str(), "user@example.org");
        assert_eq!(credentials.password.as_str(), "secret");
        assert_eq!(credentials.phase2, Phase2Method::Pap);
    }
}
