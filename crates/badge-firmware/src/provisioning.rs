//! Network settings baked in at build time
//!
//! `build.rs` exports these from `.env`; see `.env.example`.

use badge_core::config::{EnterpriseConfig, NetworkConfig};
use badge_core::wifi::{AuthThreshold, Phase2Method, RetryLimit};
use log::warn;

/// The provisioned network. An empty `WIFI_IDENTITY` selects WPA2-Personal.
pub fn network_config() -> NetworkConfig<'static> {
    let identity = env!("WIFI_IDENTITY");
    let max_retries = env!("WIFI_MAX_RETRIES").parse().unwrap_or_else(|e| {
        warn!("WIFI_MAX_RETRIES: {}, using the default", e);
        RetryLimit::default()
    });

    let enterprise = (!identity.is_empty()).then(|| EnterpriseConfig {
        identity,
        anonymous_identity: env!("WIFI_ANONYMOUS_IDENTITY"),
        phase2: Phase2Method::default(),
    });
    let auth = if enterprise.is_some() {
        AuthThreshold::Wpa2Enterprise
    } else {
        AuthThreshold::default()
    };

    NetworkConfig {
        ssid: env!("WIFI_SSID"),
        password: env!("WIFI_PASSWORD"),
        auth,
        max_retries,
        enterprise,
    }
}
