//! Compile-time WiFi provisioning
//!
//! Reads `.env` (if present) and the process environment, and exports the
//! network settings to the firmware as `env!` variables. Unset keys are
//! exported empty so the firmware always compiles.

const NETWORK_KEYS: [&str; 5] = [
    "WIFI_SSID",
    "WIFI_PASSWORD",
    "WIFI_MAX_RETRIES",
    "WIFI_IDENTITY",
    "WIFI_ANONYMOUS_IDENTITY",
];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        println!("cargo:warning=Ignoring unreadable .env: {e}");
    }

    for key in NETWORK_KEYS {
        println!("cargo:rerun-if-env-changed={key}");
        let value = std::env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={key}={value}");
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
