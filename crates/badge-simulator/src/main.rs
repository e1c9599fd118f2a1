//! Desktop simulator for the badge board-support layer.
//!
//! Runs the peripheral bring-up sequence against register-level models of
//! the I2C devices, then walks the WiFi connection manager through a few
//! scenarios against a simulated station: scanning, connecting through
//! transient failures, giving up after the retry budget, and provisioning
//! an enterprise network from an encoded config.
//!
//! Set `RUST_LOG=info` (or `debug`) to see the output.

mod hardware;
mod station;

use badge_core::board::pins::{ENVIRONMENT_ADDR, IMU_ADDR, SUPERVISOR_ADDR};
use badge_core::board::{Board, BoardDrivers, DisplaySource};
use badge_core::config::{EnterpriseConfig, NetworkConfig};
use badge_core::drivers::{Bme680, Bno055, Rp2040};
use badge_core::shared_i2c::SharedI2cDevice;
use badge_core::wifi::{
    AuthThreshold, ConnectionManager, PersonalCredentials, Phase2Method, RetryLimit,
    StationConfig,
};
use embassy_futures::block_on;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use log::{error, info, warn};

use hardware::{HostDelay, SimBuses, SimDisplay, SimFpga, SimI2cBus};
use station::{EVENTS, SimNetwork, SimStation};

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

type SimI2c<'a> = SharedI2cDevice<'a, CriticalSectionRawMutex, SimI2cBus>;

/// Supervisor firmware version reported by the simulated RP2040.
const SUPERVISOR_FIRMWARE: u8 = 3;

struct SimBoard<'a>(core::marker::PhantomData<&'a ()>);

impl<'a> BoardDrivers for SimBoard<'a> {
    type Bus = SimBuses;
    type Display = SimDisplay;
    type Supervisor = Rp2040<SimI2c<'a>>;
    type Fpga = SimFpga;
    type Imu = Bno055<SimI2c<'a>>;
    type Environment = Bme680<SimI2c<'a>, HostDelay>;
    type Delay = HostDelay;
}

fn i2c_bus() -> SimI2cBus {
    SimI2cBus::new()
        // Firmware version; button word all released (FPGA done high)
        .with_device(
            SUPERVISOR_ADDR,
            &[(0x00, SUPERVISOR_FIRMWARE), (0x06, 0xFF), (0x07, 0xFF)],
        )
        .with_device(IMU_ADDR, &[(0x00, 0xA0)])
        .with_device(ENVIRONMENT_ADDR, &[(0xD0, 0x61)])
}

fn networks() -> Vec<SimNetwork> {
    vec![
        SimNetwork {
            ssid: "badge-lab",
            password: "correct horse",
            bssid: [0x24, 0x0a, 0xc4, 0x01, 0x02, 0x03],
            channel: 6,
            rssi: -58,
            auth: AuthThreshold::Wpa2Personal,
        },
        SimNetwork {
            ssid: "campus",
            password: "hunter22",
            bssid: [0x24, 0x0a, 0xc4, 0x0a, 0x0b, 0x0c],
            channel: 11,
            rssi: -74,
            auth: AuthThreshold::Wpa2Enterprise,
        },
        SimNetwork {
            ssid: "hallway",
            password: "open sesame",
            bssid: [0x24, 0x0a, 0xc4, 0x10, 0x20, 0x30],
            channel: 1,
            rssi: -86,
            auth: AuthThreshold::Wpa2Personal,
        },
    ]
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

async fn bring_up(i2c: &Mutex<CriticalSectionRawMutex, SimI2cBus>) {
    let mut board: Board<SimBoard<'_>> = Board::new(
        SimBuses,
        SimDisplay::default(),
        Rp2040::new(SharedI2cDevice::new(i2c), SUPERVISOR_ADDR),
        SimFpga,
        Bno055::new(SharedI2cDevice::new(i2c), IMU_ADDR),
        Bme680::new(SharedI2cDevice::new(i2c), HostDelay, ENVIRONMENT_ADDR),
        HostDelay,
    );

    if let Err(e) = board.init_all().await {
        error!("Board bring-up failed: {}", e);
        return;
    }
    info!(
        "Supervisor firmware version: {:?}",
        board.supervisor_firmware_version()
    );

    if let Some(supervisor) = board.supervisor() {
        if let Err(e) = supervisor.set_backlight(255).await {
            warn!("Setting backlight failed: {}", e);
        }
    }

    for source in [DisplaySource::Fpga, DisplaySource::Mcu] {
        if let Err(e) = board.route_display(source).await {
            error!("Routing display to {:?} failed: {}", source, e);
        }
    }
}

async fn wifi_scenarios(manager: &ConnectionManager<SimStation, HostDelay>) {
    let found = manager.scan().await;
    for access_point in &found {
        info!(
            "{} on channel {} ({:?})",
            access_point.ssid,
            access_point.channel,
            access_point.strength()
        );
    }

    // Two dropped associations, then success within the budget of three
    manager.station().await.set_flaky_attempts(2);
    let credentials = PersonalCredentials::new("badge-lab", "correct horse");
    if manager
        .connect(&credentials, AuthThreshold::Wpa2Personal, RetryLimit::Limited(3))
        .await
    {
        info!("Connected, lease {:?}", manager.ip_info());
    }
    manager.disconnect().await;

    // Wrong password exhausts the budget
    manager.station().await.set_flaky_attempts(0);
    let credentials = PersonalCredentials::new("badge-lab", "wrong");
    let connected = manager
        .connect(&credentials, AuthThreshold::Wpa2Personal, RetryLimit::Limited(2))
        .await;
    info!("Connect with a wrong password: {}", connected);

    // Enterprise network from a provisioned config blob
    let provisioned = NetworkConfig {
        ssid: "campus",
        password: "hunter22",
        auth: AuthThreshold::Wpa2Enterprise,
        max_retries: RetryLimit::default(),
        enterprise: Some(EnterpriseConfig {
            identity: "student@campus.example",
            anonymous_identity: "anonymous@campus.example",
            phase2: Phase2Method::MsChapV2,
        }),
    };
    let blob = match provisioned.to_bytes() {
        Ok(blob) => blob,
        Err(e) => {
            error!("Encoding network config failed: {}", e);
            return;
        }
    };
    let config = match NetworkConfig::from_bytes(&blob) {
        Ok(config) => config,
        Err(e) => {
            error!("Decoding network config failed: {}", e);
            return;
        }
    };

    let connected = match config.station_config() {
        StationConfig::Enterprise(credentials) => {
            manager
                .connect_enterprise(&credentials, config.max_retries)
                .await
        }
        StationConfig::Personal { credentials, auth } => {
            manager.connect(&credentials, auth, config.max_retries).await
        }
    };
    info!(
        "Enterprise connect: {}, status {:?}",
        connected,
        manager.status()
    );
    manager.disconnect().await;
}

/// Deliver station events to the manager, as the firmware's event task does.
async fn event_pump(manager: &ConnectionManager<SimStation, HostDelay>) {
    loop {
        let event = EVENTS.receive().await;
        manager.handle_event(event).await;
    }
}

fn main() {
    env_logger::init();
    info!("Starting badge simulator");

    let i2c = Mutex::<CriticalSectionRawMutex, _>::new(i2c_bus());
    block_on(bring_up(&i2c));

    let manager = ConnectionManager::new(SimStation::new(networks()), HostDelay);
    block_on(select(wifi_scenarios(&manager), event_pump(&manager)));

    info!("Simulation finished");
}
