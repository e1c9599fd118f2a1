#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::cell::RefCell;

use badge_core::board::pins::{ENVIRONMENT_ADDR, IMU_ADDR, SUPERVISOR_ADDR};
use badge_core::board::{DisplaySource, Supervisor};
use badge_core::drivers::{Bme680, Bno055, Rp2040};
use badge_core::wifi::{ConnectionManager, StationConfig};
use badge_firmware::board::{
    BadgeBoard, DisplayPins, EspBuses, EspDisplay, EspFpga, EspI2c, SharedOutput,
};
use badge_firmware::provisioning::network_config;
use badge_firmware::wifi::{EspStation, Manager, install_event_handlers, pump_events, watch_ip};
use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Delay, Duration};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use log::{error, info, warn};
use static_cell::StaticCell;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Upper bound on the initial WiFi connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// LCD backlight level once the panel is up.
const BACKLIGHT_ON: u8 = 0xFF;

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn station_event_task(manager: &'static Manager) -> ! {
    pump_events(manager).await
}

#[embassy_executor::task]
async fn ip_task(stack: Stack<'static>) -> ! {
    watch_ip(stack).await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 98767);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // Peripheral bring-up

    type SharedPin = critical_section::Mutex<RefCell<Output<'static>>>;
    static LCD_CS: StaticCell<SharedPin> = StaticCell::new();
    static LCD_DC: StaticCell<SharedPin> = StaticCell::new();
    static LCD_RESET: StaticCell<SharedPin> = StaticCell::new();
    let shared_output = |cell: &'static StaticCell<SharedPin>, pin: Output<'static>| {
        SharedOutput::new(cell.init(critical_section::Mutex::new(RefCell::new(pin))))
    };

    // Pin map: I2C SDA 22 SCL 21; SPI MOSI 23 MISO 35 CLK 18; LCD CS 32 DC 33
    // RESET 25 MODE 26; FPGA CS 27 INT 39; supervisor INT 34
    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .expect("Failed to create I2C bus")
        .with_sda(peripherals.GPIO22)
        .with_scl(peripherals.GPIO21);
    let spi = Spi::new(peripherals.SPI2, SpiConfig::default())
        .expect("Failed to create SPI bus")
        .with_sck(peripherals.GPIO18)
        .with_mosi(peripherals.GPIO23)
        .with_miso(peripherals.GPIO35);
    let buses = EspBuses::new(i2c, spi);

    let display = EspDisplay::new(
        DisplayPins {
            cs: shared_output(
                &LCD_CS,
                Output::new(peripherals.GPIO32, Level::High, OutputConfig::default()),
            ),
            dc: shared_output(
                &LCD_DC,
                Output::new(peripherals.GPIO33, Level::Low, OutputConfig::default()),
            ),
            reset: shared_output(
                &LCD_RESET,
                Output::new(peripherals.GPIO25, Level::High, OutputConfig::default()),
            ),
        },
        Output::new(peripherals.GPIO26, Level::High, OutputConfig::default()),
    );
    let fpga = EspFpga::new(
        Output::new(peripherals.GPIO27, Level::High, OutputConfig::default()),
        Input::new(peripherals.GPIO39, InputConfig::default()),
    );
    let mut supervisor_interrupt = Input::new(peripherals.GPIO34, InputConfig::default());

    let mut board = BadgeBoard::new(
        buses,
        display,
        Rp2040::new(EspI2c, SUPERVISOR_ADDR),
        fpga,
        Bno055::new(EspI2c, IMU_ADDR),
        Bme680::new(EspI2c, Delay, ENVIRONMENT_ADDR),
        Delay,
    );

    match board.init_all().await {
        Ok(()) => info!("Board ready"),
        Err(e) => error!("Board bring-up stopped: {}", e),
    }
    if let Err(e) = board.route_display(DisplaySource::Mcu).await {
        warn!("Display routing unavailable: {}", e);
    }
    if let Some(supervisor) = board.supervisor()
        && let Err(e) = supervisor.set_backlight(BACKLIGHT_ON).await
    {
        warn!("Backlight: {}", e);
    }

    // WiFi

    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    static MANAGER: StaticCell<Manager> = StaticCell::new();

    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (controller, interfaces) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let seed = ((rng.random() as u64) << 32) | rng.random() as u64;
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );

    install_event_handlers();
    let manager: &'static Manager =
        MANAGER.init(ConnectionManager::new(EspStation::new(controller), Delay));

    spawner.spawn(net_task(runner).expect("net task spawned twice"));
    spawner.spawn(station_event_task(manager).expect("event task spawned twice"));
    spawner.spawn(ip_task(stack).expect("IP task spawned twice"));

    info!("{} access points in range", manager.scan_count().await);

    let network = network_config();
    if network.is_provisioned() {
        match network.station_config() {
            StationConfig::Personal { credentials, auth } => {
                manager
                    .connect_async(&credentials, auth, network.max_retries)
                    .await
            }
            StationConfig::Enterprise(credentials) => {
                manager
                    .connect_enterprise_async(&credentials, network.max_retries)
                    .await
            }
        }
        let connected = manager.await_connection(CONNECT_TIMEOUT).await;
        if let Some(lease) = manager.ip_info().filter(|_| connected) {
            info!("IP {} mask {} gateway {}", lease.ip, lease.netmask, lease.gateway);
        }
    } else {
        info!("No WiFi network provisioned");
    }

    // Report button changes signalled by the supervisor
    loop {
        supervisor_interrupt.wait_for_falling_edge().await;
        match board.supervisor() {
            Some(supervisor) => match supervisor.read_buttons().await {
                Ok(buttons) => info!("Buttons {:#06x}", buttons),
                Err(e) => warn!("Reading buttons failed: {}", e),
            },
            None => warn!("Supervisor interrupt without a ready supervisor"),
        }
    }
}
