//! Concrete driver set for the ESP32 board
//!
//! The shared buses only exist once [`EspBuses`] has run, so every driver
//! that talks over them looks the bus up when it is first used. The board
//! sequencer guarantees that happens after bus bring-up.

mod bus;
mod display;
mod fpga;

pub use bus::{EspBuses, EspI2c, I2C_BUS, SPI_BUS, SpiBus, i2c_config, spi_config};
pub use display::{DisplayPins, EspDisplay, Panel, SharedOutput};
pub use fpga::EspFpga;

use badge_core::board::{Board, BoardDrivers};
use badge_core::drivers::{Bme680, Bno055, Rp2040};
use embassy_time::Delay;

pub struct EspBoard;

impl BoardDrivers for EspBoard {
    type Bus = EspBuses;
    type Display = EspDisplay;
    type Supervisor = Rp2040<EspI2c>;
    type Fpga = EspFpga;
    type Imu = Bno055<EspI2c>;
    type Environment = Bme680<EspI2c, Delay>;
    type Delay = Delay;
}

pub type BadgeBoard = Board<EspBoard>;
