//! Bus parameters and device addresses for this hardware revision
//!
//! GPIO assignments live with the firmware's typed peripherals.

// cSpell: disable

// Shared I2C bus (supervisor, IMU, environmental sensor)
pub const I2C_FREQUENCY_KHZ: u32 = 400;
/// Bus timeout in I2C clock cycles.
pub const I2C_TIMEOUT_CYCLES: u32 = 250 * 80;

// SPI bus (LCD and FPGA, one chip-select each)
pub const SPI_MAX_TRANSFER_SIZE: usize = 4094;

// LCD
pub const LCD_SPI_FREQUENCY_HZ: u32 = 40_000_000;
pub const LCD_WIDTH: u16 = 320;
pub const LCD_HEIGHT: u16 = 240;

// I2C addresses
pub const SUPERVISOR_ADDR: u8 = 0x17;
pub const IMU_ADDR: u8 = 0x28;
pub const ENVIRONMENT_ADDR: u8 = 0x77;
