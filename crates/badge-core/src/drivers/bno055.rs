//! BNO055 inertial measurement unit

use embedded_hal_async::i2c::I2c;

use crate::board::Imu;
use crate::error::DriverError;
use crate::shared_i2c::driver_error;

const REG_CHIP_ID: u8 = 0x00;
const REG_OPR_MODE: u8 = 0x3D;
const CHIP_ID: u8 = 0xA0;
const MODE_CONFIG: u8 = 0x00;

pub struct Bno055<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Bno055<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<I: I2c> Imu for Bno055<I> {
    /// Check the chip id and park the sensor in config mode.
    async fn init(&mut self) -> Result<(), DriverError> {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(self.address, &[REG_CHIP_ID], &mut id)
            .await
            .map_err(driver_error)?;
        if id[0] != CHIP_ID {
            return Err(DriverError::UnexpectedChipId {
                expected: CHIP_ID,
                found: id[0],
            });
        }

        self.i2c
            .write(self.address, &[REG_OPR_MODE, MODE_CONFIG])
            .await
            .map_err(driver_error)
    }
}
