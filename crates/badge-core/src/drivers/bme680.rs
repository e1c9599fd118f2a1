//! BME680 environmental sensor

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::board::EnvironmentSensor;
use crate::error::DriverError;
use crate::shared_i2c::driver_error;

const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const CHIP_ID: u8 = 0x61;
const SOFT_RESET: u8 = 0xB6;
const RESET_TIME_MS: u32 = 10;

pub struct Bme680<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Bme680<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }
}

impl<I: I2c, D: DelayNs> EnvironmentSensor for Bme680<I, D> {
    /// Soft reset, then check the chip id.
    async fn init(&mut self) -> Result<(), DriverError> {
        self.i2c
            .write(self.address, &[REG_RESET, SOFT_RESET])
            .await
            .map_err(driver_error)?;
        self.delay.delay_ms(RESET_TIME_MS).await;

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
        Ok(())
    }
}
