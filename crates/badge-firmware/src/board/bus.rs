//! I2C and SPI bus bring-up

use core::cell::RefCell;

use badge_core::DriverError;
use badge_core::board::BusLayer;
use badge_core::board::pins::{I2C_FREQUENCY_KHZ, I2C_TIMEOUT_CYCLES, LCD_SPI_FREQUENCY_HZ};
use badge_core::shared_i2c::SharedI2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::once_lock::OnceLock;
use embedded_hal_async::i2c::{ErrorType, I2c as AsyncI2c, Operation};
use esp_hal::Async;
use esp_hal::Blocking;
use esp_hal::i2c::master::{BusTimeout, Config as I2cConfig, Error as I2cError, I2c};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use log::{error, info};

pub type SpiBus = Spi<'static, Blocking>;

/// Shared I2C bus (supervisor, IMU, environmental sensor).
pub static I2C_BUS: OnceLock<AsyncMutex<CriticalSectionRawMutex, I2c<'static, Async>>> =
    OnceLock::new();

/// Shared SPI bus (LCD, FPGA). Each device owns its chip select.
pub static SPI_BUS: OnceLock<critical_section::Mutex<RefCell<SpiBus>>> = OnceLock::new();

/// Board settings for the I2C bus.
pub fn i2c_config() -> I2cConfig {
    I2cConfig::default()
        .with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ))
        .with_timeout(BusTimeout::BusCycles(I2C_TIMEOUT_CYCLES))
}

/// Board settings for the SPI bus.
///
/// The LCD is the only device clocked on the bus so far.
pub fn spi_config() -> SpiConfig {
    SpiConfig::default().with_frequency(Rate::from_hz(LCD_SPI_FREQUENCY_HZ))
}

/// Bus drivers attached to their pins, published once both take the board
/// configuration. A failed attempt keeps them for the next one.
pub struct EspBuses {
    buses: Option<(I2c<'static, Blocking>, SpiBus)>,
}

impl EspBuses {
    pub fn new(i2c: I2c<'static, Blocking>, spi: SpiBus) -> Self {
        Self {
            buses: Some((i2c, spi)),
        }
    }
}

impl BusLayer for EspBuses {
    async fn init(&mut self) -> Result<(), DriverError> {
        let Some((i2c, spi)) = self.buses.as_mut() else {
            return Err(DriverError::InvalidState);
        };

        i2c.apply_config(&i2c_config()).map_err(|e| {
            error!("I2C config rejected: {:?}", e);
            DriverError::Bus
        })?;
        spi.apply_config(&spi_config()).map_err(|e| {
            error!("SPI config rejected: {:?}", e);
            DriverError::Bus
        })?;

        let Some((i2c, spi)) = self.buses.take() else {
            return Err(DriverError::InvalidState);
        };
        if I2C_BUS.init(AsyncMutex::new(i2c.into_async())).is_err()
            || SPI_BUS
                .init(critical_section::Mutex::new(RefCell::new(spi)))
                .is_err()
        {
            return Err(DriverError::InvalidState);
        }
        info!(
            "I2C bus at {} kHz, SPI bus at {} MHz",
            I2C_FREQUENCY_KHZ,
            LCD_SPI_FREQUENCY_HZ / 1_000_000
        );

        Ok(())
    }
}

/// Handle to the shared I2C bus for one driver.
///
/// Waits for bus bring-up on first use.
#[derive(Clone, Copy, Default)]
pub struct EspI2c;

impl ErrorType for EspI2c {
    type Error = I2cError;
}

impl AsyncI2c for EspI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let bus = I2C_BUS.get().await;
        SharedI2cDevice::new(bus)
            .transaction(address, operations)
            .await
    }
}
