//! RP2040 supervisor co-processor

use embedded_hal_async::i2c::I2c;
use log::debug;

use crate::board::Supervisor;
use crate::error::DriverError;
use crate::shared_i2c::driver_error;

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum Register {
    FirmwareVersion = 0x00,
    LcdBacklight = 0x04,
    Fpga = 0x05,
    /// Low byte of the button-state word; the high byte follows.
    Input1 = 0x06,
    Interrupt1 = 0x08,
}

pub struct Rp2040<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Rp2040<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    async fn read(&mut self, register: Register, buf: &mut [u8]) -> Result<(), DriverError> {
        self.i2c
            .write_read(self.address, &[register as u8], buf)
            .await
            .map_err(driver_error)
    }

    async fn write(&mut self, register: Register, value: u8) -> Result<(), DriverError> {
        self.i2c
            .write(self.address, &[register as u8, value])
            .await
            .map_err(driver_error)
    }

    pub async fn set_backlight(&mut self, level: u8) -> Result<(), DriverError> {
        self.write(Register::LcdBacklight, level).await
    }
}

impl<I: I2c> Supervisor for Rp2040<I> {
    /// Probe the supervisor and discard interrupts latched before boot.
    async fn init(&mut self) -> Result<(), DriverError> {
        let mut version = [0u8; 1];
        self.read(Register::FirmwareVersion, &mut version).await?;
        let mut pending = [0u8; 2];
        self.read(Register::Interrupt1, &mut pending).await?;
        debug!(
            "Supervisor answered, firmware {}, pending interrupts {:#06x}",
            version[0],
            u16::from_le_bytes(pending)
        );
        Ok(())
    }

    async fn firmware_version(&mut self) -> Result<u8, DriverError> {
        let mut version = [0u8; 1];
        self.read(Register::FirmwareVersion, &mut version).await?;
        Ok(version[0])
    }

    async fn read_buttons(&mut self) -> Result<u16, DriverError> {
        let mut buttons = [0u8; 2];
        self.read(Register::Input1, &mut buttons).await?;
        Ok(u16::from_le_bytes(buttons))
    }

    async fn set_fpga_enabled(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.write(Register::Fpga, enabled as u8).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FPGA_DONE_BIT, FpgaControl, SupervisorFpgaControl};
    use crate::board::testing::MockDelay;
    use crate::shared_i2c::testing::MockI2cBus;
    use embassy_futures::block_on;

    const ADDR: u8 = 0x17;

    #[test]
    fn test_version_and_buttons() {
        let mut bus = MockI2cBus::new().with_device(ADDR);
        bus.set_register(ADDR, 0x00, 2);
        bus.set_register(ADDR, 0x06, 0x34);
        bus.set_register(ADDR, 0x07, 0x12);
        let mut supervisor = Rp2040::new(bus, ADDR);

        block_on(supervisor.init()).unwrap();
        assert_eq!(block_on(supervisor.firmware_version()), Ok(2));
        assert_eq!(block_on(supervisor.read_buttons()), Ok(0x1234));
    }

    #[test]
    fn test_fpga_proxy_over_registers() {
        let mut bus = MockI2cBus::new().with_device(ADDR);
        // CDONE low: configured
        bus.set_register(ADDR, 0x06, !(FPGA_DONE_BIT as u8));
        let mut supervisor = Rp2040::new(bus, ADDR);
        let mut delay = MockDelay::default();

        let mut control = SupervisorFpgaControl::new(&mut supervisor, &mut delay);
        assert_eq!(block_on(control.done()), Ok(true));
        block_on(control.set_enabled(true)).unwrap();

        assert_eq!(supervisor.i2c.register(ADDR, 0x05), Some(1));
        assert_eq!(delay.total_ms, 100);
    }

    #[test]
    fn test_absent_supervisor() {
        let mut supervisor = Rp2040::new(MockI2cBus::new(), ADDR);
        assert_eq!(
            block_on(supervisor.init()),
            Err(DriverError::NotResponding)
        );
    }
}
