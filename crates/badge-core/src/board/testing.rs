//! Mock drivers shared by the board tests

use alloc::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use super::drivers::*;
use super::{Board, BoardDrivers};
use crate::error::DriverError;

#[derive(Default)]
pub struct MockDelay {
    pub total_ms: u32,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ms += ns / 1_000_000;
    }

    async fn delay_us(&mut self, us: u32) {
        self.total_ms += us / 1_000;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}

#[derive(Default)]
pub struct MockBus {
    pub init_calls: u32,
    pub fail_init: bool,
}

impl BusLayer for MockBus {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.init_calls += 1;
        if self.fail_init {
            Err(DriverError::Bus)
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MockDisplay {
    pub init_calls: u32,
    pub fail_init: bool,
    pub fpga_mode_writes: Vec<bool>,
}

impl Display for MockDisplay {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.init_calls += 1;
        if self.fail_init {
            Err(DriverError::NotResponding)
        } else {
            Ok(())
        }
    }

    async fn set_fpga_mode(&mut self, fpga: bool) -> Result<(), DriverError> {
        self.fpga_mode_writes.push(fpga);
        Ok(())
    }
}

pub struct MockSupervisor {
    pub version: u8,
    pub buttons: u16,
    pub init_calls: u32,
    pub button_reads: u32,
    pub fpga_writes: Vec<bool>,
    pub fail_version: bool,
    pub fail_fpga_write: bool,
}

impl MockSupervisor {
    pub fn new(version: u8) -> Self {
        Self {
            version,
            buttons: 0xFFFF,
            init_calls: 0,
            button_reads: 0,
            fpga_writes: Vec::new(),
            fail_version: false,
            fail_fpga_write: false,
        }
    }
}

impl Supervisor for MockSupervisor {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.init_calls += 1;
        Ok(())
    }

    async fn firmware_version(&mut self) -> Result<u8, DriverError> {
        if self.fail_version {
            Err(DriverError::Timeout)
        } else {
            Ok(self.version)
        }
    }

    async fn read_buttons(&mut self) -> Result<u16, DriverError> {
        self.button_reads += 1;
        Ok(self.buttons)
    }

    async fn set_fpga_enabled(&mut self, enabled: bool) -> Result<(), DriverError> {
        if self.fail_fpga_write {
            return Err(DriverError::Bus);
        }
        self.fpga_writes.push(enabled);
        Ok(())
    }
}

/// Holds the FPGA in reset on init, like the real driver.
#[derive(Default)]
pub struct MockFpga {
    pub init_calls: u32,
}

impl Fpga for MockFpga {
    async fn init<C: FpgaControl>(&mut self, control: &mut C) -> Result<(), DriverError> {
        self.init_calls += 1;
        control.set_enabled(false).await
    }
}

#[derive(Default)]
pub struct MockSensor {
    pub init_calls: u32,
}

impl Imu for MockSensor {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.init_calls += 1;
        Ok(())
    }
}

impl EnvironmentSensor for MockSensor {
    async fn init(&mut self) -> Result<(), DriverError> {
        self.init_calls += 1;
        Ok(())
    }
}

pub struct TestBoard;

impl BoardDrivers for TestBoard {
    type Bus = MockBus;
    type Display = MockDisplay;
    type Supervisor = MockSupervisor;
    type Fpga = MockFpga;
    type Imu = MockSensor;
    type Environment = MockSensor;
    type Delay = MockDelay;
}

pub fn test_board(supervisor_version: u8) -> Board<TestBoard> {
    Board::new(
        MockBus::default(),
        MockDisplay::default(),
        MockSupervisor::new(supervisor_version),
        MockFpga::default(),
        MockSensor::default(),
        MockSensor::default(),
        MockDelay::default(),
    )
}
