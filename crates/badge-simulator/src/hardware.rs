//! Simulated board peripherals
//!
//! The I2C devices are register files behind the real `badge-core` drivers;
//! the SPI devices are stand-ins that only track their state.

use core::future::poll_fn;
use core::task::Poll;
use std::time::{Duration, Instant};

use badge_core::DriverError;
use badge_core::board::pins::I2C_FREQUENCY_KHZ;
use badge_core::board::{BusLayer, Display, Fpga, FpgaControl};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::info;

/// Delay backed by the host clock. Yields until the deadline passes.
#[derive(Clone, Copy, Default)]
pub struct HostDelay;

impl HostDelay {
    async fn until(deadline: Instant) {
        poll_fn(|cx| {
            if Instant::now() >= deadline {
                Poll::Ready(())
            } else {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        })
        .await
    }
}

impl DelayNs for HostDelay {
    async fn delay_ns(&mut self, ns: u32) {
        Self::until(Instant::now() + Duration::from_nanos(ns as u64)).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        Self::until(Instant::now() + Duration::from_millis(ms as u64)).await
    }
}

/// Register files of every device on the simulated I2C bus.
pub struct SimI2cBus {
    devices: Vec<(u8, [u8; 256])>,
}

impl SimI2cBus {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Add a device with the given preset registers.
    pub fn with_device(mut self, address: u8, presets: &[(u8, u8)]) -> Self {
        let mut regs = [0u8; 256];
        for &(register, value) in presets {
            regs[register as usize] = value;
        }
        self.devices.push((address, regs));
        self
    }
}

impl ErrorType for SimI2cBus {
    type Error = ErrorKind;
}

impl I2c for SimI2cBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let (_, regs) = self
            .devices
            .iter_mut()
            .find(|(a, _)| *a == address)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

        let mut pointer = 0u8;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((first, rest)) = bytes.split_first() {
                        pointer = *first;
                        for byte in rest {
                            regs[pointer as usize] = *byte;
                            pointer = pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = regs[pointer as usize];
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Bus bring-up always succeeds; the I2C bus already exists.
pub struct SimBuses;

impl BusLayer for SimBuses {
    async fn init(&mut self) -> Result<(), DriverError> {
        info!(
            "I2C bus configured at {} kHz, SPI bus configured",
            I2C_FREQUENCY_KHZ
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct SimDisplay {
    pub fpga_mode: bool,
}

impl Display for SimDisplay {
    async fn init(&mut self) -> Result<(), DriverError> {
        info!("LCD initialized");
        Ok(())
    }

    async fn set_fpga_mode(&mut self, fpga: bool) -> Result<(), DriverError> {
        self.fpga_mode = fpga;
        info!("LCD now driven by {}", if fpga { "FPGA" } else { "MCU" });
        Ok(())
    }
}

pub struct SimFpga;

impl Fpga for SimFpga {
    async fn init<C: FpgaControl>(&mut self, control: &mut C) -> Result<(), DriverError> {
        control.set_enabled(false).await
    }
}
