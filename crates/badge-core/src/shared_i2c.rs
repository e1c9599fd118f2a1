//! Shared I2C bus device
//!
//! The supervisor, the IMU and the environmental sensor all sit on one I2C
//! bus. Each driver gets its own [`SharedI2cDevice`] pointing at the same
//! async mutex, so a transfer from one driver can never interleave with
//! another's.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::error::DriverError;

/// One driver's handle on the shared bus.
///
/// # Example
///
/// ```ignore
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// use embassy_sync::mutex::Mutex;
/// use static_cell::StaticCell;
///
/// static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, esp_hal::i2c::master::I2c<'static, esp_hal::Async>>> = StaticCell::new();
///
/// let i2c = /* ... create async I2C ... */;
/// let bus = I2C_BUS.init(Mutex::new(i2c));
///
/// let supervisor = Rp2040::new(SharedI2cDevice::new(bus), SUPERVISOR_ADDR);
/// let imu = Bno055::new(SharedI2cDevice::new(bus), IMU_ADDR);
/// ```
pub struct SharedI2cDevice<'a, M: RawMutex, T> {
    bus: &'a Mutex<M, T>,
}

impl<'a, M: RawMutex, T> SharedI2cDevice<'a, M, T> {
    #[inline]
    pub const fn new(bus: &'a Mutex<M, T>) -> Self {
        Self { bus }
    }
}

impl<M: RawMutex, T: ErrorType> ErrorType for SharedI2cDevice<'_, M, T> {
    type Error = T::Error;
}

impl<M: RawMutex, T: I2c> I2c for SharedI2cDevice<'_, M, T> {
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.write(address, write).await
    }

    /// The bus stays locked across the repeated start.
    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.write_read(address, write, read).await
    }

    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.transaction(address, operations).await
    }
}

/// Map a bus error onto the driver error the sequencer reports.
pub fn driver_error<E: embedded_hal_async::i2c::Error>(error: E) -> DriverError {
    match error.kind() {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => DriverError::NotResponding,
        _ => DriverError::Bus,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use alloc::vec::Vec;

    use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

    /// Register-file model of the devices on a bus.
    ///
    /// The first written byte of a transfer selects the register; further
    /// written bytes land in consecutive registers, reads come out of them.
    pub struct MockI2cBus {
        devices: Vec<(u8, [u8; 256])>,
        /// Every write as `(address, bytes)`.
        pub writes: Vec<(u8, Vec<u8>)>,
    }

    impl MockI2cBus {
        pub fn new() -> Self {
            Self {
                devices: Vec::new(),
                writes: Vec::new(),
            }
        }

        pub fn with_device(mut self, address: u8) -> Self {
            self.devices.push((address, [0; 256]));
            self
        }

        pub fn set_register(&mut self, address: u8, register: u8, value: u8) {
            if let Some(regs) = self.registers(address) {
                regs[register as usize] = value;
            }
        }

        pub fn register(&self, address: u8, register: u8) -> Option<u8> {
            self.devices
                .iter()
                .find(|(a, _)| *a == address)
                .map(|(_, regs)| regs[register as usize])
        }

        fn registers(&mut self, address: u8) -> Option<&mut [u8; 256]> {
            self.devices
                .iter_mut()
                .find(|(a, _)| *a == address)
                .map(|(_, regs)| regs)
        }
    }

    impl ErrorType for MockI2cBus {
        type Error = ErrorKind;
    }

    impl I2c for MockI2cBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let mut log = Vec::new();
            let regs = self
                .registers(address)
                .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;
            let mut pointer = 0usize;

            for operation in operations.iter_mut() {
                match operation {
                    Operation::Write(bytes) => {
                        if let Some((first, rest)) = bytes.split_first() {
                            pointer = *first as usize;
                            for byte in rest {
                                regs[pointer % 256] = *byte;
                                pointer += 1;
                            }
                        }
                        log.extend_from_slice(bytes);
                    }
                    Operation::Read(buffer) => {
                        for byte in buffer.iter_mut() {
                            *byte = regs[pointer % 256];
                            pointer += 1;
                        }
                    }
                }
            }

            if !log.is_empty() {
                self.writes.push((address, log));
            }
            Ok(())
        }
    }
}
