//! Contracts between the bring-up sequencer and the peripheral drivers
//!
//! The drivers themselves live elsewhere (register-level ones in
//! [`crate::drivers`], SPI ones in the firmware crate). The sequencer only
//! needs these narrow entry points to order and gate their setup.

use crate::error::DriverError;

/// Bring-up of the shared communication buses.
pub trait BusLayer {
    /// Configure the I2C and SPI buses. Must succeed in full before any device
    /// is initialized, and a failed call must leave the layer retryable.
    fn init(&mut self) -> impl Future<Output = Result<(), DriverError>>;
}

pub trait Display {
    /// Bring up the panel. A failed call must leave the display retryable.
    fn init(&mut self) -> impl Future<Output = Result<(), DriverError>>;

    /// Hand the panel to the FPGA (`true`) or take it back (`false`).
    fn set_fpga_mode(&mut self, fpga: bool) -> impl Future<Output = Result<(), DriverError>>;
}

/// Supervisor co-processor owning the buttons and the FPGA control lines.
pub trait Supervisor {
    fn init(&mut self) -> impl Future<Output = Result<(), DriverError>>;

    /// Firmware version; `0xFF` means the supervisor is in bootloader mode.
    fn firmware_version(&mut self) -> impl Future<Output = Result<u8, DriverError>>;

    /// Raw button-state word.
    fn read_buttons(&mut self) -> impl Future<Output = Result<u16, DriverError>>;

    /// Drive the FPGA enable line. `false` holds the FPGA in reset.
    fn set_fpga_enabled(&mut self, enabled: bool)
    -> impl Future<Output = Result<(), DriverError>>;
}

/// Access to the FPGA's "done" status and reset control.
///
/// On this board the lines are not wired to the main processor, so the
/// implementation is a proxy (see [`super::SupervisorFpgaControl`]).
pub trait FpgaControl {
    /// Whether the FPGA reports its configuration as done.
    fn done(&mut self) -> impl Future<Output = Result<bool, DriverError>>;

    /// Release (`true`) or assert (`false`) the FPGA reset.
    fn set_enabled(&mut self, enabled: bool) -> impl Future<Output = Result<(), DriverError>>;
}

pub trait Fpga {
    /// Set up the FPGA's SPI device and leave it held disabled.
    fn init<C: FpgaControl>(
        &mut self,
        control: &mut C,
    ) -> impl Future<Output = Result<(), DriverError>>;
}

pub trait Imu {
    fn init(&mut self) -> impl Future<Output = Result<(), DriverError>>;
}

pub trait EnvironmentSensor {
    fn init(&mut self) -> impl Future<Output = Result<(), DriverError>>;
}
