//! Error types shared by the bring-up sequencer and the device drivers

use core::fmt;

use thiserror_no_std::Error;

/// Failure reported by a peripheral driver or bus operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("bus transfer failed")]
    Bus,
    #[error("device did not respond in time")]
    Timeout,
    #[error("device is not responding")]
    NotResponding,
    #[error("unexpected chip id {found:#04x}, expected {expected:#04x}")]
    UnexpectedChipId { expected: u8, found: u8 },
    #[error("device is in an invalid state")]
    InvalidState,
}

/// The bring-up stage a driver failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Bus,
    Display,
    Supervisor,
    SupervisorVersion,
    Fpga,
    FpgaDone,
    DisplayRouting,
    Imu,
    Environment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Bus => "communication buses",
            Stage::Display => "display",
            Stage::Supervisor => "supervisor",
            Stage::SupervisorVersion => "supervisor firmware version",
            Stage::Fpga => "FPGA",
            Stage::FpgaDone => "FPGA done state",
            Stage::DisplayRouting => "display routing",
            Stage::Imu => "IMU",
            Stage::Environment => "environmental sensor",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspError {
    #[error("communication buses are not initialized")]
    BusNotReady,
    #[error("supervisor is not initialized")]
    SupervisorNotReady,
    #[error("supervisor is in bootloader mode")]
    SupervisorInBootloader,
    #[error("display is not initialized")]
    DisplayNotReady,
    #[error("FPGA is not initialized")]
    FpgaNotReady,
    #[error("FPGA reports done while disabled")]
    FpgaDoneWhileDisabled,
    #[error("{stage} failed: {error}")]
    Driver { stage: Stage, error: DriverError },
}

impl BspError {
    pub const fn driver(stage: Stage, error: DriverError) -> Self {
        Self::Driver { stage, error }
    }
}
