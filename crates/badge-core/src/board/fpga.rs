//! FPGA done/reset proxy through the supervisor
//!
//! The FPGA's CDONE and CRESET lines are owned by the supervisor, not the main
//! processor. "Done" is read back as a bit in the supervisor's button-state
//! word and reset is driven through its FPGA register.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use super::drivers::{FpgaControl, Supervisor};
use crate::error::DriverError;

/// Bit in the supervisor button word carrying the FPGA CDONE line (active low).
pub const FPGA_DONE_BIT: u16 = 1 << 5;

/// Settle time after every reset toggle.
pub const FPGA_RESET_SETTLE: Duration = Duration::from_millis(100);

/// SPI tuning for the FPGA configuration interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpgaTiming {
    pub full_duplex_hz: u32,
    pub half_duplex_hz: u32,
    pub turbo_hz: u32,
    pub input_delay_ns: u32,
    pub max_transfer_size: usize,
}

impl FpgaTiming {
    pub const DEFAULT: Self = Self {
        full_duplex_hz: 26_700_000,
        half_duplex_hz: 40_000_000,
        turbo_hz: 80_000_000,
        input_delay_ns: 10,
        max_transfer_size: super::pins::SPI_MAX_TRANSFER_SIZE,
    };
}

impl Default for FpgaTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct SupervisorFpgaControl<'a, S, D> {
    supervisor: &'a mut S,
    delay: &'a mut D,
}

impl<'a, S, D> SupervisorFpgaControl<'a, S, D>
where
    S: Supervisor,
    D: DelayNs,
{
    pub fn new(supervisor: &'a mut S, delay: &'a mut D) -> Self {
        Self { supervisor, delay }
    }
}

impl<S, D> FpgaControl for SupervisorFpgaControl<'_, S, D>
where
    S: Supervisor,
    D: DelayNs,
{
    async fn done(&mut self) -> Result<bool, DriverError> {
        let buttons = self.supervisor.read_buttons().await?;
        Ok(buttons & FPGA_DONE_BIT == 0)
    }

    async fn set_enabled(&mut self, enabled: bool) -> Result<(), DriverError> {
        let result = self.supervisor.set_fpga_enabled(enabled).await;
        // The settle delay applies even when the write failed
        self.delay
            .delay_ms(FPGA_RESET_SETTLE.as_millis() as u32)
            .await;
        result
    }
}
