//! iCE40 FPGA on the shared SPI bus

use badge_core::DriverError;
use badge_core::board::{Fpga, FpgaControl, FpgaTiming};
use esp_hal::gpio::{Input, Output};
use log::info;

pub struct EspFpga {
    cs: Output<'static>,
    /// Interrupt line from the FPGA fabric.
    interrupt: Input<'static>,
    timing: FpgaTiming,
}

impl EspFpga {
    pub fn new(cs: Output<'static>, interrupt: Input<'static>) -> Self {
        Self {
            cs,
            interrupt,
            timing: FpgaTiming::DEFAULT,
        }
    }

    pub fn timing(&self) -> &FpgaTiming {
        &self.timing
    }

    /// Whether the fabric is asserting its (active low) interrupt line.
    pub fn interrupt_pending(&self) -> bool {
        self.interrupt.is_low()
    }
}

impl Fpga for EspFpga {
    /// Deselect the FPGA and hold it in reset until a bitstream is loaded.
    async fn init<C: FpgaControl>(&mut self, control: &mut C) -> Result<(), DriverError> {
        self.cs.set_high();
        control.set_enabled(false).await?;
        info!("FPGA held in reset, SPI timing {:?}", self.timing);
        Ok(())
    }
}
