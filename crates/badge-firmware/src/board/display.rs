//! ILI9341 LCD on the shared SPI bus

use alloc::vec;
use core::cell::RefCell;
use core::convert::Infallible;

use badge_core::DriverError;
use badge_core::board::Display;
use badge_core::board::pins::{LCD_HEIGHT, LCD_WIDTH};
use embassy_time::Delay;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_bus::spi::CriticalSectionDevice;
use esp_hal::gpio::Output;
use log::{error, info};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{Orientation, Rotation};
use mipidsi::{Builder as MipidsiBuilder, Display as MipidsiDisplay};

use super::bus::{SPI_BUS, SpiBus};

/// SPI batching buffer for the panel; larger is faster but uses more RAM.
pub const LCD_BUFFER_SIZE: usize = 512;

/// Output line held in a static, so a failed panel init leaves it in place
/// for the next attempt.
#[derive(Clone, Copy)]
pub struct SharedOutput(&'static critical_section::Mutex<RefCell<Output<'static>>>);

impl SharedOutput {
    pub fn new(pin: &'static critical_section::Mutex<RefCell<Output<'static>>>) -> Self {
        Self(pin)
    }
}

impl ErrorType for SharedOutput {
    type Error = Infallible;
}

impl OutputPin for SharedOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).set_low());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        critical_section::with(|cs| self.0.borrow_ref_mut(cs).set_high());
        Ok(())
    }
}

type LcdSpi = CriticalSectionDevice<'static, SpiBus, SharedOutput, Delay>;
pub type Panel =
    MipidsiDisplay<SpiInterface<'static, LcdSpi, SharedOutput>, ILI9341Rgb565, SharedOutput>;

#[derive(Clone, Copy)]
pub struct DisplayPins {
    pub cs: SharedOutput,
    pub dc: SharedOutput,
    pub reset: SharedOutput,
}

pub struct EspDisplay {
    pins: DisplayPins,
    /// High routes the panel to this MCU, low to the FPGA.
    mode: Output<'static>,
    panel: Option<Panel>,
}

impl EspDisplay {
    pub fn new(pins: DisplayPins, mode: Output<'static>) -> Self {
        Self {
            pins,
            mode,
            panel: None,
        }
    }

    /// Draw target for the panel, once initialized.
    pub fn panel(&mut self) -> Option<&mut Panel> {
        self.panel.as_mut()
    }
}

impl Display for EspDisplay {
    async fn init(&mut self) -> Result<(), DriverError> {
        if self.panel.is_some() {
            return Err(DriverError::InvalidState);
        }
        let pins = self.pins;
        self.mode.set_high();

        let bus = SPI_BUS.get().await;
        let device =
            CriticalSectionDevice::new(bus, pins.cs, Delay).map_err(|_| DriverError::Bus)?;
        // Lives as long as the panel; a failed attempt leaks this one buffer
        let buffer = vec![0; LCD_BUFFER_SIZE].leak();
        let interface = SpiInterface::new(device, pins.dc, buffer);

        // The panel is portrait natively
        let mut panel = MipidsiBuilder::new(ILI9341Rgb565, interface)
            .reset_pin(pins.reset)
            .display_size(LCD_HEIGHT, LCD_WIDTH)
            .orientation(Orientation::new().rotate(Rotation::Deg90))
            .init(&mut Delay)
            .map_err(|_| {
                error!("LCD controller did not initialize");
                DriverError::NotResponding
            })?;

        panel.clear(Rgb565::BLACK).map_err(|_| DriverError::Bus)?;
        self.panel = Some(panel);
        info!("LCD {}x{} initialized", LCD_WIDTH, LCD_HEIGHT);
        Ok(())
    }

    async fn set_fpga_mode(&mut self, fpga: bool) -> Result<(), DriverError> {
        if fpga {
            self.mode.set_low();
        } else {
            self.mode.set_high();
        }
        Ok(())
    }
}
