//! Staged peripheral bring-up for the badge
//!
//! [`Board`] owns every peripheral handle together with its readiness flag.
//! Each `init_*` operation is idempotent, refuses to run until the devices it
//! depends on are ready, and only marks its own device ready once the driver
//! reports success. Accessors hand out a device only after that point.
//!
//! Dependency order:
//!
//! ```text
//! bus ─┬─ supervisor ── fpga
//!      ├─ display
//!      ├─ imu
//!      └─ environment
//! ```

pub mod drivers;
mod fpga;
pub mod pins;
#[cfg(test)]
pub(crate) mod testing;

pub use drivers::*;
pub use fpga::{FPGA_DONE_BIT, FPGA_RESET_SETTLE, FpgaTiming, SupervisorFpgaControl};

use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use crate::error::{BspError, Stage};

/// Supervisor firmware version reported while it sits in its bootloader.
pub const SUPERVISOR_BOOTLOADER_VERSION: u8 = 0xFF;

/// The concrete driver set of one board.
pub trait BoardDrivers {
    type Bus: BusLayer;
    type Display: Display;
    type Supervisor: Supervisor;
    type Fpga: Fpga;
    type Imu: Imu;
    type Environment: EnvironmentSensor;
    type Delay: DelayNs;
}

/// Which side drives the LCD panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySource {
    Mcu,
    Fpga,
}

/// A peripheral handle and its monotonic readiness flag.
struct Slot<T> {
    device: T,
    ready: bool,
}

impl<T> Slot<T> {
    const fn new(device: T) -> Self {
        Self {
            device,
            ready: false,
        }
    }

    fn get(&mut self) -> Option<&mut T> {
        self.ready.then_some(&mut self.device)
    }
}

/// Explicit context object for the board's peripherals.
pub struct Board<D: BoardDrivers> {
    bus: Slot<D::Bus>,
    display: Slot<D::Display>,
    supervisor: Slot<D::Supervisor>,
    fpga: Slot<D::Fpga>,
    imu: Slot<D::Imu>,
    environment: Slot<D::Environment>,
    supervisor_version: Option<u8>,
    delay: D::Delay,
}

impl<D: BoardDrivers> Board<D> {
    pub fn new(
        bus: D::Bus,
        display: D::Display,
        supervisor: D::Supervisor,
        fpga: D::Fpga,
        imu: D::Imu,
        environment: D::Environment,
        delay: D::Delay,
    ) -> Self {
        Self {
            bus: Slot::new(bus),
            display: Slot::new(display),
            supervisor: Slot::new(supervisor),
            fpga: Slot::new(fpga),
            imu: Slot::new(imu),
            environment: Slot::new(environment),
            supervisor_version: None,
            delay,
        }
    }

    /// Bring up everything in dependency order, stopping at the first failure.
    pub async fn init_all(&mut self) -> Result<(), BspError> {
        self.init_bus().await?;
        self.init_supervisor().await?;
        self.init_display().await?;
        self.init_fpga().await?;
        self.init_imu().await?;
        self.init_environment().await?;
        info!("Board ready");
        Ok(())
    }

    pub async fn init_bus(&mut self) -> Result<(), BspError> {
        if self.bus.ready {
            return Ok(());
        }

        if let Err(e) = self.bus.device.init().await {
            error!("Initializing communication buses failed: {}", e);
            return Err(BspError::driver(Stage::Bus, e));
        }

        self.bus.ready = true;
        info!("Communication buses ready");
        Ok(())
    }

    pub async fn init_display(&mut self) -> Result<(), BspError> {
        if self.display.ready {
            return Ok(());
        }
        self.require_bus()?;

        if let Err(e) = self.display.device.init().await {
            error!("Initializing display failed: {}", e);
            return Err(BspError::driver(Stage::Display, e));
        }

        self.display.ready = true;
        info!("Display ready");
        Ok(())
    }

    pub async fn init_supervisor(&mut self) -> Result<(), BspError> {
        if self.supervisor.ready {
            return Ok(());
        }
        self.require_bus()?;

        if let Err(e) = self.supervisor.device.init().await {
            error!("Initializing supervisor failed: {}", e);
            return Err(BspError::driver(Stage::Supervisor, e));
        }

        let version = match self.supervisor.device.firmware_version().await {
            Ok(version) => version,
            Err(e) => {
                error!("Failed to read supervisor firmware version: {}", e);
                return Err(BspError::driver(Stage::SupervisorVersion, e));
            }
        };

        self.supervisor_version = Some(version);
        self.supervisor.ready = true;
        if version == SUPERVISOR_BOOTLOADER_VERSION {
            info!("Supervisor ready (bootloader mode)");
        } else {
            info!("Supervisor ready (firmware {})", version);
        }
        Ok(())
    }

    pub async fn init_fpga(&mut self) -> Result<(), BspError> {
        if self.fpga.ready {
            return Ok(());
        }
        self.require_bus()?;
        if !self.supervisor.ready {
            return Err(BspError::SupervisorNotReady);
        }
        // The FPGA can only be controlled while the supervisor runs its firmware
        if self.supervisor_version == Some(SUPERVISOR_BOOTLOADER_VERSION) {
            return Err(BspError::SupervisorInBootloader);
        }

        let mut control = SupervisorFpgaControl::new(&mut self.supervisor.device, &mut self.delay);

        if let Err(e) = self.fpga.device.init(&mut control).await {
            error!("Initializing FPGA failed: {}", e);
            return Err(BspError::driver(Stage::Fpga, e));
        }

        match control.done().await {
            Ok(false) => {}
            Ok(true) => {
                error!("FPGA indicates done in disabled state");
                return Err(BspError::FpgaDoneWhileDisabled);
            }
            Err(e) => {
                error!("Failed to read FPGA done state: {}", e);
                return Err(BspError::driver(Stage::FpgaDone, e));
            }
        }

        self.fpga.ready = true;
        info!("FPGA ready");
        Ok(())
    }

    pub async fn init_imu(&mut self) -> Result<(), BspError> {
        if self.imu.ready {
            return Ok(());
        }
        self.require_bus()?;

        if let Err(e) = self.imu.device.init().await {
            error!("Initializing IMU failed: {}", e);
            return Err(BspError::driver(Stage::Imu, e));
        }

        self.imu.ready = true;
        info!("IMU ready");
        Ok(())
    }

    pub async fn init_environment(&mut self) -> Result<(), BspError> {
        if self.environment.ready {
            return Ok(());
        }
        self.require_bus()?;

        if let Err(e) = self.environment.device.init().await {
            error!("Initializing environmental sensor failed: {}", e);
            return Err(BspError::driver(Stage::Environment, e));
        }

        self.environment.ready = true;
        info!("Environmental sensor ready");
        Ok(())
    }

    /// Switch the LCD between the main processor and the FPGA.
    pub async fn route_display(&mut self, source: DisplaySource) -> Result<(), BspError> {
        if !self.display.ready {
            return Err(BspError::DisplayNotReady);
        }
        if source == DisplaySource::Fpga && !self.fpga.ready {
            return Err(BspError::FpgaNotReady);
        }

        self.display
            .device
            .set_fpga_mode(source == DisplaySource::Fpga)
            .await
            .map_err(|e| {
                error!("Switching display to {:?} failed: {}", source, e);
                BspError::driver(Stage::DisplayRouting, e)
            })
    }

    fn require_bus(&self) -> Result<(), BspError> {
        if self.bus.ready {
            Ok(())
        } else {
            Err(BspError::BusNotReady)
        }
    }

    pub fn is_bus_ready(&self) -> bool {
        self.bus.ready
    }

    pub fn display(&mut self) -> Option<&mut D::Display> {
        self.display.get()
    }

    pub fn supervisor(&mut self) -> Option<&mut D::Supervisor> {
        self.supervisor.get()
    }

    pub fn fpga(&mut self) -> Option<&mut D::Fpga> {
        self.fpga.get()
    }

    /// The FPGA together with the supervisor-backed control proxy it needs for
    /// reconfiguration.
    pub fn fpga_with_control(
        &mut self,
    ) -> Option<(
        &mut D::Fpga,
        SupervisorFpgaControl<'_, D::Supervisor, D::Delay>,
    )> {
        if !self.fpga.ready {
            return None;
        }
        let control = SupervisorFpgaControl::new(&mut self.supervisor.device, &mut self.delay);
        Some((&mut self.fpga.device, control))
    }

    pub fn imu(&mut self) -> Option<&mut D::Imu> {
        self.imu.get()
    }

    pub fn environment(&mut self) -> Option<&mut D::Environment> {
        self.environment.get()
    }

    /// Cached supervisor firmware version, once the supervisor is ready.
    pub fn supervisor_firmware_version(&self) -> Option<u8> {
        self.supervisor_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::board::testing::{TestBoard, test_board};
    use embassy_futures::block_on;

    #[test]
    fn test_init_is_idempotent() {
        let mut board = test_board(1);

        block_on(board.init_bus()).unwrap();
        block_on(board.init_bus()).unwrap();
        block_on(board.init_supervisor()).unwrap();
        block_on(board.init_supervisor()).unwrap();
        block_on(board.init_display()).unwrap();
        block_on(board.init_display()).unwrap();
        block_on(board.init_fpga()).unwrap();
        block_on(board.init_fpga()).unwrap();
        block_on(board.init_imu()).unwrap();
        block_on(board.init_imu()).unwrap();
        block_on(board.init_environment()).unwrap();
        block_on(board.init_environment()).unwrap();

        assert_eq!(board.bus.device.init_calls, 1);
        assert_eq!(board.supervisor.device.init_calls, 1);
        assert_eq!(board.display.device.init_calls, 1);
        assert_eq!(board.fpga.device.init_calls, 1);
        assert_eq!(board.imu.device.init_calls, 1);
        assert_eq!(board.environment.device.init_calls, 1);
    }

    #[test]
    fn test_devices_require_bus() {
        let mut board = test_board(1);

        assert_eq!(block_on(board.init_display()), Err(BspError::BusNotReady));
        assert_eq!(block_on(board.init_supervisor()), Err(BspError::BusNotReady));
        assert_eq!(block_on(board.init_fpga()), Err(BspError::BusNotReady));
        assert_eq!(block_on(board.init_imu()), Err(BspError::BusNotReady));
        assert_eq!(block_on(board.init_environment()), Err(BspError::BusNotReady));

        assert_eq!(board.display.device.init_calls, 0);
        assert_eq!(board.supervisor.device.init_calls, 0);
        assert_eq!(board.fpga.device.init_calls, 0);
        assert_eq!(board.imu.device.init_calls, 0);
        assert_eq!(board.environment.device.init_calls, 0);
    }

    #[test]
    fn test_fpga_requires_supervisor() {
        let mut board = test_board(1);
        block_on(board.init_bus()).unwrap();

        assert_eq!(
            block_on(board.init_fpga()),
            Err(BspError::SupervisorNotReady)
        );
        assert_eq!(board.fpga.device.init_calls, 0);
        assert_eq!(board.supervisor.device.button_reads, 0);
        assert!(board.supervisor.device.fpga_writes.is_empty());
        assert!(board.fpga().is_none());
    }

    #[test]
    fn test_fpga_refused_in_bootloader_mode() {
        let mut board = test_board(SUPERVISOR_BOOTLOADER_VERSION);
        block_on(board.init_bus()).unwrap();
        block_on(board.init_supervisor()).unwrap();

        assert_eq!(
            block_on(board.init_fpga()),
            Err(BspError::SupervisorInBootloader)
        );
        assert_eq!(board.fpga.device.init_calls, 0);
        assert_eq!(
            board.supervisor_firmware_version(),
            Some(SUPERVISOR_BOOTLOADER_VERSION)
        );
    }

    #[test]
    fn test_fpga_done_while_disabled_is_rejected() {
        let mut board = test_board(1);
        board.supervisor.device.buttons = !FPGA_DONE_BIT;
        block_on(board.init_bus()).unwrap();
        block_on(board.init_supervisor()).unwrap();

        assert_eq!(
            block_on(board.init_fpga()),
            Err(BspError::FpgaDoneWhileDisabled)
        );
        assert!(board.fpga().is_none());
    }

    #[test]
    fn test_fpga_init_holds_reset_through_supervisor() {
        let mut board = test_board(1);
        block_on(board.init_all()).unwrap();

        // The mock FPGA asserts reset during init
        assert_eq!(board.supervisor.device.fpga_writes, [false]);
        assert_eq!(board.delay.total_ms, 100);
        assert!(board.fpga_with_control().is_some());
    }

    #[test]
    fn test_driver_failure_leaves_device_unready() {
        let mut board = test_board(1);
        block_on(board.init_bus()).unwrap();
        board.display.device.fail_init = true;

        assert_eq!(
            block_on(board.init_display()),
            Err(BspError::driver(Stage::Display, DriverError::NotResponding))
        );
        assert!(board.display().is_none());

        // Retrying after the fault clears succeeds
        board.display.device.fail_init = false;
        block_on(board.init_display()).unwrap();
        assert!(board.display().is_some());
        assert_eq!(board.display.device.init_calls, 2);
    }

    #[test]
    fn test_bus_failure_blocks_everything() {
        let mut board = test_board(1);
        board.bus.device.fail_init = true;

        assert_eq!(
            block_on(board.init_all()),
            Err(BspError::driver(Stage::Bus, DriverError::Bus))
        );
        assert!(!board.is_bus_ready());
        assert_eq!(board.supervisor.device.init_calls, 0);
    }

    #[test]
    fn test_bus_retry_after_failure() {
        let mut board = test_board(1);
        board.bus.device.fail_init = true;
        assert!(block_on(board.init_bus()).is_err());

        // Bus layers must survive a failed attempt
        board.bus.device.fail_init = false;
        block_on(board.init_all()).unwrap();
        assert!(board.is_bus_ready());
        assert_eq!(board.bus.device.init_calls, 2);
        assert!(board.display().is_some());
    }

    #[test]
    fn test_supervisor_version_failure() {
        let mut board = test_board(1);
        board.supervisor.device.fail_version = true;
        block_on(board.init_bus()).unwrap();

        assert_eq!(
            block_on(board.init_supervisor()),
            Err(BspError::driver(
                Stage::SupervisorVersion,
                DriverError::Timeout
            ))
        );
        assert!(board.supervisor().is_none());
        assert_eq!(board.supervisor_firmware_version(), None);
    }

    #[test]
    fn test_accessors_gated_by_readiness() {
        let mut board: Board<TestBoard> = test_board(1);
        assert!(board.display().is_none());
        assert!(board.supervisor().is_none());
        assert!(board.imu().is_none());
        assert!(board.environment().is_none());

        block_on(board.init_all()).unwrap();
        assert!(board.display().is_some());
        assert!(board.supervisor().is_some());
        assert!(board.fpga().is_some());
        assert!(board.imu().is_some());
        assert!(board.environment().is_some());
    }

    #[test]
    fn test_route_display() {
        let mut board = test_board(1);
        assert_eq!(
            block_on(board.route_display(DisplaySource::Mcu)),
            Err(BspError::DisplayNotReady)
        );

        block_on(board.init_bus()).unwrap();
        block_on(board.init_display()).unwrap();
        assert_eq!(
            block_on(board.route_display(DisplaySource::Fpga)),
            Err(BspError::FpgaNotReady)
        );

        block_on(board.init_supervisor()).unwrap();
        block_on(board.init_fpga()).unwrap();
        block_on(board.route_display(DisplaySource::Fpga)).unwrap();
        block_on(board.route_display(DisplaySource::Mcu)).unwrap();
        assert_eq!(board.display.device.fpga_mode_writes, [true, false]);
    }
}
