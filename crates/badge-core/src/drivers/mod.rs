//! Register-level drivers for the devices on the shared I2C bus
//!
//! These only cover what bring-up needs: probing, resetting into a known
//! state, and the supervisor registers that proxy the FPGA lines.

mod bme680;
mod bno055;
mod rp2040;

pub use bme680::Bme680;
pub use bno055::Bno055;
pub use rp2040::Rp2040;
