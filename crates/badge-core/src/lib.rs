//! Hardware-independent core library for the badge
//!
//! This crate contains the platform-agnostic half of the board-support layer:
//! the staged peripheral bring-up sequencer, the WiFi station connection
//! state machine and manager, network configuration, and register-level
//! drivers for the devices hanging off the shared I2C bus.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both the
//! ESP32 target and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod board;
pub mod config;
pub mod drivers;
pub mod error;
pub mod shared_i2c;
pub mod wifi;

pub use error::{BspError, DriverError};
