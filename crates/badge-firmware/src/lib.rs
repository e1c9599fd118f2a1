//! ESP32 firmware-specific modules for the badge
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: esp-hal bus setup, the SPI peripherals, the esp-radio station
//! adapter, and the tasks that feed driver events into `badge_core`.

#![no_std]

extern crate alloc;

pub mod board;
pub mod provisioning;
pub mod wifi;
