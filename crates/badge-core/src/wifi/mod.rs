//! WiFi station-mode connection handling
//!
//! - [`types`]: credentials, access point records, signal-strength bands
//! - [`station`]: the contract with the vendor station driver
//! - [`fsm`]: the connect/retry state machine
//! - [`manager`]: the shared connection manager built on the two

pub mod fsm;
pub mod manager;
pub mod station;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use fsm::{
    ConnectionFsm, FsmAction, LinkPhase, LinkStatus, ParseRetryLimitError, RetryLimit,
};
pub use manager::{ConnectionManager, MAX_STATUS_WAITERS, SCAN_START_TIMEOUT, WAIT_FOREVER};
pub use station::{ScanConfig, StationConfig, StationError, StationEvent, WifiStation};
pub use types::*;
