//! Scriptable station driver and delays for the manager tests

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::future::pending;

use embedded_hal_async::delay::DelayNs;
use heapless::String;

use super::station::{ScanConfig, StationConfig, StationError, WifiStation};
use super::types::{AccessPoint, SSID_MAX_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetMode,
    Configure(String<SSID_MAX_LEN>),
    Disable11b,
    Start,
    Stop,
    Connect,
    Disconnect,
    Scan,
}

#[derive(Default)]
pub struct MockStation {
    pub calls: Vec<Call>,
    pub started: bool,
    pub access_points: Vec<AccessPoint>,
    pub fail_configure: bool,
    pub fail_11b: bool,
    pub scan_error: Option<StationError>,
}

impl MockStation {
    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl WifiStation for MockStation {
    async fn set_station_mode(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::SetMode);
        Ok(())
    }

    async fn configure(&mut self, config: &StationConfig) -> Result<(), StationError> {
        if self.fail_configure {
            return Err(StationError::InvalidConfig);
        }
        let mut ssid = String::new();
        let _ = ssid.push_str(config.ssid());
        self.calls.push(Call::Configure(ssid));
        Ok(())
    }

    async fn disable_11b_rates(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::Disable11b);
        if self.fail_11b {
            Err(StationError::Internal(-1))
        } else {
            Ok(())
        }
    }

    async fn start(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::Start);
        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::Stop);
        self.started = false;
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::Connect);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), StationError> {
        self.calls.push(Call::Disconnect);
        Ok(())
    }

    async fn scan(&mut self, _config: &ScanConfig) -> Result<Vec<AccessPoint>, StationError> {
        self.calls.push(Call::Scan);
        if !self.started {
            return Err(StationError::NotStarted);
        }
        match self.scan_error {
            Some(e) => Err(e),
            None => Ok(self.access_points.clone()),
        }
    }
}

/// Every delay elapses immediately.
#[derive(Clone, Default)]
pub struct InstantDelay;

impl DelayNs for InstantDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// No delay ever elapses.
#[derive(Clone, Default)]
pub struct NeverDelay;

impl DelayNs for NeverDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        pending::<()>().await
    }
}

/// Elapses immediately and records every requested delay, shared across clones.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    requested_ms: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn requested_ms(&self) -> Vec<u32> {
        self.requested_ms.borrow().clone()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.requested_ms.borrow_mut().push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.requested_ms.borrow_mut().push(ms);
    }
}
