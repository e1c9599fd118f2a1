//! Connection state machine
//!
//! Pure bookkeeping: events go in, the action the manager has to perform on
//! the driver comes out. Nothing here touches the radio.

use core::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use super::station::StationEvent;
use super::types::IpInfo;

/// How many times a dropped or failed association is retried.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryLimit {
    Limited(u8),
    Unlimited,
}

impl RetryLimit {
    /// Whether another attempt is allowed after `attempts` retries.
    pub const fn allows(self, attempts: u8) -> bool {
        match self {
            RetryLimit::Limited(max) => attempts < max,
            RetryLimit::Unlimited => true,
        }
    }
}

impl Default for RetryLimit {
    fn default() -> Self {
        RetryLimit::Limited(3)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected a retry count or \"unlimited\"")]
pub struct ParseRetryLimitError;

/// Accepts a count (`"5"`), `"unlimited"`, or an empty string for the default.
impl FromStr for RetryLimit {
    type Err = ParseRetryLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Ok(RetryLimit::default())
        } else if s.eq_ignore_ascii_case("unlimited") {
            Ok(RetryLimit::Unlimited)
        } else {
            s.parse()
                .map(RetryLimit::Limited)
                .map_err(|_| ParseRetryLimitError)
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// No connection requested, or explicitly disconnected.
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Retry budget exhausted.
    Failed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub phase: LinkPhase,
    /// The station interface is running.
    pub started: bool,
}

impl LinkStatus {
    /// Connected, failed, or cancelled by an explicit disconnect.
    pub const fn is_settled(&self) -> bool {
        !matches!(self.phase, LinkPhase::Connecting)
    }
}

/// Driver call the manager owes after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmAction {
    None,
    Connect,
    Stop,
}

#[derive(Debug, Default)]
pub struct ConnectionFsm {
    status: LinkStatus,
    retry_count: u8,
    retry_limit: RetryLimit,
    scanning: bool,
    ip_info: Option<IpInfo>,
}

impl ConnectionFsm {
    pub const fn new() -> Self {
        Self {
            status: LinkStatus {
                phase: LinkPhase::Idle,
                started: false,
            },
            retry_count: 0,
            retry_limit: RetryLimit::Limited(3),
            scanning: false,
            ip_info: None,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    pub fn retry_limit(&self) -> RetryLimit {
        self.retry_limit
    }

    pub fn ip_info(&self) -> Option<IpInfo> {
        self.ip_info
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// While scanning, a station start does not trigger a connect.
    pub fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    /// A new connection was requested; the previous one has been stopped.
    pub fn begin_connect(&mut self, limit: RetryLimit) {
        self.retry_count = 0;
        self.retry_limit = limit;
        self.status = LinkStatus {
            phase: LinkPhase::Connecting,
            started: false,
        };
    }

    /// An explicit disconnect: no retry budget left, nothing to wait for.
    pub fn request_disconnect(&mut self) {
        self.retry_limit = RetryLimit::Limited(0);
        self.status.phase = LinkPhase::Idle;
    }

    pub fn on_event(&mut self, event: StationEvent) -> FsmAction {
        match event {
            StationEvent::Started => {
                self.status.started = true;
                info!("WiFi station start.");
                if !self.scanning && self.status.phase == LinkPhase::Connecting {
                    FsmAction::Connect
                } else {
                    FsmAction::None
                }
            }
            StationEvent::Stopped => {
                self.status.started = false;
                info!("WiFi station stop.");
                FsmAction::None
            }
            StationEvent::Disconnected { reason } => self.on_disconnected(reason),
            StationEvent::GotIp(ip_info) => {
                if self.status.phase == LinkPhase::Idle {
                    warn!("Ignoring address acquired after disconnect");
                    return FsmAction::None;
                }
                info!("IP          : {}", ip_info.ip);
                info!("Netmask     : {}", ip_info.netmask);
                info!("Gateway     : {}", ip_info.gateway);
                self.ip_info = Some(ip_info);
                self.retry_count = 0;
                self.status.phase = LinkPhase::Connected;
                FsmAction::None
            }
        }
    }

    fn on_disconnected(&mut self, reason: u8) -> FsmAction {
        match self.status.phase {
            LinkPhase::Connecting | LinkPhase::Connected => {
                if self.retry_limit.allows(self.retry_count) {
                    self.retry_count = self.retry_count.saturating_add(1);
                    self.status.phase = LinkPhase::Connecting;
                    info!("Retrying connection (reason {})", reason);
                    FsmAction::Connect
                } else {
                    self.status.phase = LinkPhase::Failed;
                    info!("Connection failed (reason {})", reason);
                    FsmAction::Stop
                }
            }
            LinkPhase::Idle | LinkPhase::Failed => FsmAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::Ipv4Addr;

    const DISCONNECTED: StationEvent = StationEvent::Disconnected { reason: 201 };

    fn got_ip() -> StationEvent {
        StationEvent::GotIp(IpInfo {
            ip: Ipv4Addr::new(10, 0, 0, 42),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
        })
    }

    #[test]
    fn test_retry_limit_parse() {
        assert_eq!("5".parse(), Ok(RetryLimit::Limited(5)));
        assert_eq!(" 0 ".parse(), Ok(RetryLimit::Limited(0)));
        assert_eq!("Unlimited".parse(), Ok(RetryLimit::Unlimited));
        assert_eq!("".parse(), Ok(RetryLimit::default()));
        assert_eq!("300".parse::<RetryLimit>(), Err(ParseRetryLimitError));
        assert_eq!("-1".parse::<RetryLimit>(), Err(ParseRetryLimitError));
    }

    fn connecting(limit: RetryLimit) -> ConnectionFsm {
        let mut fsm = ConnectionFsm::new();
        fsm.begin_connect(limit);
        fsm
    }

    #[test]
    fn test_start_triggers_connect() {
        let mut fsm = connecting(RetryLimit::Limited(3));
        assert_eq!(fsm.on_event(StationEvent::Started), FsmAction::Connect);
        assert!(fsm.status().started);
        assert_eq!(fsm.status().phase, LinkPhase::Connecting);
    }

    #[test]
    fn test_start_while_scanning_does_not_connect() {
        let mut fsm = connecting(RetryLimit::Limited(3));
        fsm.set_scanning(true);
        assert_eq!(fsm.on_event(StationEvent::Started), FsmAction::None);
        assert!(fsm.status().started);
    }

    #[test]
    fn test_start_while_idle_does_not_connect() {
        let mut fsm = ConnectionFsm::new();
        assert_eq!(fsm.on_event(StationEvent::Started), FsmAction::None);
    }

    #[test]
    fn test_stop_clears_started() {
        let mut fsm = connecting(RetryLimit::Limited(3));
        fsm.on_event(StationEvent::Started);
        assert_eq!(fsm.on_event(StationEvent::Stopped), FsmAction::None);
        assert!(!fsm.status().started);
    }

    #[test]
    fn test_limited_retries_exhaust_on_extra_disconnect() {
        for max in [0u8, 1, 3, 7] {
            let mut fsm = connecting(RetryLimit::Limited(max));
            fsm.on_event(StationEvent::Started);

            for attempt in 1..=max {
                assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::Connect);
                assert_eq!(fsm.retry_count(), attempt);
                assert_eq!(fsm.status().phase, LinkPhase::Connecting);
            }

            assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::Stop);
            assert_eq!(fsm.status().phase, LinkPhase::Failed);

            // Nothing further happens once failed
            assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::None);
            assert_eq!(fsm.status().phase, LinkPhase::Failed);
        }
    }

    #[test]
    fn test_unlimited_retries_never_fail() {
        let mut fsm = connecting(RetryLimit::Unlimited);
        for _ in 0..1000 {
            assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::Connect);
            assert_eq!(fsm.status().phase, LinkPhase::Connecting);
        }
        assert_eq!(fsm.retry_count(), u8::MAX);
    }

    #[test]
    fn test_got_ip_resets_retry_count() {
        let mut fsm = connecting(RetryLimit::Limited(5));
        fsm.on_event(DISCONNECTED);
        fsm.on_event(DISCONNECTED);
        fsm.on_event(DISCONNECTED);
        assert_eq!(fsm.retry_count(), 3);

        assert_eq!(fsm.on_event(got_ip()), FsmAction::None);
        assert_eq!(fsm.retry_count(), 0);
        assert_eq!(fsm.status().phase, LinkPhase::Connected);
        assert_eq!(fsm.ip_info().map(|i| i.ip), Some(Ipv4Addr::new(10, 0, 0, 42)));
    }

    #[test]
    fn test_connected_link_loss_reconnects() {
        let mut fsm = connecting(RetryLimit::Limited(1));
        fsm.on_event(got_ip());

        assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::Connect);
        assert_eq!(fsm.status().phase, LinkPhase::Connecting);
        assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::Stop);
        assert_eq!(fsm.status().phase, LinkPhase::Failed);
    }

    #[test]
    fn test_explicit_disconnect_suppresses_reconnect() {
        let mut fsm = connecting(RetryLimit::Unlimited);
        fsm.on_event(got_ip());
        fsm.request_disconnect();

        assert_eq!(fsm.retry_limit(), RetryLimit::Limited(0));
        assert_eq!(fsm.status().phase, LinkPhase::Idle);
        assert_eq!(fsm.on_event(DISCONNECTED), FsmAction::None);
        assert_eq!(fsm.on_event(StationEvent::Started), FsmAction::None);
        assert_eq!(fsm.on_event(got_ip()), FsmAction::None);
        assert_eq!(fsm.status().phase, LinkPhase::Idle);
    }

    #[test]
    fn test_begin_connect_resets_state() {
        let mut fsm = connecting(RetryLimit::Limited(0));
        fsm.on_event(StationEvent::Started);
        fsm.on_event(DISCONNECTED);
        assert_eq!(fsm.status().phase, LinkPhase::Failed);

        fsm.begin_connect(RetryLimit::Limited(2));
        assert_eq!(
            fsm.status(),
            LinkStatus {
                phase: LinkPhase::Connecting,
                started: false
            }
        );
        assert_eq!(fsm.retry_count(), 0);
        assert!(!fsm.status().is_settled());
    }
}
