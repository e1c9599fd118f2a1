//! WiFi station connection manager
//!
//! Owns the station driver and the [`ConnectionFsm`], and is shared between
//! the application (connect, disconnect, wait, scan) and the driver's event
//! dispatch context ([`ConnectionManager::handle_event`]).
//!
//! Status changes are published on a [`Watch`], so up to
//! [`MAX_STATUS_WAITERS`] waiters can block on a predicate over the current
//! [`LinkStatus`] without polling. Further waiters fall back to polling the
//! status every [`STATUS_POLL_INTERVAL_MS`].

use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex as AsyncMutex, MutexGuard};
use embassy_sync::watch::Watch;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use super::fsm::{ConnectionFsm, FsmAction, LinkPhase, LinkStatus, RetryLimit};
use super::station::{ScanConfig, StationConfig, StationError, StationEvent, WifiStation};
use super::types::{AccessPoint, AuthThreshold, EnterpriseCredentials, IpInfo, PersonalCredentials};

/// Maximum number of tasks blocked on the link status at the same time.
pub const MAX_STATUS_WAITERS: usize = 4;

/// Poll period for waiters beyond [`MAX_STATUS_WAITERS`].
pub const STATUS_POLL_INTERVAL_MS: u32 = 10;

/// Passed to [`ConnectionManager::await_connection`] to wait without a deadline.
pub const WAIT_FOREVER: Duration = Duration::from_ticks(0);

/// How long a scan waits for the station to come up when it had to start it.
pub const SCAN_START_TIMEOUT: Duration = Duration::from_millis(2000);

pub struct ConnectionManager<S, D> {
    station: AsyncMutex<CriticalSectionRawMutex, S>,
    fsm: BlockingMutex<CriticalSectionRawMutex, RefCell<ConnectionFsm>>,
    status: Watch<CriticalSectionRawMutex, LinkStatus, MAX_STATUS_WAITERS>,
    delay: D,
}

impl<S, D> ConnectionManager<S, D>
where
    S: WifiStation,
    D: DelayNs + Clone,
{
    pub fn new(station: S, delay: D) -> Self {
        let status = Watch::new();
        status.sender().send(LinkStatus::default());
        Self {
            station: AsyncMutex::new(station),
            fsm: BlockingMutex::new(RefCell::new(ConnectionFsm::new())),
            status,
            delay,
        }
    }

    /// Connect to a WPA/WPA2/WPA3 personal network and wait for the outcome.
    pub async fn connect(
        &self,
        credentials: &PersonalCredentials,
        auth: AuthThreshold,
        retries: RetryLimit,
    ) -> bool {
        self.connect_async(credentials, auth, retries).await;
        self.await_connection(WAIT_FOREVER).await
    }

    /// Connect to a WPA2-Enterprise network and wait for the outcome.
    pub async fn connect_enterprise(
        &self,
        credentials: &EnterpriseCredentials,
        retries: RetryLimit,
    ) -> bool {
        self.connect_enterprise_async(credentials, retries).await;
        self.await_connection(WAIT_FOREVER).await
    }

    /// Start connecting to a personal network and return right away.
    ///
    /// Setup failures are logged and abort the attempt without being
    /// reported; a subsequent [`Self::await_connection`] then only returns
    /// through its timeout or a [`Self::disconnect`].
    pub async fn connect_async(
        &self,
        credentials: &PersonalCredentials,
        auth: AuthThreshold,
        retries: RetryLimit,
    ) {
        let config = StationConfig::Personal {
            credentials: credentials.clone(),
            auth,
        };
        let mut station = self.restart(retries).await;

        match Self::apply_config(&mut station, &config).await {
            Ok(()) => info!("Connecting to WiFi..."),
            Err(e) => error!("WiFi connection error: {}", e),
        }
    }

    /// Start connecting to a WPA2-Enterprise network and return right away.
    ///
    /// Same failure behavior as [`Self::connect_async`].
    pub async fn connect_enterprise_async(
        &self,
        credentials: &EnterpriseCredentials,
        retries: RetryLimit,
    ) {
        let config = StationConfig::Enterprise(credentials.clone());
        let mut station = self.restart(retries).await;

        match Self::apply_config(&mut station, &config).await {
            Ok(()) => {
                info!(
                    "Connecting to '{}' as '{}'/'{}'",
                    credentials.ssid, credentials.identity, credentials.anonymous_identity
                );
                info!("Phase2 mode: {:?}", credentials.phase2);
            }
            Err(e) => error!("WiFi connection error: {}", e),
        }
    }

    /// Stop any previous connection and reset the state machine for a new
    /// attempt. Returns the locked station for the caller to configure.
    async fn restart(
        &self,
        retries: RetryLimit,
    ) -> MutexGuard<'_, CriticalSectionRawMutex, S> {
        let mut station = self.station.lock().await;
        // Errors only mean there was nothing to tear down
        let _ = station.disconnect().await;
        let _ = station.stop().await;

        self.update(|fsm| fsm.begin_connect(retries));
        station
    }

    async fn apply_config(station: &mut S, config: &StationConfig) -> Result<(), StationError> {
        station.set_station_mode().await?;
        station.configure(config).await?;
        match (station.disable_11b_rates().await, config) {
            (Ok(()), _) => {}
            // Best effort for personal networks
            (Err(e), StationConfig::Personal { .. }) => {
                warn!("Disabling 802.11b rates failed: {}", e);
            }
            (Err(e), StationConfig::Enterprise(_)) => return Err(e),
        }
        station.start().await
    }

    /// Disconnect and do not attempt to reconnect.
    ///
    /// Releases anyone blocked in [`Self::await_connection`].
    pub async fn disconnect(&self) {
        self.update(|fsm| fsm.request_disconnect());
        self.stop_station().await;
    }

    /// Wait for the connection attempt to settle.
    ///
    /// A zero `timeout` ([`WAIT_FOREVER`]) waits indefinitely. Returns `true`
    /// once connected. On failure or timeout the station is stopped and
    /// `false` is returned; an explicit disconnect also yields `false`.
    pub async fn await_connection(&self, timeout: Duration) -> bool {
        let timeout = (timeout != WAIT_FOREVER).then_some(timeout);
        match self.wait_for(LinkStatus::is_settled, timeout).await {
            Some(LinkStatus {
                phase: LinkPhase::Connected,
                ..
            }) => {
                info!("Connected to WiFi");
                true
            }
            Some(LinkStatus {
                phase: LinkPhase::Failed,
                ..
            }) => {
                error!("Failed to connect");
                self.stop_station().await;
                false
            }
            Some(_) => {
                info!("Connection attempt cancelled");
                false
            }
            None => {
                error!("Timed out waiting on connection");
                self.stop_station().await;
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status().phase == LinkPhase::Connected
    }

    pub fn status(&self) -> LinkStatus {
        self.fsm.lock(|fsm| fsm.borrow().status())
    }

    pub fn retry_count(&self) -> u8 {
        self.fsm.lock(|fsm| fsm.borrow().retry_count())
    }

    /// Address configuration from the most recent lease, if any.
    pub fn ip_info(&self) -> Option<IpInfo> {
        self.fsm.lock(|fsm| fsm.borrow().ip_info())
    }

    /// Exclusive access to the underlying station driver.
    pub async fn station(&self) -> MutexGuard<'_, CriticalSectionRawMutex, S> {
        self.station.lock().await
    }

    /// Feed a driver event through the state machine and perform the
    /// resulting driver call.
    pub async fn handle_event(&self, event: StationEvent) {
        let action = self.update(|fsm| fsm.on_event(event));

        match action {
            FsmAction::None => {}
            FsmAction::Connect => {
                if let Err(e) = self.station.lock().await.connect().await {
                    warn!("Reconnect request failed: {}", e);
                }
            }
            FsmAction::Stop => self.stop_station().await,
        }
    }

    /// Scan for access points and return them.
    ///
    /// Starts the station for the duration of the scan if it is not running.
    /// Any failure yields an empty list.
    pub async fn scan(&self) -> Vec<AccessPoint> {
        self.update(|fsm| fsm.set_scanning(true));
        let access_points = self.run_scan().await;
        self.update(|fsm| fsm.set_scanning(false));
        access_points
    }

    /// Scan, log the results and discard them.
    pub async fn scan_count(&self) -> usize {
        self.scan().await.len()
    }

    async fn run_scan(&self) -> Vec<AccessPoint> {
        info!("Starting scan...");

        let mut stop_when_done = false;
        let mut result = self
            .station
            .lock()
            .await
            .scan(&ScanConfig::ALL_CHANNELS)
            .await;

        if result == Err(StationError::NotStarted) {
            info!("Starting WiFi for scan");
            result = match self.start_for_scan().await {
                Ok(()) => {
                    stop_when_done = true;
                    if self
                        .wait_for(|s| s.started, Some(SCAN_START_TIMEOUT))
                        .await
                        .is_none()
                    {
                        warn!("Station did not report started before scanning");
                    }
                    self.station
                        .lock()
                        .await
                        .scan(&ScanConfig::ALL_CHANNELS)
                        .await
                }
                Err(e) => Err(e),
            };
        }

        let access_points = match result {
            Ok(access_points) => access_points,
            Err(StationError::NoMemory) => {
                error!("Out of memory while collecting scan results");
                Vec::new()
            }
            Err(e) => {
                error!("Error in WiFi scan: {}", e);
                Vec::new()
            }
        };

        for access_point in &access_points {
            info!("{}", access_point);
        }

        if stop_when_done {
            // Only started for this scan
            self.stop_station().await;
        }
        access_points
    }

    async fn start_for_scan(&self) -> Result<(), StationError> {
        let mut station = self.station.lock().await;
        station.set_station_mode().await?;
        station.start().await
    }

    async fn stop_station(&self) {
        if let Err(e) = self.station.lock().await.stop().await {
            warn!("Stopping WiFi failed: {}", e);
        }
    }

    /// Wait until the status satisfies `predicate`. `None` means `timeout`
    /// elapsed first.
    async fn wait_for(
        &self,
        predicate: impl Fn(&LinkStatus) -> bool,
        timeout: Option<Duration>,
    ) -> Option<LinkStatus> {
        let Some(mut receiver) = self.status.receiver() else {
            warn!("All WiFi status receivers taken, polling instead");
            return self.poll_for(predicate, timeout).await;
        };
        let wait = receiver.get_and(|status| predicate(status));

        match timeout {
            None => Some(wait.await),
            Some(timeout) => {
                let mut delay = self.delay.clone();
                let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
                match select(wait, delay.delay_ms(millis)).await {
                    Either::First(status) => Some(status),
                    Either::Second(()) => None,
                }
            }
        }
    }

    /// [`Self::wait_for`] without a [`Watch`] receiver.
    async fn poll_for(
        &self,
        predicate: impl Fn(&LinkStatus) -> bool,
        timeout: Option<Duration>,
    ) -> Option<LinkStatus> {
        let mut delay = self.delay.clone();
        let mut remaining_ms = timeout.map(|timeout| timeout.as_millis());
        loop {
            let status = self.status();
            if predicate(&status) {
                return Some(status);
            }
            let step = match remaining_ms.as_mut() {
                Some(0) => return None,
                Some(remaining) => {
                    let step = (*remaining).min(u64::from(STATUS_POLL_INTERVAL_MS));
                    *remaining -= step;
                    step as u32
                }
                None => STATUS_POLL_INTERVAL_MS,
            };
            delay.delay_ms(step).await;
            // Let the event dispatch run even when the delay is immediate
            yield_now().await;
        }
    }

    /// Mutate the state machine and publish the resulting status.
    fn update<R>(&self, f: impl FnOnce(&mut ConnectionFsm) -> R) -> R {
        let (result, status) = self.fsm.lock(|fsm| {
            let mut fsm = fsm.borrow_mut();
            let result = f(&mut fsm);
            (result, fsm.status())
        });
        self.status.sender().send(status);
        result
    }
}
