//! Driver events into the connection manager
//!
//! esp-radio invokes its event handlers from the radio task, where nothing
//! may block. They only queue a [`StationEvent`]; [`pump_events`] hands the
//! queue to the manager from an ordinary embassy task.

use core::net::Ipv4Addr;

use badge_core::wifi::{IpInfo, StationEvent};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_radio::wifi::event::{self, EventExt};
use log::{info, warn};

use super::Manager;

pub static STATION_EVENTS: Channel<CriticalSectionRawMutex, StationEvent, 8> = Channel::new();

fn post(event: StationEvent) {
    if STATION_EVENTS.try_send(event).is_err() {
        warn!("WiFi event queue full, dropped {:?}", event);
    }
}

/// Route the station events the manager cares about into [`STATION_EVENTS`].
pub fn install_event_handlers() {
    event::StaStart::update_handler(|_| post(StationEvent::Started));
    event::StaStop::update_handler(|_| post(StationEvent::Stopped));
    event::StaDisconnected::update_handler(|event| {
        post(StationEvent::Disconnected {
            reason: event.reason(),
        })
    });
}

pub async fn pump_events(manager: &Manager) -> ! {
    loop {
        let event = STATION_EVENTS.receive().await;
        manager.handle_event(event).await;
    }
}

/// Report every DHCP lease as a got-IP event.
pub async fn watch_ip(stack: Stack<'_>) -> ! {
    loop {
        stack.wait_config_up().await;
        match stack.config_v4() {
            Some(config) => post(StationEvent::GotIp(IpInfo {
                ip: config.address.address(),
                netmask: config.address.netmask(),
                gateway: config.gateway.unwrap_or(Ipv4Addr::UNSPECIFIED),
            })),
            None => info!("Network up without an IPv4 configuration"),
        }
        stack.wait_config_down().await;
    }
}
