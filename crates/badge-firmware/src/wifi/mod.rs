//! esp-radio backend for the badge connection manager

mod events;
mod station;

pub use events::{STATION_EVENTS, install_event_handlers, pump_events, watch_ip};
pub use station::EspStation;

use badge_core::wifi::ConnectionManager;
use embassy_time::Delay;

pub type Manager = ConnectionManager<EspStation, Delay>;
