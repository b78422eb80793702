//! # mystrom_rs
//!
//! An async Rust library for discovering and controlling myStrom smart-home
//! devices (switches, bulbs, buttons, sensors) on the local network.
//!
//! Devices announce themselves with small UDP broadcasts on port 7979. A
//! [`Listener`] collects those announcements and turns each one into a shared
//! [`Device`] handle through a [`DeviceRegistry`]. Handles talk to the device's
//! REST API over plain HTTP.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mystrom_rs::{DiscoveryConfig, Listener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut listener = Listener::bind(DiscoveryConfig::default()).await?;
//!
//!     for device in listener.find_all().await? {
//!         println!("{device}");
//!         if let Some(switch) = device.as_switch() {
//!             let on = switch.toggle().await?;
//!             println!("  relay is now {}", if on { "on" } else { "off" });
//!         }
//!     }
//!
//!     listener.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Discovery
//!
//! - [`Listener::find_all`] stops once any address announces itself a second
//!   time or no announcement arrives within the receive timeout.
//! - [`Listener::find_continuous`] reports every announcement until dropped.
//! - [`DeviceRegistry::resolve_by_address`] looks up a device by IP directly.
//!
//! ## Capabilities
//!
//! Every handle exposes identity, info, settings and Wi-Fi scan. Switches
//! ([`Device::as_switch`]) and bulbs ([`Device::as_bulb`]) add their own
//! operations; other models stay [`DeviceKind::Generic`].

mod announcement;
mod device;
mod discovery;
mod errors;
mod http;
mod registry;
pub mod runtime;
mod scan;
mod types;

// Re-export public API
pub use announcement::Announcement;
pub use device::{Bulb, Device, DeviceInfo, MAX_DELAY, Switch, WifiNetwork};
pub use discovery::{DISCOVERY_PORT, Datagram, DiscoveryConfig, Listener};
pub use errors::Error;
pub use http::Reply;
pub use registry::{DeviceRegistry, IpPolicy};
pub use scan::{BoundedScan, ScanEvent, ScanStep};
pub use types::{
    BulbState, BulbUpdate, ColorMode, DeviceKind, DeviceType, SwitchReport, Temperature,
    TimerMode, type_name,
};
