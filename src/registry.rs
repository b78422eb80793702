//! MAC-keyed table of device handles.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;

use crate::announcement::normalize_mac;
use crate::device::{Device, DeviceInfo};
use crate::errors::Error;
use crate::http::HttpClient;

type Result<T> = std::result::Result<T, Error>;

/// What [`DeviceRegistry::resolve`] does when a known MAC shows up at a new address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpPolicy {
    /// Keep the address the device was first seen at.
    Keep,
    /// Move the handle to the most recently observed address.
    #[default]
    Update,
}

/// Owns one [`Device`] handle per MAC address.
///
/// The registry is an explicit object: a [`Listener`](crate::Listener) creates
/// its own by default, or several listeners and direct lookups can share one
/// through an `Arc`. Handles live as long as the registry.
///
/// # Example
///
/// ```
/// use mystrom_rs::{DeviceKind, DeviceRegistry};
///
/// let registry = DeviceRegistry::new().unwrap();
/// let a = registry.resolve("64006a1fab09", "192.168.1.20".parse().unwrap(), 106);
/// let b = registry.resolve("64006a1fab09", "192.168.1.20".parse().unwrap(), 106);
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(a.kind(), DeviceKind::Switch);
/// ```
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, Arc<Device>>>,
    ip_policy: IpPolicy,
    http: HttpClient,
}

impl DeviceRegistry {
    pub fn new() -> Result<Self> {
        Ok(DeviceRegistry {
            devices: Mutex::new(HashMap::new()),
            ip_policy: IpPolicy::default(),
            http: HttpClient::new(HttpClient::DEFAULT_PORT, HttpClient::DEFAULT_TIMEOUT)?,
        })
    }

    pub fn with_ip_policy(mut self, ip_policy: IpPolicy) -> Self {
        self.ip_policy = ip_policy;
        self
    }

    /// Talk HTTP to devices on another port and with another request timeout.
    ///
    /// Only affects handles created after the call.
    pub fn with_http(mut self, port: u16, timeout: Duration) -> Result<Self> {
        self.http = HttpClient::new(port, timeout)?;
        Ok(self)
    }

    pub fn ip_policy(&self) -> IpPolicy {
        self.ip_policy
    }

    /// Returns the handle for `mac`, creating it on first sight.
    ///
    /// The type code only matters when the handle is created. For a known MAC,
    /// `ip` is applied according to the registry's [`IpPolicy`].
    pub fn resolve(&self, mac: &str, ip: IpAddr, type_code: u8) -> Arc<Device> {
        let mut devices = self.devices.lock();

        if let Some(device) = devices.get(mac) {
            if self.ip_policy == IpPolicy::Update && device.set_ip(ip) {
                info!("Device {} moved to {}", mac, ip);
            }
            return Arc::clone(device);
        }

        let device = Arc::new(Device::new(mac, ip, type_code, self.http.clone()));
        debug!("Registered {}", device);
        devices.insert(mac.to_string(), Arc::clone(&device));
        device
    }

    /// Asks the device at `ip` who it is, then resolves it like an announcement would.
    ///
    /// # Errors
    ///
    /// [`Error::UnreachableDevice`] if the info request fails, and
    /// [`Error::InvalidDeviceResponse`] if the reply lacks a usable MAC or type code.
    pub async fn resolve_by_address(&self, ip: IpAddr) -> Result<Arc<Device>> {
        // No lock is held across the request.
        let info: DeviceInfo = match self.http.get_json(ip, "api/v1/info").await {
            Ok(info) => info,
            Err(Error::Http(err)) => return Err(Error::UnreachableDevice { ip, err }),
            Err(Error::DeviceCommunication { status, body }) => {
                return Err(Error::InvalidDeviceResponse(format!("status {status}: {body}")));
            }
            Err(e) => return Err(e),
        };

        let mac = normalize_mac(&info.mac)
            .ok_or_else(|| Error::InvalidDeviceResponse(format!("bad mac {:?}", info.mac)))?;
        let type_code = u8::try_from(info.type_code).map_err(|_| {
            Error::InvalidDeviceResponse(format!("type code {} out of range", info.type_code))
        })?;

        let device = self.resolve(&mac, ip, type_code);
        if let Some(version) = info.version {
            device.set_version(version);
        }
        Ok(device)
    }

    pub fn get(&self, mac: &str) -> Option<Arc<Device>> {
        self.devices.lock().get(mac).cloned()
    }

    /// Snapshot of all known handles, in no particular order.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceKind;
    use mockito::Server;
    use std::net::SocketAddr;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn registry_for(server: &Server) -> (DeviceRegistry, IpAddr) {
        let addr: SocketAddr = server.host_with_port().parse().unwrap();
        let registry = DeviceRegistry::new()
            .unwrap()
            .with_http(addr.port(), Duration::from_secs(2))
            .unwrap();
        (registry, addr.ip())
    }

    #[test]
    fn test_same_mac_same_handle() {
        let registry = DeviceRegistry::new().unwrap();
        let first = registry.resolve("aabbccddeeff", ip("10.0.0.2"), 106);
        let again = registry.resolve("aabbccddeeff", ip("10.0.0.2"), 106);
        let other_ip = registry.resolve("aabbccddeeff", ip("10.0.0.3"), 106);
        let other_code = registry.resolve("aabbccddeeff", ip("10.0.0.2"), 102);

        assert!(Arc::ptr_eq(&first, &again));
        assert!(Arc::ptr_eq(&first, &other_ip));
        assert!(Arc::ptr_eq(&first, &other_code));
        assert_eq!(first.kind(), DeviceKind::Switch);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_macs() {
        let registry = DeviceRegistry::new().unwrap();
        let a = registry.resolve("aabbccddee01", ip("10.0.0.2"), 106);
        let b = registry.resolve("aabbccddee02", ip("10.0.0.2"), 102);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("aabbccddee02").is_some());
        assert!(registry.get("000000000000").is_none());
    }

    #[test]
    fn test_unknown_code_is_generic() {
        let registry = DeviceRegistry::new().unwrap();
        for code in [0u8, 42, 108, 200, 255] {
            let mac = format!("0000000000{code:02x}");
            let device = registry.resolve(&mac, ip("10.0.0.9"), code);
            assert_eq!(device.kind(), DeviceKind::Generic);
            assert_eq!(device.type_name(), format!("Unknown type: {code}"));
            assert!(device.as_switch().is_none());
            assert!(device.as_bulb().is_none());
        }
    }

    #[test]
    fn test_update_policy_moves_ip() {
        let registry = DeviceRegistry::new().unwrap();
        assert_eq!(registry.ip_policy(), IpPolicy::Update);
        let device = registry.resolve("aabbccddeeff", ip("10.0.0.2"), 107);
        registry.resolve("aabbccddeeff", ip("10.0.0.77"), 107);
        assert_eq!(device.ip(), ip("10.0.0.77"));
    }

    #[test]
    fn test_keep_policy_keeps_ip() {
        let registry = DeviceRegistry::new().unwrap().with_ip_policy(IpPolicy::Keep);
        let device = registry.resolve("aabbccddeeff", ip("10.0.0.2"), 107);
        registry.resolve("aabbccddeeff", ip("10.0.0.77"), 107);
        assert_eq!(device.ip(), ip("10.0.0.2"));
    }

    #[test]
    fn test_concurrent_resolve_creates_one_handle() {
        let registry = Arc::new(DeviceRegistry::new().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.resolve("aabbccddeeff", ip(&format!("10.0.0.{i}")), 106)
                })
            })
            .collect();

        let devices: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(devices.iter().all(|d| Arc::ptr_eq(d, &devices[0])));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_by_address() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/info")
            .with_body(r#"{"version": "3.82.60", "mac": "64006A1FAB09", "type": 106, "ssid": "home", "ip": "192.168.1.20", "connected": true}"#)
            .create_async()
            .await;

        let (registry, addr) = registry_for(&server);
        let device = registry.resolve_by_address(addr).await.unwrap();
        assert_eq!(device.mac(), "64006a1fab09");
        assert_eq!(device.kind(), DeviceKind::Switch);
        assert_eq!(device.ip(), addr);
        assert_eq!(device.version().as_deref(), Some("3.82.60"));

        // A later broadcast for the same MAC lands on the same handle.
        let announced = registry.resolve("64006a1fab09", addr, 106);
        assert!(Arc::ptr_eq(&device, &announced));
    }

    #[tokio::test]
    async fn test_resolve_by_address_missing_fields() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/info")
            .with_body(r#"{"version": "3.82.60", "ip": "192.168.1.20"}"#)
            .create_async()
            .await;

        let (registry, addr) = registry_for(&server);
        let err = registry.resolve_by_address(addr).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDeviceResponse(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_by_address_bad_type_code() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/info")
            .with_body(r#"{"mac": "64006A1FAB09", "type": 4096}"#)
            .create_async()
            .await;

        let (registry, addr) = registry_for(&server);
        let err = registry.resolve_by_address(addr).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDeviceResponse(_)));
    }

    #[tokio::test]
    async fn test_resolve_by_address_unreachable() {
        // Grab a free port and release it so nothing is listening there.
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let registry = DeviceRegistry::new()
            .unwrap()
            .with_http(port, Duration::from_secs(2))
            .unwrap();

        let err = registry
            .resolve_by_address(ip("127.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnreachableDevice { .. }));
    }
}
