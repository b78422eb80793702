//! Device handles and their capability views.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;
use crate::http::{HttpClient, Reply};
use crate::types::{
    BulbAction, BulbState, BulbUpdate, DeviceKind, SwitchReport, Temperature, TimerMode,
    type_name,
};

type Result<T> = std::result::Result<T, Error>;

/// Upper bound for power-cycle and timer durations.
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

/// Output of a device's `api/v1/info` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceInfo {
    pub mac: String,
    #[serde(rename = "type")]
    pub type_code: u64,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: Option<bool>,
}

/// A network seen in a device's Wi-Fi scan.
#[derive(Debug, Clone, PartialEq)]
pub struct WifiNetwork {
    pub ssid: String,
    pub signal: Value,
}

#[derive(Debug)]
struct DeviceState {
    ip: IpAddr,
    name: Option<String>,
    version: Option<String>,
    settings: HashMap<String, Value>,
}

/// The in-process handle for one physical device.
///
/// Handles are created by a [`DeviceRegistry`](crate::DeviceRegistry), one per MAC,
/// and shared behind an `Arc`. The MAC and type code never change; the IP,
/// display name, firmware version and settings cache do.
#[derive(Debug)]
pub struct Device {
    mac: String,
    type_code: u8,
    kind: DeviceKind,
    state: RwLock<DeviceState>,
    http: HttpClient,
}

impl Device {
    pub(crate) fn new(mac: &str, ip: IpAddr, type_code: u8, http: HttpClient) -> Self {
        Device {
            mac: mac.to_string(),
            type_code,
            kind: DeviceKind::from_code(type_code),
            state: RwLock::new(DeviceState {
                ip,
                name: None,
                version: None,
                settings: HashMap::new(),
            }),
            http,
        }
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn type_code(&self) -> u8 {
        self.type_code
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn type_name(&self) -> String {
        type_name(self.type_code)
    }

    /// Last known address.
    pub fn ip(&self) -> IpAddr {
        self.state.read().ip
    }

    /// Returns `true` if the address changed.
    pub(crate) fn set_ip(&self, ip: IpAddr) -> bool {
        let mut state = self.state.write();
        if state.ip == ip {
            return false;
        }
        state.ip = ip;
        true
    }

    /// Display name from the settings, or the model name until settings were fetched.
    pub fn name(&self) -> String {
        self.state.read().name.clone().unwrap_or_else(|| self.type_name())
    }

    /// Firmware version, once [`fetch_info`](Self::fetch_info) succeeded.
    pub fn version(&self) -> Option<String> {
        self.state.read().version.clone()
    }

    pub(crate) fn set_version(&self, version: String) {
        self.state.write().version = Some(version);
    }

    /// Cached settings; empty until [`fetch_settings`](Self::fetch_settings) succeeded.
    pub fn settings(&self) -> HashMap<String, Value> {
        self.state.read().settings.clone()
    }

    pub fn identity_string(&self) -> String {
        self.to_string()
    }

    pub fn as_switch(&self) -> Option<Switch<'_>> {
        (self.kind == DeviceKind::Switch).then_some(Switch(self))
    }

    pub fn as_bulb(&self) -> Option<Bulb<'_>> {
        (self.kind == DeviceKind::Bulb).then_some(Bulb(self))
    }

    /// Raw `GET` against the device's API.
    pub async fn api_get(&self, path: &str) -> Result<Reply> {
        self.http.get(self.ip(), path).await
    }

    /// Raw form-encoded `POST` against the device's API.
    pub async fn api_post<F>(&self, path: &str, form: &F) -> Result<Reply>
    where
        F: Serialize + ?Sized,
    {
        self.http.post_form(self.ip(), path, form).await
    }

    pub async fn fetch_info(&self) -> Result<DeviceInfo> {
        let info: DeviceInfo = self.http.get_json(self.ip(), "api/v1/info").await?;
        self.state.write().version.clone_from(&info.version);
        Ok(info)
    }

    /// Fetches the settings and replaces the cache with them.
    pub async fn fetch_settings(&self) -> Result<HashMap<String, Value>> {
        let settings: HashMap<String, Value> =
            self.http.get_json(self.ip(), "api/v1/settings").await?;

        let mut state = self.state.write();
        if let Some(name) = settings
            .get("name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
        {
            state.name = Some(name.to_string());
        }
        state.settings = settings.clone();
        Ok(settings)
    }

    pub async fn update_settings(&self, settings: &HashMap<String, Value>) -> Result<Reply> {
        self.http
            .post_json(self.ip(), "api/v1/settings", settings)
            .await
    }

    /// Networks visible to the device, in the order it reports them.
    pub async fn wifi_networks(&self) -> Result<Vec<WifiNetwork>> {
        let flat: Vec<Value> = self.http.get_json(self.ip(), "api/v1/scan").await?;
        Ok(pair_up(flat))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<MyStromDevice '{}' \"{}\" {} @ {}>",
            self.type_name(),
            self.name(),
            self.mac,
            self.ip()
        )
    }
}

/// `api/v1/scan` answers `[ssid, signal, ssid, signal, ...]`.
fn pair_up(flat: Vec<Value>) -> Vec<WifiNetwork> {
    let mut networks = Vec::with_capacity(flat.len() / 2);
    let mut items = flat.into_iter();
    while let (Some(ssid), Some(signal)) = (items.next(), items.next()) {
        let ssid = match ssid {
            Value::String(s) => s,
            other => other.to_string(),
        };
        networks.push(WifiNetwork { ssid, signal });
    }
    networks
}

fn capped(delay: Duration) -> u64 {
    delay.min(MAX_DELAY).as_secs()
}

#[derive(Deserialize)]
struct RelayState {
    relay: bool,
}

/// Switch capability of a [`Device`].
#[derive(Debug, Clone, Copy)]
pub struct Switch<'a>(&'a Device);

impl<'a> Switch<'a> {
    pub fn device(&self) -> &'a Device {
        self.0
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_relay(true).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_relay(false).await
    }

    /// Flips the relay and returns its new state.
    pub async fn toggle(&self) -> Result<bool> {
        let state: RelayState = self.0.http.get_json(self.0.ip(), "toggle").await?;
        info!("{} relay toggled to {}", self.0.mac, state.relay);
        Ok(state.relay)
    }

    pub async fn report(&self) -> Result<SwitchReport> {
        self.0.http.get_json(self.0.ip(), "report").await
    }

    pub async fn temperature(&self) -> Result<Temperature> {
        self.0.http.get_json(self.0.ip(), "api/v1/temperature").await
    }

    /// Switches off, then back on after `delay` (at most [`MAX_DELAY`]).
    pub async fn power_cycle(&self, delay: Duration) -> Result<Reply> {
        let path = format!("power_cycle?time={}", capped(delay));
        self.0.http.get(self.0.ip(), &path).await
    }

    /// Applies `mode` for `duration` (at most [`MAX_DELAY`]), after which the relay reverts.
    pub async fn timer(&self, mode: TimerMode, duration: Duration) -> Result<Reply> {
        let path = format!("timer?mode={}&time={}", mode, capped(duration));
        self.0.http.post(self.0.ip(), &path).await
    }

    async fn set_relay(&self, on: bool) -> Result<()> {
        let path = format!("relay?state={}", u8::from(on));
        self.0.http.get(self.0.ip(), &path).await?;
        debug!("{} relay set to {}", self.0.mac, on);
        Ok(())
    }
}

/// Bulb capability of a [`Device`].
#[derive(Debug, Clone, Copy)]
pub struct Bulb<'a>(&'a Device);

impl<'a> Bulb<'a> {
    pub fn device(&self) -> &'a Device {
        self.0
    }

    pub async fn turn_on(&self) -> Result<BulbState> {
        self.action(BulbAction::On).await
    }

    pub async fn turn_off(&self) -> Result<BulbState> {
        self.action(BulbAction::Off).await
    }

    pub async fn toggle(&self) -> Result<BulbState> {
        self.action(BulbAction::Toggle).await
    }

    pub async fn set(&self, update: &BulbUpdate) -> Result<BulbState> {
        let (status, reply) = self
            .0
            .http
            .post_form_with_status(self.0.ip(), &self.path(), update)
            .await?;
        self.unwrap_state(status, reply)
    }

    pub async fn state(&self) -> Result<BulbState> {
        let (status, reply) = self.0.http.get_with_status(self.0.ip(), &self.path()).await?;
        self.unwrap_state(status, reply)
    }

    async fn action(&self, action: BulbAction) -> Result<BulbState> {
        let form = [("action", action.to_string())];
        let (status, reply) = self
            .0
            .http
            .post_form_with_status(self.0.ip(), &self.path(), &form)
            .await?;
        self.unwrap_state(status, reply)
    }

    fn path(&self) -> String {
        format!("api/v1/device/{}", self.0.mac.to_uppercase())
    }

    /// Bulbs answer `{"<MAC>": {...state...}}`; accept a bare state object too.
    fn unwrap_state(&self, status: u16, reply: Reply) -> Result<BulbState> {
        let reply = match reply {
            Reply::Json(Value::Object(mut map)) => {
                let key = map
                    .keys()
                    .find(|key| key.eq_ignore_ascii_case(&self.0.mac))
                    .cloned();
                match key.and_then(|key| map.remove(&key)) {
                    Some(inner) => Reply::Json(inner),
                    None => Reply::Json(Value::Object(map)),
                }
            }
            other => other,
        };
        reply.decode(status)
    }
}
