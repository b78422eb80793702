//! Vendor device-type codes.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Hardware models identified by the type code in announcements and in `api/v1/info`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, EnumIter, PartialEq, Eq, Hash)]
pub enum DeviceType {
    SwitchChV1 = 101,
    Bulb = 102,
    ButtonPlus = 103,
    ButtonSmall = 104,
    LedStrip = 105,
    SwitchChV2 = 106,
    SwitchEu = 107,
    MotionSensor = 110,
    Gateway = 112,
    Modulo = 113,
    ButtonPlus2 = 118,
    SwitchZero = 120,
}

impl DeviceType {
    pub fn create(code: u8) -> Option<Self> {
        DeviceType::iter().find(|t| t.code() == code)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Human readable model name.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::SwitchChV1 => "Switch CH v1",
            DeviceType::Bulb => "Bulb",
            DeviceType::ButtonPlus => "Button+ 1st gen",
            DeviceType::ButtonSmall => "Button small/simple",
            DeviceType::LedStrip => "LED Strip",
            DeviceType::SwitchChV2 => "Switch CH v2",
            DeviceType::SwitchEu => "Switch EU",
            DeviceType::MotionSensor => "Motion Sensor",
            DeviceType::Gateway => "Gateway",
            DeviceType::Modulo => "modulo STECCO/CUBO",
            DeviceType::ButtonPlus2 => "Button+ 2nd gen",
            DeviceType::SwitchZero => "Switch Zero",
        }
    }

    /// Which capability set a handle for this model carries.
    pub fn kind(&self) -> DeviceKind {
        match self {
            DeviceType::SwitchChV1
            | DeviceType::SwitchChV2
            | DeviceType::SwitchEu
            | DeviceType::SwitchZero => DeviceKind::Switch,
            DeviceType::Bulb => DeviceKind::Bulb,
            _ => DeviceKind::Generic,
        }
    }
}

/// Capability class of a device handle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceKind {
    /// No capabilities beyond identity, info, settings and Wi-Fi scan.
    #[default]
    Generic,
    /// Relay switch: on/off/toggle, report, temperature, power cycle, timer.
    Switch,
    /// Color bulb: on/off/toggle, color/mode/ramp updates, state.
    Bulb,
}

impl DeviceKind {
    pub fn from_code(code: u8) -> Self {
        DeviceType::create(code).map_or(DeviceKind::Generic, |t| t.kind())
    }
}

/// Model name for any type code, including codes this crate does not know.
pub fn type_name(code: u8) -> String {
    match DeviceType::create(code) {
        Some(t) => t.name().to_string(),
        None => format!("Unknown type: {code}"),
    }
}
