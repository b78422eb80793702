//! Bulb state and update types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Color interpretation used by a bulb.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorMode {
    /// `"hue;saturation;value"`
    Hsv,
    /// `"RRGGBB"` or `"WWRRGGBB"` hex
    Rgb,
    /// `"temperature;brightness"`
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BulbAction {
    On,
    Off,
    Toggle,
}

/// State reported by a bulb after an action or a state query.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulbState {
    pub on: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub mode: Option<ColorMode>,
    /// Transition time in milliseconds.
    #[serde(default)]
    pub ramp: Option<u64>,
    /// Current power draw in watts.
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default, rename = "notifyurl")]
    pub notify_url: Option<String>,
}

/// A set of bulb attributes to change in one request. Unset fields are left alone.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mystrom_rs::{BulbUpdate, ColorMode};
///
/// let update = BulbUpdate::new()
///     .color("0;0;100")
///     .mode(ColorMode::Hsv)
///     .ramp(Duration::from_millis(500));
/// assert!(!update.is_empty());
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct BulbUpdate {
    color: Option<String>,
    mode: Option<ColorMode>,
    ramp: Option<u64>,
    #[serde(rename = "notifyurl")]
    notify_url: Option<String>,
}

impl BulbUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn mode(mut self, mode: ColorMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn ramp(mut self, ramp: Duration) -> Self {
        self.ramp = Some(u64::try_from(ramp.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
