//! Relay timer modes for switches.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// What a switch does when a timer starts; the relay reverts when it expires.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimerMode {
    On,
    Off,
    Toggle,
    /// Cancels a running timer.
    None,
}
