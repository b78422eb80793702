//! Value types for device identity and control parameters.

mod bulb;
mod device_type;
mod switch;
mod timer;

pub(crate) use bulb::BulbAction;
pub use bulb::{BulbState, BulbUpdate, ColorMode};
pub use device_type::{DeviceKind, DeviceType, type_name};
pub use switch::{SwitchReport, Temperature};
pub use timer::TimerMode;
