//! Switch readings.

use serde::{Deserialize, Serialize};

/// Output of a switch's `report` endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SwitchReport {
    /// Current power draw in watts.
    pub power: f64,
    /// Average power over the last measurement period, in watts.
    #[serde(default, rename = "Ws")]
    pub ws: Option<f64>,
    pub relay: bool,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Output of a switch's `api/v1/temperature` endpoint, in degrees Celsius.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub measured: f64,
    pub compensation: f64,
    pub compensated: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_report() {
        let report: SwitchReport = serde_json::from_value(json!({
            "power": 12.3,
            "Ws": 11.9,
            "relay": true,
            "temperature": 23.1
        }))
        .unwrap();
        assert!(report.relay);
        assert_eq!(report.ws, Some(11.9));
    }

    #[test]
    fn test_parse_report_first_gen() {
        // CH v1 switches report neither Ws nor temperature
        let report: SwitchReport =
            serde_json::from_value(json!({"power": 0.0, "relay": false})).unwrap();
        assert!(!report.relay);
        assert_eq!(report.temperature, None);
    }
}
