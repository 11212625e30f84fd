// report.rs

use chrono::Local;

use crate::*;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One reading as sent to HTTP clients and to the MQTT state topic.
/// Field order is part of the wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TempReport {
    pub temperature: f64,
    pub requestor: String,
    pub time: String,
}

impl TempReport {
    pub fn new(temperature: f64, requestor: &str) -> Self {
        TempReport {
            temperature,
            requestor: requestor.to_string(),
            time: Local::now().format(TIME_FORMAT).to_string(),
        }
    }
}

/// Reads the sensor and returns the serialized report together with the value.
pub fn json_report(config: &MyConfig, requestor: &str) -> Result<(String, f64), ReportError> {
    let temperature = read_temperature(config)?;
    let report = TempReport::new(temperature, requestor);
    Ok((serde_json::to_string(&report)?, temperature))
}


// EOF
