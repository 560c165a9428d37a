use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod cloud;

// Re-export the concrete controller
pub use cloud::CloudHeatPumpController;

/// Error types for device control operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeviceError {
    Rejected(String),
    Offline,
    ConnectionError(String),
    Timeout,
    Unknown(String),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Rejected(msg) => write!(f, "Command rejected: {}", msg),
            DeviceError::Offline => write!(f, "Device offline"),
            DeviceError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DeviceError::Timeout => write!(f, "Request timeout"),
            DeviceError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// One typed field of the vendor's loosely-typed status report.
///
/// The vendor cloud returns device status as code/value string pairs; they are
/// parsed into this variant type once at the controller boundary and never
/// travel further as untyped maps.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusField {
    Power(bool),
    SetTemp(f64),
    WaterTemp(f64),
    Mode(i32),
    FanSpeed(i32),
}

impl StatusField {
    /// Parse a single vendor code/value pair. Unknown codes yield None.
    pub fn parse(code: &str, value: &str) -> Option<StatusField> {
        match code {
            "power" => match value {
                "on" | "1" | "true" => Some(StatusField::Power(true)),
                "off" | "0" | "false" => Some(StatusField::Power(false)),
                _ => None,
            },
            "set_temp" => value.parse().ok().map(StatusField::SetTemp),
            "water_temp" => value.parse().ok().map(StatusField::WaterTemp),
            "mode" => value.parse().ok().map(StatusField::Mode),
            "fan_speed" => value.parse().ok().map(StatusField::FanSpeed),
            _ => None,
        }
    }
}

/// Current state of the heat pump, assembled from parsed status fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub power: bool,
    pub set_temp: Option<f64>,
    pub water_temp: Option<f64>,
    pub mode: Option<i32>,
    pub fan_speed: Option<i32>,
}

impl DeviceStatus {
    /// Fold raw vendor code/value pairs into a typed status. Unparseable
    /// pairs are skipped with a warning.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut status = DeviceStatus::default();
        for (code, value) in pairs {
            match StatusField::parse(code, value) {
                Some(StatusField::Power(on)) => status.power = on,
                Some(StatusField::SetTemp(t)) => status.set_temp = Some(t),
                Some(StatusField::WaterTemp(t)) => status.water_temp = Some(t),
                Some(StatusField::Mode(m)) => status.mode = Some(m),
                Some(StatusField::FanSpeed(s)) => status.fan_speed = Some(s),
                None => {
                    log::warn!("Skipping unrecognized device status pair: {}={}", code, value);
                }
            }
        }
        status
    }
}

/// Narrow interface over the physical heat pump.
///
/// The schedule executor only ever needs these three operations; everything
/// vendor-specific (endpoints, payload shapes, status codes) stays behind it.
#[async_trait]
pub trait DeviceController: Send + Sync {
    /// Turn the pump on or off
    async fn set_power(&self, on: bool) -> Result<(), DeviceError>;

    /// Set the pump's target water temperature in °C
    async fn set_temperature(&self, celsius: f64) -> Result<(), DeviceError>;

    /// Read the pump's current status
    async fn status(&self) -> Result<DeviceStatus, DeviceError>;
}
