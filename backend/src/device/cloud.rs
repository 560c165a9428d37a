//! HTTP-backed heat pump controller for the vendor cloud API.
//!
//! Commands and status reads go through a small REST surface with a bearer
//! token. Every request carries a bounded timeout so a stuck device
//! connection cannot stall a whole executor run.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{DeviceController, DeviceError, DeviceStatus};

/// Per-request timeout. Device commands are slow but not minutes-slow.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Deserialize, Debug)]
struct StatusPair {
    code: String,
    value: String,
}

#[derive(Deserialize, Debug)]
struct StatusResponse {
    fields: Vec<StatusPair>,
}

pub struct CloudHeatPumpController {
    client: reqwest::Client,
    base_url: String,
    device_id: String,
    token: String,
}

impl CloudHeatPumpController {
    pub fn new(base_url: &str, device_id: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            device_id: device_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Build a controller from the DEVICE_API_URL, DEVICE_ID and
    /// DEVICE_API_TOKEN environment variables.
    pub fn from_env() -> Result<Self, String> {
        let base_url = std::env::var("DEVICE_API_URL")
            .map_err(|_| "DEVICE_API_URL environment variable is not set".to_string())?;
        let device_id = std::env::var("DEVICE_ID")
            .map_err(|_| "DEVICE_ID environment variable is not set".to_string())?;
        let token = std::env::var("DEVICE_API_TOKEN")
            .map_err(|_| "DEVICE_API_TOKEN environment variable is not set".to_string())?;
        Ok(Self::new(&base_url, &device_id, &token))
    }

    async fn post_command(&self, body: serde_json::Value) -> Result<(), DeviceError> {
        let url = format!("{}/devices/{}/control", self.base_url, self.device_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.as_u16() == 503 {
            Err(DeviceError::Offline)
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(DeviceError::Rejected(format!(
                "device API returned {}: {}",
                status, detail
            )))
        }
    }
}

fn map_request_error(e: reqwest::Error) -> DeviceError {
    if e.is_timeout() {
        DeviceError::Timeout
    } else if e.is_connect() {
        DeviceError::ConnectionError(e.to_string())
    } else {
        DeviceError::Unknown(e.to_string())
    }
}

#[async_trait]
impl DeviceController for CloudHeatPumpController {
    async fn set_power(&self, on: bool) -> Result<(), DeviceError> {
        log::info!("Setting pump power: {}", if on { "on" } else { "off" });
        self.post_command(serde_json::json!({
            "command": "power",
            "value": if on { "on" } else { "off" },
        }))
        .await
    }

    async fn set_temperature(&self, celsius: f64) -> Result<(), DeviceError> {
        log::info!("Setting pump target temperature: {:.1}°C", celsius);
        self.post_command(serde_json::json!({
            "command": "set_temp",
            "value": celsius,
        }))
        .await
    }

    async fn status(&self) -> Result<DeviceStatus, DeviceError> {
        let url = format!("{}/devices/{}/status", self.base_url, self.device_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 503 {
                return Err(DeviceError::Offline);
            }
            return Err(DeviceError::Rejected(format!(
                "device API returned {}",
                status
            )));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| DeviceError::Unknown(format!("malformed status response: {}", e)))?;

        Ok(DeviceStatus::from_pairs(
            parsed
                .fields
                .iter()
                .map(|p| (p.code.as_str(), p.value.as_str())),
        ))
    }
}
