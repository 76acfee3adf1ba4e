//! Device client - HTTP JSON API of the LED strip controller
//!
//! Endpoints:
//! - `GET  /api/config`, `POST /api/config`
//! - `GET  /api/status`
//! - `POST /api/mode`, `/api/brightness`, `/api/color`, `/api/led`

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::config::DeviceSettings;
use crate::error::DeviceError;
use crate::models::{
    BrightnessRequest, DeviceConfig, DeviceStatus, LedRequest, ModeRequest, Rgb,
    SaveConfigRequest,
};

const CONFIG_PATH: &str = "/api/config";
const STATUS_PATH: &str = "/api/status";
const MODE_PATH: &str = "/api/mode";
const BRIGHTNESS_PATH: &str = "/api/brightness";
const COLOR_PATH: &str = "/api/color";
const LED_PATH: &str = "/api/led";

/// Operations the synchronizer needs from a device
#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn fetch_config(&self) -> Result<DeviceConfig, DeviceError>;

    async fn save_config(&self, request: &SaveConfigRequest) -> Result<(), DeviceError>;

    async fn fetch_status(&self) -> Result<DeviceStatus, DeviceError>;

    async fn set_mode(&self, mode: u8) -> Result<(), DeviceError>;

    async fn set_brightness(&self, brightness: u8) -> Result<(), DeviceError>;

    async fn set_color(&self, color: Rgb) -> Result<(), DeviceError>;

    async fn set_led(&self, request: &LedRequest) -> Result<(), DeviceError>;
}

/// reqwest-backed client for a controller at `base_url`
#[derive(Clone)]
pub struct HttpDeviceClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpDeviceClient {
    pub fn new(settings: &DeviceSettings) -> Result<Self, DeviceError> {
        let base_url = Url::parse(&settings.base_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .build()
            .unwrap_or_default();

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &'static str) -> Result<Url, DeviceError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, DeviceError> {
        let resp = self
            .http_client
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|source| DeviceError::Request {
                endpoint: path,
                source,
            })?;

        let resp = check_status(path, resp)?;

        resp.json()
            .await
            .map_err(|source| DeviceError::Request {
                endpoint: path,
                source,
            })
    }

    /// POST a JSON body; the response body is ignored
    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<(), DeviceError> {
        let resp = self
            .http_client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(|source| DeviceError::Request {
                endpoint: path,
                source,
            })?;

        check_status(path, resp)?;
        Ok(())
    }
}

fn check_status(
    endpoint: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, DeviceError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        tracing::debug!("{} returned {}", endpoint, status);
        Err(DeviceError::Status { endpoint, status })
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceClient {
    async fn fetch_config(&self) -> Result<DeviceConfig, DeviceError> {
        self.get_json(CONFIG_PATH).await
    }

    async fn save_config(&self, request: &SaveConfigRequest) -> Result<(), DeviceError> {
        self.post_json(CONFIG_PATH, request).await
    }

    async fn fetch_status(&self) -> Result<DeviceStatus, DeviceError> {
        self.get_json(STATUS_PATH).await
    }

    async fn set_mode(&self, mode: u8) -> Result<(), DeviceError> {
        self.post_json(MODE_PATH, &ModeRequest { mode }).await
    }

    async fn set_brightness(&self, brightness: u8) -> Result<(), DeviceError> {
        self.post_json(BRIGHTNESS_PATH, &BrightnessRequest { brightness })
            .await
    }

    async fn set_color(&self, color: Rgb) -> Result<(), DeviceError> {
        self.post_json(COLOR_PATH, &color).await
    }

    async fn set_led(&self, request: &LedRequest) -> Result<(), DeviceError> {
        self.post_json(LED_PATH, request).await
    }
}
