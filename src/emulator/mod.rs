//! Device emulator - in-memory LED controller serving the device HTTP API
//!
//! Used for local development (`ledstrip-panel emulate`) and by the client
//! and synchronizer tests.

mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;

use crate::config::EmulatorSettings;
use crate::models::{DeviceConfig, Rgb, StripConfig};

/// Heap bytes consumed per enabled LED (one RGB frame buffer entry)
const BYTES_PER_LED: u32 = 3;

/// Mutable state of the emulated device
#[derive(Debug)]
pub struct EmulatedDevice {
    pub config: DeviceConfig,
    pub color: Rgb,
    /// Manually addressed pixels keyed by (strip index, led index)
    pub pixels: HashMap<(u8, u16), Rgb>,
    base_free_heap: u32,
}

impl EmulatedDevice {
    pub fn free_heap(&self) -> u32 {
        self.base_free_heap
            .saturating_sub(self.config.total_leds() * BYTES_PER_LED)
    }
}

/// Shared emulator state
#[derive(Clone)]
pub struct EmulatorState {
    pub device: Arc<RwLock<EmulatedDevice>>,
}

impl EmulatorState {
    pub fn new(settings: &EmulatorSettings) -> Self {
        let strips = settings
            .pins
            .iter()
            .enumerate()
            .map(|(index, &pin)| StripConfig {
                pin,
                led_count: settings.led_count,
                enabled: index == 0,
            })
            .collect();

        let device = EmulatedDevice {
            config: DeviceConfig {
                strips,
                ..Default::default()
            },
            color: Rgb::new(255, 255, 255),
            pixels: HashMap::new(),
            base_free_heap: settings.free_heap,
        };

        Self {
            device: Arc::new(RwLock::new(device)),
        }
    }
}

pub fn router(state: EmulatorState) -> Router {
    Router::new()
        .route("/api/config", get(handlers::get_config))
        .route("/api/config", post(handlers::save_config))
        .route("/api/status", get(handlers::get_status))
        .route("/api/mode", post(handlers::set_mode))
        .route("/api/brightness", post(handlers::set_brightness))
        .route("/api/color", post(handlers::set_color))
        .route("/api/led", post(handlers::set_led))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> (Router, EmulatorState) {
        let state = EmulatorState::new(&EmulatorSettings::default());
        (router(state.clone()), state)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_initial_config() {
        let (app, _) = test_router();
        let resp = app
            .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["strips"][0]["pin"], 16);
        assert_eq!(json["strips"][0]["ledCount"], 60);
        assert_eq!(json["strips"][0]["enabled"], true);
        assert_eq!(json["strips"][1]["enabled"], false);
        assert_eq!(json["manualMode"], false);
        assert_eq!(json["brightness"], 100);
    }

    #[tokio::test]
    async fn test_save_rejects_pin_mismatch() {
        let (app, state) = test_router();
        let body = serde_json::json!({"strips": [
            {"pin": 16, "ledCount": 10, "enabled": true},
            {"pin": 99, "ledCount": 10, "enabled": true},
            {"pin": 18, "ledCount": 10, "enabled": true},
            {"pin": 19, "ledCount": 10, "enabled": true}
        ]});
        let resp = app.oneshot(post_json("/api/config", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["status"], 400);

        // Nothing applied
        assert_eq!(state.device.read().await.config.strips[0].led_count, 60);
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_strip() {
        let (app, _) = test_router();
        let body = serde_json::json!({"strips": [
            {"pin": 16, "ledCount": 301, "enabled": true},
            {"pin": 17, "ledCount": 10, "enabled": true},
            {"pin": 18, "ledCount": 10, "enabled": true},
            {"pin": 19, "ledCount": 10, "enabled": true}
        ]});
        let resp = app.oneshot(post_json("/api/config", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mode_sets_manual_flag() {
        let (app, state) = test_router();
        let resp = app
            .clone()
            .oneshot(post_json("/api/mode", serde_json::json!({"mode": 255})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.device.read().await.config.manual_mode);

        app.oneshot(post_json("/api/mode", serde_json::json!({"mode": 1})))
            .await
            .unwrap();
        assert!(!state.device.read().await.config.manual_mode);
    }

    #[tokio::test]
    async fn test_led_requires_manual_mode_and_bounds() {
        let (app, state) = test_router();
        let led = serde_json::json!({"strip": 0, "led": 5, "r": 1, "g": 2, "b": 3});

        let resp = app
            .clone()
            .oneshot(post_json("/api/led", led.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        state.device.write().await.config.apply_mode(255);

        let resp = app.clone().oneshot(post_json("/api/led", led)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            state.device.read().await.pixels.get(&(0, 5)),
            Some(&Rgb::new(1, 2, 3))
        );

        let out_of_range = serde_json::json!({"strip": 0, "led": 60, "r": 1, "g": 2, "b": 3});
        let resp = app
            .clone()
            .oneshot(post_json("/api/led", out_of_range))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bad_strip = serde_json::json!({"strip": 9, "led": 0, "r": 1, "g": 2, "b": 3});
        let resp = app.oneshot(post_json("/api/led", bad_strip)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_tracks_enabled_leds() {
        let (app, state) = test_router();
        state.device.write().await.config.strips[1].enabled = true;

        let resp = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["freeHeap"], 180_000 - 120 * 3);
    }
}
