//! Emulator HTTP handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::EmulatorState;
use crate::error::EmulatorError;
use crate::models::{
    BrightnessRequest, DeviceStatus, LedRequest, ModeRequest, Rgb, SaveConfigRequest,
    MAX_LED_COUNT,
};

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// GET /api/config
pub async fn get_config(State(state): State<EmulatorState>) -> impl IntoResponse {
    let device = state.device.read().await;
    Json(device.config.clone())
}

/// POST /api/config - Replace strip settings; pins are fixed by the device
pub async fn save_config(
    State(state): State<EmulatorState>,
    Json(payload): Json<SaveConfigRequest>,
) -> Result<impl IntoResponse, EmulatorError> {
    let mut device = state.device.write().await;

    if payload.strips.len() != device.config.strips.len() {
        return Err(EmulatorError::BadRequest(format!(
            "expected {} strips, got {}",
            device.config.strips.len(),
            payload.strips.len()
        )));
    }

    for (index, (current, requested)) in device
        .config
        .strips
        .iter()
        .zip(&payload.strips)
        .enumerate()
    {
        if current.pin != requested.pin {
            return Err(EmulatorError::BadRequest(format!(
                "strip {} is on GPIO {}, not {}",
                index, current.pin, requested.pin
            )));
        }
        if requested.led_count > MAX_LED_COUNT {
            return Err(EmulatorError::BadRequest(format!(
                "strip {} ledCount {} exceeds {}",
                index, requested.led_count, MAX_LED_COUNT
            )));
        }
    }

    device.config.strips = payload.strips;
    let strip_count = device.config.strips.len();
    device
        .pixels
        .retain(|&(strip, _), _| usize::from(strip) < strip_count);

    tracing::info!(
        "Emulator config saved: {} strips, {} LEDs active",
        strip_count,
        device.config.total_leds()
    );
    Ok(SuccessResponse::ok())
}

/// GET /api/status
pub async fn get_status(State(state): State<EmulatorState>) -> impl IntoResponse {
    let device = state.device.read().await;
    Json(DeviceStatus {
        free_heap: device.free_heap(),
    })
}

/// POST /api/mode
pub async fn set_mode(
    State(state): State<EmulatorState>,
    Json(payload): Json<ModeRequest>,
) -> impl IntoResponse {
    let mut device = state.device.write().await;
    device.config.apply_mode(payload.mode);
    tracing::info!(
        "Emulator mode -> {} (manual: {})",
        payload.mode,
        device.config.manual_mode
    );
    SuccessResponse::ok()
}

/// POST /api/brightness
pub async fn set_brightness(
    State(state): State<EmulatorState>,
    Json(payload): Json<BrightnessRequest>,
) -> impl IntoResponse {
    state.device.write().await.config.brightness = payload.brightness;
    tracing::debug!("Emulator brightness -> {}", payload.brightness);
    SuccessResponse::ok()
}

/// POST /api/color
pub async fn set_color(
    State(state): State<EmulatorState>,
    Json(payload): Json<Rgb>,
) -> impl IntoResponse {
    let mut device = state.device.write().await;
    tracing::info!("Emulator color {} -> {}", device.color, payload);
    device.color = payload;
    SuccessResponse::ok()
}

/// POST /api/led - Only accepted in manual mode
pub async fn set_led(
    State(state): State<EmulatorState>,
    Json(payload): Json<LedRequest>,
) -> Result<impl IntoResponse, EmulatorError> {
    let mut device = state.device.write().await;

    if !device.config.manual_mode {
        return Err(EmulatorError::Conflict(
            "manual mode is not active".to_string(),
        ));
    }

    let strip = device
        .config
        .strips
        .get(usize::from(payload.strip))
        .ok_or_else(|| EmulatorError::BadRequest(format!("no strip {}", payload.strip)))?;

    if payload.led >= strip.led_count {
        return Err(EmulatorError::BadRequest(format!(
            "led {} out of range (strip {} has {} LEDs)",
            payload.led, payload.strip, strip.led_count
        )));
    }

    device
        .pixels
        .insert((payload.strip, payload.led), payload.color);
    Ok(SuccessResponse::ok())
}
