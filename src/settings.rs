//! Toy settings and tunables
//!
//! Persisted in LocalStorage, overridable from JS with a JSON object.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Tunables for physics, layout and audio response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Physics tick period in milliseconds
    pub tick_ms: u32,
    /// Downward acceleration applied to the ball
    pub gravity: f32,

    // === Layout ===
    /// Ground top as a fraction of surface height
    pub ground_ratio: f32,
    /// Ball radius as a fraction of surface height
    pub role_ratio: f32,

    // === Audio ===
    /// Request the microphone at startup
    pub audio_enabled: bool,
    /// Samples per delivered buffer (power of two, 256..=16384)
    pub buffer_size: u32,
    /// Peak magnitude that starts pushing the ball sideways
    pub nudge_threshold: f32,
    /// Peak magnitude that makes the ball jump instead
    pub jump_threshold: f32,
    /// Jump height multiplier
    pub jump_gain: f32,
    /// Keep audio moves above the ground (off: the next tick sorts it out)
    pub clamp_audio_moves: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            gravity: GRAVITY,

            ground_ratio: GROUND_RATIO,
            role_ratio: ROLE_RATIO,

            audio_enabled: true,
            buffer_size: AUDIO_BUFFER_SIZE,
            nudge_threshold: NUDGE_THRESHOLD,
            jump_threshold: JUMP_THRESHOLD,
            jump_gain: JUMP_GAIN,
            clamp_audio_moves: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "shout_ball_settings";

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| GameError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, GameError> {
        serde_json::to_string(self).map_err(|e| GameError::InvalidSettings(e.to_string()))
    }

    /// Reject values the layout, physics or Web Audio cannot work with
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |reason: String| Err(GameError::InvalidSettings(reason));

        if self.tick_ms == 0 {
            return invalid("tick_ms must be positive".into());
        }
        if !self.gravity.is_finite() {
            return invalid(format!("gravity must be finite, got {}", self.gravity));
        }
        if !(self.ground_ratio > 0.0 && self.ground_ratio < 1.0) {
            return invalid(format!("ground_ratio {} outside (0, 1)", self.ground_ratio));
        }
        if !(self.role_ratio > 0.0 && self.role_ratio < self.ground_ratio) {
            return invalid(format!(
                "role_ratio {} outside (0, ground_ratio)",
                self.role_ratio
            ));
        }
        // ScriptProcessorNode only accepts these sizes
        if !self.buffer_size.is_power_of_two() || !(256..=16384).contains(&self.buffer_size) {
            return invalid(format!(
                "buffer_size {} must be a power of two in 256..=16384",
                self.buffer_size
            ));
        }
        if !(self.nudge_threshold >= 0.0 && self.nudge_threshold < self.jump_threshold) {
            return invalid(format!(
                "thresholds must satisfy 0 <= nudge ({}) < jump ({})",
                self.nudge_threshold, self.jump_threshold
            ));
        }
        if !(self.jump_gain.is_finite() && self.jump_gain >= 0.0) {
            return invalid(format!("jump_gain {} must be >= 0", self.jump_gain));
        }
        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
