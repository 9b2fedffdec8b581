//! Error types
//!
//! Only startup problems are fatal. A missing microphone is reported to the
//! player and the rest of the toy keeps running.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// No element with the given id exists in the document
    SurfaceNotFound(String),
    /// The element exists but is not a `<canvas>`
    NotACanvas(String),
    /// The canvas refused to hand out a 2D context
    ContextUnavailable,
    /// Microphone access was denied or no input device exists
    AudioUnavailable(String),
    /// A timer or animation frame could not be scheduled
    Scheduling(String),
    /// Settings failed validation or could not be parsed
    InvalidSettings(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::SurfaceNotFound(id) => write!(f, "No element with id '{id}'"),
            GameError::NotACanvas(id) => write!(f, "Element '{id}' is not a canvas"),
            GameError::ContextUnavailable => write!(f, "2D canvas context unavailable"),
            GameError::AudioUnavailable(reason) => write!(f, "Audio input unavailable: {reason}"),
            GameError::Scheduling(reason) => write!(f, "Scheduling failed: {reason}"),
            GameError::InvalidSettings(reason) => write!(f, "Invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for GameError {}

#[cfg(target_arch = "wasm32")]
impl From<GameError> for wasm_bindgen::JsValue {
    fn from(err: GameError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Best-effort text for a thrown JS value
#[cfg(target_arch = "wasm32")]
pub fn describe_js(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_surface_id() {
        let err = GameError::SurfaceNotFound("gameboard".into());
        assert_eq!(err.to_string(), "No element with id 'gameboard'");
    }

    #[test]
    fn test_audio_error_keeps_reason() {
        let err = GameError::AudioUnavailable("Permission denied".into());
        assert!(err.to_string().contains("Permission denied"));
    }
}
