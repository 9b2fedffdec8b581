//! Shout Ball - a ball that falls under gravity and jumps when you shout
//!
//! Core modules:
//! - `sim`: Pure simulation (entities, gravity step, audio nudges, scene)
//! - `driver`: Event dispatch tying the simulation to a drawing surface
//! - `runtime`: Single-threaded mailbox that feeds the driver
//! - `platform`: Browser/headless collaborators (surface, timers, audio, frames)
//! - `settings`: Tunables, persisted in LocalStorage on the web

pub mod driver;
pub mod error;
pub mod platform;
pub mod runtime;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use driver::{Driver, DriverStats, Effect, Event};
pub use error::GameError;
pub use runtime::Runtime;
pub use settings::Settings;

#[cfg(target_arch = "wasm32")]
pub use web::{GameHandle, deploy_game, deploy_game_with_settings};

/// Game configuration constants
pub mod consts {
    /// Physics tick period (10 Hz)
    pub const TICK_MS: u32 = 100;
    /// Gravity in surface units per second²
    pub const GRAVITY: f32 = 9.8;

    /// Ground top as a fraction of surface height
    pub const GROUND_RATIO: f32 = 0.8;
    /// Ball radius as a fraction of surface height (also scales nudges)
    pub const ROLE_RATIO: f32 = 0.05;

    /// Samples per audio buffer delivered to the driver
    pub const AUDIO_BUFFER_SIZE: u32 = 1 << 14;
    /// Peak above this (and below the jump threshold) pushes the ball sideways
    pub const NUDGE_THRESHOLD: f32 = 0.1;
    /// Peak at or above this makes the ball jump
    pub const JUMP_THRESHOLD: f32 = 0.7;
    /// Jump height multiplier
    pub const JUMP_GAIN: f32 = 3.0;

    /// Canvas element id used by the default entry point
    pub const DEFAULT_SURFACE_ID: &str = "gameboard";
}
