//! Simulation module
//!
//! Entities, the gravity step, audio nudges and the scene. Pure: no timers,
//! no audio devices, no browser types. Drawing goes through `platform::Surface`.

pub mod layout;
pub mod scene;
pub mod state;
pub mod tick;

pub use layout::initial_layout;
pub use scene::{EntityHandle, Scene};
pub use state::{GROUND_COLOR, Ground, Motion, ROLE_COLOR, Render, Role};
pub use tick::{Nudge, advance, nudge, peak_magnitude};
