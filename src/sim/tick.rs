//! Gravity step and audio nudges
//!
//! Both operate on the role in place. Nothing here touches a surface.

use super::state::Role;
use crate::settings::Settings;

/// Advance the ball by `dt_ms` of gravity, landing it on `ground_top`.
///
/// Only a ball that starts strictly above the ground line is integrated, and
/// only such a ball can land. A ball already on (or pushed below) the line is
/// left untouched. Returns whether the ball moved.
pub fn advance(role: &mut Role, dt_ms: f32, ground_top: f32) -> bool {
    let dt = dt_ms / 1000.0;
    let mut changed = false;

    if role.bottom() < ground_top {
        // Exact for constant acceleration
        role.pos.y += (role.vel.y + role.gravity / 2.0 * dt) * dt;
        role.vel.y += role.gravity * dt;
        changed = true;
    }

    if changed && role.bottom() >= ground_top {
        role.land(ground_top);
    }

    changed
}

/// Largest absolute sample in the buffer (0 for an empty buffer, NaN ignored)
pub fn peak_magnitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
}

/// How a buffer moved the ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nudge {
    /// Too quiet
    None,
    /// Moderate sound: pushed right by this many units
    Right(f32),
    /// Loud sound: lifted by this many units
    Up(f32),
}

/// Move the ball according to one buffer's peak magnitude.
///
/// Velocity is untouched; gravity takes over again on the next tick. Unless
/// `clamp_audio_moves` is set, the ball may leave the top of the surface or
/// end up below the ground line.
pub fn nudge(
    role: &mut Role,
    peak: f32,
    surface_size: (f32, f32),
    ground_top: f32,
    settings: &Settings,
) -> Nudge {
    let (width, height) = surface_size;

    let nudge = if settings.nudge_threshold < peak && peak < settings.jump_threshold {
        let dx = peak * settings.role_ratio * width;
        role.pos.x += dx;
        Nudge::Right(dx)
    } else if peak >= settings.jump_threshold {
        let dy = settings.jump_gain * peak * settings.role_ratio * height;
        role.pos.y -= dy;
        Nudge::Up(dy)
    } else {
        Nudge::None
    };

    if settings.clamp_audio_moves {
        if role.bottom() > ground_top {
            role.land(ground_top);
        } else if role.pos.y < role.radius {
            role.pos.y = role.radius;
        }
    }

    nudge
}
