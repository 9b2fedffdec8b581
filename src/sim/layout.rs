//! Initial placement derived from the surface size

use super::state::{Ground, Role};
use crate::settings::Settings;

/// Build the ground and the ball for a surface of `width` x `height`.
///
/// The ground spans the full width below `ground_ratio * height`; the ball
/// starts resting on it at the left edge.
pub fn initial_layout(width: f32, height: f32, settings: &Settings) -> (Ground, Role) {
    let ground_top = settings.ground_ratio * height;
    let ground = Ground::new(0.0, ground_top, width, height - ground_top);

    let radius = settings.role_ratio * height;
    let role = Role::new(radius, radius, ground_top - radius).with_gravity(settings.gravity);

    (ground, role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Motion;

    #[test]
    fn test_default_layout() {
        let (ground, role) = initial_layout(400.0, 200.0, &Settings::default());

        assert_eq!(ground.top(), 160.0);
        assert_eq!(ground.pos.x, 0.0);
        assert_eq!(ground.size.x, 400.0);
        assert!((ground.size.y - 40.0).abs() < 1e-4);

        assert!((role.radius - 10.0).abs() < 1e-4);
        assert_eq!(role.pos.x, role.radius);
        assert_eq!(role.bottom(), 160.0);
        assert_eq!(role.motion(ground.top()), Motion::Resting);
        assert_eq!(role.gravity, 9.8);
    }

    #[test]
    fn test_layout_follows_settings() {
        let settings = Settings {
            ground_ratio: 0.5,
            role_ratio: 0.1,
            gravity: 20.0,
            ..Default::default()
        };
        let (ground, role) = initial_layout(100.0, 100.0, &settings);
        assert_eq!(ground.top(), 50.0);
        assert_eq!(role.radius, 10.0);
        assert_eq!(role.pos.y, 40.0);
        assert_eq!(role.gravity, 20.0);
    }
}
