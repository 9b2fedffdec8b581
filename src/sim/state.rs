//! Entities and their drawing
//!
//! The ground is fixed at startup; the role (the ball) moves every tick and
//! on every loud audio buffer.

use glam::Vec2;

use crate::consts::GRAVITY;
use crate::platform::{Color, Surface};

/// Ball fill color
pub const ROLE_COLOR: Color = Color::gray(0xA0);
/// Ground fill color
pub const GROUND_COLOR: Color = Color::BLACK;

/// Anything the scene can draw
pub trait Render {
    fn render(&self, surface: &mut dyn Surface);
}

/// Vertical state of the ball relative to the ground line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Bottom edge strictly above the ground line
    Falling,
    /// Touching or below the ground line
    Resting,
}

/// The static floor rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Ground {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// The ground line the ball lands on
    pub fn top(&self) -> f32 {
        self.pos.y
    }
}

impl Render for Ground {
    fn render(&self, surface: &mut dyn Surface) {
        surface.begin_path();
        surface.set_fill_color(GROUND_COLOR);
        surface.fill_rect(self.pos.x, self.pos.y, self.size.x, self.size.y);
        surface.close_path();
    }
}

/// The player's ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Role {
    /// Center
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Downward acceleration (screen y grows downward)
    pub gravity: f32,
}

impl Role {
    /// Ball at rest with default gravity
    pub fn new(radius: f32, x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            radius,
            gravity: GRAVITY,
        }
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Lowest point of the ball
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }

    pub fn motion(&self, ground_top: f32) -> Motion {
        if self.bottom() < ground_top {
            Motion::Falling
        } else {
            Motion::Resting
        }
    }

    /// Put the ball on the ground line and stop vertical motion
    pub fn land(&mut self, ground_top: f32) {
        self.pos.y = ground_top - self.radius;
        self.vel.y = 0.0;
    }
}

impl Render for Role {
    fn render(&self, surface: &mut dyn Surface) {
        surface.begin_path();
        surface.set_fill_color(ROLE_COLOR);
        surface.fill_circle(self.pos.x, self.pos.y, self.radius);
        surface.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{DrawCommand, RecordingSurface};

    #[test]
    fn test_ground_render_commands() {
        let ground = Ground::new(0.0, 80.0, 200.0, 20.0);
        let mut surface = RecordingSurface::new(200.0, 100.0);
        ground.render(&mut surface);

        assert_eq!(
            surface.take(),
            vec![
                DrawCommand::BeginPath,
                DrawCommand::SetFill(Color::BLACK),
                DrawCommand::FillRect {
                    x: 0.0,
                    y: 80.0,
                    width: 200.0,
                    height: 20.0
                },
                DrawCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn test_role_render_commands() {
        let role = Role::new(5.0, 12.0, 34.0);
        let mut surface = RecordingSurface::new(100.0, 100.0);
        role.render(&mut surface);

        let commands = surface.take();
        assert_eq!(commands[1], DrawCommand::SetFill(Color::gray(0xA0)));
        assert_eq!(
            commands[2],
            DrawCommand::FillCircle {
                cx: 12.0,
                cy: 34.0,
                radius: 5.0
            }
        );
        assert_eq!(commands.len(), 4);
    }

    #[test]
    fn test_motion_boundary() {
        let mut role = Role::new(10.0, 0.0, 89.0);
        assert_eq!(role.motion(100.0), Motion::Falling);
        role.pos.y = 90.0;
        assert_eq!(role.motion(100.0), Motion::Resting);
        role.pos.y = 95.0;
        assert_eq!(role.motion(100.0), Motion::Resting);
    }

    #[test]
    fn test_land_zeroes_vertical_velocity_only() {
        let mut role = Role::new(10.0, 0.0, 95.0);
        role.vel = Vec2::new(3.0, 7.0);
        role.land(100.0);
        assert_eq!(role.pos.y, 90.0);
        assert_eq!(role.vel, Vec2::new(3.0, 0.0));
    }
}
