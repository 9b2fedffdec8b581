//! Event dispatch
//!
//! The driver owns the scene and the drawing surface and reacts to one event
//! at a time. It never schedules anything itself: when it wants a redraw or
//! needs to tell the player something it returns an `Effect` for the runtime
//! to carry out.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::GameError;
use crate::platform::Surface;
use crate::settings::Settings;
use crate::sim::{
    Ground, Motion, Nudge, Role, Scene, advance, initial_layout, nudge, peak_magnitude,
};

/// Everything that can happen to the toy
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Physics timer fired
    TimerTick,
    /// One buffer of microphone samples in [-1, 1]
    AudioBuffer(Vec<f32>),
    /// A requested redraw opportunity arrived
    FramePresented,
    /// Microphone access failed
    AudioFailed(String),
    /// Shut down; later events are ignored
    Stop,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::TimerTick => "TimerTick",
            Event::AudioBuffer(_) => "AudioBuffer",
            Event::FramePresented => "FramePresented",
            Event::AudioFailed(_) => "AudioFailed",
            Event::Stop => "Stop",
        }
    }
}

/// Work the driver asks its host to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `Event::FramePresented` at the next redraw opportunity
    RequestFrame,
    /// Show a message to the player
    Notify(String),
}

/// Microphone state as seen by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// No buffer or failure seen yet
    Waiting,
    Live,
    Unavailable,
}

/// Counters for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub ticks: u64,
    /// Ticks where gravity actually moved the ball
    pub moving_ticks: u64,
    pub audio_buffers: u64,
    /// Full scene renders (ticks and presented frames)
    pub renders: u64,
}

pub struct Driver {
    settings: Settings,
    surface: Box<dyn Surface>,
    scene: Scene,
    ground: Rc<RefCell<Ground>>,
    role: Rc<RefCell<Role>>,
    frame_pending: bool,
    audio: AudioStatus,
    running: bool,
    stats: DriverStats,
}

impl Driver {
    /// Lay out the ground and ball for the surface and register them (ground first)
    pub fn new(surface: Box<dyn Surface>, settings: Settings) -> Result<Self, GameError> {
        settings.validate()?;

        let (width, height) = surface.size();
        let (ground, role) = initial_layout(width, height, &settings);
        log::info!(
            "Surface {}x{}: ground at y={}, ball radius {}",
            width,
            height,
            ground.top(),
            role.radius
        );

        let ground = Rc::new(RefCell::new(ground));
        let role = Rc::new(RefCell::new(role));

        let mut scene = Scene::new();
        scene.add(ground.clone());
        scene.add(role.clone());

        Ok(Self {
            settings,
            surface,
            scene,
            ground,
            role,
            frame_pending: false,
            audio: AudioStatus::Waiting,
            running: true,
            stats: DriverStats::default(),
        })
    }

    /// Handle one event
    pub fn dispatch(&mut self, event: Event) -> Option<Effect> {
        if !self.running {
            log::debug!("Ignoring {} after stop", event.name());
            return None;
        }

        match event {
            Event::TimerTick => {
                self.on_tick();
                None
            }
            Event::AudioBuffer(samples) => self.on_audio(&samples),
            Event::FramePresented => {
                self.frame_pending = false;
                self.render();
                None
            }
            Event::AudioFailed(reason) => {
                self.audio = AudioStatus::Unavailable;
                log::warn!("Audio unavailable, gravity only: {reason}");
                Some(Effect::Notify(reason))
            }
            Event::Stop => {
                self.running = false;
                log::info!(
                    "Stopped after {} ticks, {} audio buffers, {} renders",
                    self.stats.ticks,
                    self.stats.audio_buffers,
                    self.stats.renders
                );
                None
            }
        }
    }

    fn on_tick(&mut self) {
        self.stats.ticks += 1;
        let ground_top = self.ground_top();

        let (moved, landed) = {
            let mut role = self.role.borrow_mut();
            let moved = advance(&mut role, self.settings.tick_ms as f32, ground_top);
            (moved, moved && role.motion(ground_top) == Motion::Resting)
        };

        if moved {
            self.stats.moving_ticks += 1;
            if landed {
                log::debug!("Ball landed");
            }
            self.surface.clear();
            self.render();
        }
    }

    fn on_audio(&mut self, samples: &[f32]) -> Option<Effect> {
        self.stats.audio_buffers += 1;
        if self.audio != AudioStatus::Live {
            log::info!("Receiving audio ({} samples per buffer)", samples.len());
            self.audio = AudioStatus::Live;
        }

        let peak = peak_magnitude(samples);
        let size = self.surface.size();
        let ground_top = self.ground_top();
        let moved = nudge(&mut self.role.borrow_mut(), peak, size, ground_top, &self.settings);
        if moved != Nudge::None {
            log::debug!("Peak {peak:.2}: {moved:?}");
        }

        // Cleared now, redrawn on the next frame
        self.surface.clear();

        if self.frame_pending {
            None
        } else {
            self.frame_pending = true;
            Some(Effect::RequestFrame)
        }
    }

    fn render(&mut self) {
        self.scene.render_all(&mut *self.surface);
        self.stats.renders += 1;
    }

    /// Draw the initial frame
    pub fn present(&mut self) {
        self.surface.clear();
        self.render();
    }

    fn ground_top(&self) -> f32 {
        self.ground.borrow().top()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current ball state
    pub fn role(&self) -> Role {
        *self.role.borrow()
    }

    /// Shared handle for moving the ball from outside the event flow
    pub fn role_handle(&self) -> Rc<RefCell<Role>> {
        self.role.clone()
    }

    pub fn ground(&self) -> Ground {
        *self.ground.borrow()
    }

    pub fn motion(&self) -> Motion {
        self.role.borrow().motion(self.ground_top())
    }

    pub fn audio_status(&self) -> AudioStatus {
        self.audio
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{DrawCommand, RecordingSurface};

    fn driver(settings: Settings) -> (Driver, RecordingSurface) {
        let surface = RecordingSurface::new(400.0, 200.0);
        let driver = Driver::new(Box::new(surface.clone()), settings).expect("valid settings");
        (driver, surface)
    }

    fn count_fills(commands: &[DrawCommand]) -> (usize, usize) {
        let rects = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .count();
        let circles = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .count();
        (rects, circles)
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let surface = RecordingSurface::new(400.0, 200.0);
        let settings = Settings {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            Driver::new(Box::new(surface), settings),
            Err(GameError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_present_draws_ground_then_ball() {
        let (mut driver, surface) = driver(Settings::default());
        driver.present();

        let commands = surface.take();
        assert!(matches!(commands[0], DrawCommand::ClearRect { .. }));
        let first_rect = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::FillRect { .. }));
        let first_circle = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::FillCircle { .. }));
        assert!(first_rect < first_circle);
        assert_eq!(count_fills(&commands), (1, 1));
    }

    #[test]
    fn test_resting_tick_draws_nothing() {
        let (mut driver, surface) = driver(Settings::default());
        assert_eq!(driver.motion(), Motion::Resting);

        assert_eq!(driver.dispatch(Event::TimerTick), None);
        assert!(surface.commands().is_empty());
        assert_eq!(driver.stats().ticks, 1);
        assert_eq!(driver.stats().moving_ticks, 0);
    }

    #[test]
    fn test_falling_tick_clears_and_redraws() {
        let (mut driver, surface) = driver(Settings::default());
        driver.role_handle().borrow_mut().pos.y = 50.0;

        assert_eq!(driver.dispatch(Event::TimerTick), None);
        let commands = surface.take();
        assert!(matches!(commands[0], DrawCommand::ClearRect { .. }));
        assert_eq!(count_fills(&commands), (1, 1));
        assert!(driver.role().pos.y > 50.0);
        assert_eq!(driver.motion(), Motion::Falling);
    }

    #[test]
    fn test_loud_buffer_lifts_and_requests_one_frame() {
        let (mut driver, surface) = driver(Settings::default());
        let start = driver.role();

        let effect = driver.dispatch(Event::AudioBuffer(vec![0.0, -0.9, 0.2]));
        assert_eq!(effect, Some(Effect::RequestFrame));
        assert!(driver.role().pos.y < start.pos.y);
        assert_eq!(driver.audio_status(), AudioStatus::Live);

        // Coalesced until the frame arrives
        assert_eq!(driver.dispatch(Event::AudioBuffer(vec![0.5])), None);
        assert!(driver.frame_pending());

        // Audio only clears; drawing waits for the frame
        assert_eq!(count_fills(&surface.take()), (0, 0));

        assert_eq!(driver.dispatch(Event::FramePresented), None);
        assert_eq!(count_fills(&surface.take()), (1, 1));
        assert!(!driver.frame_pending());

        assert_eq!(
            driver.dispatch(Event::AudioBuffer(vec![0.0])),
            Some(Effect::RequestFrame)
        );
    }

    #[test]
    fn test_quiet_buffer_keeps_position() {
        let (mut driver, _surface) = driver(Settings::default());
        let start = driver.role();
        driver.dispatch(Event::AudioBuffer(vec![0.05, -0.1]));
        assert_eq!(driver.role(), start);
    }

    #[test]
    fn test_jump_then_fall_back_to_ground() {
        let settings = Settings {
            gravity: 2000.0,
            ..Default::default()
        };
        let (mut driver, _surface) = driver(settings);
        let rest_y = driver.role().pos.y;

        driver.dispatch(Event::AudioBuffer(vec![1.0]));
        assert_eq!(driver.motion(), Motion::Falling);

        let mut ticks = 0;
        while driver.motion() == Motion::Falling {
            driver.dispatch(Event::TimerTick);
            ticks += 1;
            assert!(ticks < 50, "ball never came down");
        }
        assert_eq!(driver.role().pos.y, rest_y);
        assert_eq!(driver.role().vel.y, 0.0);
    }

    #[test]
    fn test_audio_failure_notifies_and_ticks_continue() {
        let (mut driver, _surface) = driver(Settings::default());
        let effect = driver.dispatch(Event::AudioFailed("Permission denied".into()));
        assert_eq!(effect, Some(Effect::Notify("Permission denied".into())));
        assert_eq!(driver.audio_status(), AudioStatus::Unavailable);

        driver.role_handle().borrow_mut().pos.y = 10.0;
        driver.dispatch(Event::TimerTick);
        assert_eq!(driver.stats().moving_ticks, 1);
    }

    #[test]
    fn test_stop_ignores_later_events() {
        let (mut driver, surface) = driver(Settings::default());
        driver.role_handle().borrow_mut().pos.y = 10.0;
        driver.dispatch(Event::Stop);
        assert!(!driver.is_running());

        let before = driver.role();
        assert_eq!(driver.dispatch(Event::TimerTick), None);
        assert_eq!(driver.dispatch(Event::AudioBuffer(vec![1.0])), None);
        assert_eq!(driver.dispatch(Event::FramePresented), None);
        assert_eq!(driver.role(), before);
        assert!(surface.commands().is_empty());
        assert_eq!(driver.stats(), DriverStats::default());
    }
}
