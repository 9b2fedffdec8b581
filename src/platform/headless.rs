//! In-memory collaborators
//!
//! Drive the toy without a browser: commands are recorded instead of drawn,
//! and time, audio and frames advance only when told to. Every type is a
//! cheap clonable handle so the caller can keep one copy for inspection
//! while the runtime owns another.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{AudioInput, Color, FrameScheduler, Notifier, Subscription, Surface, Timer};
use crate::error::GameError;

/// A recorded drawing command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginPath,
    SetFill(Color),
    FillRect { x: f32, y: f32, width: f32, height: f32 },
    FillCircle { cx: f32, cy: f32, radius: f32 },
    ClosePath,
    ClearRect { x: f32, y: f32, width: f32, height: f32 },
}

/// Surface that records commands instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f32,
    height: f32,
    commands: Rc<RefCell<Vec<DrawCommand>>>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            commands: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Snapshot of everything recorded so far
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    /// Drain the recorded commands
    pub fn take(&self) -> Vec<DrawCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    fn push(&self, command: DrawCommand) {
        self.commands.borrow_mut().push(command);
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.push(DrawCommand::SetFill(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::FillRect { x, y, width, height });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.push(DrawCommand::FillCircle { cx, cy, radius });
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::ClearRect { x, y, width, height });
    }
}

/// Subscription backed by a shared "still active" flag
#[derive(Debug, Clone)]
pub struct FlagSubscription {
    active: Rc<Cell<bool>>,
}

impl FlagSubscription {
    fn new() -> Self {
        Self {
            active: Rc::new(Cell::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Subscription for FlagSubscription {
    fn cancel(&mut self) {
        self.active.set(false);
    }
}

struct TimerEntry {
    period_ms: u32,
    elapsed_ms: u32,
    callback: Box<dyn FnMut()>,
    active: FlagSubscription,
}

/// Timer that only fires when time is advanced by hand
#[derive(Clone, Default)]
pub struct ManualTimer {
    entries: Rc<RefCell<Vec<TimerEntry>>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions that have not been cancelled
    pub fn active_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.active.is_active())
            .count()
    }

    /// Advance the clock, firing each callback once per elapsed period.
    /// Returns how many callbacks ran.
    pub fn advance(&self, ms: u32) -> usize {
        // Callbacks run outside the borrow so they may touch the timer again
        let mut entries = std::mem::take(&mut *self.entries.borrow_mut());
        let mut fired = 0;

        for entry in entries.iter_mut() {
            entry.elapsed_ms += ms;
            while entry.active.is_active() && entry.elapsed_ms >= entry.period_ms {
                entry.elapsed_ms -= entry.period_ms;
                (entry.callback)();
                fired += 1;
            }
        }

        entries.retain(|e| e.active.is_active());
        let mut slot = self.entries.borrow_mut();
        entries.append(&mut *slot);
        *slot = entries;
        fired
    }
}

impl Timer for ManualTimer {
    fn every(
        &mut self,
        period_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        if period_ms == 0 {
            return Err(GameError::Scheduling("timer period must be positive".into()));
        }
        let active = FlagSubscription::new();
        self.entries.borrow_mut().push(TimerEntry {
            period_ms,
            elapsed_ms: 0,
            callback,
            active: active.clone(),
        });
        Ok(Box::new(active))
    }
}

#[derive(Default)]
struct AudioSlot {
    buffer_size: u32,
    on_buffer: Option<Box<dyn FnMut(&[f32])>>,
    on_error: Option<Box<dyn FnOnce(GameError)>>,
    active: Option<FlagSubscription>,
}

/// Audio input fed from test code
#[derive(Clone, Default)]
pub struct ScriptedAudio {
    slot: Rc<RefCell<AudioSlot>>,
}

impl ScriptedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the input is open and not cancelled
    pub fn is_open(&self) -> bool {
        self.slot
            .borrow()
            .active
            .as_ref()
            .is_some_and(|a| a.is_active())
    }

    /// Buffer size requested by the consumer
    pub fn buffer_size(&self) -> u32 {
        self.slot.borrow().buffer_size
    }

    /// Deliver one buffer. Returns false if nobody is listening.
    pub fn deliver(&self, samples: &[f32]) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(mut on_buffer) = self.slot.borrow_mut().on_buffer.take() else {
            return false;
        };
        on_buffer(samples);
        self.slot.borrow_mut().on_buffer = Some(on_buffer);
        true
    }

    /// Report an acquisition failure. Returns false if already failed or closed.
    pub fn fail(&self, error: GameError) -> bool {
        if !self.is_open() {
            return false;
        }
        let on_error = {
            let mut slot = self.slot.borrow_mut();
            slot.on_buffer = None;
            if let Some(active) = slot.active.as_mut() {
                active.cancel();
            }
            slot.on_error.take()
        };
        match on_error {
            Some(on_error) => {
                on_error(error);
                true
            }
            None => false,
        }
    }
}

impl AudioInput for ScriptedAudio {
    fn open(
        &mut self,
        buffer_size: u32,
        on_buffer: Box<dyn FnMut(&[f32])>,
        on_error: Box<dyn FnOnce(GameError)>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        let active = FlagSubscription::new();
        *self.slot.borrow_mut() = AudioSlot {
            buffer_size,
            on_buffer: Some(on_buffer),
            on_error: Some(on_error),
            active: Some(active.clone()),
        };
        Ok(Box::new(active))
    }
}

/// Frame scheduler whose frames are presented by hand
#[derive(Clone, Default)]
pub struct ManualFrames {
    pending: Rc<RefCell<Vec<(FlagSubscription, Box<dyn FnOnce()>)>>>,
    requested: Rc<Cell<usize>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested over the lifetime of this scheduler
    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    /// Frames waiting to be presented
    pub fn pending(&self) -> usize {
        self.pending
            .borrow()
            .iter()
            .filter(|(active, _)| active.is_active())
            .count()
    }

    /// Run every pending frame callback. Returns how many ran.
    pub fn present(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let mut ran = 0;
        for (active, callback) in pending {
            if active.is_active() {
                callback();
                ran += 1;
            }
        }
        ran
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(
        &mut self,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        let active = FlagSubscription::new();
        self.pending.borrow_mut().push((active.clone(), callback));
        self.requested.set(self.requested.get() + 1);
        Ok(Box::new(active))
    }
}

/// Notifier that logs and remembers messages
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    messages: Rc<RefCell<Vec<String>>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str) {
        log::warn!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timer_fires_per_period() {
        let mut timer = ManualTimer::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let _sub = timer
            .every(100, Box::new(move || c.set(c.get() + 1)))
            .unwrap();

        assert_eq!(timer.advance(99), 0);
        assert_eq!(timer.advance(1), 1);
        assert_eq!(timer.advance(250), 2);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_manual_timer_cancel() {
        let mut timer = ManualTimer::new();
        let mut sub = timer.every(10, Box::new(|| {})).unwrap();
        assert_eq!(timer.active_count(), 1);
        sub.cancel();
        assert_eq!(timer.advance(100), 0);
        assert_eq!(timer.active_count(), 0);
    }

    #[test]
    fn test_manual_timer_rejects_zero_period() {
        let mut timer = ManualTimer::new();
        assert!(timer.every(0, Box::new(|| {})).is_err());
    }

    #[test]
    fn test_scripted_audio_delivers_until_failure() {
        let mut audio = ScriptedAudio::new();
        assert!(!audio.deliver(&[0.5]));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(Cell::new(0));
        let s = seen.clone();
        let e = errors.clone();
        let _sub = audio
            .open(
                256,
                Box::new(move |buf| s.borrow_mut().extend_from_slice(buf)),
                Box::new(move |_| e.set(e.get() + 1)),
            )
            .unwrap();

        assert_eq!(audio.buffer_size(), 256);
        assert!(audio.deliver(&[0.1, -0.2]));
        assert!(audio.fail(GameError::AudioUnavailable("denied".into())));
        assert!(!audio.fail(GameError::AudioUnavailable("again".into())));
        assert!(!audio.deliver(&[0.3]));

        assert_eq!(*seen.borrow(), vec![0.1, -0.2]);
        assert_eq!(errors.get(), 1);
    }

    #[test]
    fn test_manual_frames_skip_cancelled() {
        let mut frames = ManualFrames::new();
        let ran = Rc::new(Cell::new(0));
        let r1 = ran.clone();
        let r2 = ran.clone();
        let mut first = frames
            .request_frame(Box::new(move || r1.set(r1.get() + 1)))
            .unwrap();
        let _second = frames
            .request_frame(Box::new(move || r2.set(r2.get() + 10)))
            .unwrap();
        first.cancel();

        assert_eq!(frames.requested(), 2);
        assert_eq!(frames.pending(), 1);
        assert_eq!(frames.present(), 1);
        assert_eq!(ran.get(), 10);
        assert_eq!(frames.pending(), 0);
    }

    #[test]
    fn test_recording_surface_clear_covers_size() {
        let mut surface = RecordingSurface::new(320.0, 240.0);
        surface.clear();
        assert_eq!(
            surface.take(),
            vec![DrawCommand::ClearRect {
                x: 0.0,
                y: 0.0,
                width: 320.0,
                height: 240.0
            }]
        );
        assert!(surface.commands().is_empty());
    }
}
