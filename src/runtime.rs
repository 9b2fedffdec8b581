//! Single-threaded event loop around the driver
//!
//! Every collaborator callback (timer, audio, animation frame) posts an event
//! into one mailbox and the pump hands events to the driver one at a time.
//! All of it runs on the browser main thread, so plain `Rc<RefCell<..>>`
//! is enough: a callback always runs to completion before the next starts.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::driver::{Driver, DriverStats, Effect, Event};
use crate::error::GameError;
use crate::platform::{AudioInput, FrameScheduler, Notifier, Subscription, Timer};
use crate::sim::Role;

struct Inner {
    driver: RefCell<Driver>,
    queue: RefCell<VecDeque<Event>>,
    frames: RefCell<Box<dyn FrameScheduler>>,
    notifier: RefCell<Box<dyn Notifier>>,
    subscriptions: RefCell<Vec<Box<dyn Subscription>>>,
    pending_frame: RefCell<Option<Box<dyn Subscription>>>,
    started: Cell<bool>,
    stopped: Cell<bool>,
}

/// Clonable handle to the running toy
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<Inner>,
}

impl Runtime {
    pub fn new(
        driver: Driver,
        frames: Box<dyn FrameScheduler>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                driver: RefCell::new(driver),
                queue: RefCell::new(VecDeque::new()),
                frames: RefCell::new(frames),
                notifier: RefCell::new(notifier),
                subscriptions: RefCell::new(Vec::new()),
                pending_frame: RefCell::new(None),
                started: Cell::new(false),
                stopped: Cell::new(false),
            }),
        }
    }

    /// Draw the first frame and subscribe to the physics timer and, when
    /// enabled, the audio input.
    ///
    /// Audio refusal is not an error here: it arrives later as
    /// `Event::AudioFailed` and the toy keeps running without it.
    pub fn start(
        &self,
        timer: &mut dyn Timer,
        audio: Option<&mut dyn AudioInput>,
    ) -> Result<(), GameError> {
        if self.inner.started.replace(true) {
            return Err(GameError::Scheduling("runtime already started".into()));
        }

        self.inner.driver.borrow_mut().present();
        let settings = self.inner.driver.borrow().settings().clone();

        let rt = self.clone();
        let tick = timer.every(settings.tick_ms, Box::new(move || rt.post(Event::TimerTick)))?;
        self.inner.subscriptions.borrow_mut().push(tick);
        log::info!("Physics tick every {} ms", settings.tick_ms);

        match audio {
            Some(audio) if settings.audio_enabled => {
                let on_buffer = {
                    let rt = self.clone();
                    Box::new(move |samples: &[f32]| rt.post(Event::AudioBuffer(samples.to_vec())))
                };
                let on_error = {
                    let rt = self.clone();
                    Box::new(move |err: GameError| rt.post(Event::AudioFailed(err.to_string())))
                };
                match audio.open(settings.buffer_size, on_buffer, on_error) {
                    Ok(sub) => {
                        self.inner.subscriptions.borrow_mut().push(sub);
                        log::info!(
                            "Requested audio input ({} samples per buffer)",
                            settings.buffer_size
                        );
                    }
                    Err(err) => self.post(Event::AudioFailed(err.to_string())),
                }
            }
            _ => log::info!("Audio input disabled, gravity only"),
        }

        Ok(())
    }

    /// Queue an event and process everything pending
    pub fn post(&self, event: Event) {
        self.inner.queue.borrow_mut().push_back(event);
        self.pump();
    }

    fn pump(&self) {
        loop {
            // Posted from inside a dispatch: the outer pump picks it up
            let Ok(mut driver) = self.inner.driver.try_borrow_mut() else {
                return;
            };
            let Some(event) = self.inner.queue.borrow_mut().pop_front() else {
                return;
            };
            let effect = driver.dispatch(event);
            drop(driver);

            if let Some(effect) = effect {
                self.apply(effect);
            }
        }
    }

    fn apply(&self, effect: Effect) {
        match effect {
            Effect::RequestFrame => {
                // A scheduler that presents synchronously re-enters here
                let Ok(mut frames) = self.inner.frames.try_borrow_mut() else {
                    self.inner.queue.borrow_mut().push_back(Event::FramePresented);
                    return;
                };
                let rt = self.clone();
                let requested =
                    frames.request_frame(Box::new(move || rt.post(Event::FramePresented)));
                drop(frames);
                match requested {
                    Ok(sub) => {
                        *self.inner.pending_frame.borrow_mut() = Some(sub);
                    }
                    Err(err) => {
                        // Draw right away rather than never
                        log::error!("Frame request failed, drawing now: {err}");
                        self.inner.queue.borrow_mut().push_back(Event::FramePresented);
                    }
                }
            }
            Effect::Notify(message) => {
                self.inner.notifier.borrow_mut().notify(&message);
            }
        }
    }

    /// Stop the toy: no more ticks, audio or frames. Calling twice is harmless.
    pub fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        self.post(Event::Stop);

        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        for mut sub in subscriptions {
            sub.cancel();
        }
        if let Some(mut frame) = self.inner.pending_frame.borrow_mut().take() {
            frame.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    /// Inspect the driver between events
    pub fn with_driver<R>(&self, f: impl FnOnce(&Driver) -> R) -> R {
        f(&self.inner.driver.borrow())
    }

    pub fn role(&self) -> Role {
        self.with_driver(|d| d.role())
    }

    pub fn stats(&self) -> DriverStats {
        self.with_driver(|d| d.stats())
    }
}
