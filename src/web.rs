//! Browser collaborators and the JS entry points
//!
//! `deployGame("gameboard")` wires a canvas to the 2D context, `setInterval`,
//! `requestAnimationFrame`, the microphone and `alert`, and returns a handle
//! that can stop it all again.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use crate::audio::Microphone;
use crate::driver::Driver;
use crate::error::{GameError, describe_js};
use crate::platform::{Color, FrameScheduler, Notifier, Subscription, Surface, Timer};
use crate::runtime::Runtime;
use crate::settings::Settings;

fn window() -> Result<Window, GameError> {
    web_sys::window().ok_or(GameError::Scheduling("no window".into()))
}

/// Canvas 2D context as a drawing surface
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up a `<canvas>` by id and take its 2D context
    pub fn from_element_id(id: &str) -> Result<Self, GameError> {
        let document = window()?
            .document()
            .ok_or(GameError::SurfaceNotFound(id.to_string()))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(id)
            .ok_or(GameError::SurfaceNotFound(id.to_string()))?
            .dyn_into()
            .map_err(|_| GameError::NotACanvas(id.to_string()))?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or(GameError::ContextUnavailable)?
            .dyn_into()
            .map_err(|_| GameError::ContextUnavailable)?;
        Ok(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f32, f32) {
        (self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx
            .fill_rect(x as f64, y as f64, width as f64, height as f64);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        if let Err(e) = self.ctx.arc(
            cx as f64,
            cy as f64,
            radius as f64,
            0.0,
            std::f64::consts::TAU,
        ) {
            // Negative radius after a bad settings override
            log::warn!("arc failed: {}", describe_js(&e));
            return;
        }
        self.ctx.fill();
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ctx
            .clear_rect(x as f64, y as f64, width as f64, height as f64);
    }
}

/// `setInterval` timer
#[derive(Debug, Default)]
pub struct IntervalTimer;

struct IntervalSubscription {
    handle: Option<i32>,
    _callback: Closure<dyn FnMut()>,
}

impl Subscription for IntervalSubscription {
    fn cancel(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_interval_with_handle(handle);
        }
    }
}

impl Timer for IntervalTimer {
    fn every(
        &mut self,
        period_ms: u32,
        callback: Box<dyn FnMut()>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        let closure = Closure::<dyn FnMut()>::wrap(callback);
        let handle = window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms as i32,
            )
            .map_err(|e| GameError::Scheduling(describe_js(&e)))?;
        Ok(Box::new(IntervalSubscription {
            handle: Some(handle),
            _callback: closure,
        }))
    }
}

/// `requestAnimationFrame` scheduler
#[derive(Debug, Default)]
pub struct AnimationFrames;

struct FrameSubscription {
    handle: Option<i32>,
    _callback: Closure<dyn FnMut(f64)>,
}

impl Subscription for FrameSubscription {
    fn cancel(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(handle);
        }
    }
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(
        &mut self,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Box<dyn Subscription>, GameError> {
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
            if let Some(callback) = callback.take() {
                callback();
            }
        });
        let handle = window()?
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(|e| GameError::Scheduling(describe_js(&e)))?;
        Ok(Box::new(FrameSubscription {
            handle: Some(handle),
            _callback: closure,
        }))
    }
}

/// Blocking `window.alert`
#[derive(Debug, Default)]
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn notify(&mut self, message: &str) {
        log::error!("{message}");
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}

/// Running toy, returned to JS
#[wasm_bindgen]
pub struct GameHandle {
    runtime: Runtime,
}

#[wasm_bindgen]
impl GameHandle {
    /// Stop ticking, release the microphone, drop pending frames
    pub fn stop(&self) {
        self.runtime.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn stopped(&self) -> bool {
        self.runtime.is_stopped()
    }

    /// Ball center x
    #[wasm_bindgen(getter, js_name = ballX)]
    pub fn ball_x(&self) -> f32 {
        self.runtime.role().pos.x
    }

    /// Ball center y
    #[wasm_bindgen(getter, js_name = ballY)]
    pub fn ball_y(&self) -> f32 {
        self.runtime.role().pos.y
    }
}

/// Start the toy on the canvas with the given id, using stored settings
#[wasm_bindgen(js_name = deployGame)]
pub fn deploy_game(surface_id: &str) -> Result<GameHandle, JsValue> {
    Ok(deploy(surface_id, Settings::load())?)
}

/// Start the toy with settings given as a JSON object; they are saved for next time
#[wasm_bindgen(js_name = deployGameWithSettings)]
pub fn deploy_game_with_settings(surface_id: &str, json: &str) -> Result<GameHandle, JsValue> {
    let settings = Settings::from_json(json)?;
    settings.save();
    Ok(deploy(surface_id, settings)?)
}

fn deploy(surface_id: &str, settings: Settings) -> Result<GameHandle, GameError> {
    let surface = CanvasSurface::from_element_id(surface_id)?;
    let driver = Driver::new(Box::new(surface), settings)?;
    let runtime = Runtime::new(
        driver,
        Box::new(AnimationFrames),
        Box::new(AlertNotifier),
    );

    let mut timer = IntervalTimer;
    let mut microphone = Microphone::new();
    runtime.start(&mut timer, Some(&mut microphone))?;

    log::info!("Deployed on #{surface_id}");
    Ok(GameHandle { runtime })
}
