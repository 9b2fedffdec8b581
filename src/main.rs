//! Shout Ball entry point
//!
//! On the web the toy is deployed onto the `#gameboard` canvas. Natively there
//! is no canvas or microphone, so a short scripted run is simulated headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;

    use shout_ball::GameHandle;
    use shout_ball::consts::DEFAULT_SURFACE_ID;

    thread_local! {
        // Keeps the toy alive for the lifetime of the page
        static GAME: RefCell<Option<GameHandle>> = const { RefCell::new(None) };
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Shout Ball starting...");

        match shout_ball::deploy_game(DEFAULT_SURFACE_ID) {
            Ok(handle) => {
                GAME.with(|game| *game.borrow_mut() = Some(handle));
                log::info!("Shout Ball running!");
            }
            Err(e) => log::error!("Failed to start: {:?}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Shout Ball (native) starting...");
    log::info!("Native mode has no canvas or microphone - simulating a shout headless");

    if let Err(e) = headless_run() {
        log::error!("Headless run failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn headless_run() -> Result<(), shout_ball::GameError> {
    use shout_ball::platform::headless::{
        LogNotifier, ManualFrames, ManualTimer, RecordingSurface, ScriptedAudio,
    };
    use shout_ball::{Driver, Runtime, Settings};

    let settings = Settings::load();
    let tick_ms = settings.tick_ms;
    let surface = RecordingSurface::new(640.0, 480.0);
    let frames = ManualFrames::new();
    let driver = Driver::new(Box::new(surface.clone()), settings)?;
    let runtime = Runtime::new(driver, Box::new(frames.clone()), Box::new(LogNotifier::new()));

    let mut timer = ManualTimer::new();
    let mut audio = ScriptedAudio::new();
    runtime.start(&mut timer, Some(&mut audio))?;

    let rest = runtime.role();
    log::info!("Ball resting at ({:.1}, {:.1})", rest.pos.x, rest.pos.y);

    // A murmur, a word, then a shout
    for peak in [0.05, 0.4, 0.95] {
        audio.deliver(&[0.0, peak, -peak / 2.0]);
        frames.present();
        let role = runtime.role();
        log::info!("Peak {:.2} -> ball at ({:.1}, {:.1})", peak, role.pos.x, role.pos.y);
    }

    // Zero gravity would float forever
    let mut elapsed = 0;
    while runtime.with_driver(|d| d.motion()) == shout_ball::sim::Motion::Falling
        && elapsed < 60_000
    {
        timer.advance(tick_ms);
        elapsed += tick_ms;
        let role = runtime.role();
        log::info!(
            "t+{elapsed} ms: y={:.2} vy={:.2}",
            role.pos.y,
            role.vel.y
        );
    }

    runtime.stop();
    let stats = runtime.stats();
    log::info!(
        "Landed after {} ms; {} draw commands recorded, {} renders",
        elapsed,
        surface.commands().len(),
        stats.renders
    );
    Ok(())
}
