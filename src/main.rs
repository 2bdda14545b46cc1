// ============================================================================
// main.rs — Branches
// Entry point. Initializes logging, then runs either the window or the
// headless cycle driver (`--headless [frames]`).
// ============================================================================

mod app;
mod camera;
mod canvas;
mod config;
mod cycle;
mod gpu_canvas;
mod growth;
mod headless;
mod metrics;
mod pen;
mod pipeline;
mod registry;
mod renderer;

#[cfg(test)]
mod testing;

use app::App;
use headless::{run_headless, HeadlessConfig};
use winit::event_loop::EventLoop;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let headless = match HeadlessConfig::from_args(&args) {
        Ok(headless) => headless,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(2);
        }
    };

    if let Some(config) = headless {
        let summary = run_headless(&config);
        log::info!("Headless run finished: {:?}", summary);
        return;
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            std::process::exit(1);
        }
    };

    let mut app = App::new();
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop terminated with error: {err}");
        std::process::exit(1);
    }
}
