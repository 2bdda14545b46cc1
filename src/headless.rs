// ============================================================================
// headless.rs — Branches
// Windowless runner: drives the grow/finish/reset cycle on CPU-only canvas
// textures for a fixed number of frames and reports what happened.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::canvas::{CanvasTexture, Rgba, TextureAllocator};
use crate::cycle::{CycleController, FrameOutcome};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessConfig {
    pub frames: u32,
    pub progress_interval: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: 10_000,
            progress_interval: 1000,
        }
    }
}

impl HeadlessConfig {
    /// `--headless [frames]` selects headless mode; anything else runs the
    /// window.
    pub fn from_args(args: &[String]) -> Result<Option<Self>, String> {
        match args {
            [flag, rest @ ..] if flag == "--headless" => {
                let mut config = Self::default();
                if let Some(frames) = rest.first() {
                    config.frames = frames
                        .parse()
                        .map_err(|e| format!("invalid frame count {frames:?}: {e}"))?;
                }
                Ok(Some(config))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub frames: u32,
    pub cycles_completed: u64,
    pub ticks: u64,
    pub peak_pens: usize,
    pub textures_allocated: u64,
    pub textures_released: u64,
    pub uploads: u64,
}

// ======================== CPU Textures ========================

#[derive(Default)]
struct TextureCounters {
    allocated: Cell<u64>,
    released: Cell<u64>,
    uploads: Cell<u64>,
}

/// Allocator whose textures only count what would have reached the GPU.
#[derive(Default)]
pub struct HeadlessAllocator {
    counters: Rc<TextureCounters>,
}

pub struct HeadlessTexture {
    counters: Rc<TextureCounters>,
}

impl TextureAllocator for HeadlessAllocator {
    type Texture = HeadlessTexture;

    fn allocate(&mut self, _side: u32, _pixels: &[Rgba]) -> HeadlessTexture {
        self.counters.allocated.set(self.counters.allocated.get() + 1);
        HeadlessTexture {
            counters: Rc::clone(&self.counters),
        }
    }
}

impl CanvasTexture for HeadlessTexture {
    fn upload(&mut self, _pixels: &[Rgba]) {
        self.counters.uploads.set(self.counters.uploads.get() + 1);
    }

    fn release(&mut self) {
        self.counters.released.set(self.counters.released.get() + 1);
    }
}

// ======================== Runner ========================

pub fn run_headless(config: &HeadlessConfig) -> HeadlessSummary {
    let allocator = HeadlessAllocator::default();
    let counters = Rc::clone(&allocator.counters);
    let mut rng = rand::thread_rng();
    let mut controller = CycleController::new(allocator, &mut rng);
    let mut summary = HeadlessSummary {
        frames: config.frames,
        peak_pens: 1,
        ..Default::default()
    };

    log::info!("Headless run started: {} frames", config.frames);

    let started = Instant::now();
    for step in 0..config.frames {
        match controller.frame(&mut rng) {
            FrameOutcome::Grew(report) => {
                summary.ticks += 1;
                summary.peak_pens = summary.peak_pens.max(report.live);
            }
            FrameOutcome::Reset { .. } => summary.cycles_completed += 1,
            FrameOutcome::Finishing { .. } => {}
        }

        if config.progress_interval > 0 && (step + 1) % config.progress_interval == 0 {
            let done = step + 1;
            let elapsed = started.elapsed().as_secs_f64().max(1e-6);
            log::info!(
                "Headless progress: {}/{} | fps={:.0} | cycle {} {} (finish frame {}) | hue {} | {} pens",
                done,
                config.frames,
                done as f64 / elapsed,
                controller.stats().cycle,
                controller.phase().name(),
                controller.finish_frame(),
                controller.hue().degrees(),
                controller.pens().len(),
            );
        }
    }

    controller.shutdown();
    summary.textures_allocated = counters.allocated.get();
    summary.textures_released = counters.released.get();
    summary.uploads = counters.uploads.get();
    summary
}
