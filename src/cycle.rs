// ============================================================================
// cycle.rs — Branches
// Grow → finish → reset state machine. Owns the canvas, the live pens, the
// trail hue and the finish-zoom animation; advanced once per frame.
// ============================================================================

use crate::canvas::{Canvas, TextureAllocator};
use crate::config::{BACKGROUND, FINISH_LENGTH, ZOOM_EPSILON};
use crate::growth::{grow, TickReport, TrailHue};
use crate::metrics::{coverage, CycleStats};
use crate::pen::{Dice, Pen};
use crate::registry::PenRegistry;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    /// At least one pen is alive.
    Growing,
    /// No pens left; holding the canvas and zooming in.
    Finishing,
    /// Finish animation done; the next frame starts a new canvas.
    Resetting,
}

impl CyclePhase {
    pub fn name(self) -> &'static str {
        match self {
            CyclePhase::Growing => "growing",
            CyclePhase::Finishing => "finishing",
            CyclePhase::Resetting => "resetting",
        }
    }
}

/// What one call to [`CycleController::frame`] did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    Grew(TickReport),
    Finishing { frame: u32, zoom: f32 },
    Reset { cycle: u64 },
}

/// Camera zoom for a given finish frame: held at 1.0 for the first third,
/// then `1 / (1 - progress)`, which runs away as progress approaches 1.
pub fn finish_zoom(frame: u32) -> f32 {
    let hold = FINISH_LENGTH / 3;
    if frame <= hold {
        return 1.0;
    }
    let progress = ((frame - hold) as f32 / (FINISH_LENGTH - hold) as f32).max(ZOOM_EPSILON);
    1.0 / (1.0 - progress).max(ZOOM_EPSILON)
}

pub struct CycleController<A: TextureAllocator> {
    allocator: A,
    canvas: Canvas<A::Texture>,
    pens: PenRegistry,
    hue: TrailHue,
    finish_frame: u32,
    zoom: f32,
    stats: CycleStats,
}

impl<A: TextureAllocator> CycleController<A> {
    /// Growing, with a fresh canvas and one seed pen at its center.
    pub fn new<D: Dice + ?Sized>(mut allocator: A, dice: &mut D) -> Self {
        let canvas = Canvas::create(BACKGROUND, &mut allocator);
        Self {
            allocator,
            canvas,
            pens: PenRegistry::with_seed(Pen::seed(dice)),
            hue: TrailHue::new(0),
            finish_frame: 0,
            zoom: 1.0,
            stats: CycleStats::starting(1),
        }
    }

    pub fn phase(&self) -> CyclePhase {
        if !self.pens.is_empty() {
            CyclePhase::Growing
        } else if self.finish_frame < FINISH_LENGTH {
            CyclePhase::Finishing
        } else {
            CyclePhase::Resetting
        }
    }

    /// Run one frame of whichever phase the cycle is in.
    pub fn frame<D: Dice + ?Sized>(&mut self, dice: &mut D) -> FrameOutcome {
        match self.phase() {
            CyclePhase::Growing => {
                let report = grow(&mut self.pens, &mut self.canvas, &mut self.hue, dice);
                self.stats.record(&report);
                if report.live == 0 {
                    self.stats.log(coverage(self.canvas.pixels()));
                }
                FrameOutcome::Grew(report)
            }
            CyclePhase::Finishing => {
                self.finish_frame += 1;
                self.zoom = finish_zoom(self.finish_frame);
                FrameOutcome::Finishing {
                    frame: self.finish_frame,
                    zoom: self.zoom,
                }
            }
            CyclePhase::Resetting => {
                self.reset(dice);
                FrameOutcome::Reset {
                    cycle: self.stats.cycle,
                }
            }
        }
    }

    fn reset<D: Dice + ?Sized>(&mut self, dice: &mut D) {
        // Old texture goes before the new one is allocated.
        self.canvas.destroy();
        self.canvas = Canvas::create(BACKGROUND, &mut self.allocator);
        self.zoom = 1.0;
        self.finish_frame = 0;
        self.pens.insert(Pen::seed(dice));
        self.stats = CycleStats::starting(self.stats.cycle + 1);
        log::info!("Canvas reset; starting cycle {}", self.stats.cycle);
    }

    /// Release the live canvas texture. Must run before the controller is
    /// dropped while its allocator's device is still alive.
    pub fn shutdown(&mut self) {
        if self.canvas.is_destroyed() {
            return;
        }
        self.canvas.destroy();
        log::debug!("Cycle {} canvas released", self.stats.cycle);
    }

    pub fn canvas(&self) -> &Canvas<A::Texture> {
        &self.canvas
    }

    pub fn pens(&self) -> &PenRegistry {
        &self.pens
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn hue(&self) -> TrailHue {
        self.hue
    }

    pub fn finish_frame(&self) -> u32 {
        self.finish_frame
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }
}
