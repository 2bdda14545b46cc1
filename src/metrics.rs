// ============================================================================
// metrics.rs — Branches
// Per-cycle growth statistics, logged once each time a canvas finishes.
// ============================================================================

use crate::canvas::Rgba;
use crate::config::BACKGROUND;
use crate::growth::TickReport;

/// Running totals for the current grow → finish → reset cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// 1-based index of the cycle since startup.
    pub cycle: u64,
    pub ticks: u64,
    pub peak_pens: usize,
    pub spawned: u64,
    pub removed: u64,
}

impl CycleStats {
    pub fn starting(cycle: u64) -> Self {
        Self {
            cycle,
            peak_pens: 1,
            ..Self::default()
        }
    }

    pub fn record(&mut self, tick: &TickReport) {
        self.ticks += 1;
        self.spawned += tick.spawned as u64;
        self.removed += tick.removed as u64;
        self.peak_pens = self.peak_pens.max(tick.live);
    }

    /// Log the finished cycle at INFO level.
    pub fn log(&self, coverage: f32) {
        log::info!(
            "Cycle {} grown: {} ticks | peak {} pens | {} spawned, {} died | {:.1}% covered",
            self.cycle,
            self.ticks,
            self.peak_pens,
            self.spawned,
            self.removed,
            coverage * 100.0,
        );
    }
}

/// Fraction of cells that hold anything but the background.
pub fn coverage(pixels: &[Rgba]) -> f32 {
    if pixels.is_empty() {
        return 0.0;
    }
    let painted = pixels.iter().filter(|&&p| p != BACKGROUND).count();
    painted as f32 / pixels.len() as f32
}
