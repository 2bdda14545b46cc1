// ============================================================================
// config.rs — Branches
// Compiled-in simulation constants and fixed palette.
// ============================================================================

use std::time::Duration;

use crate::canvas::Rgba;

// ======================== Canvas & Timing ========================

/// Side length of the square, toroidal canvas in pixels.
pub const CANVAS_SIZE: u32 = 1024;

/// Frames spent holding and zooming into a finished canvas before it resets.
pub const FINISH_LENGTH: u32 = 300;

pub const TARGET_FPS: u32 = 60;

pub fn frame_interval() -> Duration {
    Duration::from_secs_f64(1.0 / TARGET_FPS as f64)
}

// ======================== Growth Rules ========================

/// Every random decision of a pen is a uniform draw in `[0, DRAW_SIDES)`.
pub const DRAW_SIDES: u32 = 1000;
/// A draw strictly above this spawns siblings (24 of 1000 outcomes).
pub const BRANCH_THRESHOLD: u32 = 975;
/// A second draw strictly above this turns the pen (29 of 1000 outcomes).
pub const TURN_THRESHOLD: u32 = 970;

pub const TRAIL_SATURATION: f32 = 0.7;
pub const TRAIL_VALUE: f32 = 1.0;

/// Lower bound for the finish-zoom progress and for its divisor.
pub const ZOOM_EPSILON: f32 = 0.001;

// ======================== Palette ========================

pub const BACKGROUND: Rgba = Rgba::rgb(0, 0, 0);
/// Soft claim on a cell a pen is about to enter. Never produced by a trail hue.
pub const OCCUPANCY_MARKER: Rgba = Rgba::rgb(230, 41, 55);
/// Window area around the canvas once the camera zooms.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 80.0 / 255.0,
    g: 80.0 / 255.0,
    b: 80.0 / 255.0,
    a: 1.0,
};
