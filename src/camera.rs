// ============================================================================
// camera.rs — Branches
// 2D camera (target, offset, zoom, rotation) and its GPU uniform block.
// ============================================================================

use crate::config::CANVAS_SIZE;

/// Zoom handed to the shader never exceeds this, so the last finish frame
/// still produces finite vertex positions.
const MAX_RENDER_ZOOM: f32 = 4096.0;

/// GPU-side camera uniforms uploaded every frame. Layout matches
/// `Camera` in `shaders/canvas.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub target: [f32; 2],
    pub offset: [f32; 2],
    pub viewport: [f32; 2],
    pub zoom: f32,
    pub rotation: f32,
    pub canvas_size: f32,
    pub _pad: [f32; 3],
}

/// World point `target` is drawn at screen point `offset`, scaled by `zoom`
/// and rotated by `rotation` radians around it.
#[derive(Clone, Debug)]
pub struct Camera2D {
    pub target: [f32; 2],
    pub offset: [f32; 2],
    pub zoom: f32,
    pub rotation: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        let center = CANVAS_SIZE as f32 / 2.0;
        Self {
            target: [center, center],
            offset: [center, center],
            zoom: 1.0,
            rotation: 0.0,
        }
    }
}

impl Camera2D {
    /// Keep the canvas center pinned to the middle of the window.
    pub fn fit_viewport(&mut self, width: u32, height: u32) {
        self.offset = [width as f32 / 2.0, height as f32 / 2.0];
    }

    /// Build the GPU uniform for a `width × height` surface. Zoom 1.0 shows
    /// the whole canvas however large the window is.
    pub fn uniforms(&self, width: u32, height: u32) -> CameraUniforms {
        let fit = width.min(height).max(1) as f32 / CANVAS_SIZE as f32;
        let zoom = if self.zoom.is_finite() {
            self.zoom.min(MAX_RENDER_ZOOM)
        } else {
            MAX_RENDER_ZOOM
        };
        CameraUniforms {
            target: self.target,
            offset: self.offset,
            viewport: [width.max(1) as f32, height.max(1) as f32],
            zoom: zoom * fit,
            rotation: self.rotation,
            canvas_size: CANVAS_SIZE as f32,
            _pad: [0.0; 3],
        }
    }
}
