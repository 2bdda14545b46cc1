// ============================================================================
// canvas.rs — Branches
// Square pixel buffer with a batched write session and its displayable
// texture. Per-pixel texture updates are far too slow, so every write goes
// into a private copy that is committed and uploaded once per tick.
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::config::CANVAS_SIZE;

// ======================== Color ========================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// HSV → RGB using the piecewise-linear channel form.
    /// `hue` in degrees, `saturation` and `value` in `[0, 1]`.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let channel = |n: f32| -> u8 {
            let k = (n + hue / 60.0) % 6.0;
            let k = k.min(4.0 - k).clamp(0.0, 1.0);
            ((value - value * saturation * k) * 255.0) as u8
        };
        Self::rgb(channel(5.0), channel(3.0), channel(1.0))
    }
}

// ======================== Display Seams ========================

/// GPU-side (or otherwise displayable) mirror of one canvas.
pub trait CanvasTexture {
    /// Replace the whole texture with `pixels` (row-major, `side * side`).
    fn upload(&mut self, pixels: &[Rgba]);
    /// Free the underlying resource. Called exactly once per texture.
    fn release(&mut self);
}

/// Creates the displayable texture for a freshly created canvas.
pub trait TextureAllocator {
    type Texture: CanvasTexture;

    fn allocate(&mut self, side: u32, pixels: &[Rgba]) -> Self::Texture;
}

#[inline]
fn index(x: u32, y: u32) -> usize {
    debug_assert!(x < CANVAS_SIZE && y < CANVAS_SIZE, "pixel ({x}, {y}) out of range");
    (y * CANVAS_SIZE + x) as usize
}

// ======================== Canvas ========================

/// The one authoritative pixel buffer plus the texture it is displayed with.
pub struct Canvas<T: CanvasTexture> {
    pixels: Vec<Rgba>,
    texture: Option<T>,
}

impl<T: CanvasTexture> Canvas<T> {
    pub fn create<A>(fill: Rgba, allocator: &mut A) -> Self
    where
        A: TextureAllocator<Texture = T>,
    {
        let pixels = vec![fill; (CANVAS_SIZE * CANVAS_SIZE) as usize];
        let texture = allocator.allocate(CANVAS_SIZE, &pixels);
        Self {
            pixels,
            texture: Some(texture),
        }
    }

    pub fn side(&self) -> u32 {
        CANVAS_SIZE
    }

    /// Committed color at `(x, y)`.
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[index(x, y)]
    }

    /// Committed buffer, row-major. Empty once destroyed.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Texture backing this canvas, `None` once destroyed.
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    /// Start a write session on a private copy of the buffer. Nothing reaches
    /// the buffer or the texture until [`Batch::commit`].
    pub fn begin_batch(&mut self) -> Batch<'_, T> {
        let pixels = self.pixels.clone();
        Batch {
            canvas: self,
            pixels,
            committed: false,
        }
    }

    /// Frozen copy of the committed buffer, unaffected by any open batch.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pixels: self.pixels.clone(),
        }
    }

    /// Release the texture. The buffer is dropped with it; the canvas must be
    /// replaced afterwards. Calling it twice releases nothing the second time.
    pub fn destroy(&mut self) {
        if let Some(mut texture) = self.texture.take() {
            texture.release();
        }
        self.pixels = Vec::new();
    }

    pub fn is_destroyed(&self) -> bool {
        self.texture.is_none()
    }
}

impl<T: CanvasTexture> Drop for Canvas<T> {
    fn drop(&mut self) {
        if self.texture.is_some() && !std::thread::panicking() {
            log::error!("canvas dropped without releasing its texture; GPU memory leaked");
            debug_assert!(false, "Canvas::destroy must run before a canvas is discarded");
        }
    }
}

// ======================== Batch ========================

/// Scoped write session. Commit it, or its writes are thrown away.
#[must_use = "a batch does nothing until it is committed"]
pub struct Batch<'a, T: CanvasTexture> {
    canvas: &'a mut Canvas<T>,
    pixels: Vec<Rgba>,
    committed: bool,
}

impl<T: CanvasTexture> Batch<'_, T> {
    #[inline]
    pub fn write_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        self.pixels[index(x, y)] = color;
    }

    /// Make the private copy the canvas buffer and push it to the texture in
    /// a single upload.
    pub fn commit(mut self) {
        let pixels = std::mem::take(&mut self.pixels);
        if let Some(texture) = self.canvas.texture.as_mut() {
            texture.upload(&pixels);
        }
        self.canvas.pixels = pixels;
        self.committed = true;
    }
}

impl<T: CanvasTexture> Drop for Batch<'_, T> {
    fn drop(&mut self) {
        if !self.committed && !std::thread::panicking() {
            log::warn!("pixel batch dropped without commit; its writes were discarded");
        }
    }
}

// ======================== Snapshot ========================

/// Read-only copy of a canvas buffer at one point in time.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pixels: Vec<Rgba>,
}

impl Snapshot {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.pixels[index(x, y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BACKGROUND, OCCUPANCY_MARKER, TRAIL_SATURATION, TRAIL_VALUE};
    use crate::testing::CountingAllocator;

    #[test]
    fn create_fills_every_cell_and_uploads_once() {
        let mut allocator = CountingAllocator::default();
        let mut canvas = Canvas::create(BACKGROUND, &mut allocator);

        assert_eq!(canvas.side(), CANVAS_SIZE);
        assert_eq!(canvas.pixel(0, 0), BACKGROUND);
        assert_eq!(canvas.pixel(CANVAS_SIZE - 1, CANVAS_SIZE - 1), BACKGROUND);
        assert_eq!(allocator.allocated(), 1);
        assert_eq!(canvas.texture().map(|t| t.uploads()), Some(0));

        canvas.destroy();
    }

    #[test]
    fn batch_writes_stay_private_until_commit() {
        let mut allocator = CountingAllocator::default();
        let mut canvas = Canvas::create(BACKGROUND, &mut allocator);
        let red = Rgba::rgb(255, 0, 0);

        let mut batch = canvas.begin_batch();
        batch.write_pixel(3, 4, red);
        batch.commit();

        assert_eq!(canvas.pixel(3, 4), red);
        assert_eq!(canvas.pixel(4, 3), BACKGROUND);
        let texture = canvas.texture().expect("texture is live");
        assert_eq!(texture.uploads(), 1);
        assert_eq!(texture.last_upload_len(), (CANVAS_SIZE * CANVAS_SIZE) as usize);

        canvas.destroy();
    }

    #[test]
    fn dropped_batch_leaves_canvas_untouched() {
        let mut allocator = CountingAllocator::default();
        let mut canvas = Canvas::create(BACKGROUND, &mut allocator);

        {
            let mut batch = canvas.begin_batch();
            batch.write_pixel(1, 1, OCCUPANCY_MARKER);
        }

        assert_eq!(canvas.pixel(1, 1), BACKGROUND);
        assert_eq!(canvas.texture().map(|t| t.uploads()), Some(0));
        canvas.destroy();
    }

    #[test]
    fn snapshot_ignores_later_writes() {
        let mut allocator = CountingAllocator::default();
        let mut canvas = Canvas::create(BACKGROUND, &mut allocator);

        let snapshot = canvas.snapshot();
        let mut batch = canvas.begin_batch();
        batch.write_pixel(10, 20, OCCUPANCY_MARKER);
        batch.commit();

        assert_eq!(snapshot.get(10, 20), BACKGROUND);
        assert_eq!(canvas.pixel(10, 20), OCCUPANCY_MARKER);
        canvas.destroy();
    }

    #[test]
    fn destroy_releases_texture_exactly_once() {
        let mut allocator = CountingAllocator::default();
        let mut canvas = Canvas::create(BACKGROUND, &mut allocator);

        canvas.destroy();
        canvas.destroy();

        assert!(canvas.is_destroyed());
        assert_eq!(allocator.released(), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Canvas::destroy must run")]
    fn dropping_a_live_canvas_is_fatal() {
        let mut allocator = CountingAllocator::default();
        let canvas = Canvas::create(BACKGROUND, &mut allocator);
        drop(canvas);
    }

    #[test]
    fn hsv_primary_hues() {
        assert_eq!(Rgba::from_hsv(0.0, 1.0, 1.0), Rgba::rgb(255, 0, 0));
        assert_eq!(Rgba::from_hsv(120.0, 1.0, 1.0), Rgba::rgb(0, 255, 0));
        assert_eq!(Rgba::from_hsv(240.0, 1.0, 1.0), Rgba::rgb(0, 0, 255));
        assert_eq!(Rgba::from_hsv(0.0, 0.7, 1.0), Rgba::rgb(255, 76, 76));
    }

    #[test]
    fn trail_colors_never_collide_with_reserved_colors() {
        for hue in 0..360 {
            let color = Rgba::from_hsv(hue as f32, TRAIL_SATURATION, TRAIL_VALUE);
            assert_ne!(color, BACKGROUND, "hue {hue}");
            assert_ne!(color, OCCUPANCY_MARKER, "hue {hue}");
        }
    }
}
