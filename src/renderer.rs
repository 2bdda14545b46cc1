// ============================================================================
// renderer.rs — Branches
// Debug HUD text rendering via glyphon.
// ============================================================================

use glyphon::{
    Attrs, Buffer as TextBuffer, Cache as GlyphCache, Color as GlyphColor, Family, FontSystem,
    Metrics, Resolution, Shaping, SwashCache, TextArea, TextAtlas, TextBounds, TextRenderer,
    Viewport as GlyphViewport,
};

use crate::cycle::CyclePhase;

/// Numbers shown in the top-left corner each frame.
#[derive(Clone, Debug)]
pub struct HudInfo {
    pub pens: usize,
    pub phase: CyclePhase,
    pub cycle: u64,
    pub zoom: f32,
    pub update_ms: f32,
    pub draw_ms: f32,
}

/// All glyphon resources needed for HUD text rendering.
pub struct HudRenderer {
    pub font_system: FontSystem,
    pub swash_cache: SwashCache,
    pub glyph_viewport: GlyphViewport,
    pub text_atlas: TextAtlas,
    pub text_renderer: TextRenderer,
}

impl HudRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let glyph_cache = GlyphCache::new(device);
        let glyph_viewport = GlyphViewport::new(device, &glyph_cache);
        let mut text_atlas = TextAtlas::new(device, queue, &glyph_cache, surface_format);
        let text_renderer =
            TextRenderer::new(&mut text_atlas, device, wgpu::MultisampleState::default(), None);

        Self {
            font_system,
            swash_cache,
            glyph_viewport,
            text_atlas,
            text_renderer,
        }
    }

    /// Shape and upload this frame's HUD text.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        info: &HudInfo,
        win_w: u32,
        win_h: u32,
    ) {
        self.glyph_viewport.update(
            queue,
            Resolution {
                width: win_w,
                height: win_h,
            },
        );

        let hud_text = build_hud_text(info);

        let mut text_buf = TextBuffer::new(&mut self.font_system, Metrics::new(12.0, 14.0));
        text_buf.set_size(&mut self.font_system, Some(win_w as f32), Some(win_h as f32));
        text_buf.set_text(
            &mut self.font_system,
            &hud_text,
            Attrs::new().family(Family::Monospace),
            Shaping::Basic,
        );
        text_buf.shape_until_scroll(&mut self.font_system, false);

        let prepared = self.text_renderer.prepare(
            device,
            queue,
            &mut self.font_system,
            &mut self.text_atlas,
            &self.glyph_viewport,
            [TextArea {
                buffer: &text_buf,
                left: 10.0,
                top: 10.0,
                scale: 1.0,
                bounds: TextBounds {
                    left: 0,
                    top: 0,
                    right: win_w as i32,
                    bottom: win_h as i32,
                },
                default_color: GlyphColor::rgb(230, 41, 55),
                custom_glyphs: &[],
            }],
            &mut self.swash_cache,
        );
        if let Err(err) = prepared {
            log::warn!("HUD text prepare failed: {err:?}");
        }
    }

    /// Render HUD overlay into an active render pass.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if let Err(err) = self
            .text_renderer
            .render(&self.text_atlas, &self.glyph_viewport, pass)
        {
            log::warn!("HUD text render failed: {err:?}");
        }
    }

    /// Trim the glyph atlas after presenting.
    pub fn trim(&mut self) {
        self.text_atlas.trim();
    }
}

// ======================== HUD Text Builder ========================

fn build_hud_text(info: &HudInfo) -> String {
    format!(
        "pens: {}\n\
         update total: {:.2} ms\n\
         draw: {:.2} ms\n\
         cycle {} ({})  zoom {:.2}x",
        info.pens,
        info.update_ms,
        info.draw_ms,
        info.cycle,
        info.phase.name(),
        info.zoom,
    )
}
