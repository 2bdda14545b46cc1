// ============================================================================
// gpu_canvas.rs — Branches
// wgpu-backed canvas textures: one sRGB texture per canvas, one full upload
// per committed batch, explicit destroy on release.
// ============================================================================

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::camera::{Camera2D, CameraUniforms};
use crate::canvas::{CanvasTexture, Rgba, TextureAllocator};
use crate::config::CANVAS_SIZE;
use crate::pipeline::canvas_bind_group_layout;

/// Creates canvas textures and owns what every canvas bind group shares:
/// the layout, a nearest-neighbour sampler and the camera uniform buffer.
pub struct GpuTextureAllocator {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,
}

impl GpuTextureAllocator {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let layout = canvas_bind_group_layout(&device);

        // Nearest filtering keeps single pixels crisp while zooming in.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("canvas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniforms"),
            contents: bytemuck::bytes_of(&Camera2D::default().uniforms(CANVAS_SIZE, CANVAS_SIZE)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            device,
            queue,
            layout,
            sampler,
            camera_buffer,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn write_camera(&self, uniforms: &CameraUniforms) {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

impl TextureAllocator for GpuTextureAllocator {
    type Texture = GpuCanvasTexture;

    fn allocate(&mut self, side: u32, pixels: &[Rgba]) -> GpuCanvasTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas_texture"),
            size: extent(side),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("canvas_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
            ],
        });

        let mut canvas_texture = GpuCanvasTexture {
            texture,
            bind_group,
            queue: Arc::clone(&self.queue),
            side,
        };
        canvas_texture.upload(pixels);
        log::debug!("Allocated {side}x{side} canvas texture");
        canvas_texture
    }
}

pub struct GpuCanvasTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    queue: Arc<wgpu::Queue>,
    side: u32,
}

impl GpuCanvasTexture {
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

impl CanvasTexture for GpuCanvasTexture {
    fn upload(&mut self, pixels: &[Rgba]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(pixels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.side),
                rows_per_image: Some(self.side),
            },
            extent(self.side),
        );
    }

    fn release(&mut self) {
        // VRAM is not reclaimed until the texture is destroyed explicitly.
        self.texture.destroy();
        log::debug!("Released canvas texture");
    }
}

fn extent(side: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: side,
        height: side,
        depth_or_array_layers: 1,
    }
}
