use bytemuck::Zeroable;
use renderkit_mesh::Mesh;
use renderkit_render::{
    FrameOutcome, FramePass, FrameUniforms, ModelUniforms, RenderBackend, RenderError,
};
use wgpu::util::DeviceExt;

use crate::config::{DEPTH_FORMAT, RendererConfig};
use crate::mesh_upload::{GpuMesh, index_format, upload_mesh};
use crate::pipeline::ForwardPipelines;
use crate::shaders;

const MODEL_SIZE: u64 = std::mem::size_of::<ModelUniforms>() as u64;
const INITIAL_MODEL_SLOTS: u64 = 64;

/// Round `value` up to a multiple of `alignment`.
pub fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

pub fn clear_color(color: glam::Vec4) -> wgpu::Color {
    wgpu::Color {
        r: color.x as f64,
        g: color.y as f64,
        b: color.z as f64,
        a: color.w as f64,
    }
}

/// Number of model slots to allocate for `count` draws: the next power of
/// two, capped so the buffer stays within `max_buffer_size` and every
/// dynamic offset fits in a `u32`. `None` if `count` itself exceeds the cap.
pub fn model_slot_capacity(count: u64, stride: u64, max_buffer_size: u64) -> Option<u64> {
    let by_size = max_buffer_size / stride;
    // The last slot starts at (slots - 1) * stride.
    let by_offset = u32::MAX as u64 / stride + 1;
    let limit = by_size.min(by_offset);
    if count > limit {
        return None;
    }
    Some(count.next_power_of_two().min(limit))
}

/// Run `f` inside a validation error scope and surface any captured error.
fn validated<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(out),
    }
}

/// wgpu-backed device, surface and forward pipeline.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    sample_count: u32,
    pipelines: ForwardPipelines,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    model_slots: u64,
    model_staging: Vec<u8>,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    /// Acquire a device for `target` and build the surface, pipelines and
    /// depth state. Any failure is returned instead of aborting.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        settings: &RendererConfig,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: settings.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("renderkit_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = settings
            .pick_color_format(&caps.formats)
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        if format != settings.color_format {
            tracing::warn!(
                "{:?} unsupported by surface, using {:?}",
                settings.color_format,
                format
            );
        }

        let sample_count = Self::supported_sample_count(&adapter, format, settings.sample_count);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: settings.present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(MODEL_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("forward_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let shader = validated(&device, || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("forward_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::FORWARD_SHADER.into()),
            })
        })
        .map_err(RenderError::Shader)?;

        let pipelines = validated(&device, || {
            ForwardPipelines::new(&device, &shader, &pipeline_layout, format, sample_count)
        })
        .map_err(RenderError::Pipeline)?;

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let model_stride = align_to(
            MODEL_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(&device, &model_layout, model_stride, INITIAL_MODEL_SLOTS);

        let depth_view = Self::create_depth_texture(&device, &config, sample_count);
        let msaa_view = Self::create_msaa_texture(&device, &config, sample_count);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %adapter.get_info().name,
            ?format,
            sample_count,
            "GPU initialized"
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
            size: (width, height),
            sample_count,
            pipelines,
            frame_buffer,
            frame_bind_group,
            model_layout,
            model_buffer,
            model_bind_group,
            model_stride,
            model_slots: INITIAL_MODEL_SLOTS,
            model_staging: Vec::new(),
            depth_view,
            msaa_view,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn supported_sample_count(
        adapter: &wgpu::Adapter,
        format: wgpu::TextureFormat,
        requested: u32,
    ) -> u32 {
        if requested <= 1 {
            return 1;
        }
        let supported = |f| {
            adapter
                .get_texture_format_features(f)
                .flags
                .sample_count_supported(requested)
        };
        if supported(format) && supported(DEPTH_FORMAT) {
            requested
        } else {
            tracing::warn!(requested, "sample count unsupported, falling back to 1");
            1
        }
    }

    fn create_model_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        slots: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("model_uniforms"),
            size: stride * slots,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(MODEL_SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Grow the per-instance uniform buffer to hold at least `count` blocks.
    /// Returns `false` if the device cannot hold that many.
    fn ensure_model_slots(&mut self, count: usize) -> bool {
        let count = count as u64;
        if count <= self.model_slots {
            return true;
        }
        let Some(slots) = model_slot_capacity(
            count,
            self.model_stride,
            self.device.limits().max_buffer_size,
        ) else {
            return false;
        };
        let (buffer, bind_group) =
            Self::create_model_buffer(&self.device, &self.model_layout, self.model_stride, slots);
        self.model_buffer = buffer;
        self.model_bind_group = bind_group;
        self.model_slots = slots;
        tracing::debug!(slots, "model uniform buffer grown");
        true
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_msaa_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa_color_texture"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&Default::default()))
    }

    fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface acquire timed out");
                None
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                None
            }
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Geometry = GpuMesh;

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<GpuMesh, RenderError> {
        Ok(upload_mesh(&self.device, mesh)?)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        // Minimized windows report a zero size; keep the old targets.
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_texture(&self.device, &self.config, self.sample_count);
        self.msaa_view = Self::create_msaa_texture(&self.device, &self.config, self.sample_count);
    }

    fn submit(&mut self, pass: &FramePass<'_, GpuMesh>) -> FrameOutcome {
        if self.size.0 == 0 || self.size.1 == 0 {
            return FrameOutcome::Skipped;
        }
        if !self.ensure_model_slots(pass.draws.len()) {
            tracing::warn!(
                draws = pass.draws.len(),
                max_buffer_size = self.device.limits().max_buffer_size,
                "too many instances for one model uniform buffer, frame skipped"
            );
            return FrameOutcome::Skipped;
        }
        let Some(output) = self.acquire() else {
            return FrameOutcome::Skipped;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&pass.frame));

        if !pass.draws.is_empty() {
            let stride = self.model_stride as usize;
            self.model_staging.clear();
            self.model_staging.resize(stride * pass.draws.len(), 0);
            for (chunk, item) in self.model_staging.chunks_mut(stride).zip(&pass.draws) {
                chunk[..MODEL_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&item.model));
            }
            self.queue
                .write_buffer(&self.model_buffer, 0, &self.model_staging);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("forward_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(pass.clear.color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            rpass.set_pipeline(self.pipelines.get(pass.cull_mode));
            rpass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (i, item) in pass.draws.iter().enumerate() {
                let mesh = item.geometry;
                rpass.set_vertex_buffer(0, mesh.positions.slice(..));
                rpass.set_vertex_buffer(1, mesh.normals.slice(..));
                rpass.set_vertex_buffer(2, mesh.uvs.slice(..));
                rpass.set_index_buffer(mesh.indices.slice(..), index_format(mesh.index_width));
                // In range: slot count is capped by `model_slot_capacity`.
                let offset = (i as u64 * self.model_stride) as u32;
                rpass.set_bind_group(1, &self.model_bind_group, &[offset]);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        FrameOutcome::Presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_rounds_up() {
        assert_eq!(align_to(96, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(96, 32), 96);
    }

    #[test]
    fn model_slots_grow_to_power_of_two() {
        assert_eq!(model_slot_capacity(65, 256, 1 << 28), Some(128));
        assert_eq!(model_slot_capacity(128, 256, 1 << 28), Some(128));
        assert_eq!(model_slot_capacity(1, 256, 1 << 28), Some(1));
    }

    #[test]
    fn model_slots_respect_buffer_limit() {
        // 1 MiB buffer holds 4096 blocks of 256 bytes.
        let max = 1 << 20;
        assert_eq!(model_slot_capacity(3000, 256, max), Some(4096));
        assert_eq!(model_slot_capacity(4096, 256, max), Some(4096));
        assert_eq!(model_slot_capacity(4097, 256, max), None);
        // Rounding up would overshoot; clamp to the limit instead.
        assert_eq!(model_slot_capacity(3000, 256, 3500 * 256), Some(3500));
    }

    #[test]
    fn model_slots_keep_offsets_in_u32() {
        let stride = 256;
        let slots = model_slot_capacity(1 << 24, stride, u64::MAX).unwrap();
        assert_eq!(slots, 1 << 24);
        assert!((slots - 1) * stride <= u32::MAX as u64);
        assert_eq!(model_slot_capacity((1 << 24) + 1, stride, u64::MAX), None);
    }

    #[test]
    fn clear_color_widens_channels() {
        let c = clear_color(glam::Vec4::new(0.5, 0.25, 0.0, 1.0));
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 0.0, 1.0));
    }
}
