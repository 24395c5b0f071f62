/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Thin layer over `wgpu`: the render target, uniform buffers and indexed
//! drawables built from vertex attributes and bind group slots.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use bytemuck::NoUninit;
use log::debug;
use wgpu::util::DeviceExt;
use winit::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

pub enum IndexData<'a> {
    U32(&'a [u32]),
    U16(&'a [u16]),
}

impl IndexData<'_> {
    fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
        }
    }

    fn count(&self) -> anyhow::Result<u32> {
        let len = match self {
            IndexData::U32(indices) => indices.len(),
            IndexData::U16(indices) => indices.len(),
        };
        Ok(u32::try_from(len)?)
    }

    fn bytes(&self) -> &[u8] {
        match self {
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
        }
    }
}

/// A value living in its own uniform buffer, mirrored on the CPU side.
///
/// Only scalars, `vec4` and `mat4x4` are used here, which need no padding.
pub struct Uniform<T> {
    value: T,
    buffer: wgpu::Buffer,
    queue: Rc<wgpu::Queue>,
}

impl<T: NoUninit + PartialEq> Uniform<T> {
    pub fn new(context: &DrawContext, value: T) -> Self {
        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Uniform Buffer"),
                contents: bytemuck::bytes_of(&value),
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::UNIFORM,
            });
        Self {
            value,
            buffer,
            queue: Rc::clone(&context.queue),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Queues a buffer write when `value` differs from the current one.
    /// Returns whether a write happened.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.value));
        true
    }
}

pub struct BindingSlot<'a> {
    pub bind_group: u32,
    pub binding: u32,
    pub resource: &'a dyn AsBindingResource,
}

pub trait AsBindingResource {
    fn binding_resource(&self) -> wgpu::BindingResource;
    fn binding_type(&self) -> wgpu::BindingType;
}

impl<T> AsBindingResource for Uniform<T> {
    fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
    fn binding_type(&self) -> wgpu::BindingType {
        wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        }
    }
}

enum GroupSource<'a> {
    /// Built from slots and owned by the drawable.
    Slots(BTreeMap<u32, (wgpu::BindingResource<'a>, wgpu::BindGroupLayoutEntry)>),
    /// Layout only, the bind group is handed over at render time.
    External(&'a wgpu::BindGroupLayout),
}

struct VertexInput {
    attribute: [wgpu::VertexAttribute; 1],
    buffer: wgpu::Buffer,
}

pub struct DrawableBuilder<'a> {
    context: &'a DrawContext,
    shader_module: &'a wgpu::ShaderModule,
    index_format: wgpu::IndexFormat,
    index_count: u32,
    index_buffer: wgpu::Buffer,
    vertex_inputs: Vec<VertexInput>,
    used_locations: HashSet<u32>,
    groups: BTreeMap<u32, GroupSource<'a>>,
    blend_state: Option<wgpu::BlendState>,
    cull_mode: Option<wgpu::Face>,
}

impl<'a> DrawableBuilder<'a> {
    /// The shader module must provide both `vs_main` and `fs_main` entry points.
    pub fn new(
        context: &'a DrawContext,
        shader_module: &'a wgpu::ShaderModule,
        indices: &IndexData,
    ) -> anyhow::Result<Self> {
        let index_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: indices.bytes(),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(Self {
            context,
            shader_module,
            index_format: indices.format(),
            index_count: indices.count()?,
            index_buffer,
            vertex_inputs: Vec::new(),
            used_locations: HashSet::new(),
            groups: BTreeMap::new(),
            blend_state: None,
            cull_mode: Some(wgpu::Face::Back),
        })
    }

    pub fn set_blend_state(&mut self, blend_state: wgpu::BlendState) -> &mut Self {
        self.blend_state = Some(blend_state);
        self
    }

    pub fn set_cull_mode(&mut self, cull_mode: Option<wgpu::Face>) -> &mut Self {
        self.cull_mode = cull_mode;
        self
    }

    /// One vertex buffer per attribute, stepped per vertex.
    pub fn add_attribute<T: NoUninit>(
        &mut self,
        shader_location: u32,
        data: &[T],
        format: wgpu::VertexFormat,
    ) -> anyhow::Result<&mut Self> {
        if !self.used_locations.insert(shader_location) {
            bail!("Location {} already used!", shader_location);
        }
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_inputs.push(VertexInput {
            attribute: [wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location,
            }],
            buffer,
        });
        Ok(self)
    }

    pub fn add_binding_slot(&mut self, slot: &BindingSlot<'a>) -> anyhow::Result<&mut Self> {
        let source = self
            .groups
            .entry(slot.bind_group)
            .or_insert_with(|| GroupSource::Slots(BTreeMap::new()));
        let GroupSource::Slots(bindings) = source else {
            bail!(
                "Bind group {} is provided by the caller at render time",
                slot.bind_group
            );
        };
        if bindings.contains_key(&slot.binding) {
            bail!(
                "Binding {} of bind group {} already used!",
                slot.binding,
                slot.bind_group
            );
        }
        let layout_entry = wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: slot.resource.binding_type(),
            count: None,
        };
        bindings.insert(
            slot.binding,
            (slot.resource.binding_resource(), layout_entry),
        );
        Ok(self)
    }

    /// Reserves a whole bind group whose content is swapped by the owner of the
    /// drawable, see [`Drawable::render_with`].
    pub fn add_bind_group_layout(
        &mut self,
        bind_group: u32,
        layout: &'a wgpu::BindGroupLayout,
    ) -> anyhow::Result<&mut Self> {
        if self.groups.contains_key(&bind_group) {
            bail!("Bind group {} already used!", bind_group);
        }
        self.groups.insert(bind_group, GroupSource::External(layout));
        Ok(self)
    }

    /// Bind groups must be numbered contiguously from 0.
    pub fn build(self) -> anyhow::Result<Drawable> {
        let device = &self.context.device;
        let mut owned_layouts = BTreeMap::new();
        let mut bind_groups = Vec::new();
        for (expected, (group_id, source)) in (0..).zip(&self.groups) {
            if *group_id != expected {
                bail!("Bind group {} is missing", expected);
            }
            if let GroupSource::Slots(bindings) = source {
                let (layout, bind_group) = Self::create_bind_group(device, bindings);
                owned_layouts.insert(*group_id, layout);
                bind_groups.push((*group_id, bind_group));
            }
        }
        let layouts: Vec<&wgpu::BindGroupLayout> = self
            .groups
            .iter()
            .map(|(group_id, source)| match source {
                GroupSource::External(layout) => Ok(*layout),
                GroupSource::Slots(_) => owned_layouts
                    .get(group_id)
                    .ok_or_else(|| anyhow!("No layout for bind group {group_id}")),
            })
            .collect::<anyhow::Result<_>>()?;
        let pipeline = self.create_pipeline(&layouts);
        Ok(Drawable {
            pipeline,
            bind_groups,
            vertex_buffers: self.vertex_inputs.into_iter().map(|v| v.buffer).collect(),
            index_buffer: self.index_buffer,
            index_format: self.index_format,
            index_count: self.index_count,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        bindings: &BTreeMap<u32, (wgpu::BindingResource<'a>, wgpu::BindGroupLayoutEntry)>,
    ) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
        let layout_entries: Vec<_> = bindings.values().map(|(_, entry)| *entry).collect();
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &layout_entries,
        });
        let entries: Vec<_> = bindings
            .iter()
            .map(|(binding, (resource, _))| wgpu::BindGroupEntry {
                binding: *binding,
                resource: resource.clone(),
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout,
            entries: &entries,
        });
        (layout, bind_group)
    }

    fn create_pipeline(&self, layouts: &[&wgpu::BindGroupLayout]) -> wgpu::RenderPipeline {
        let device = &self.context.device;
        let buffer_layouts: Vec<_> = self
            .vertex_inputs
            .iter()
            .map(|input| wgpu::VertexBufferLayout {
                array_stride: input.attribute[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &input.attribute,
            })
            .collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: layouts,
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: self.shader_module,
                entry_point: Some("vs_main"),
                buffers: &buffer_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: self.shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.context.surface_config.format,
                    blend: self.blend_state,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DrawContext::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.context.sample_count(),
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }
}

pub struct Drawable {
    pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<(u32, wgpu::BindGroup)>,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
}

impl Drawable {
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.render_with(render_pass, &[]);
    }

    /// Same as [`Drawable::render`], also setting the bind groups reserved with
    /// [`DrawableBuilder::add_bind_group_layout`].
    pub fn render_with(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        external_groups: &[(u32, &wgpu::BindGroup)],
    ) {
        render_pass.set_pipeline(&self.pipeline);
        for (group_id, bind_group) in &self.bind_groups {
            render_pass.set_bind_group(*group_id, bind_group, &[]);
        }
        for (group_id, bind_group) in external_groups {
            render_pass.set_bind_group(*group_id, *bind_group, &[]);
        }
        for (slot, buffer) in (0..).zip(&self.vertex_buffers) {
            render_pass.set_vertex_buffer(slot, buffer.slice(..));
        }
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Depth buffer, plus the multisampled color buffer resolved into the target.
struct Attachments {
    depth: wgpu::TextureView,
    multisample: Option<wgpu::TextureView>,
}

impl Attachments {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Self {
        let create = |label, format| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: config.width,
                        height: config.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        Self {
            depth: create("Depth Texture", DrawContext::DEPTH_FORMAT),
            multisample: (sample_count > 1).then(|| create("Multisample Texture", config.format)),
        }
    }
}

/// Where frames end up: a window surface, or a texture when headless.
enum RenderTarget {
    Offscreen(wgpu::Texture),
    Surface(wgpu::Surface<'static>),
}

impl RenderTarget {
    fn configure(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        match self {
            Self::Offscreen(texture) => {
                *texture = Self::offscreen_texture(device, config);
            }
            Self::Surface(surface) => surface.configure(device, config),
        }
    }

    fn offscreen_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }
}

pub struct DrawContext {
    target: RenderTarget,
    attachments: Attachments,
    sample_count: u32,
    clear_color: Option<wgpu::Color>,
    pub window: Option<Arc<Window>>,
    pub queue: Rc<wgpu::Queue>,
    pub device: wgpu::Device,
    pub surface_config: wgpu::SurfaceConfiguration,
}

impl DrawContext {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    const DEFAULT_SIZE: u32 = 500;
    const SAMPLE_COUNT: u32 = 4;
    const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Without a window, frames are drawn to an offscreen texture.
    ///
    /// A browser window reports a size of 0 until the canvas is laid out, so
    /// `dimensions` takes precedence over the window size.
    pub async fn new(
        window: Option<Arc<Window>>,
        dimensions: Option<Dimensions>,
    ) -> anyhow::Result<Self> {
        let Dimensions { width, height } = dimensions
            .or_else(|| {
                window.as_ref().map(|w| Dimensions {
                    width: w.inner_size().width,
                    height: w.inner_size().height,
                })
            })
            .unwrap_or(Dimensions {
                width: Self::DEFAULT_SIZE,
                height: Self::DEFAULT_SIZE,
            });
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = window
            .as_ref()
            .map(|w| instance.create_surface(Arc::clone(w)))
            .transpose()?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: surface.as_ref(),
            })
            .await
            .ok_or_else(|| anyhow!("Could not create WebGPU adapter"))?;
        debug!("{:?}", adapter.get_info());
        let required_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::default()
        };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;
        let format = match &surface {
            Some(surface) => {
                let formats = surface.get_capabilities(&adapter).formats;
                formats
                    .iter()
                    .copied()
                    .find(wgpu::TextureFormat::is_srgb)
                    .or_else(|| formats.first().copied())
                    .ok_or_else(|| anyhow!("Surface is not compatible with the adapter"))?
            }
            None => Self::OFFSCREEN_FORMAT,
        };
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        let target = match surface {
            Some(surface) => {
                surface.configure(&device, &surface_config);
                RenderTarget::Surface(surface)
            }
            None => RenderTarget::Offscreen(RenderTarget::offscreen_texture(
                &device,
                &surface_config,
            )),
        };
        let attachments = Attachments::new(&device, &surface_config, Self::SAMPLE_COUNT);
        Ok(Self {
            target,
            attachments,
            sample_count: Self::SAMPLE_COUNT,
            clear_color: Some(wgpu::Color::BLACK),
            window,
            queue: Rc::new(queue),
            device,
            surface_config,
        })
    }

    /// `None` keeps the previous content of the target.
    pub fn set_clear_color(&mut self, color: Option<wgpu::Color>) {
        self.clear_color = color;
    }

    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn create_shader_module(&self, wgsl_shader: &str) -> wgpu::ShaderModule {
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: None,
                source: wgpu::ShaderSource::Wgsl(wgsl_shader.into()),
            })
    }

    /// Creates a sampled 2D texture filled with tightly packed RGBA8 `pixels`.
    pub fn create_rgba_texture(
        &self,
        label: &str,
        dimensions: Dimensions,
        format: wgpu::TextureFormat,
        pixels: &[u8],
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: dimensions.width,
            height: dimensions.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.width),
                rows_per_image: Some(dimensions.height),
            },
            size,
        );
        texture
    }

    /// Zero sizes and unchanged sizes are ignored.
    pub fn resize(&mut self, dimensions: Dimensions) {
        let Dimensions { width, height } = dimensions;
        if width == 0 || height == 0 || dimensions == self.surface_dimensions() {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.target.configure(&self.device, &self.surface_config);
        self.attachments = Attachments::new(&self.device, &self.surface_config, self.sample_count);
    }

    /// Configures the render target again after the surface got lost.
    pub fn reconfigure(&mut self) {
        self.target.configure(&self.device, &self.surface_config);
    }

    #[must_use]
    pub fn surface_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.surface_config.width,
            height: self.surface_config.height,
        }
    }

    /// Runs `callback` inside a single render pass, then submits and presents.
    pub fn render_scene<C>(&self, callback: C) -> anyhow::Result<()>
    where
        C: FnOnce(wgpu::RenderPass<'_>),
    {
        let surface_texture = match &self.target {
            RenderTarget::Surface(surface) => Some(surface.get_current_texture()?),
            RenderTarget::Offscreen(_) => None,
        };
        let target_view = match (&self.target, &surface_texture) {
            (RenderTarget::Offscreen(texture), _) => {
                texture.create_view(&wgpu::TextureViewDescriptor::default())
            }
            (RenderTarget::Surface(_), Some(frame)) => frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (RenderTarget::Surface(_), None) => bail!("Surface texture should have been acquired"),
        };
        let (view, resolve_target) = match &self.attachments.multisample {
            Some(multisample) => (multisample, Some(&target_view)),
            None => (&target_view, None),
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Command Encoder"),
            });
        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: self
                        .clear_color
                        .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.attachments.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        callback(render_pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = surface_texture {
            frame.present();
        }
        Ok(())
    }
}
