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

use std::fmt;

use crate::assets::DecodedTexture;
use crate::draw_context::{AsBindingResource, BindingSlot, Dimensions, DrawContext, Uniform};

/// The four image-encoded buffers sampled by the plane shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataChannel {
    Diffuse,
    Position,
    Motion,
    Data,
}

impl DataChannel {
    pub const ALL: [DataChannel; 4] = [
        DataChannel::Diffuse,
        DataChannel::Position,
        DataChannel::Motion,
        DataChannel::Data,
    ];

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            DataChannel::Diffuse => "gameboy_diffuse-high.png",
            DataChannel::Position => "gameboy_position-high.png",
            DataChannel::Motion => "gameboy_mv-high.png",
            DataChannel::Data => "gameboy_data-high.png",
        }
    }

    /// Only the diffuse channel holds colors, the others hold raw data.
    #[must_use]
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            DataChannel::Diffuse => wgpu::TextureFormat::Rgba8UnormSrgb,
            _ => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn index(self) -> usize {
        match self {
            DataChannel::Diffuse => 0,
            DataChannel::Position => 1,
            DataChannel::Motion => 2,
            DataChannel::Data => 3,
        }
    }

    /// Binding of the texture in [`ChannelBindings`], after the sampler.
    fn binding(self) -> u32 {
        match self {
            DataChannel::Diffuse => 1,
            DataChannel::Position => 2,
            DataChannel::Motion => 3,
            DataChannel::Data => 4,
        }
    }
}

impl fmt::Display for DataChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataChannel::Diffuse => "diffuse",
            DataChannel::Position => "position",
            DataChannel::Motion => "motion",
            DataChannel::Data => "data",
        };
        f.write_str(name)
    }
}

/// One optional value per data channel, unset until its asset resolves.
#[derive(Debug)]
pub struct ChannelSlots<T> {
    slots: [Option<T>; 4],
}

impl<T> Default for ChannelSlots<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }
}

impl<T> ChannelSlots<T> {
    #[must_use]
    pub fn get(&self, channel: DataChannel) -> Option<&T> {
        self.slots[channel.index()].as_ref()
    }

    pub fn set(&mut self, channel: DataChannel, value: T) -> &T {
        self.slots[channel.index()].insert(value)
    }

    #[must_use]
    pub fn is_set(&self, channel: DataChannel) -> bool {
        self.slots[channel.index()].is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DataChannel, Option<&T>)> {
        DataChannel::ALL
            .into_iter()
            .map(|channel| (channel, self.get(channel)))
    }
}

/// CPU copy of every scalar uniform of the plane material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialValues {
    pub time: f32,
    pub progress: f32,
    pub mouse_x: f32,
    pub displacement_strength: f32,
    pub resolution: [f32; 4],
}

pub struct MaterialUniforms {
    pub time: Uniform<f32>,
    pub progress: Uniform<f32>,
    pub mouse_x: Uniform<f32>,
    pub displacement_strength: Uniform<f32>,
    pub resolution: Uniform<[f32; 4]>,
}

impl MaterialUniforms {
    pub const BIND_GROUP: u32 = 1;

    pub fn new(context: &DrawContext, values: &MaterialValues) -> Self {
        Self {
            time: Uniform::new(context, values.time),
            progress: Uniform::new(context, values.progress),
            mouse_x: Uniform::new(context, values.mouse_x),
            displacement_strength: Uniform::new(context, values.displacement_strength),
            resolution: Uniform::new(context, values.resolution),
        }
    }

    fn slot(binding: u32, resource: &dyn AsBindingResource) -> BindingSlot<'_> {
        BindingSlot {
            bind_group: Self::BIND_GROUP,
            binding,
            resource,
        }
    }

    #[must_use]
    pub fn binding_slots(&self) -> [BindingSlot<'_>; 5] {
        [
            Self::slot(0, &self.time),
            Self::slot(1, &self.progress),
            Self::slot(2, &self.mouse_x),
            Self::slot(3, &self.displacement_strength),
            Self::slot(4, &self.resolution),
        ]
    }

    /// Writes every value which differs from what the GPU already holds.
    pub fn sync(&mut self, values: &MaterialValues) {
        self.time.set(values.time);
        self.progress.set(values.progress);
        self.mouse_x.set(values.mouse_x);
        self.displacement_strength.set(values.displacement_strength);
        self.resolution.set(values.resolution);
    }
}

/// A decoded image uploaded to the GPU.
pub struct DataTexture {
    view: wgpu::TextureView,
}

impl DataTexture {
    pub fn upload(
        context: &DrawContext,
        label: &str,
        decoded: &DecodedTexture,
        format: wgpu::TextureFormat,
    ) -> Self {
        let dimensions = Dimensions {
            width: decoded.width,
            height: decoded.height,
        };
        let texture = context.create_rgba_texture(label, dimensions, format, &decoded.pixels);
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// Sampler and the four channel textures, bound as one group swapped on every upload.
pub struct ChannelBindings {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placeholder: DataTexture,
    bind_group: wgpu::BindGroup,
}

impl ChannelBindings {
    pub const BIND_GROUP: u32 = 2;

    pub fn new(context: &DrawContext) -> Self {
        let texture_entry = |channel: DataChannel| wgpu::BindGroupLayoutEntry {
            binding: channel.binding(),
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        }];
        entries.extend(DataChannel::ALL.map(texture_entry));
        let layout = context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Channel Bind Group Layout"),
                entries: &entries,
            });
        let sampler = context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Channel Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        // Unset channels sample transparent black
        let placeholder = DataTexture::upload(
            context,
            "Channel Placeholder",
            &DecodedTexture {
                width: 1,
                height: 1,
                pixels: vec![0; 4],
            },
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let bind_group = Self::create_bind_group(
            context,
            &layout,
            &sampler,
            &placeholder,
            &ChannelSlots::default(),
        );
        Self {
            layout,
            sampler,
            placeholder,
            bind_group,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    #[must_use]
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn rebuild(&mut self, context: &DrawContext, channels: &ChannelSlots<DataTexture>) {
        self.bind_group = Self::create_bind_group(
            context,
            &self.layout,
            &self.sampler,
            &self.placeholder,
            channels,
        );
    }

    fn create_bind_group(
        context: &DrawContext,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        placeholder: &DataTexture,
        channels: &ChannelSlots<DataTexture>,
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(sampler),
        }];
        entries.extend(channels.iter().map(|(channel, texture)| wgpu::BindGroupEntry {
            binding: channel.binding(),
            resource: wgpu::BindingResource::TextureView(&texture.unwrap_or(placeholder).view),
        }));
        context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Channel Bind Group"),
                layout,
                entries: &entries,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_independent() {
        let mut slots = ChannelSlots::default();
        slots.set(DataChannel::Motion, "motion");
        assert!(slots.is_set(DataChannel::Motion));
        assert!(!slots.is_set(DataChannel::Diffuse));
        assert_eq!(slots.get(DataChannel::Motion), Some(&"motion"));
        let set: Vec<_> = slots
            .iter()
            .filter_map(|(channel, value)| value.map(|_| channel))
            .collect();
        assert_eq!(set, vec![DataChannel::Motion]);
    }

    #[test]
    fn channels_have_distinct_bindings() {
        let mut bindings: Vec<u32> = DataChannel::ALL.iter().map(|c| c.binding()).collect();
        bindings.dedup();
        assert_eq!(bindings, vec![1, 2, 3, 4]);
    }

    #[test]
    fn channel_names() {
        assert_eq!(DataChannel::Diffuse.to_string(), "diffuse");
        assert_eq!(DataChannel::Data.file_name(), "gameboy_data-high.png");
        assert!(DataChannel::Diffuse.texture_format().is_srgb());
        assert!(!DataChannel::Position.texture_format().is_srgb());
    }
}
