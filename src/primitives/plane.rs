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

use cgmath::{Matrix4, SquareMatrix};

use crate::draw_context::{DrawContext, Drawable, DrawableBuilder, IndexData};
use crate::material::{ChannelBindings, ChannelSlots, DataTexture, MaterialUniforms, MaterialValues};
use crate::plugins::scene_3d::Scene3DUniforms;
use crate::primitives::{Object3DUniforms, Renderable, Shareable, Transforms};

const SKETCH_SHADER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/shaders/sketch.wgsl"
));

/// Flat grid in the xy plane, centered on the origin and facing +z.
///
/// Texture coordinates start at the top left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl PlaneGeometry {
    #[must_use]
    pub fn new(width: f32, height: f32, width_segments: u16, height_segments: u16) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let columns = grid_x + 1;
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for iy in 0..=grid_y {
            let v = f32::from(iy) / f32::from(grid_y);
            for ix in 0..=grid_x {
                let u = f32::from(ix) / f32::from(grid_x);
                positions.push([(u - 0.5) * width, (0.5 - v) * height, 0.0]);
                uvs.push([u, v]);
            }
        }
        let mut indices = Vec::new();
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + columns * iy;
                let b = ix + columns * (iy + 1);
                let c = ix + 1 + columns * (iy + 1);
                let d = ix + 1 + columns * iy;
                indices.extend([a, b, d, b, c, d]);
            }
        }
        Self {
            positions,
            uvs,
            indices,
        }
    }
}

/// The displaced plane: a unit quad drawn with the sketch shader and its data channels.
pub struct SketchPlane {
    drawable: Drawable,
    transform: Matrix4<f32>,
    uniforms: Object3DUniforms,
    material: MaterialUniforms,
    channels: ChannelBindings,
}

impl SketchPlane {
    pub fn new(
        context: &DrawContext,
        scene_uniforms: &Scene3DUniforms,
        values: &MaterialValues,
    ) -> anyhow::Result<Self> {
        let geometry = PlaneGeometry::new(1.0, 1.0, 1, 1);
        let shader_module = context.create_shader_module(SKETCH_SHADER);
        let uniforms = Object3DUniforms::new(context);
        let material = MaterialUniforms::new(context, values);
        let channels = ChannelBindings::new(context);

        let mut drawable_builder = DrawableBuilder::new(
            context,
            &shader_module,
            &IndexData::U16(&geometry.indices),
        )?;
        drawable_builder
            .set_blend_state(wgpu::BlendState::ALPHA_BLENDING)
            .set_cull_mode(None)
            .add_attribute(0, &geometry.positions, wgpu::VertexFormat::Float32x3)?
            .add_attribute(1, &geometry.uvs, wgpu::VertexFormat::Float32x2)?
            .add_binding_slot(&scene_uniforms.binding_slot())?
            .add_binding_slot(&uniforms.binding_slot())?
            .add_bind_group_layout(ChannelBindings::BIND_GROUP, channels.layout())?;
        for slot in &material.binding_slots() {
            drawable_builder.add_binding_slot(slot)?;
        }
        let drawable = drawable_builder.build()?;
        Ok(Self {
            drawable,
            transform: Matrix4::identity(),
            uniforms,
            material,
            channels,
        })
    }

    pub fn update_material(&mut self, values: &MaterialValues) {
        self.material.sync(values);
    }

    /// Binds the textures currently available, placeholders elsewhere.
    pub fn bind_channels(&mut self, context: &DrawContext, textures: &ChannelSlots<DataTexture>) {
        self.channels.rebuild(context, textures);
    }
}

impl Transforms for SketchPlane {
    fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
        self.uniforms.model.set(self.transform.into());
    }
    fn get_transform(&self) -> &Matrix4<f32> {
        &self.transform
    }
}

impl Renderable for SketchPlane {
    fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.drawable.render_with(
            render_pass,
            &[(ChannelBindings::BIND_GROUP, self.channels.bind_group())],
        );
    }
}

impl Shareable for SketchPlane {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_quad() {
        let plane = PlaneGeometry::new(1.0, 1.0, 1, 1);
        assert_eq!(
            plane.positions,
            vec![
                [-0.5, 0.5, 0.0],
                [0.5, 0.5, 0.0],
                [-0.5, -0.5, 0.0],
                [0.5, -0.5, 0.0]
            ]
        );
        assert_eq!(plane.uvs[0], [0.0, 0.0]);
        assert_eq!(plane.uvs[3], [1.0, 1.0]);
        assert_eq!(plane.indices, vec![0, 2, 1, 2, 3, 1]);
    }

    #[test]
    fn triangles_face_the_camera() {
        let plane = PlaneGeometry::new(2.0, 1.0, 3, 2);
        assert_eq!(plane.positions.len(), 12);
        assert_eq!(plane.indices.len(), 3 * 2 * 6);
        for triangle in plane.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| plane.positions[usize::from(i)]);
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
            assert!(cross > 0.0);
        }
    }

    #[test]
    fn zero_segments_still_give_a_quad() {
        let plane = PlaneGeometry::new(1.0, 1.0, 0, 0);
        assert_eq!(plane.indices.len(), 6);
    }
}
