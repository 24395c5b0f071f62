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

use cgmath::{Matrix4, Vector3};
use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon::math::Point;
use lyon::path::{Event, FillRule, Path};
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use crate::assets::AssetLoadError;
use crate::config::LabelConfig;
use crate::draw_context::{DrawContext, DrawableBuilder, IndexData};
use crate::plugins::scene_3d::Scene3DUniforms;
use crate::primitives::{Object3D, Object3DUniforms, Transforms};
use crate::typeface::Typeface;

const TEXT_SHADER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/shaders/text.wgsl"
));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    pub size: f32,
    /// Extrusion depth along z.
    pub depth: f32,
    /// Straight segments used for each curve of the outline.
    pub curve_segments: u32,
}

impl From<&LabelConfig> for TextOptions {
    fn from(label: &LabelConfig) -> Self {
        Self {
            size: label.size,
            depth: label.depth,
            curve_segments: label.curve_segments,
        }
    }
}

/// Extruded mesh of a text string: front face at `z = depth`, back face at
/// `z = 0`, joined by side walls.
#[derive(Debug, Clone, Default)]
pub struct TextGeometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TextGeometry {
    pub fn new(
        typeface: &Typeface,
        text: &str,
        options: &TextOptions,
    ) -> Result<Self, AssetLoadError> {
        let outline = typeface.build_path(text, options.size)?;
        let contours = flatten_contours(&outline, options.curve_segments.max(1));
        Self::extrude(&contours, options.depth)
    }

    fn extrude(contours: &[Vec<Point>], depth: f32) -> Result<Self, AssetLoadError> {
        let mut builder = Path::builder();
        for contour in contours {
            let Some((first, rest)) = contour.split_first() else {
                continue;
            };
            builder.begin(*first);
            for p in rest {
                builder.line_to(*p);
            }
            builder.close();
        }
        let polygon = builder.build();

        let mut face: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                &polygon,
                &FillOptions::default().with_fill_rule(FillRule::EvenOdd),
                &mut BuffersBuilder::new(&mut face, |vertex: FillVertex| {
                    vertex.position().to_array()
                }),
            )
            .map_err(|err| AssetLoadError::Tessellation(format!("{err:?}")))?;

        let mut geometry = Self::default();
        let face_len = u32::try_from(face.vertices.len())
            .map_err(|_| AssetLoadError::Tessellation("too many vertices".to_string()))?;

        // Back face, reversed so that it faces -z
        geometry
            .positions
            .extend(face.vertices.iter().map(|[x, y]| [*x, *y, 0.0]));
        for triangle in face.indices.chunks_exact(3) {
            geometry
                .indices
                .extend([triangle[0], triangle[2], triangle[1]]);
        }
        // Front face
        geometry
            .positions
            .extend(face.vertices.iter().map(|[x, y]| [*x, *y, depth]));
        geometry
            .indices
            .extend(face.indices.iter().map(|i| i + face_len));

        for contour in contours {
            let edges = contour.iter().zip(contour.iter().cycle().skip(1));
            for (a, b) in edges {
                if a == b {
                    continue;
                }
                let base = u32::try_from(geometry.positions.len())
                    .map_err(|_| AssetLoadError::Tessellation("too many vertices".to_string()))?;
                geometry.positions.extend([
                    [a.x, a.y, 0.0],
                    [b.x, b.y, 0.0],
                    [b.x, b.y, depth],
                    [a.x, a.y, depth],
                ]);
                geometry
                    .indices
                    .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }
        Ok(geometry)
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Splits an outline into closed polygons, each curve cut into `segments`
/// straight pieces. Consecutive duplicates and the closing point are dropped.
fn flatten_contours(path: &Path, segments: u32) -> Vec<Vec<Point>> {
    #[allow(clippy::cast_precision_loss)]
    let steps = move || (1..=segments).map(move |i| i as f32 / segments as f32);
    let mut contours = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let push = |current: &mut Vec<Point>, p: Point| {
        if current.last() != Some(&p) {
            current.push(p);
        }
    };
    for event in path.iter() {
        match event {
            Event::Begin { at } => {
                current = vec![at];
            }
            Event::Line { to, .. } => push(&mut current, to),
            Event::Quadratic { from, ctrl, to } => {
                let curve = QuadraticBezierSegment { from, ctrl, to };
                for t in steps() {
                    push(&mut current, curve.sample(t));
                }
            }
            Event::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => {
                let curve = CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                };
                for t in steps() {
                    push(&mut current, curve.sample(t));
                }
            }
            Event::End { .. } => {
                if current.len() > 1 && current.first() == current.last() {
                    current.pop();
                }
                if current.len() >= 3 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    contours
}

pub fn create_text_mesh(
    context: &DrawContext,
    geometry: &TextGeometry,
    scene_uniforms: &Scene3DUniforms,
    label: &LabelConfig,
) -> anyhow::Result<Object3D> {
    let shader_module = context.create_shader_module(TEXT_SHADER);
    let object_uniforms = Object3DUniforms::with_color(context, label.color);
    let mut drawable_builder =
        DrawableBuilder::new(context, &shader_module, &IndexData::U32(&geometry.indices))?;
    drawable_builder
        .set_cull_mode(None)
        .add_attribute(0, &geometry.positions, wgpu::VertexFormat::Float32x3)?
        .add_binding_slot(&scene_uniforms.binding_slot())?
        .add_binding_slot(&object_uniforms.binding_slot())?;
    if let Some(color_slot) = object_uniforms.color_binding_slot() {
        drawable_builder.add_binding_slot(&color_slot)?;
    }
    let drawable = drawable_builder.build()?;
    let mut text = Object3D::new(drawable, object_uniforms);
    let [x, y, z] = label.position;
    text.set_transform(Matrix4::from_translation(Vector3::new(x, y, z)));
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeface::tests::SQUARE_TYPEFACE;

    const OPTIONS: TextOptions = TextOptions {
        size: 1.0,
        depth: 0.5,
        curve_segments: 12,
    };

    fn typeface() -> Typeface {
        Typeface::from_slice(SQUARE_TYPEFACE.as_bytes()).unwrap()
    }

    fn face_area(geometry: &TextGeometry, z: f32) -> f32 {
        geometry
            .indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(|i| geometry.positions[i as usize]))
            .filter(|t| t.iter().all(|p| p[2] == z))
            .map(|[a, b, c]| {
                0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs()
            })
            .sum()
    }

    #[test]
    fn square_glyph_is_extruded() {
        let geometry = TextGeometry::new(&typeface(), "A", &OPTIONS).unwrap();
        assert!(
            geometry
                .positions
                .iter()
                .all(|p| p[2] == 0.0 || p[2] == OPTIONS.depth)
        );
        assert!(
            geometry
                .positions
                .iter()
                .all(|p| (0.0..=0.1 + 1e-6).contains(&p[0]))
        );
        let front = face_area(&geometry, OPTIONS.depth);
        let back = face_area(&geometry, 0.0);
        assert!((front - 0.01).abs() < 1e-6);
        assert!((front - back).abs() < 1e-6);
    }

    #[test]
    fn four_side_walls_for_a_square() {
        let geometry = TextGeometry::new(&typeface(), "A", &OPTIONS).unwrap();
        let walls = geometry
            .indices
            .chunks_exact(3)
            .filter(|t| {
                let zs: Vec<f32> = t.iter().map(|i| geometry.positions[*i as usize][2]).collect();
                zs.contains(&0.0) && zs.contains(&OPTIONS.depth)
            })
            .count();
        assert_eq!(walls, 8);
    }

    #[test]
    fn holes_are_not_filled() {
        let geometry = TextGeometry::new(&typeface(), "O", &OPTIONS).unwrap();
        let front = face_area(&geometry, OPTIONS.depth);
        assert!((front - (0.01 - 0.0025)).abs() < 1e-6);
    }

    #[test]
    fn curves_use_the_requested_segments() {
        let mut builder = Path::builder();
        builder.begin(lyon::math::point(0.0, 0.0));
        builder.quadratic_bezier_to(lyon::math::point(1.0, 1.0), lyon::math::point(2.0, 0.0));
        builder.close();
        let contours = flatten_contours(&builder.build(), 12);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 13);
    }

    #[test]
    fn blank_text_gives_empty_geometry() {
        let geometry = TextGeometry::new(&typeface(), " ", &OPTIONS).unwrap();
        assert_eq!(geometry.triangle_count(), 0);
    }
}
