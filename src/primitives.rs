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

pub mod plane;
pub mod text;

use std::cell::RefCell;
use std::rc::Rc;

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector4};

use crate::draw_context::{BindingSlot, DrawContext, Drawable, Uniform};
use crate::plugins::scene_3d::Scene3DUniforms;

pub trait Shareable: Sized {
    fn into_shareable(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }
}

pub trait Transforms {
    fn set_transform(&mut self, transform: Matrix4<f32>);
    fn get_transform(&self) -> &Matrix4<f32>;
    /// Origin of the object in world space, used to order transparent objects.
    fn world_position(&self) -> Point3<f32> {
        let origin = *self.get_transform() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        Point3::from_vec(origin.truncate())
    }
}

/// Anything the scene can draw.
pub trait Renderable: Transforms {
    fn render(&self, render_pass: &mut wgpu::RenderPass<'_>);
}

pub struct Object3DUniforms {
    pub model: Uniform<[[f32; 4]; 4]>,
    /// Flat color, for meshes without a material of their own.
    pub color: Option<Uniform<[f32; 4]>>,
}

impl Object3DUniforms {
    pub const BINDING_MODEL: u32 = 1;
    pub const BIND_GROUP_COLOR: u32 = 1;
    pub const BINDING_COLOR: u32 = 0;

    pub fn new(context: &DrawContext) -> Self {
        Self {
            model: Uniform::new(context, Matrix4::<f32>::identity().into()),
            color: None,
        }
    }

    pub fn with_color(context: &DrawContext, color: [f32; 4]) -> Self {
        Self {
            color: Some(Uniform::new(context, color)),
            ..Self::new(context)
        }
    }

    #[must_use]
    pub fn binding_slot(&self) -> BindingSlot<'_> {
        BindingSlot {
            bind_group: Scene3DUniforms::BIND_GROUP,
            binding: Self::BINDING_MODEL,
            resource: &self.model,
        }
    }

    #[must_use]
    pub fn color_binding_slot(&self) -> Option<BindingSlot<'_>> {
        self.color.as_ref().map(|color| BindingSlot {
            bind_group: Self::BIND_GROUP_COLOR,
            binding: Self::BINDING_COLOR,
            resource: color,
        })
    }
}

pub struct Object3D {
    drawable: Drawable,
    transform: Matrix4<f32>,
    uniforms: Object3DUniforms,
}

impl Object3D {
    pub fn new(drawable: Drawable, uniforms: Object3DUniforms) -> Self {
        Object3D {
            drawable,
            transform: Matrix4::<f32>::identity(),
            uniforms,
        }
    }
}

impl Transforms for Object3D {
    fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
        self.uniforms.model.set(self.transform.into());
    }
    fn get_transform(&self) -> &Matrix4<f32> {
        &self.transform
    }
}

impl Renderable for Object3D {
    fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.drawable.render(render_pass);
    }
}

impl Shareable for Object3D {}
