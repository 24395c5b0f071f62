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

use std::{cell::RefCell, rc::Rc};

use cgmath::{MetricSpace, Point3, SquareMatrix};
use winit::event::WindowEvent;

use crate::cameras::{Camera, OrbitControls};
use crate::draw_context::{BindingSlot, DrawContext, Uniform};
use crate::primitives::Renderable;
use crate::render_loop::{EventState, RenderContext};

use super::Plugin;

pub type RenderableWrapper = Rc<RefCell<dyn Renderable>>;

#[allow(clippy::manual_non_exhaustive)]
pub struct Scene3DUniforms {
    pub camera_mat: Uniform<[[f32; 4]; 4]>,
    _private: (),
}

impl Scene3DUniforms {
    pub const BIND_GROUP: u32 = 0;
    pub const BINDING_CAMERA: u32 = 0;

    #[must_use]
    pub fn binding_slot(&self) -> BindingSlot<'_> {
        BindingSlot {
            bind_group: Self::BIND_GROUP,
            binding: Self::BINDING_CAMERA,
            resource: &self.camera_mat,
        }
    }
}

/// Objects sharing one camera. Elements are only ever added.
pub struct Scene3D {
    renderables: Vec<RenderableWrapper>,
    scene_uniforms: Scene3DUniforms,
}

impl Scene3D {
    pub fn new(context: &DrawContext) -> Self {
        Self {
            renderables: Vec::new(),
            scene_uniforms: Scene3DUniforms {
                camera_mat: Uniform::new(context, cgmath::Matrix4::identity().into()),
                _private: (),
            },
        }
    }

    #[must_use]
    pub fn scene_uniforms(&self) -> &Scene3DUniforms {
        &self.scene_uniforms
    }

    pub fn update(&mut self, camera: &Camera) {
        self.scene_uniforms
            .camera_mat
            .set(camera.get_camera_matrix().into());
    }

    pub fn add(&mut self, element: RenderableWrapper) {
        self.renderables.push(element);
    }

    /// Draws farthest objects first, so that blended ones show what lies behind.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>, eye: Point3<f32>) {
        let positions: Vec<_> = self
            .renderables
            .iter()
            .map(|renderable| renderable.borrow().world_position())
            .collect();
        for index in back_to_front(eye, &positions) {
            self.renderables[index].borrow().render(render_pass);
        }
    }
}

fn back_to_front(eye: Point3<f32>, positions: &[Point3<f32>]) -> Vec<usize> {
    let mut order: Vec<(usize, f32)> = positions
        .iter()
        .map(|position| eye.distance2(*position))
        .enumerate()
        .collect();
    order.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    order.into_iter().map(|(index, _)| index).collect()
}

pub struct Scene3DPlugin {
    pub controls: OrbitControls,
    pub scene: Scene3D,
}

impl Plugin for Scene3DPlugin {
    fn on_window_event(&mut self, event: &WindowEvent, event_state: EventState) -> EventState {
        if event_state.processed {
            match event {
                WindowEvent::MouseInput { .. } => {
                    self.controls.cancel_drag();
                    return event_state;
                }
                WindowEvent::MouseWheel { .. } => return event_state,
                _ => {}
            }
        }
        self.controls.window_event_listener(event);
        event_state
    }

    #[allow(clippy::cast_precision_loss)]
    fn on_render(
        &mut self,
        render_context: &RenderContext,
        render_pass: &mut wgpu::RenderPass<'static>,
    ) {
        let Self { controls, scene } = self;
        let dimensions = render_context.draw_context.surface_dimensions();
        controls.update_screen_height(dimensions.height as f32);
        controls.update_control();
        scene.update(&controls.controled_camera);
        scene.render(render_pass, controls.controled_camera.eye_position());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farthest_first() {
        let eye = Point3::new(0.0, 0.0, 0.8);
        let plane = Point3::new(0.0, 0.0, 0.0);
        let text = Point3::new(-0.9, 0.2, -0.1);
        assert_eq!(back_to_front(eye, &[plane, text]), vec![1, 0]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let eye = Point3::new(0.0, 0.0, 1.0);
        let origin = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(back_to_front(eye, &[origin, origin, origin]), vec![0, 1, 2]);
    }
}
