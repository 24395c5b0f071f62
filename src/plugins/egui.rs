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

use std::sync::Arc;

use winit::event::WindowEvent;
use winit::window::Window;

use crate::draw_context::DrawContext;
use crate::render_loop::{EventState, RenderContext};

use super::Plugin;

/// Immediate mode GUI drawn on top of the scene.
///
/// Without a window (headless mode) nothing is drawn.
pub enum EguiPlugin {
    NoWindow,
    WithWindow(EguiPluginWithWindow),
}

pub struct EguiPluginWithWindow {
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    pixels_per_point: f32,
    frame_started: bool,
    window: Arc<Window>,
}

impl EguiPlugin {
    /// `pixels_per_point` must match the pixel ratio the surface is sized with.
    pub fn new(draw_context: &DrawContext, pixels_per_point: f32) -> Self {
        let Some(window) = draw_context.window.as_ref() else {
            return Self::NoWindow;
        };
        let window = Arc::clone(window);
        let egui_state = egui_winit::State::new(
            egui::Context::default(),
            egui::ViewportId::default(),
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &draw_context.device,
            draw_context.surface_config.format,
            Some(DrawContext::DEPTH_FORMAT),
            draw_context.sample_count(),
            true,
        );
        Self::WithWindow(EguiPluginWithWindow {
            egui_state,
            egui_renderer,
            pixels_per_point,
            frame_started: false,
            window,
        })
    }

    pub fn set_pixels_per_point(&mut self, pixels_per_point: f32) {
        if let Self::WithWindow(egui_plugin) = self {
            egui_plugin.pixels_per_point = pixels_per_point;
        }
    }

    /// Starts the GUI frame, finished and drawn during the next render.
    pub fn draw<F, R>(&mut self, run_ui: F) -> Option<R>
    where
        F: FnOnce(&egui::Context) -> R,
    {
        let Self::WithWindow(egui_plugin) = self else {
            return None;
        };
        if !egui_plugin.frame_started {
            let raw_input = egui_plugin.egui_state.take_egui_input(&egui_plugin.window);
            egui_plugin.egui_state.egui_ctx().begin_pass(raw_input);
            egui_plugin.frame_started = true;
        }
        Some(run_ui(egui_plugin.egui_state.egui_ctx()))
    }

    fn end_frame_and_draw(
        egui_plugin: &mut EguiPluginWithWindow,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        render_pass: &mut wgpu::RenderPass<'static>,
    ) {
        egui_plugin.frame_started = false;
        let egui_ctx = egui_plugin.egui_state.egui_ctx().clone();
        egui_ctx.set_pixels_per_point(screen_descriptor.pixels_per_point);
        let full_output = egui_ctx.end_pass();
        egui_plugin
            .egui_state
            .handle_platform_output(&egui_plugin.window, full_output.platform_output);

        let tris = egui_ctx.tessellate(full_output.shapes, egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            egui_plugin
                .egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        // Paint callbacks are not used, their command buffers are dropped
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Egui Encoder"),
        });
        egui_plugin
            .egui_renderer
            .update_buffers(device, queue, &mut encoder, &tris, screen_descriptor);
        egui_plugin
            .egui_renderer
            .render(render_pass, &tris, screen_descriptor);
        for id in &full_output.textures_delta.free {
            egui_plugin.egui_renderer.free_texture(id);
        }
    }
}

impl Plugin for EguiPlugin {
    fn on_window_event(&mut self, event: &WindowEvent, event_state: EventState) -> EventState {
        match self {
            Self::WithWindow(egui_plugin) => {
                let event_response = egui_plugin
                    .egui_state
                    .on_window_event(&egui_plugin.window, event);
                EventState {
                    processed: event_state.processed || event_response.consumed,
                }
            }
            Self::NoWindow => event_state,
        }
    }

    fn on_render(
        &mut self,
        render_context: &RenderContext,
        render_pass: &mut wgpu::RenderPass<'static>,
    ) {
        let Self::WithWindow(egui_plugin) = self else {
            return;
        };
        if !egui_plugin.frame_started {
            return;
        }
        let draw_context = render_context.draw_context;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                draw_context.surface_config.width,
                draw_context.surface_config.height,
            ],
            pixels_per_point: egui_plugin.pixels_per_point,
        };
        Self::end_frame_and_draw(
            egui_plugin,
            &draw_context.device,
            &draw_context.queue,
            &screen_descriptor,
            render_pass,
        );
    }
}
