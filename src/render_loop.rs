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

use std::rc::Rc;

use crate::{draw_context::DrawContext, plugins::PluginRegistry, viewport::MountPoint};
use winit::event::{KeyEvent, WindowEvent};

#[derive(Default, Debug, Clone, Copy)]
pub struct EventState {
    pub processed: bool,
}

pub struct RenderContext<'a> {
    pub draw_context: &'a DrawContext,
}

pub struct LaunchContext<'a> {
    pub draw_context: &'a mut DrawContext,
    pub plugin_registry: &'a mut PluginRegistry,
    pub mount_point: Rc<dyn MountPoint>,
}

/// Callbacks driven by the host once per event and once per display refresh.
///
/// Handlers never reschedule themselves: the host draws a new frame after each
/// `on_render` until [`RenderLoopHandler::is_finished`] returns `true`.
pub trait RenderLoopHandler {
    fn on_keyboard_event(&mut self, _plugin_registry: &mut PluginRegistry, _event: &KeyEvent) {}
    /// Called for every window event, `event_state` telling if a plugin already used it.
    fn on_window_event(
        &mut self,
        _plugin_registry: &mut PluginRegistry,
        _event: &WindowEvent,
        _event_state: EventState,
    ) {
    }
    fn on_resize(&mut self, _plugin_registry: &mut PluginRegistry, _draw_context: &mut DrawContext) {
    }
    fn on_update(
        &mut self,
        _plugin_registry: &mut PluginRegistry,
        _draw_context: &mut DrawContext,
    ) {
    }
    fn on_render(
        &mut self,
        _plugin_registry: &mut PluginRegistry,
        _render_context: &RenderContext,
        _render_pass: &mut wgpu::RenderPass<'static>,
    ) {
    }
    fn is_finished(&self) -> bool {
        false
    }
}

pub type RenderLoopBuilder = dyn Fn(LaunchContext) -> anyhow::Result<Box<dyn RenderLoopHandler>>;

/// Draws one frame: the handler first, then every plugin in registration order.
pub(crate) fn render_frame(
    handler: &mut dyn RenderLoopHandler,
    plugin_registry: &mut PluginRegistry,
    draw_context: &DrawContext,
) -> anyhow::Result<()> {
    let render_context = RenderContext { draw_context };
    draw_context.render_scene(|render_pass| {
        let mut render_pass = render_pass.forget_lifetime();
        handler.on_render(plugin_registry, &render_context, &mut render_pass);
        for plugin in plugin_registry.iter_mut() {
            plugin.on_render(&render_context, &mut render_pass);
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Playing,
    Paused,
}

/// Time accumulator advanced by a fixed step per frame, independent of wall-clock time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    playback: Playback,
    ticks: u64,
    step: f32,
}

impl FrameClock {
    pub const DEFAULT_STEP: f32 = 0.05;

    #[must_use]
    pub fn new(step: f32) -> Self {
        Self {
            playback: Playback::Playing,
            ticks: 0,
            step,
        }
    }

    /// Advances the clock if playing, returning the new time.
    pub fn tick(&mut self) -> f32 {
        if self.playback == Playback::Playing {
            self.ticks += 1;
        }
        self.time()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self) -> f32 {
        self.step * self.ticks as f32
    }

    #[must_use]
    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn pause(&mut self) {
        self.playback = Playback::Paused;
    }

    pub fn resume(&mut self) {
        self.playback = Playback::Playing;
    }

    pub fn toggle(&mut self) -> Playback {
        match self.playback {
            Playback::Playing => self.pause(),
            Playback::Paused => self.resume(),
        }
        self.playback
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_playing_at_zero() {
        let clock = FrameClock::default();
        assert_eq!(clock.playback(), Playback::Playing);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn time_is_step_times_ticks() {
        let mut clock = FrameClock::default();
        for n in 1..=500_u16 {
            let time = clock.tick();
            assert_eq!(time, 0.05 * f32::from(n));
        }
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let mut clock = FrameClock::default();
        clock.tick();
        assert_eq!(clock.toggle(), Playback::Paused);
        clock.tick();
        clock.tick();
        assert_eq!(clock.time(), 0.05);
        clock.resume();
        assert_eq!(clock.tick(), 0.05 * 2.0);
    }
}
