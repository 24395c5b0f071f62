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

use std::any::{Any, TypeId};

use indexmap::IndexMap;
use winit::event::WindowEvent;

use crate::render_loop::{EventState, RenderContext};

pub mod egui;
pub mod scene_3d;

/// Self-contained layer of a render loop, fed with window events and drawn
/// after the handler, in registration order.
pub trait Plugin: Any {
    /// `event_state` tells if a plugin registered later already used the event.
    fn on_window_event(&mut self, _event: &WindowEvent, event_state: EventState) -> EventState {
        event_state
    }
    fn on_render(
        &mut self,
        render_context: &RenderContext,
        render_pass: &mut wgpu::RenderPass<'static>,
    );
}

impl dyn Plugin {
    fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
    fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<TypeId, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn register<T: Plugin + 'static>(&mut self, plugin: T) {
        self.plugins.insert(TypeId::of::<T>(), Box::new(plugin));
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Plugin>> {
        self.plugins.values_mut()
    }
    /// Last registered first, the order in which plugins drawn on top see events.
    pub fn iter_mut_rev(&mut self) -> impl Iterator<Item = &mut Box<dyn Plugin>> {
        self.plugins.values_mut().rev()
    }
    #[must_use]
    pub fn get<T: Plugin + 'static>(&self) -> Option<&T> {
        self.plugins
            .get(&TypeId::of::<T>())
            .and_then(|plugin| plugin.as_ref().downcast_ref::<T>())
    }
    #[must_use]
    pub fn get_mut<T: Plugin + 'static>(&mut self) -> Option<&mut T> {
        self.plugins
            .get_mut(&TypeId::of::<T>())
            .and_then(|plugin| plugin.as_mut().downcast_mut::<T>())
    }
    /// Dispatches a window event from the top-most plugin down.
    pub fn dispatch_window_event(&mut self, event: &WindowEvent) -> EventState {
        self.iter_mut_rev().fold(EventState::default(), |state, plugin| {
            plugin.on_window_event(event, state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    impl Plugin for Counter {
        fn on_render(&mut self, _: &RenderContext, _: &mut wgpu::RenderPass<'static>) {}
    }

    struct Consumer;

    impl Plugin for Consumer {
        fn on_window_event(&mut self, _event: &WindowEvent, _: EventState) -> EventState {
            EventState { processed: true }
        }
        fn on_render(&mut self, _: &RenderContext, _: &mut wgpu::RenderPass<'static>) {}
    }

    #[test]
    fn plugins_are_found_by_type() {
        let mut registry = PluginRegistry::default();
        registry.register(Counter(1));
        assert_eq!(registry.get::<Counter>().map(|c| c.0), Some(1));
        if let Some(counter) = registry.get_mut::<Counter>() {
            counter.0 += 1;
        }
        assert_eq!(registry.get::<Counter>().map(|c| c.0), Some(2));
        assert!(registry.get::<Consumer>().is_none());
    }

    #[test]
    fn processed_state_reaches_earlier_plugins() {
        let mut registry = PluginRegistry::default();
        registry.register(Counter(0));
        registry.register(Consumer);
        let state = registry.dispatch_window_event(&WindowEvent::Focused(true));
        assert!(state.processed);
    }
}
