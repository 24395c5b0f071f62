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

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::draw_context::DrawContext;
use crate::launcher::LaunchOptions;
use crate::plugins::PluginRegistry;
use crate::render_loop::{LaunchContext, RenderLoopBuilder, RenderLoopHandler, render_frame};
use crate::viewport::MountPoint;

enum AppState {
    Uninitialized,
    #[cfg(target_arch = "wasm32")]
    Initializing {
        mount_point: Rc<dyn MountPoint>,
        window: Arc<Window>,
        pending: Rc<RefCell<Option<anyhow::Result<DrawContext>>>>,
    },
    Running(Box<RunningApp>),
    Failed,
}

struct RunningApp {
    window: Arc<Window>,
    draw_context: DrawContext,
    plugin_registry: PluginRegistry,
    handler: Box<dyn RenderLoopHandler>,
}

impl RunningApp {
    fn redraw(&mut self) -> anyhow::Result<()> {
        self.handler
            .on_update(&mut self.plugin_registry, &mut self.draw_context);
        render_frame(
            self.handler.as_mut(),
            &mut self.plugin_registry,
            &self.draw_context,
        )
    }
}

struct App {
    options: LaunchOptions,
    builder: Box<RenderLoopBuilder>,
    state: AppState,
    #[cfg(not(target_arch = "wasm32"))]
    error: Option<anyhow::Error>,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes().with_title(self.options.title.clone());
        let window = Arc::new(event_loop.create_window(attributes)?);

        #[cfg(not(target_arch = "wasm32"))]
        {
            use pollster::FutureExt;

            use crate::viewport::WindowMount;

            let mount_point: Rc<dyn MountPoint> = Rc::new(WindowMount(Arc::clone(&window)));
            let draw_context = DrawContext::new(Some(Arc::clone(&window)), None).block_on()?;
            let running = self.launch(window, mount_point, draw_context)?;
            self.state = AppState::Running(Box::new(running));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use anyhow::anyhow;
            use winit::platform::web::WindowExtWebSys;

            use crate::viewport::{ElementMount, Viewport};

            let mount_point = ElementMount::find(&self.options.mount_element_id)?;
            let canvas = window
                .canvas()
                .ok_or_else(|| anyhow!("The window has no canvas"))?;
            // Sized by the container, winit reports the changes as resize events
            canvas
                .set_attribute("style", "display: block; width: 100%; height: 100%;")
                .map_err(|err| anyhow!("Could not style the canvas: {err:?}"))?;
            mount_point
                .element
                .append_child(&canvas)
                .map_err(|err| anyhow!("Could not append the canvas: {err:?}"))?;
            let dimensions = Viewport::measure(&mount_point, None).physical_dimensions();

            let pending = Rc::new(RefCell::new(None));
            let pending_result = Rc::clone(&pending);
            let context_window = Arc::clone(&window);
            wasm_bindgen_futures::spawn_local(async move {
                let result =
                    DrawContext::new(Some(Arc::clone(&context_window)), Some(dimensions)).await;
                *pending_result.borrow_mut() = Some(result);
                context_window.request_redraw();
            });
            self.state = AppState::Initializing {
                mount_point: Rc::new(mount_point),
                window,
                pending,
            };
        }
        Ok(())
    }

    fn launch(
        &self,
        window: Arc<Window>,
        mount_point: Rc<dyn MountPoint>,
        mut draw_context: DrawContext,
    ) -> anyhow::Result<RunningApp> {
        let mut plugin_registry = PluginRegistry::default();
        let handler = (self.builder)(LaunchContext {
            draw_context: &mut draw_context,
            plugin_registry: &mut plugin_registry,
            mount_point,
        })?;
        info!("Render loop started");
        window.request_redraw();
        Ok(RunningApp {
            window,
            draw_context,
            plugin_registry,
            handler,
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_initialization(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Initializing { pending, .. } = &self.state else {
            return;
        };
        let Some(result) = pending.borrow_mut().take() else {
            return;
        };
        let AppState::Initializing {
            mount_point,
            window,
            ..
        } = std::mem::replace(&mut self.state, AppState::Uninitialized)
        else {
            return;
        };
        match result.and_then(|draw_context| self.launch(window, mount_point, draw_context)) {
            Ok(running) => self.state = AppState::Running(Box::new(running)),
            Err(err) => self.fail(event_loop, err),
        }
    }

    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("Startup failed: {err:#}");
        self.state = AppState::Failed;
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.error = Some(err);
            event_loop.exit();
        }
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen::throw_str(&format!("{err:#}"));
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Uninitialized) {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        self.poll_initialization(event_loop);

        if matches!(event, WindowEvent::CloseRequested) {
            info!("Close requested");
            event_loop.exit();
            return;
        }
        let AppState::Running(app) = &mut self.state else {
            return;
        };
        let event_state = app.plugin_registry.dispatch_window_event(&event);
        app.handler
            .on_window_event(&mut app.plugin_registry, &event, event_state);
        match &event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                app.handler
                    .on_resize(&mut app.plugin_registry, &mut app.draw_context);
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } if !event_state.processed => {
                app.handler
                    .on_keyboard_event(&mut app.plugin_registry, key_event);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = app.redraw() {
                    match err.downcast_ref::<wgpu::SurfaceError>() {
                        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            warn!("Surface lost, reconfiguring");
                            app.draw_context.reconfigure();
                        }
                        Some(wgpu::SurfaceError::OutOfMemory) => {
                            error!("Out of GPU memory");
                            event_loop.exit();
                            return;
                        }
                        _ => warn!("Frame skipped: {err:#}"),
                    }
                }
                if app.handler.is_finished() {
                    event_loop.exit();
                } else {
                    app.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn run_event_loop(
    options: LaunchOptions,
    builder: Box<RenderLoopBuilder>,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App {
        options,
        builder,
        state: AppState::Uninitialized,
        error: None,
    };
    event_loop.run_app(&mut app)?;
    app.error.take().map_or(Ok(()), Err)
}

#[cfg(target_arch = "wasm32")]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn run_event_loop(
    options: LaunchOptions,
    builder: Box<RenderLoopBuilder>,
) -> anyhow::Result<()> {
    use winit::platform::web::EventLoopExtWebSys;

    let event_loop = EventLoop::new()?;
    event_loop.spawn_app(App {
        options,
        builder,
        state: AppState::Uninitialized,
    });
    Ok(())
}
