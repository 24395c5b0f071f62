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

use std::env;

use log::info;

use crate::config::ENV_HEADLESS;
use crate::render_loop::{LaunchContext, RenderLoopBuilder, RenderLoopHandler};
use crate::window::run_event_loop;

const GLOBAL_LOG_FILTER: log::LevelFilter = log::LevelFilter::Info;
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_WIDTH: u32 = 500;
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_HEIGHT: u32 = 500;

pub struct LaunchOptions {
    pub title: String,
    /// Id of the DOM element receiving the canvas, in a browser.
    pub mount_element_id: String,
}

pub fn launch_app<F>(options: LaunchOptions, builder: F) -> anyhow::Result<()>
where
    F: Fn(LaunchContext) -> anyhow::Result<Box<dyn RenderLoopHandler>> + 'static,
{
    init_log()?;
    info!("Init app");
    let is_headless = env::var(ENV_HEADLESS).is_ok();
    if is_headless {
        info!("Running in headless mode");
        run_headless(Box::new(builder))
    } else {
        run_event_loop(options, Box::new(builder))
    }
}

fn init_log() -> anyhow::Result<()> {
    let mut builder = fern::Dispatch::new();
    let level_formatter;
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        level_formatter = |level| level;
        builder = builder.chain(fern::Output::call(console_log::log));
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use fern::colors::{Color, ColoredLevelConfig};
        let colors = ColoredLevelConfig::new()
            .info(Color::Blue)
            .debug(Color::Green);
        level_formatter = move |level| colors.color(level);
        builder = builder.chain(std::io::stdout());
    }
    builder
        .level(GLOBAL_LOG_FILTER)
        .level_for(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}:{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                level_formatter(record.level()),
                record.target(),
                record.line().unwrap_or_default(),
                message
            ));
        })
        .apply()?;
    Ok(())
}

/// Draws a single frame offscreen, then returns.
#[cfg(not(target_arch = "wasm32"))]
#[allow(clippy::needless_pass_by_value)]
fn run_headless(builder: Box<RenderLoopBuilder>) -> anyhow::Result<()> {
    use std::rc::Rc;

    use pollster::FutureExt;

    use crate::draw_context::{Dimensions, DrawContext};
    use crate::plugins::PluginRegistry;
    use crate::render_loop::render_frame;
    use crate::viewport::{FixedMount, MountPoint};

    let dimensions = Dimensions {
        width: HEADLESS_WIDTH,
        height: HEADLESS_HEIGHT,
    };
    let mount_point: Rc<dyn MountPoint> = Rc::new(FixedMount {
        width: f64::from(HEADLESS_WIDTH),
        height: f64::from(HEADLESS_HEIGHT),
        pixel_ratio: 1.0,
    });
    let mut draw_context = DrawContext::new(None, Some(dimensions)).block_on()?;
    let mut plugin_registry = PluginRegistry::default();
    let mut handler = builder(LaunchContext {
        draw_context: &mut draw_context,
        plugin_registry: &mut plugin_registry,
        mount_point,
    })?;
    handler.on_update(&mut plugin_registry, &mut draw_context);
    render_frame(handler.as_mut(), &mut plugin_registry, &draw_context)?;
    info!("Headless frame rendered");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[allow(clippy::needless_pass_by_value)]
fn run_headless(_builder: Box<RenderLoopBuilder>) -> anyhow::Result<()> {
    anyhow::bail!("Headless mode is not supported in a browser")
}
