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

use displacement_sketch::config::SketchConfig;
use displacement_sketch::sketch::Sketch;
use displacement_sketch::{LaunchOptions, RenderLoopHandler, launch_app};

fn main() -> anyhow::Result<()> {
    let config = SketchConfig::from_env();
    let options = LaunchOptions {
        title: "ButterMax".to_owned(),
        mount_element_id: config.mount_element_id.clone(),
    };
    launch_app(options, move |launch_context| {
        let sketch = Sketch::new(launch_context, &config)?;
        Ok(Box::new(sketch) as Box<dyn RenderLoopHandler>)
    })
}
