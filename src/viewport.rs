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
use std::cell::Cell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
use std::sync::Arc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, closure::Closure};
use winit::window::Window;

use crate::Dimensions;

/// Host element sizing the render target.
pub trait MountPoint {
    /// Size of the bounding box, in logical pixels.
    fn bounding_box(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;
    /// Width of the host window, in the unit of pointer positions.
    fn host_width(&self) -> f64;
    /// `true` when pointer moves come from a listener on the whole page rather
    /// than from window events.
    fn tracks_page_pointer(&self) -> bool {
        false
    }
    /// Latest pointer move seen on the page since the previous call, as
    /// `(x, host_width)`.
    fn take_page_pointer(&self) -> Option<(f64, f64)> {
        None
    }
}

/// A mount point with a fixed size, used when no window exists.
pub struct FixedMount {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl MountPoint for FixedMount {
    fn bounding_box(&self) -> (f64, f64) {
        (self.width, self.height)
    }
    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
    fn host_width(&self) -> f64 {
        self.width * self.pixel_ratio
    }
}

/// The window itself, when running natively.
pub struct WindowMount(pub Arc<Window>);

impl MountPoint for WindowMount {
    fn bounding_box(&self) -> (f64, f64) {
        let size = self.0.inner_size().to_logical::<f64>(self.0.scale_factor());
        (size.width, size.height)
    }
    fn device_pixel_ratio(&self) -> f64 {
        self.0.scale_factor()
    }
    fn host_width(&self) -> f64 {
        f64::from(self.0.inner_size().width)
    }
}

#[cfg(target_arch = "wasm32")]
fn inner_width(window: &web_sys::Window) -> f64 {
    window
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .unwrap_or_default()
}

/// `mousemove` listener on the document body, keeping the latest
/// `(clientX, innerWidth)` pair.
#[cfg(target_arch = "wasm32")]
struct PagePointer {
    body: web_sys::HtmlElement,
    latest: Rc<Cell<Option<(f64, f64)>>>,
    listener: Closure<dyn FnMut(web_sys::MouseEvent)>,
}

#[cfg(target_arch = "wasm32")]
impl PagePointer {
    const EVENT: &'static str = "mousemove";

    fn listen(window: &web_sys::Window) -> anyhow::Result<Self> {
        let body = window
            .document()
            .and_then(|document| document.body())
            .ok_or_else(|| anyhow::anyhow!("No document body"))?;
        let latest = Rc::new(Cell::new(None));
        let listener = {
            let latest = Rc::clone(&latest);
            let window = window.clone();
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |event: web_sys::MouseEvent| {
                latest.set(Some((f64::from(event.client_x()), inner_width(&window))));
            })
        };
        body.add_event_listener_with_callback(Self::EVENT, listener.as_ref().unchecked_ref())
            .map_err(|err| anyhow::anyhow!("Could not listen to pointer moves: {err:?}"))?;
        Ok(Self {
            body,
            latest,
            listener,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for PagePointer {
    fn drop(&mut self) {
        let _ = self
            .body
            .remove_event_listener_with_callback(Self::EVENT, self.listener.as_ref().unchecked_ref());
    }
}

/// A DOM element receiving the canvas, when running in a browser.
#[cfg(target_arch = "wasm32")]
pub struct ElementMount {
    pub element: web_sys::Element,
    pub window: web_sys::Window,
    pointer: PagePointer,
}

#[cfg(target_arch = "wasm32")]
impl ElementMount {
    pub fn find(element_id: &str) -> anyhow::Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No browser window"))?;
        let element = window
            .document()
            .and_then(|document| document.get_element_by_id(element_id))
            .ok_or_else(|| anyhow::anyhow!("No element with id '{element_id}'"))?;
        let pointer = PagePointer::listen(&window)?;
        Ok(Self {
            element,
            window,
            pointer,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl MountPoint for ElementMount {
    fn bounding_box(&self) -> (f64, f64) {
        let rect = self.element.get_bounding_client_rect();
        (rect.width(), rect.height())
    }
    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }
    fn host_width(&self) -> f64 {
        inner_width(&self.window)
    }
    fn tracks_page_pointer(&self) -> bool {
        true
    }
    fn take_page_pointer(&self) -> Option<(f64, f64)> {
        self.pointer.latest.take()
    }
}

/// Size of the render target, as measured on the mount point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    #[must_use]
    pub fn measure(mount_point: &dyn MountPoint, max_pixel_ratio: Option<f64>) -> Self {
        let (width, height) = mount_point.bounding_box();
        let pixel_ratio = mount_point.device_pixel_ratio();
        let pixel_ratio = max_pixel_ratio.map_or(pixel_ratio, |max| pixel_ratio.min(max));
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    #[must_use]
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn physical_dimensions(&self) -> Dimensions {
        let to_pixels = |length: f64| (length * self.pixel_ratio).round().max(1.0) as u32;
        Dimensions {
            width: to_pixels(self.width),
            height: to_pixels(self.height),
        }
    }

    /// `width, height, ratio, 1 / ratio`, as fed to shaders.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn resolution(&self) -> [f32; 4] {
        let ratio = if self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        [
            self.width as f32,
            self.height as f32,
            ratio as f32,
            (1.0 / ratio) as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped() {
        let mount = FixedMount {
            width: 800.0,
            height: 600.0,
            pixel_ratio: 3.0,
        };
        let viewport = Viewport::measure(&mount, Some(2.0));
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(
            viewport.physical_dimensions(),
            Dimensions {
                width: 1600,
                height: 1200
            }
        );
        let unclamped = Viewport::measure(&mount, None);
        assert_eq!(unclamped.pixel_ratio, 3.0);
    }

    #[test]
    fn empty_mount_keeps_a_drawable_surface() {
        let mount = FixedMount {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
        };
        let viewport = Viewport::measure(&mount, None);
        assert_eq!(viewport.aspect(), 1.0);
        assert_eq!(
            viewport.physical_dimensions(),
            Dimensions {
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn resolution_carries_ratio_and_inverse() {
        let viewport = Viewport {
            width: 400.0,
            height: 200.0,
            pixel_ratio: 2.0,
        };
        assert_eq!(viewport.resolution(), [400.0, 200.0, 2.0, 0.5]);
    }
}
