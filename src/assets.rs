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

//! Background loading of the data channels and of the label typeface.
//!
//! Every request is an independent job whose tagged result lands in a
//! channel drained once per frame by the render loop.

use std::sync::mpsc;

use log::debug;
use thiserror::Error;

use crate::material::DataChannel;
use crate::primitives::text::{TextGeometry, TextOptions};
use crate::typeface::Typeface;

#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not fetch {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid typeface: {0}")]
    Typeface(#[from] serde_json::Error),
    #[error("invalid glyph outline: {0}")]
    Outline(String),
    #[error("could not tessellate text: {0}")]
    Tessellation(String),
}

/// RGBA8 pixels, rows from top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedTexture {
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetLoadError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

pub enum LoadedAsset {
    Channel {
        channel: DataChannel,
        result: Result<DecodedTexture, AssetLoadError>,
    },
    Label(Result<TextGeometry, AssetLoadError>),
}

pub struct AssetLoader {
    sender: mpsc::Sender<LoadedAsset>,
    receiver: mpsc::Receiver<LoadedAsset>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn request_channel(&self, channel: DataChannel, path: String) {
        self.spawn_load(path, move |bytes| LoadedAsset::Channel {
            channel,
            result: bytes.and_then(|bytes| DecodedTexture::decode(&bytes)),
        });
    }

    /// Loads the typeface at `path` and extrudes `text` with it.
    pub fn request_label(&self, path: String, text: String, options: TextOptions) {
        self.spawn_load(path, move |bytes| {
            LoadedAsset::Label(bytes.and_then(|bytes| {
                let typeface = Typeface::from_slice(&bytes)?;
                TextGeometry::new(&typeface, &text, &options)
            }))
        });
    }

    /// Results received since the last call, never blocking.
    pub fn drain(&self) -> impl Iterator<Item = LoadedAsset> + '_ {
        self.receiver.try_iter()
    }

    #[cfg(test)]
    fn wait_next(&self, timeout: std::time::Duration) -> Option<LoadedAsset> {
        self.receiver.recv_timeout(timeout).ok()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_load<F>(&self, path: String, finish: F)
    where
        F: FnOnce(Result<Vec<u8>, AssetLoadError>) -> LoadedAsset + Send + 'static,
    {
        let sender = self.sender.clone();
        rayon::spawn(move || {
            debug!("Loading {path}");
            let bytes = std::fs::read(&path).map_err(|source| AssetLoadError::Io {
                path: path.clone(),
                source,
            });
            if sender.send(finish(bytes)).is_err() {
                debug!("Loader dropped before {path} was loaded");
            }
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_load<F>(&self, path: String, finish: F)
    where
        F: FnOnce(Result<Vec<u8>, AssetLoadError>) -> LoadedAsset + 'static,
    {
        let sender = self.sender.clone();
        wasm_bindgen_futures::spawn_local(async move {
            debug!("Fetching {path}");
            let bytes = fetch_bytes(&path).await;
            if sender.send(finish(bytes)).is_err() {
                debug!("Loader dropped before {path} was loaded");
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(path: &str) -> Result<Vec<u8>, AssetLoadError> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let fetch_error = |reason: JsValue| AssetLoadError::Fetch {
        path: path.to_owned(),
        reason: format!("{reason:?}"),
    };
    let window = web_sys::window().ok_or_else(|| AssetLoadError::Fetch {
        path: path.to_owned(),
        reason: "no browser window".to_owned(),
    })?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(fetch_error)?
        .dyn_into()
        .map_err(fetch_error)?;
    if !response.ok() {
        return Err(AssetLoadError::Fetch {
            path: path.to_owned(),
            reason: format!("HTTP status {}", response.status()),
        });
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(fetch_error)?)
        .await
        .map_err(fetch_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([u8::try_from(x).unwrap(), u8::try_from(y).unwrap(), 7, 255])
        });
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn decodes_png_to_rgba() {
        let decoded = DecodedTexture::decode(&encoded_png(3, 2)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
        // Pixel (2, 1)
        assert_eq!(&decoded.pixels[(3 + 2) * 4..(3 + 2) * 4 + 4], &[2, 1, 7, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            DecodedTexture::decode(b"not an image"),
            Err(AssetLoadError::Image(_))
        ));
    }

    #[test]
    fn failed_channel_does_not_affect_others() {
        let loader = AssetLoader::new();
        let image_path = temp_file("position.png", &encoded_png(4, 4));
        loader.request_channel(DataChannel::Diffuse, "/does/not/exist.png".to_owned());
        loader.request_channel(
            DataChannel::Position,
            image_path.to_string_lossy().into_owned(),
        );
        let mut loaded = Vec::new();
        for _ in 0..2 {
            match loader.wait_next(TIMEOUT) {
                Some(LoadedAsset::Channel { channel, result }) => loaded.push((channel, result)),
                _ => panic!("expected a channel result"),
            }
        }
        loaded.sort_by_key(|(channel, _)| *channel != DataChannel::Diffuse);
        assert!(matches!(loaded[0], (DataChannel::Diffuse, Err(AssetLoadError::Io { .. }))));
        assert!(matches!(&loaded[1], (DataChannel::Position, Ok(texture)) if texture.width == 4));
        assert!(loader.drain().next().is_none());
        std::fs::remove_file(image_path).unwrap();
    }

    #[test]
    fn label_is_extruded_in_the_background() {
        let loader = AssetLoader::new();
        let font_path = temp_file(
            "font.typeface.json",
            crate::typeface::tests::SQUARE_TYPEFACE.as_bytes(),
        );
        loader.request_label(
            font_path.to_string_lossy().into_owned(),
            "AO".to_owned(),
            TextOptions {
                size: 0.3,
                depth: 0.01,
                curve_segments: 12,
            },
        );
        match loader.wait_next(TIMEOUT) {
            Some(LoadedAsset::Label(Ok(geometry))) => assert!(geometry.triangle_count() > 0),
            _ => panic!("expected an extruded label"),
        }
        std::fs::remove_file(font_path).unwrap();
    }

    #[test]
    fn invalid_typeface_is_reported() {
        let loader = AssetLoader::new();
        let font_path = temp_file("broken.typeface.json", b"{}");
        loader.request_label(
            font_path.to_string_lossy().into_owned(),
            "A".to_owned(),
            TextOptions {
                size: 0.3,
                depth: 0.01,
                curve_segments: 12,
            },
        );
        assert!(matches!(
            loader.wait_next(TIMEOUT),
            Some(LoadedAsset::Label(Err(AssetLoadError::Typeface(_))))
        ));
        std::fs::remove_file(font_path).unwrap();
    }
}
