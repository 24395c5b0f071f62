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

use crate::material::DataChannel;

pub const ENV_HEADLESS: &str = "HEADLESS";
pub const ENV_ASSETS_DIR: &str = "SKETCH_ASSETS_DIR";

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_ASSETS_DIR: &str = "assets";
#[cfg(target_arch = "wasm32")]
const DEFAULT_ASSETS_DIR: &str = "/assets";

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_MAX_PIXEL_RATIO: Option<f64> = None;
#[cfg(target_arch = "wasm32")]
const DEFAULT_MAX_PIXEL_RATIO: Option<f64> = Some(2.0);

#[derive(Debug, Clone)]
pub struct LabelConfig {
    pub text: String,
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: "ButterMax".to_owned(),
            size: 0.30,
            depth: 0.01,
            curve_segments: 12,
            position: [-0.9, 0.2, -0.1],
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SketchConfig {
    pub assets_dir: String,
    pub mount_element_id: String,
    pub clear_color: wgpu::Color,
    pub max_pixel_ratio: Option<f64>,
    pub label: LabelConfig,
}

impl SketchConfig {
    /// Defaults, overridden by the environment where supported.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if !cfg!(target_arch = "wasm32") {
            if let Ok(assets_dir) = env::var(ENV_ASSETS_DIR) {
                config.assets_dir = assets_dir;
            }
        }
        config
    }

    #[must_use]
    pub fn channel_path(&self, channel: DataChannel) -> String {
        format!("{}/img/{}", self.assets_dir, channel.file_name())
    }

    #[must_use]
    pub fn font_path(&self) -> String {
        format!("{}/img/helvetiker_regular.typeface.json", self.assets_dir)
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            assets_dir: DEFAULT_ASSETS_DIR.to_owned(),
            mount_element_id: "container".to_owned(),
            clear_color: hex_color(0x00fe_d703),
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
            label: LabelConfig::default(),
        }
    }
}

/// Converts a `0xRRGGBB` sRGB color into the linear color expected by clear operations.
#[must_use]
pub fn hex_color(hex: u32) -> wgpu::Color {
    let channel = |shift: u32| {
        let srgb = f64::from((hex >> shift) & 0xff) / 255.0;
        if srgb <= 0.04045 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: channel(16),
        g: channel(8),
        b: channel(0),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_extremes() {
        let white = hex_color(0x00ff_ffff);
        assert!((white.r - 1.0).abs() < 1e-9);
        assert!((white.g - 1.0).abs() < 1e-9);
        let black = hex_color(0);
        assert_eq!(black.b, 0.0);
    }

    #[test]
    fn asset_paths_live_under_img() {
        let config = SketchConfig {
            assets_dir: "root".to_owned(),
            ..SketchConfig::default()
        };
        assert_eq!(
            config.channel_path(DataChannel::Motion),
            "root/img/gameboy_mv-high.png"
        );
        assert_eq!(
            config.font_path(),
            "root/img/helvetiker_regular.typeface.json"
        );
    }
}
