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

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info, warn};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::assets::{AssetLoadError, AssetLoader, LoadedAsset};
use crate::cameras::{Camera, OrbitControls};
use crate::config::{LabelConfig, SketchConfig};
use crate::draw_context::{DrawContext, Dimensions};
use crate::material::{ChannelSlots, DataChannel, DataTexture, MaterialValues};
use crate::plugins::PluginRegistry;
use crate::plugins::egui::EguiPlugin;
use crate::plugins::scene_3d::{Scene3D, Scene3DPlugin};
use crate::primitives::plane::SketchPlane;
use crate::primitives::text::{TextGeometry, TextOptions, create_text_mesh};
use crate::primitives::Shareable;
use crate::render_loop::{EventState, FrameClock, LaunchContext, Playback, RenderLoopHandler};
use crate::settings::{SettingChange, Settings, show_debug_panel};
use crate::viewport::{MountPoint, Viewport};

/// Everything the sketch tracks apart from GPU resources.
///
/// `T` is what a loaded data channel becomes, a texture on the GPU.
pub struct SketchState<T> {
    viewport: Viewport,
    max_pixel_ratio: Option<f64>,
    settings: Settings,
    clock: FrameClock,
    values: MaterialValues,
    channels: ChannelSlots<T>,
    label_added: bool,
}

impl<T> SketchState<T> {
    pub fn new(
        mount_point: &dyn MountPoint,
        max_pixel_ratio: Option<f64>,
        camera: &mut Camera,
    ) -> Self {
        let viewport = Viewport::measure(mount_point, max_pixel_ratio);
        fit_camera(camera, &viewport);
        let settings = Settings::default();
        let clock = FrameClock::default();
        let values = MaterialValues {
            time: clock.time(),
            progress: settings.progress,
            mouse_x: 0.0,
            displacement_strength: settings.displacement_strength,
            resolution: viewport.resolution(),
        };
        Self {
            viewport,
            max_pixel_ratio,
            settings,
            clock,
            values,
            channels: ChannelSlots::default(),
            label_added: false,
        }
    }

    /// Measures the mount point again, returning the new render target size.
    pub fn resize(&mut self, mount_point: &dyn MountPoint, camera: &mut Camera) -> Dimensions {
        self.viewport = Viewport::measure(mount_point, self.max_pixel_ratio);
        fit_camera(camera, &self.viewport);
        self.values.resolution = self.viewport.resolution();
        self.viewport.physical_dimensions()
    }

    /// Sets `mouse_x` to `x / host_width`. A host without width keeps the last value.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pointer_moved(&mut self, x: f64, host_width: f64) {
        if host_width > 0.0 {
            self.values.mouse_x = (x / host_width) as f32;
        }
    }

    /// Pointer move reported by the window, ignored when the mount point
    /// listens to the whole page.
    pub fn window_pointer_moved(&mut self, mount_point: &dyn MountPoint, x: f64) {
        if !mount_point.tracks_page_pointer() {
            self.pointer_moved(x, mount_point.host_width());
        }
    }

    /// Applies the latest pointer move seen on the page, if any.
    pub fn poll_page_pointer(&mut self, mount_point: &dyn MountPoint) {
        if let Some((x, host_width)) = mount_point.take_page_pointer() {
            self.pointer_moved(x, host_width);
        }
    }

    pub fn apply_setting(&mut self, change: SettingChange) {
        self.settings.apply(change);
        self.values.progress = self.settings.progress;
        self.values.displacement_strength = self.settings.displacement_strength;
    }

    pub fn tick(&mut self) -> f32 {
        self.values.time = self.clock.tick();
        self.values.time
    }

    pub fn toggle_playback(&mut self) -> Playback {
        self.clock.toggle()
    }

    /// Stores a loaded channel, returns `false` if loading failed.
    pub fn accept_channel(
        &mut self,
        channel: DataChannel,
        result: Result<T, AssetLoadError>,
    ) -> bool {
        match result {
            Ok(value) => {
                info!("Loaded {channel} channel");
                self.channels.set(channel, value);
                true
            }
            Err(err) => {
                error!("Could not load {channel} channel: {err}");
                false
            }
        }
    }

    /// GUI scale, following the clamped ratio the render target is sized with.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixels_per_point(&self) -> f32 {
        self.viewport.pixel_ratio as f32
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn values(&self) -> &MaterialValues {
        &self.values
    }

    #[must_use]
    pub fn channels(&self) -> &ChannelSlots<T> {
        &self.channels
    }

    #[must_use]
    pub fn playback(&self) -> Playback {
        self.clock.playback()
    }

    /// Whether `geometry` should be inserted as the label, which happens at most once.
    #[must_use]
    pub fn wants_label(&self, geometry: &TextGeometry) -> bool {
        if self.label_added {
            warn!("Label already added");
            return false;
        }
        if geometry.triangle_count() == 0 {
            warn!("Label has no visible glyph");
            return false;
        }
        true
    }

    pub fn label_inserted(&mut self) {
        self.label_added = true;
    }

    #[must_use]
    pub fn has_label(&self) -> bool {
        self.label_added
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fit_camera(camera: &mut Camera, viewport: &Viewport) {
    camera.resize_screen(viewport.width as f32, viewport.height as f32);
}

/// The displaced plane, its debug panel and its label.
pub struct Sketch {
    state: SketchState<DataTexture>,
    mount_point: Rc<dyn MountPoint>,
    loader: AssetLoader,
    plane: Rc<RefCell<SketchPlane>>,
    label: LabelConfig,
}

impl Sketch {
    pub fn new(
        LaunchContext {
            draw_context,
            plugin_registry,
            mount_point,
        }: LaunchContext,
        config: &SketchConfig,
    ) -> anyhow::Result<Self> {
        draw_context.set_clear_color(Some(config.clear_color));
        let mut camera = Camera::default();
        let state = SketchState::new(mount_point.as_ref(), config.max_pixel_ratio, &mut camera);
        draw_context.resize(state.viewport().physical_dimensions());

        let mut scene = Scene3D::new(draw_context);
        let plane =
            SketchPlane::new(draw_context, scene.scene_uniforms(), state.values())?.into_shareable();
        scene.add(plane.clone());
        plugin_registry.register(Scene3DPlugin {
            controls: OrbitControls::new(camera),
            scene,
        });
        plugin_registry.register(EguiPlugin::new(draw_context, state.pixels_per_point()));

        let loader = AssetLoader::new();
        for channel in DataChannel::ALL {
            loader.request_channel(channel, config.channel_path(channel));
        }
        loader.request_label(
            config.font_path(),
            config.label.text.clone(),
            TextOptions::from(&config.label),
        );

        Ok(Self {
            state,
            mount_point,
            loader,
            plane,
            label: config.label.clone(),
        })
    }

    fn apply_loaded(
        &mut self,
        plugin_registry: &mut PluginRegistry,
        draw_context: &DrawContext,
        asset: LoadedAsset,
    ) {
        match asset {
            LoadedAsset::Channel { channel, result } => {
                let texture = result.map(|decoded| {
                    DataTexture::upload(
                        draw_context,
                        &format!("{channel} channel"),
                        &decoded,
                        channel.texture_format(),
                    )
                });
                if self.state.accept_channel(channel, texture) {
                    self.plane
                        .borrow_mut()
                        .bind_channels(draw_context, self.state.channels());
                }
            }
            LoadedAsset::Label(result) => match result {
                Ok(geometry) => self.add_label(plugin_registry, draw_context, &geometry),
                Err(err) => error!("Could not load the label typeface: {err}"),
            },
        }
    }

    fn add_label(
        &mut self,
        plugin_registry: &mut PluginRegistry,
        draw_context: &DrawContext,
        geometry: &TextGeometry,
    ) {
        if !self.state.wants_label(geometry) {
            return;
        }
        let Some(scene_plugin) = plugin_registry.get_mut::<Scene3DPlugin>() else {
            warn!("No scene to add the label to");
            return;
        };
        match create_text_mesh(
            draw_context,
            geometry,
            scene_plugin.scene.scene_uniforms(),
            &self.label,
        ) {
            Ok(text) => {
                scene_plugin.scene.add(text.into_shareable());
                self.state.label_inserted();
                info!("Added label '{}'", self.label.text);
            }
            Err(err) => error!("Could not create the label mesh: {err}"),
        }
    }
}

impl RenderLoopHandler for Sketch {
    fn on_keyboard_event(&mut self, _plugin_registry: &mut PluginRegistry, event: &KeyEvent) {
        if event.state == ElementState::Pressed
            && !event.repeat
            && event.logical_key == Key::Named(NamedKey::Space)
        {
            let playback = self.state.toggle_playback();
            info!("Playback: {playback:?}");
        }
    }

    fn on_window_event(
        &mut self,
        _plugin_registry: &mut PluginRegistry,
        event: &WindowEvent,
        _event_state: EventState,
    ) {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.state
                .window_pointer_moved(self.mount_point.as_ref(), position.x);
        }
    }

    fn on_resize(&mut self, plugin_registry: &mut PluginRegistry, draw_context: &mut DrawContext) {
        let Some(scene_plugin) = plugin_registry.get_mut::<Scene3DPlugin>() else {
            warn!("No scene to resize");
            return;
        };
        let dimensions = self.state.resize(
            self.mount_point.as_ref(),
            &mut scene_plugin.controls.controled_camera,
        );
        draw_context.resize(dimensions);
        if let Some(egui_plugin) = plugin_registry.get_mut::<EguiPlugin>() {
            egui_plugin.set_pixels_per_point(self.state.pixels_per_point());
        }
    }

    fn on_update(
        &mut self,
        plugin_registry: &mut PluginRegistry,
        draw_context: &mut DrawContext,
    ) {
        self.state.poll_page_pointer(self.mount_point.as_ref());
        let loaded: Vec<_> = self.loader.drain().collect();
        for asset in loaded {
            self.apply_loaded(plugin_registry, draw_context, asset);
        }
        if let Some(egui_plugin) = plugin_registry.get_mut::<EguiPlugin>() {
            let settings = *self.state.settings();
            let changes = egui_plugin
                .draw(|egui_context| show_debug_panel(egui_context, &settings))
                .unwrap_or_default();
            for change in changes {
                self.state.apply_setting(change);
            }
        }
        self.state.tick();
        self.plane
            .borrow_mut()
            .update_material(self.state.values());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::typeface::Typeface;
    use crate::typeface::tests::SQUARE_TYPEFACE;
    use crate::viewport::FixedMount;

    fn mount(width: f64, height: f64) -> FixedMount {
        FixedMount {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    fn state(mount_point: &FixedMount, camera: &mut Camera) -> SketchState<u8> {
        SketchState::new(mount_point, None, camera)
    }

    #[test]
    fn construction_measures_the_mount() {
        let mut camera = Camera::default();
        let state = state(&mount(800.0, 600.0), &mut camera);
        assert_eq!(state.viewport().width, 800.0);
        assert_eq!(state.viewport().height, 600.0);
        assert_eq!(camera.aspect(), 800.0 / 600.0);
        assert_eq!(state.playback(), Playback::Playing);
        assert_eq!(state.values().resolution, [800.0, 600.0, 1.0, 1.0]);
    }

    /// Reports pointer moves the way a page-wide listener does.
    struct PageMount {
        latest: Cell<Option<(f64, f64)>>,
    }

    impl MountPoint for PageMount {
        fn bounding_box(&self) -> (f64, f64) {
            (400.0, 300.0)
        }
        fn device_pixel_ratio(&self) -> f64 {
            1.0
        }
        fn host_width(&self) -> f64 {
            1000.0
        }
        fn tracks_page_pointer(&self) -> bool {
            true
        }
        fn take_page_pointer(&self) -> Option<(f64, f64)> {
            self.latest.take()
        }
    }

    #[test]
    fn pointer_sets_mouse_x_exactly() {
        let mut camera = Camera::default();
        let mut state = state(&mount(800.0, 600.0), &mut camera);
        state.pointer_moved(200.0, 800.0);
        assert_eq!(state.values().mouse_x, 0.25);
        state.pointer_moved(1000.0, 800.0);
        assert_eq!(state.values().mouse_x, (1000.0_f64 / 800.0) as f32);
    }

    #[test]
    fn pointer_on_a_host_without_width_keeps_mouse_x() {
        let mut camera = Camera::default();
        let mut state = state(&mount(800.0, 600.0), &mut camera);
        state.pointer_moved(200.0, 800.0);
        state.pointer_moved(10.0, 0.0);
        assert_eq!(state.values().mouse_x, 0.25);
    }

    #[test]
    fn window_pointer_uses_the_host_width() {
        let mut camera = Camera::default();
        let window = mount(800.0, 600.0);
        let mut state = state(&window, &mut camera);
        state.window_pointer_moved(&window, 200.0);
        assert_eq!(state.values().mouse_x, 0.25);
        state.poll_page_pointer(&window);
        assert_eq!(state.values().mouse_x, 0.25);
    }

    #[test]
    fn page_pointer_is_relative_to_the_page() {
        let page = PageMount {
            latest: Cell::new(None),
        };
        let mut camera = Camera::default();
        let mut state = SketchState::<u8>::new(&page, None, &mut camera);
        // Positions relative to the canvas are not used
        state.window_pointer_moved(&page, 100.0);
        assert_eq!(state.values().mouse_x, 0.0);
        page.latest.set(Some((300.0, 1000.0)));
        state.poll_page_pointer(&page);
        let expected = (300.0_f64 / 1000.0) as f32;
        assert_eq!(state.values().mouse_x, expected);
        state.poll_page_pointer(&page);
        assert_eq!(state.values().mouse_x, expected);
    }

    #[test]
    fn gui_scale_follows_the_clamped_ratio() {
        let retina = FixedMount {
            width: 800.0,
            height: 600.0,
            pixel_ratio: 3.0,
        };
        let mut camera = Camera::default();
        let mut state = SketchState::<u8>::new(&retina, Some(2.0), &mut camera);
        assert_eq!(state.pixels_per_point(), 2.0);
        let dimensions = state.resize(&retina, &mut camera);
        assert_eq!(dimensions.width, 1600);
        assert_eq!(state.pixels_per_point(), 2.0);
    }

    #[test]
    fn label_is_inserted_once() {
        let typeface = Typeface::from_slice(SQUARE_TYPEFACE.as_bytes()).unwrap();
        let options = TextOptions {
            size: 1.0,
            depth: 0.1,
            curve_segments: 12,
        };
        let label = TextGeometry::new(&typeface, "A", &options).unwrap();
        let mut camera = Camera::default();
        let mut state = state(&mount(100.0, 100.0), &mut camera);
        assert!(!state.has_label());
        assert!(state.wants_label(&label));
        state.label_inserted();
        assert!(state.has_label());
        assert!(!state.wants_label(&label));
    }

    #[test]
    fn blank_label_is_not_inserted() {
        let typeface = Typeface::from_slice(SQUARE_TYPEFACE.as_bytes()).unwrap();
        let options = TextOptions {
            size: 1.0,
            depth: 0.1,
            curve_segments: 12,
        };
        let blank = TextGeometry::new(&typeface, " ", &options).unwrap();
        let mut camera = Camera::default();
        let state = state(&mount(100.0, 100.0), &mut camera);
        assert!(!state.wants_label(&blank));
        assert!(!state.has_label());
    }

    #[test]
    fn resize_follows_the_mount() {
        let mut camera = Camera::default();
        let mut state = state(&mount(800.0, 600.0), &mut camera);
        let dimensions = state.resize(&mount(1024.0, 256.0), &mut camera);
        assert_eq!(
            dimensions,
            Dimensions {
                width: 1024,
                height: 256
            }
        );
        assert_eq!(camera.aspect(), 4.0);
        state.resize(&mount(1024.0, 256.0), &mut camera);
        assert_eq!(camera.aspect(), 4.0);
        assert_eq!(state.values().resolution[..2], [1024.0, 256.0]);
    }

    #[test]
    fn settings_reach_the_uniform_values() {
        let mut camera = Camera::default();
        let mut state = state(&mount(100.0, 100.0), &mut camera);
        assert_eq!(state.values().displacement_strength, 0.0025);
        state.apply_setting(SettingChange::Progress(0.7));
        assert_eq!(state.values().progress, 0.7);
        state.apply_setting(SettingChange::DisplacementStrength(0.008));
        assert_eq!(state.values().displacement_strength, 0.008);
    }

    #[test]
    fn failed_channel_leaves_its_slot_unset() {
        let mut camera = Camera::default();
        let mut state = state(&mount(100.0, 100.0), &mut camera);
        assert!(state.accept_channel(DataChannel::Diffuse, Ok(1)));
        assert!(!state.accept_channel(
            DataChannel::Motion,
            Err(AssetLoadError::Fetch {
                path: "img/gameboy_mv-high.png".to_owned(),
                reason: "HTTP status 404".to_owned(),
            })
        ));
        assert!(state.accept_channel(DataChannel::Data, Ok(4)));
        assert_eq!(state.channels().get(DataChannel::Diffuse), Some(&1));
        assert!(!state.channels().is_set(DataChannel::Motion));
        assert!(!state.channels().is_set(DataChannel::Position));
        assert_eq!(state.channels().get(DataChannel::Data), Some(&4));
    }

    #[test]
    fn time_advances_by_fixed_steps_while_playing() {
        let mut camera = Camera::default();
        let mut state = state(&mount(100.0, 100.0), &mut camera);
        for _ in 0..10 {
            state.tick();
        }
        assert_eq!(state.values().time, 0.05 * 10.0);
        assert_eq!(state.toggle_playback(), Playback::Paused);
        state.tick();
        assert_eq!(state.values().time, 0.05 * 10.0);
    }
}
