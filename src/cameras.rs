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

use cgmath::{Deg, InnerSpace, Matrix4, PerspectiveFov, Point3, Rad, Vector3, vec3};
use std::f32::consts::PI;
use std::sync::LazyLock;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

static TO_WEBGPU_NDCS: LazyLock<Matrix4<f32>> = LazyLock::new(|| {
    Matrix4::from_translation(vec3(0., 0., 0.5)) * Matrix4::from_nonuniform_scale(1., 1., 0.5)
});

#[derive(Debug, Clone, Copy)]
pub struct CameraView {
    pub eye: Point3<f32>,
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
}

impl CameraView {
    #[must_use]
    pub fn calc_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.center, self.up)
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 0.8),
            center: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCameraConfig {
    pub fovy: Rad<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCameraConfig {
    fn default() -> Self {
        Self {
            fovy: Deg(70.0).into(),
            aspect: 1.0,
            near: 0.01,
            far: 1_000.0,
        }
    }
}

impl PerspectiveCameraConfig {
    #[must_use]
    pub fn calc_projection(&self) -> Matrix4<f32> {
        Matrix4::from(PerspectiveFov {
            fovy: self.fovy,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        })
    }
}

pub struct Camera {
    projection: PerspectiveCameraConfig,
    view: CameraView,
    projection_cache: Matrix4<f32>,
    view_cache: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraView::default(), PerspectiveCameraConfig::default())
    }
}

impl Camera {
    #[must_use]
    pub fn new(view: CameraView, projection: PerspectiveCameraConfig) -> Self {
        let view_cache = view.calc_view_matrix();
        let projection_cache = projection.calc_projection();
        Self {
            projection,
            view,
            projection_cache,
            view_cache,
        }
    }
    fn update_view_cache(&mut self) {
        self.view_cache = self.view.calc_view_matrix();
    }
    fn update_projection_cache(&mut self) {
        self.projection_cache = self.projection.calc_projection();
    }
    /// Zero-sized screens keep the previous aspect ratio.
    pub fn resize_screen(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.projection.aspect = width / height;
        self.update_projection_cache();
    }
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.projection.aspect
    }
    #[must_use]
    pub fn view(&self) -> &CameraView {
        &self.view
    }
    pub fn set_view(&mut self, view: CameraView) {
        self.view = view;
        self.update_view_cache();
    }
    #[must_use]
    pub fn get_camera_matrix(&self) -> Matrix4<f32> {
        (*TO_WEBGPU_NDCS) * self.projection_cache * self.view_cache
    }
    #[must_use]
    pub fn eye_position(&self) -> Point3<f32> {
        self.view.eye
    }
}

/// Rotates the camera around its center with a left drag, and dollies with the wheel.
pub struct OrbitControls {
    pub controled_camera: Camera,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    pending_rotation: (f32, f32),
    pending_dolly: f32,
    screen_height: f32,
}

impl OrbitControls {
    const ROTATE_SPEED: f32 = 1.0;
    const DOLLY_BASE: f32 = 0.95;
    const LINE_DELTA_IN_PIXELS: f32 = 50.0;
    const MIN_DISTANCE: f32 = 0.05;
    const MAX_DISTANCE: f32 = 100.0;
    const POLAR_EPSILON: f32 = 1e-4;

    #[must_use]
    pub fn new(camera: Camera) -> Self {
        Self {
            controled_camera: camera,
            dragging: false,
            last_cursor: None,
            pending_rotation: (0.0, 0.0),
            pending_dolly: 0.0,
            screen_height: 1.0,
        }
    }

    pub fn update_screen_height(&mut self, height: f32) {
        if height > 0.0 {
            self.screen_height = height;
        }
    }

    /// Releases the drag when the event was captured by an overlay.
    pub fn cancel_drag(&mut self) {
        self.dragging = false;
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn window_event_listener(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = (position.x, position.y);
                if let Some((last_x, last_y)) = self.last_cursor {
                    if self.dragging {
                        self.pending_rotation.0 += (position.0 - last_x) as f32;
                        self.pending_rotation.1 += (position.1 - last_y) as f32;
                    }
                }
                self.last_cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.pending_dolly += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * Self::LINE_DELTA_IN_PIXELS,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
            }
            _ => {}
        }
    }

    pub fn update_control(&mut self) {
        let (delta_x, delta_y) = std::mem::take(&mut self.pending_rotation);
        let dolly = std::mem::take(&mut self.pending_dolly);
        if delta_x == 0.0 && delta_y == 0.0 && dolly == 0.0 {
            return;
        }
        let azimuth = -2.0 * PI * delta_x / self.screen_height * Self::ROTATE_SPEED;
        let polar = -2.0 * PI * delta_y / self.screen_height * Self::ROTATE_SPEED;
        let scale = Self::DOLLY_BASE.powf(dolly / Self::LINE_DELTA_IN_PIXELS);
        self.orbit(Rad(azimuth), Rad(polar), scale);
    }

    /// Moves the eye on the sphere around the center, `scale` multiplying the distance.
    pub fn orbit(&mut self, azimuth: Rad<f32>, polar: Rad<f32>, scale: f32) {
        let mut view = *self.controled_camera.view();
        let offset = view.eye - view.center;
        let radius = (offset.magnitude() * scale).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
        let theta = offset.x.atan2(offset.z) + azimuth.0;
        let phi = ((offset.y / offset.magnitude()).clamp(-1.0, 1.0).acos() + polar.0)
            .clamp(Self::POLAR_EPSILON, PI - Self::POLAR_EPSILON);
        let new_offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        view.eye = view.center + new_offset;
        self.controled_camera.set_view(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, Vector4};

    #[test]
    fn aspect_follows_screen() {
        let mut camera = Camera::default();
        camera.resize_screen(1280.0, 720.0);
        assert!((camera.aspect() - 1280.0 / 720.0).abs() < f32::EPSILON);
        camera.resize_screen(0.0, 720.0);
        assert!((camera.aspect() - 1280.0 / 720.0).abs() < f32::EPSILON);
    }

    #[test]
    fn center_projects_to_middle_of_screen() {
        let camera = Camera::default();
        let clip = camera.get_camera_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn positive_x_is_on_the_right() {
        let camera = Camera::default();
        let clip = camera.get_camera_matrix() * Vector4::new(0.1, 0.0, 0.0, 1.0);
        assert!(clip.x / clip.w > 0.0);
    }

    #[test]
    fn orbit_keeps_distance_to_center() {
        let mut controls = OrbitControls::new(Camera::default());
        controls.orbit(Rad(0.7), Rad(-0.3), 1.0);
        let eye = controls.controled_camera.eye_position();
        assert!((eye.to_vec().magnitude() - 0.8).abs() < 1e-5);
        assert!(eye.x.abs() > 0.1);
    }

    #[test]
    fn dolly_is_clamped() {
        let mut controls = OrbitControls::new(Camera::default());
        controls.orbit(Rad(0.0), Rad(0.0), 1e-6);
        let eye = controls.controled_camera.eye_position();
        assert!((eye.to_vec().magnitude() - OrbitControls::MIN_DISTANCE).abs() < 1e-5);
    }
}
