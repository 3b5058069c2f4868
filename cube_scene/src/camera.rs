//! Fixed-angle orbit camera. The cube player never free-orbits: the tilt and
//! orbit angles stay at their startup values and only the zoom distance and
//! viewport respond to input.

use glam::{Mat4, Vec3};

pub const DEFAULT_ZOOM: f32 = -6.0;
pub const MIN_ZOOM: f32 = -30.0;
pub const MAX_ZOOM: f32 = -2.0;
const ZOOM_STEP: f32 = 0.5;

const TILT_DEGREES: f32 = 30.0;
const ORBIT_DEGREES: f32 = -45.0;
const FOV_DEGREES: f32 = 45.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    zoom: f32,
    tilt_degrees: f32,
    orbit_degrees: f32,
    viewport: (u32, u32),
}

impl OrbitCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            tilt_degrees: TILT_DEGREES,
            orbit_degrees: ORBIT_DEGREES,
            viewport: (width.max(1), height.max(1)),
        }
    }

    /// Record a framebuffer size change. Zero-area sizes are ignored so the
    /// aspect ratio never divides by zero while a window is minimized.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
    }

    /// Scroll-wheel zoom: `delta` notches scaled by the step, clamped to the
    /// working range. Out-of-range input clamps silently.
    pub fn adjust_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    /// View matrix: retreat along the view axis, then the two fixed
    /// rotations. Pure function of camera state.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, self.zoom))
            * Mat4::from_rotation_x(self.tilt_degrees.to_radians())
            * Mat4::from_rotation_y(self.orbit_degrees.to_radians())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            FOV_DEGREES.to_radians(),
            self.aspect_ratio(),
            NEAR_PLANE,
            FAR_PLANE,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn zoom_stays_clamped_for_any_input() {
        let mut camera = OrbitCamera::new(800, 600);
        for delta in [-1000.0, -1.0, 0.0, 0.25, 3.0, 1e6, f32::MAX] {
            camera.adjust_zoom(delta);
            assert!(
                (MIN_ZOOM..=MAX_ZOOM).contains(&camera.zoom()),
                "zoom {} escaped range after delta {}",
                camera.zoom(),
                delta
            );
        }
        camera.adjust_zoom(f32::MIN);
        assert_eq!(camera.zoom(), MIN_ZOOM);
    }

    #[test]
    fn zero_area_resize_keeps_previous_viewport() {
        let mut camera = OrbitCamera::new(800, 600);
        camera.resize(0, 600);
        camera.resize(800, 0);
        assert_eq!(camera.viewport(), (800, 600));
        camera.resize(1024, 768);
        assert_eq!(camera.viewport(), (1024, 768));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = OrbitCamera::new(800, 600);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.w > 0.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
    }

    #[test]
    fn default_zoom_matches_startup_distance() {
        let camera = OrbitCamera::new(800, 600);
        assert_eq!(camera.zoom(), DEFAULT_ZOOM);
        // The eye sits `zoom` units down the view axis, so the origin lands
        // at that depth in view space.
        let view = camera.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((view.z - DEFAULT_ZOOM).abs() < 1e-5);
    }
}
