use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

/// Right-handed perspective camera with a `[0, 1]` depth range.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub up: Vec3,
    look_at: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            up: Vec3::Y,
            look_at: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the projection after `fov`, `aspect`, `near` or `far` changed.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.look_at = target;
    }

    pub fn target(&self) -> Vec3 {
        self.look_at
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Maps a point in normalized device coordinates (`z` in `[0, 1]`) back to world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// Returns the world-space origin and unit direction of the ray through `ndc`.
    pub fn ray_through(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let origin = self.position;
        let far_point = self.unproject(ndc.extend(0.5));
        (origin, (far_point - origin).normalize_or_zero())
    }
}

/// Orbit-style controller around a fixed target.
///
/// Rotation, zoom and pan are disabled by default, which leaves only the
/// inertial damping step: residual spherical deltas decay by the damping
/// factor every update while the camera keeps aiming at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    /// Pending (azimuth, polar) rotation in radians.
    spherical_delta: Vec2,
}

impl CameraControls {
    pub fn new(target: Vec3, damping_factor: f32) -> Self {
        Self {
            target,
            enable_damping: true,
            damping_factor,
            enable_rotate: false,
            enable_zoom: false,
            enable_pan: false,
            spherical_delta: Vec2::ZERO,
        }
    }

    /// Queues a rotation; ignored while rotation is disabled.
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        if self.enable_rotate {
            self.spherical_delta += Vec2::new(azimuth, polar);
        }
    }

    /// Applies one step of pending rotation and re-aims `camera` at the target.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius > f32::EPSILON && self.spherical_delta != Vec2::ZERO {
            let step = if self.enable_damping {
                self.spherical_delta * self.damping_factor
            } else {
                self.spherical_delta
            };
            let mut theta = offset.x.atan2(offset.z);
            let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
            theta += step.x;
            phi = (phi + step.y).clamp(1e-6, std::f32::consts::PI - 1e-6);
            camera.position = self.target
                + Vec3::new(
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.cos(),
                );
        }

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
        }
        camera.look_at(self.target);
    }
}

/// Builds the camera and controls described by `config` for a viewport of `aspect`.
pub fn build_camera(config: &CameraConfig, aspect: f32) -> (PerspectiveCamera, CameraControls) {
    let mut camera = PerspectiveCamera::new(config.fov_degrees, aspect, config.near, config.far);
    camera.position = config.position;
    let mut controls = CameraControls::new(config.target, config.damping_factor);
    controls.update(&mut camera);
    (camera, controls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pose_survives_updates() {
        let (mut camera, mut controls) = build_camera(&CameraConfig::default(), 16.0 / 9.0);
        let pose = camera.position;
        controls.rotate(0.5, 0.5);
        for _ in 0..100 {
            controls.update(&mut camera);
        }
        assert_eq!(camera.position, pose);
        assert_eq!(camera.target(), Vec3::new(-2.52, -5.23, 0.0));
    }

    #[test]
    fn damping_decays_rotation() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        let mut controls = CameraControls::new(Vec3::ZERO, 0.05);
        controls.enable_rotate = true;
        controls.rotate(1.0, 0.0);

        controls.update(&mut camera);
        let first = camera.position;
        controls.update(&mut camera);
        let second = camera.position;
        assert!((first.length() - 10.0).abs() < 1e-3);
        assert!(first.distance(Vec3::new(0.0, 0.0, 10.0)) > second.distance(first) * 1.01);
    }

    #[test]
    fn center_ray_points_at_target() {
        let (camera, _) = build_camera(&CameraConfig::default(), 1.0);
        let (origin, direction) = camera.ray_through(Vec2::ZERO);
        assert_eq!(origin, camera.position);
        assert!(direction.abs_diff_eq(Vec3::NEG_Z, 1e-4), "{direction:?}");
    }
}
