use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::mesh::Mesh;
use crate::viewport::Viewport;

/// Nearest intersection between the pointer ray and the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub triangle: usize,
}

/// Latest pointer position in normalized device coordinates.
///
/// `dirty` is raised by every pointer move and cleared by the render loop
/// once it has rewritten the vertex colors; nothing is gated on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionTracker {
    pointer: Vec2,
    dirty: bool,
    last_hit: Option<RayHit>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    /// Records a pointer move given in logical pixels relative to the viewport's top-left.
    pub fn on_pointer_move(&mut self, x: f64, y: f64, viewport: &dyn Viewport) {
        self.pointer = pointer_to_ndc(x, y, viewport.size());
        self.dirty = true;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Casts the pointer ray against `mesh` and remembers the nearest hit.
    pub fn update_hit(&mut self, camera: &PerspectiveCamera, mesh: &Mesh) -> Option<RayHit> {
        let (origin, direction) = camera.ray_through(self.pointer);
        self.last_hit = intersect_mesh(origin, direction, mesh);
        self.last_hit
    }

    pub fn last_hit(&self) -> Option<RayHit> {
        self.last_hit
    }
}

/// Maps pixel coordinates to `[-1, 1]` with `+y` up.
pub fn pointer_to_ndc(x: f64, y: f64, (width, height): (u32, u32)) -> Vec2 {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));
    Vec2::new(
        ((x / width) * 2.0 - 1.0) as f32,
        (-(y / height) * 2.0 + 1.0) as f32,
    )
}

/// Tests every triangle of `mesh` (both faces) and returns the closest hit.
pub fn intersect_mesh(origin: Vec3, direction: Vec3, mesh: &Mesh) -> Option<RayHit> {
    if direction == Vec3::ZERO {
        return None;
    }
    let model = mesh.model_matrix();
    mesh.geometry
        .triangles()
        .enumerate()
        .filter_map(|(index, [a, b, c])| {
            let a = model.transform_point3(a);
            let b = model.transform_point3(b);
            let c = model.transform_point3(c);
            intersect_triangle(origin, direction, a, b, c).map(|distance| RayHit {
                distance,
                point: origin + direction * distance,
                triangle: index,
            })
        })
        .min_by(|lhs, rhs| lhs.distance.total_cmp(&rhs.distance))
}

/// Möller–Trumbore ray/triangle test; returns the ray parameter of the hit.
fn intersect_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorTriplet;
    use crate::mesh::{PhongMaterial, PlaneGeometry, VertexColorBuffer};
    use crate::viewport::StaticViewport;

    fn flat_mesh() -> Mesh {
        let geometry = PlaneGeometry::new(10.0, 10.0, 2, 2);
        let colors = VertexColorBuffer::uniform(geometry.vertex_count(), ColorTriplet::BLACK);
        let material = PhongMaterial {
            vertex_colors: true,
            flat_shading: true,
            double_sided: true,
            shininess: 100.0,
            specular: ColorTriplet::BLACK,
        };
        Mesh::new(geometry, colors, material)
    }

    #[test]
    fn pixel_corners_map_to_ndc_corners() {
        let size = (800, 600);
        assert_eq!(pointer_to_ndc(0.0, 0.0, size), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(800.0, 600.0, size), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(400.0, 300.0, size), Vec2::ZERO);
    }

    #[test]
    fn pointer_move_marks_dirty() {
        let viewport = StaticViewport::new(200, 100);
        let mut tracker = InteractionTracker::new();
        tracker.clear_dirty();
        tracker.on_pointer_move(50.0, 25.0, &viewport);
        assert!(tracker.is_dirty());
        assert_eq!(tracker.pointer(), Vec2::new(-0.5, 0.5));
    }

    #[test]
    fn ray_hits_plane_from_either_side() {
        let mesh = flat_mesh();
        let front = intersect_mesh(Vec3::new(1.0, 2.0, 5.0), Vec3::NEG_Z, &mesh).unwrap();
        assert!((front.distance - 5.0).abs() < 1e-5);
        assert!(front.point.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));

        let back = intersect_mesh(Vec3::new(1.0, 2.0, -3.0), Vec3::Z, &mesh).unwrap();
        assert!((back.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn ray_missing_plane_has_no_hit() {
        let mesh = flat_mesh();
        assert!(intersect_mesh(Vec3::new(20.0, 0.0, 5.0), Vec3::NEG_Z, &mesh).is_none());
        assert!(intersect_mesh(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, &mesh).is_none());
    }

    #[test]
    fn rotation_is_applied_before_testing() {
        let mut mesh = flat_mesh();
        mesh.rotation.x = std::f32::consts::FRAC_PI_2;
        assert!(intersect_mesh(Vec3::new(1.0, 1.0, 5.0), Vec3::NEG_Z, &mesh).is_none());
        assert!(intersect_mesh(Vec3::new(1.0, 5.0, 2.0), Vec3::NEG_Y, &mesh).is_some());
    }
}
