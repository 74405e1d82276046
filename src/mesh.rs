use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;

use crate::color::ColorTriplet;

/// Subdivided plane in the XY plane, facing +Z, centered on the origin.
///
/// Vertices are laid out row by row from the top edge (`+y`) down, each row
/// running from `-x` to `+x`; every grid cell contributes two triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut positions = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width / 2.0;
                positions.push(Vec3::new(x, -y, 0.0));
            }
        }

        let row = grid_x + 1;
        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            width,
            height,
            width_segments: grid_x,
            height_segments: grid_y,
            positions,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Offsets every vertex along Z by `(u - 0.5) * amplitude` with `u` uniform in `[0, 1)`.
    pub fn perturb<R: Rng>(&mut self, rng: &mut R, amplitude: f32) {
        for position in &mut self.positions {
            position.z = (rng.random::<f32>() - 0.5) * amplitude;
        }
    }

    /// Iterates over the triangles as vertex position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

/// One color per vertex. The backdrop always writes a single uniform tint.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexColorBuffer {
    colors: Vec<ColorTriplet>,
    needs_update: bool,
}

impl VertexColorBuffer {
    pub fn uniform(count: usize, color: ColorTriplet) -> Self {
        Self {
            colors: vec![color; count],
            needs_update: true,
        }
    }

    /// Overwrites every entry with `color` and flags the buffer for upload.
    pub fn fill(&mut self, color: ColorTriplet) {
        self.colors.fill(color);
        self.needs_update = true;
    }

    pub fn colors(&self) -> &[ColorTriplet] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Returns whether an upload was pending and clears the flag.
    pub fn take_update(&mut self) -> bool {
        std::mem::replace(&mut self.needs_update, false)
    }

    /// Flattened `rgb` floats, one triple per vertex.
    pub fn as_floats(&self) -> Vec<f32> {
        self.colors.iter().flat_map(|color| color.to_array()).collect()
    }
}

/// Shading options for the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub vertex_colors: bool,
    pub flat_shading: bool,
    pub double_sided: bool,
    pub shininess: f32,
    pub specular: ColorTriplet,
}

/// Plane geometry, its colors, material and Euler rotation (XYZ order).
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: PlaneGeometry,
    pub colors: VertexColorBuffer,
    pub material: PhongMaterial,
    pub rotation: Vec3,
    pub position: Vec3,
}

impl Mesh {
    pub fn new(geometry: PlaneGeometry, colors: VertexColorBuffer, material: PhongMaterial) -> Self {
        Self {
            geometry,
            colors,
            material,
            rotation: Vec3::ZERO,
            position: Vec3::ZERO,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}
