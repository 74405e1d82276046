use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::BloomConfig;
use crate::scene::SceneGraph;

/// Number of blurred levels the bloom pass combines.
pub const BLOOM_LEVELS: usize = 5;

/// Base contribution of each bloom level, sharpest first.
pub const BLOOM_FACTORS: [f32; BLOOM_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Gaussian kernel radius used to blur each bloom level.
pub const BLOOM_KERNEL_RADII: [u32; BLOOM_LEVELS] = [3, 5, 7, 9, 11];

/// Width of the smooth edge above the luminance threshold.
pub const BLOOM_SMOOTH_WIDTH: f32 = 0.01;

/// Per-frame camera, mesh and lighting state for the scene pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz position, w range (0 = unlimited).
    pub point_position: [f32; 4],
    /// rgb color, w intensity.
    pub point_color: [f32; 4],
    /// x decay exponent.
    pub point_decay: [f32; 4],
    /// xyz unit vector toward the light, w intensity.
    pub directional: [f32; 4],
    pub directional_color: [f32; 4],
    /// rgb color, w intensity.
    pub ambient: [f32; 4],
    /// rgb specular color, w shininess.
    pub specular: [f32; 4],
    /// xyz marker center, w marker size.
    pub helper: [f32; 4],
}

impl SceneUniform {
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let point = &scene.point_light;
        let directional = &scene.directional_light;
        let ambient = &scene.ambient_light;
        let material = &scene.mesh.material;
        Self {
            view_proj: scene.camera.view_projection().to_cols_array_2d(),
            model: scene.mesh.model_matrix().to_cols_array_2d(),
            camera_position: scene.camera.position.extend(1.0).into(),
            point_position: point.position.extend(point.distance).into(),
            point_color: point.color.to_vec3().extend(point.intensity).into(),
            point_decay: [point.decay, 0.0, 0.0, 0.0],
            directional: directional
                .direction()
                .extend(directional.intensity)
                .into(),
            directional_color: directional.color.to_vec3().extend(1.0).into(),
            ambient: ambient.color.to_vec3().extend(ambient.intensity).into(),
            specular: material.specular.to_vec3().extend(material.shininess).into(),
            helper: point.position.extend(point.helper_size).into(),
        }
    }
}

/// Parameters shared by the bright-pass and blur shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PassParams {
    pub direction: [f32; 2],
    pub texel_size: [f32; 2],
    pub kernel_radius: f32,
    pub threshold: f32,
    pub smooth_width: f32,
    pub _padding: f32,
}

impl PassParams {
    pub fn bright(threshold: f32) -> Self {
        Self {
            threshold,
            smooth_width: BLOOM_SMOOTH_WIDTH,
            ..Self::default()
        }
    }

    pub fn blur(horizontal: bool, width: u32, height: u32, kernel_radius: u32) -> Self {
        Self {
            direction: if horizontal { [1.0, 0.0] } else { [0.0, 1.0] },
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            kernel_radius: kernel_radius as f32,
            ..Self::default()
        }
    }
}

/// Final per-level weights for the composite shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    pub weights: [f32; 4],
    pub last_weight: [f32; 4],
}

impl CompositeParams {
    pub fn new(bloom: &BloomConfig) -> Self {
        let w = bloom_weights(bloom);
        Self {
            weights: [w[0], w[1], w[2], w[3]],
            last_weight: [w[4], 0.0, 0.0, 0.0],
        }
    }
}

/// Mirrors a level's factor around 0.6 as `radius` goes from 0 to 1.
pub fn lerp_bloom_factor(factor: f32, radius: f32) -> f32 {
    let mirrored = 1.2 - factor;
    factor + (mirrored - factor) * radius
}

/// Strength-scaled contribution of every bloom level.
pub fn bloom_weights(bloom: &BloomConfig) -> [f32; BLOOM_LEVELS] {
    BLOOM_FACTORS.map(|factor| bloom.strength * lerp_bloom_factor(factor, bloom.radius))
}

/// Sizes of the blurred levels for an offscreen target of `width` x `height`.
///
/// The first level is half resolution; each further level halves again.
pub fn bloom_level_sizes(width: u32, height: u32) -> [(u32, u32); BLOOM_LEVELS] {
    let mut w = (width / 2).max(1);
    let mut h = (height / 2).max(1);
    let mut sizes = [(1, 1); BLOOM_LEVELS];
    for size in &mut sizes {
        *size = (w, h);
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

/// Vertices of the point-light marker: the twelve edges of a unit octahedron.
pub fn helper_lines() -> Vec<[f32; 3]> {
    let tips = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    let mut lines = Vec::with_capacity(24);
    for (i, a) in tips.iter().enumerate() {
        for b in &tips[i + 1..] {
            if a.dot(*b) == 0.0 {
                lines.push(a.to_array());
                lines.push(b.to_array());
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_std140_friendly() {
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<SceneUniform>(), 2 * 64 + 9 * 16);
        assert_eq!(std::mem::size_of::<PassParams>(), 32);
        assert_eq!(std::mem::size_of::<CompositeParams>(), 32);
    }

    #[test]
    fn radius_mirrors_factors() {
        assert_eq!(lerp_bloom_factor(1.0, 0.0), 1.0);
        assert!((lerp_bloom_factor(1.0, 1.0) - 0.2).abs() < 1e-6);
        assert!((lerp_bloom_factor(0.6, 0.37) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn default_bloom_weights() {
        let weights = bloom_weights(&BloomConfig::default());
        let expected = [0.22, 0.185, 0.15, 0.115, 0.08];
        for (weight, expected) in weights.iter().zip(expected) {
            assert!((weight - expected).abs() < 1e-5, "{weight} != {expected}");
        }
        let params = CompositeParams::new(&BloomConfig::default());
        assert_eq!(params.last_weight[0], weights[4]);
    }

    #[test]
    fn level_sizes_halve_and_never_vanish() {
        let sizes = bloom_level_sizes(1920, 1080);
        assert_eq!(sizes[0], (960, 540));
        assert_eq!(sizes[4], (60, 33));
        assert!(bloom_level_sizes(4, 2).iter().all(|&(w, h)| w >= 1 && h >= 1));
    }

    #[test]
    fn marker_is_an_octahedron() {
        let lines = helper_lines();
        assert_eq!(lines.len(), 24);
        assert!(lines.iter().all(|v| Vec3::from_array(*v).length() == 1.0));
    }
}
