use glam::Vec3;
use log::info;
use rand::Rng;

use crate::camera::{build_camera, CameraControls, PerspectiveCamera};
use crate::color::{hex_to_rgb, ColorTriplet};
use crate::config::{BloomConfig, SceneConfig};
use crate::mesh::{Mesh, PhongMaterial, PlaneGeometry, VertexColorBuffer};
use crate::theme::ThemeTransition;
use crate::viewport::Viewport;

/// Point light with distance falloff. The helper marks its position on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: ColorTriplet,
    pub intensity: f32,
    /// Range after which the light contributes nothing; zero means unlimited.
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
    pub helper_size: f32,
}

/// Light arriving from `position` toward `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: ColorTriplet,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface toward the light.
    pub fn direction(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: ColorTriplet,
    pub intensity: f32,
}

/// Logical output size plus the effective pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl RenderSize {
    /// Size of the backing drawing buffer in physical pixels.
    pub fn drawing_buffer(&self) -> (u32, u32) {
        let scale = |value: u32| ((value as f64 * self.pixel_ratio).floor() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

/// Renderer-level settings mirrored on the CPU side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub size: RenderSize,
    pub max_pixel_ratio: f64,
    pub clear_color: ColorTriplet,
}

impl RendererSettings {
    /// Applies `device_pixel_ratio`, never exceeding the configured ceiling.
    pub fn set_pixel_ratio(&mut self, device_pixel_ratio: f64) {
        self.size.pixel_ratio = device_pixel_ratio.min(self.max_pixel_ratio);
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size.width = width;
        self.size.height = height;
    }
}

/// Passes run by the composer, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComposerPass {
    Render,
    Bloom(BloomConfig),
}

/// Post-processing chain description.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    pub size: RenderSize,
    pub passes: Vec<ComposerPass>,
}

impl ComposerSettings {
    pub fn bloom(&self) -> Option<BloomConfig> {
        self.passes.iter().find_map(|pass| match pass {
            ComposerPass::Bloom(bloom) => Some(*bloom),
            ComposerPass::Render => None,
        })
    }
}

/// Everything the backdrop draws, built once per attach.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub camera: PerspectiveCamera,
    pub controls: CameraControls,
    pub point_light: PointLight,
    pub directional_light: DirectionalLight,
    pub ambient_light: AmbientLight,
    pub mesh: Mesh,
    pub renderer: RendererSettings,
    pub composer: ComposerSettings,
}

/// One-shot construction of the [`SceneGraph`].
pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        Self { config }
    }

    /// Builds the scene for `viewport`, tinted with the transition's current values.
    ///
    /// Only call this once the host confirmed it can render.
    pub fn build<R: Rng>(
        &self,
        viewport: &dyn Viewport,
        transition: &ThemeTransition,
        rng: &mut R,
    ) -> SceneGraph {
        let config = self.config;
        let (width, height) = viewport.size();
        let (camera, controls) = build_camera(&config.camera, viewport.aspect());

        let lights = &config.lights;
        let point_light = PointLight {
            color: ColorTriplet::WHITE,
            intensity: lights.point_intensity,
            distance: lights.point_distance,
            decay: lights.point_decay,
            position: lights.point_start,
            helper_size: lights.helper_size,
        };
        let ambient_light = AmbientLight {
            color: ColorTriplet::WHITE,
            intensity: lights.ambient_intensity,
        };
        let directional_light = DirectionalLight {
            color: ColorTriplet::WHITE,
            intensity: transition.current_intensity(),
            position: lights.directional_position,
            target: Vec3::ZERO,
        };

        let plane = &config.plane;
        let mut geometry = PlaneGeometry::new(
            plane.width,
            plane.height,
            plane.width_segments,
            plane.height_segments,
        );
        geometry.perturb(rng, plane.displacement);
        let colors = VertexColorBuffer::uniform(geometry.vertex_count(), transition.current_color());
        let material = PhongMaterial {
            vertex_colors: true,
            flat_shading: true,
            double_sided: true,
            shininess: plane.shininess,
            specular: hex_to_rgb(&plane.specular),
        };
        let mut mesh = Mesh::new(geometry, colors, material);
        mesh.rotation.x = plane.tilt;

        let mut renderer = RendererSettings {
            size: RenderSize {
                width,
                height,
                pixel_ratio: 1.0,
            },
            max_pixel_ratio: config.renderer.max_pixel_ratio,
            clear_color: hex_to_rgb(&config.renderer.clear_color),
        };
        renderer.set_pixel_ratio(viewport.device_pixel_ratio());

        let composer = ComposerSettings {
            size: renderer.size,
            passes: vec![ComposerPass::Render, ComposerPass::Bloom(config.bloom)],
        };

        info!(
            "Built backdrop scene: {} vertices, {} triangles, {}x{} @ {:.2}x",
            mesh.geometry.vertex_count(),
            mesh.geometry.triangle_count(),
            width,
            height,
            renderer.size.pixel_ratio
        );

        SceneGraph {
            camera,
            controls,
            point_light,
            directional_light,
            ambient_light,
            mesh,
            renderer,
            composer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use crate::viewport::StaticViewport;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn build(viewport: StaticViewport, theme: Theme) -> SceneGraph {
        let config = SceneConfig::default();
        let transition = ThemeTransition::for_theme(theme, 0.05);
        SceneBuilder::new(&config).build(&viewport, &transition, &mut ChaCha8Rng::seed_from_u64(1))
    }

    #[test]
    fn camera_matches_viewport() {
        let scene = build(StaticViewport::new(1600, 900), Theme::Dark);
        assert_eq!(scene.camera.fov_degrees, 75.0);
        assert_eq!(scene.camera.near, 0.1);
        assert_eq!(scene.camera.far, 1000.0);
        assert!((scene.camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        assert!(!scene.controls.enable_rotate && !scene.controls.enable_zoom);
        assert!(!scene.controls.enable_pan && scene.controls.enable_damping);
    }

    #[test]
    fn mesh_is_tinted_and_tilted() {
        let scene = build(StaticViewport::new(800, 600), Theme::Light);
        let tint = Theme::Light.base_color();
        assert!(scene.mesh.colors.colors().iter().all(|c| *c == tint));
        assert_eq!(scene.mesh.colors.len(), scene.mesh.geometry.vertex_count());
        assert_eq!(scene.mesh.rotation, Vec3::new(-0.2, 0.0, 0.0));
        assert!(scene.mesh.material.flat_shading && scene.mesh.material.double_sided);
        assert_eq!(scene.mesh.material.shininess, 100.0);
        assert_eq!(scene.directional_light.intensity, 2.0);
        assert_eq!(scene.ambient_light.intensity, 0.4);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        let scene = build(StaticViewport::new(1000, 500).with_pixel_ratio(3.0), Theme::Dark);
        assert_eq!(scene.renderer.size.pixel_ratio, 1.5);
        assert_eq!(scene.renderer.size.drawing_buffer(), (1500, 750));

        let scene = build(StaticViewport::new(1000, 500).with_pixel_ratio(1.25), Theme::Dark);
        assert_eq!(scene.renderer.size.pixel_ratio, 1.25);
    }

    #[test]
    fn composer_ends_with_bloom() {
        let scene = build(StaticViewport::new(800, 600), Theme::Dark);
        assert_eq!(scene.composer.passes[0], ComposerPass::Render);
        let bloom = scene.composer.bloom().expect("bloom pass");
        assert_eq!((bloom.strength, bloom.radius, bloom.threshold), (0.25, 0.15, 0.1));
        assert_eq!(scene.composer.size, scene.renderer.size);
    }
}
