use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SceneConfig;
use crate::error::BackdropError;
use crate::interaction::InteractionTracker;
use crate::platform::PlatformCheck;
use crate::render_loop::{Compositor, RenderLoop};
use crate::resize::{handle_resize, ResizeOutcome};
use crate::scene::{SceneBuilder, SceneGraph};
use crate::theme::{Theme, ThemeTransition};
use crate::viewport::Viewport;

/// The rendering component: owns the scene graph, the theme transition,
/// the pointer tracker and the render loop for one mount.
///
/// Created by [`Backdrop::attach`], released by [`Backdrop::teardown`].
#[derive(Debug)]
pub struct Backdrop {
    config: SceneConfig,
    theme: Theme,
    scene: Option<SceneGraph>,
    transition: ThemeTransition,
    tracker: InteractionTracker,
    render_loop: RenderLoop,
}

impl Backdrop {
    /// Builds the scene and starts the loop.
    ///
    /// The vertex perturbation is seeded from `config.seed` when set and from
    /// the thread-local generator otherwise.
    pub fn attach(
        platform: &dyn PlatformCheck,
        viewport: &dyn Viewport,
        dark_mode: bool,
        config: SceneConfig,
    ) -> Result<Self, BackdropError> {
        let seed = perturbation_seed(config.seed);
        debug!("Perturbation seed: {seed}");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::attach_with_rng(platform, viewport, dark_mode, config, &mut rng)
    }

    pub fn attach_with_rng<R: Rng>(
        platform: &dyn PlatformCheck,
        viewport: &dyn Viewport,
        dark_mode: bool,
        config: SceneConfig,
        rng: &mut R,
    ) -> Result<Self, BackdropError> {
        if !platform.is_render_capable() {
            info!("No rendering surface available, skipping backdrop");
            return Err(BackdropError::EnvironmentUnavailable);
        }

        let theme = Theme::from_dark_mode(dark_mode);
        let (color, intensity) = config.theme.palette(theme);
        let transition = ThemeTransition::new(color, intensity, config.theme.smoothing);
        let scene = SceneBuilder::new(&config).build(viewport, &transition, rng);
        let mut render_loop = RenderLoop::new(&config.lights, &config.animation);
        render_loop.start();
        info!("Backdrop attached with {theme} theme");

        Ok(Self {
            config,
            theme,
            scene: Some(scene),
            transition,
            tracker: InteractionTracker::new(),
            render_loop,
        })
    }

    /// Retargets the tint and directional intensity; the render loop fades toward them.
    pub fn on_dark_mode_change(&mut self, dark_mode: bool) {
        let theme = Theme::from_dark_mode(dark_mode);
        let (color, intensity) = self.config.theme.palette(theme);
        self.transition.set_target(color, intensity);
        if theme != self.theme {
            debug!("Theme target changed to {theme}");
        }
        self.theme = theme;
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64, viewport: &dyn Viewport) {
        self.tracker.on_pointer_move(x, y, viewport);
    }

    pub fn on_resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> ResizeOutcome {
        match self.scene.as_mut() {
            Some(scene) => handle_resize(scene, width, height, device_pixel_ratio),
            None => ResizeOutcome::Ignored,
        }
    }

    /// Runs one tick of the render loop. `Ok(false)` once torn down.
    pub fn frame<C: Compositor + ?Sized>(
        &mut self,
        now_secs: f64,
        compositor: &mut C,
    ) -> Result<bool, C::Error> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        self.render_loop.frame(
            scene,
            &mut self.transition,
            &mut self.tracker,
            now_secs,
            compositor,
        )
    }

    /// Stops the loop and releases the scene graph.
    pub fn teardown(&mut self) {
        if self.scene.take().is_some() {
            info!(
                "Backdrop torn down after {} frames",
                self.render_loop.frame_count()
            );
        }
        self.render_loop.stop();
    }

    pub fn is_attached(&self) -> bool {
        self.scene.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn transition(&self) -> &ThemeTransition {
        &self.transition
    }

    pub fn tracker(&self) -> &InteractionTracker {
        &self.tracker
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }
}

/// The configured seed, or a fresh one from the thread-local generator.
pub fn perturbation_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| rand::rng().random())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Headless, Simulated};
    use crate::render_loop::LoopState;
    use crate::viewport::StaticViewport;

    struct CountingCompositor(usize);

    impl Compositor for CountingCompositor {
        type Error = std::convert::Infallible;

        fn render(&mut self, _scene: &mut SceneGraph) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }
    }

    fn attach(dark_mode: bool) -> Backdrop {
        let config = SceneConfig {
            seed: Some(11),
            ..SceneConfig::default()
        };
        Backdrop::attach(&Simulated, &StaticViewport::new(800, 600), dark_mode, config).unwrap()
    }

    #[test]
    fn headless_environment_skips_construction() {
        let result = Backdrop::attach(
            &Headless,
            &StaticViewport::new(800, 600),
            true,
            SceneConfig::default(),
        );
        assert!(matches!(result, Err(BackdropError::EnvironmentUnavailable)));
    }

    #[test]
    fn attach_starts_running_at_initial_theme() {
        let backdrop = attach(true);
        assert!(backdrop.is_attached());
        assert_eq!(backdrop.render_loop().state(), LoopState::Running);
        assert_eq!(backdrop.transition().current_color(), Theme::Dark.base_color());
        assert_eq!(backdrop.transition().current_intensity(), 1.0);
        assert!(backdrop.tracker().is_dirty());
    }

    #[test]
    fn seeded_attach_is_reproducible() {
        let first = attach(false);
        let second = attach(false);
        assert_eq!(
            first.scene().unwrap().mesh.geometry,
            second.scene().unwrap().mesh.geometry
        );
    }

    #[test]
    fn dark_mode_change_fades_instead_of_jumping() {
        let mut backdrop = attach(true);
        let mut compositor = CountingCompositor(0);
        backdrop.on_dark_mode_change(false);
        assert_eq!(backdrop.theme(), Theme::Light);
        assert_eq!(backdrop.transition().current_color(), Theme::Dark.base_color());

        backdrop.frame(0.0, &mut compositor).unwrap();
        let intensity = backdrop.scene().unwrap().directional_light.intensity;
        assert!(intensity > 1.0 && intensity < 2.0);
    }

    #[test]
    fn pointer_and_resize_reach_the_scene() {
        let mut backdrop = attach(true);
        let viewport = StaticViewport::new(800, 600);
        backdrop.on_pointer_move(400.0, 300.0, &viewport);
        assert_eq!(backdrop.tracker().pointer(), glam::Vec2::ZERO);

        backdrop.on_resize(1200, 600, 1.0);
        let scene = backdrop.scene().unwrap();
        assert!((scene.camera.aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn teardown_releases_scene_and_stops() {
        let mut backdrop = attach(true);
        let mut compositor = CountingCompositor(0);
        assert!(backdrop.frame(0.0, &mut compositor).unwrap());
        backdrop.teardown();

        assert!(!backdrop.is_attached());
        assert!(!backdrop.render_loop().is_running());
        assert!(!backdrop.frame(1.0, &mut compositor).unwrap());
        assert_eq!(backdrop.on_resize(640, 480, 1.0), ResizeOutcome::Ignored);
        assert_eq!(compositor.0, 1);
    }

    #[test]
    fn configured_seed_is_kept() {
        assert_eq!(perturbation_seed(Some(42)), 42);
    }

    #[test]
    fn unseeded_mounts_draw_different_surfaces() {
        let first = perturbation_seed(None);
        let second = perturbation_seed(None);
        assert_ne!(first, second);

        let config = SceneConfig::default();
        let viewport = StaticViewport::new(800, 600);
        let a = Backdrop::attach(&Simulated, &viewport, true, config.clone()).unwrap();
        let b = Backdrop::attach(&Simulated, &viewport, true, config).unwrap();
        assert_ne!(
            a.scene().unwrap().mesh.geometry.positions(),
            b.scene().unwrap().mesh.geometry.positions()
        );
    }
}
