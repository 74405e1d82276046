use glam::Vec3;
use log::trace;
use parking_lot::RwLock;

use crate::config::{AnimationConfig, LightsConfig};
use crate::interaction::InteractionTracker;
use crate::scene::SceneGraph;
use crate::theme::ThemeTransition;

/// Source of wall-clock seconds for the light orbit.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_secs(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default()
    }

    #[cfg(target_arch = "wasm32")]
    fn now_secs(&self) -> f64 {
        js_sys::Date::now() * 0.001
    }
}

/// Clock that only moves when told to. Used by the headless runner and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: RwLock<f64>,
}

impl ManualClock {
    pub fn new(secs: f64) -> Self {
        Self {
            secs: RwLock::new(secs),
        }
    }

    pub fn advance(&self, delta: f64) {
        *self.secs.write() += delta;
    }

    pub fn set(&self, secs: f64) {
        *self.secs.write() = secs;
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        *self.secs.read()
    }
}

/// Anything that can draw the scene through the post-processing chain.
pub trait Compositor {
    type Error;

    /// Renders one frame. Implementations consume pending vertex-color uploads.
    fn render(&mut self, scene: &mut SceneGraph) -> Result<(), Self::Error>;
}

/// Trajectory of the moving point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightOrbit {
    pub radius: f32,
    pub height: f32,
    pub bob: f32,
}

impl From<&LightsConfig> for LightOrbit {
    fn from(lights: &LightsConfig) -> Self {
        Self {
            radius: lights.orbit_radius,
            height: lights.orbit_height,
            bob: lights.orbit_bob,
        }
    }
}

/// Position of the point light at wall-clock second `t`.
///
/// The trigonometry runs in `f64`; epoch seconds lose all sub-second
/// precision in `f32`.
pub fn moving_light_position(t: f64, orbit: &LightOrbit) -> Vec3 {
    Vec3::new(
        (t.sin() * f64::from(orbit.radius)) as f32,
        (f64::from(orbit.height) + (t * 0.5).sin() * f64::from(orbit.bob)) as f32,
        (t.cos() * f64::from(orbit.radius)) as f32,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// Per-frame driver of the backdrop.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
    orbit: LightOrbit,
    spin_per_frame: f32,
}

impl RenderLoop {
    pub fn new(lights: &LightsConfig, animation: &AnimationConfig) -> Self {
        Self {
            state: LoopState::Stopped,
            frames: 0,
            orbit: LightOrbit::from(lights),
            spin_per_frame: animation.spin_per_frame,
        }
    }

    pub fn start(&mut self) {
        self.state = LoopState::Running;
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Runs one tick. Returns `Ok(false)` without touching anything when stopped.
    pub fn frame<C: Compositor + ?Sized>(
        &mut self,
        scene: &mut SceneGraph,
        transition: &mut ThemeTransition,
        tracker: &mut InteractionTracker,
        now_secs: f64,
        compositor: &mut C,
    ) -> Result<bool, C::Error> {
        if !self.is_running() {
            return Ok(false);
        }

        transition.tick();
        scene.mesh.colors.fill(transition.current_color());
        scene.directional_light.intensity = transition.current_intensity();
        scene.point_light.position = moving_light_position(now_secs, &self.orbit);
        scene.mesh.rotation.z += self.spin_per_frame;

        scene.controls.update(&mut scene.camera);
        tracker.update_hit(&scene.camera, &scene.mesh);
        tracker.clear_dirty();

        compositor.render(scene)?;
        self.frames += 1;
        trace!(
            "frame {} light={:?} intensity={:.3}",
            self.frames,
            scene.point_light.position,
            scene.directional_light.intensity
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::SceneBuilder;
    use crate::theme::Theme;
    use crate::viewport::StaticViewport;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    #[derive(Default)]
    struct RecordingCompositor {
        frames: usize,
        uploads: usize,
    }

    impl Compositor for RecordingCompositor {
        type Error = std::convert::Infallible;

        fn render(&mut self, scene: &mut SceneGraph) -> Result<(), Self::Error> {
            self.frames += 1;
            if scene.mesh.colors.take_update() {
                self.uploads += 1;
            }
            Ok(())
        }
    }

    struct Fixture {
        scene: SceneGraph,
        transition: ThemeTransition,
        tracker: InteractionTracker,
        render_loop: RenderLoop,
    }

    fn fixture() -> Fixture {
        let config = SceneConfig::default();
        let transition = ThemeTransition::for_theme(Theme::Dark, 0.05);
        let scene = SceneBuilder::new(&config).build(
            &StaticViewport::new(800, 600),
            &transition,
            &mut ChaCha8Rng::seed_from_u64(3),
        );
        Fixture {
            scene,
            transition,
            tracker: InteractionTracker::new(),
            render_loop: RenderLoop::new(&config.lights, &config.animation),
        }
    }

    impl Fixture {
        fn tick(&mut self, now: f64, compositor: &mut RecordingCompositor) -> bool {
            self.render_loop
                .frame(
                    &mut self.scene,
                    &mut self.transition,
                    &mut self.tracker,
                    now,
                    compositor,
                )
                .unwrap()
        }
    }

    #[test]
    fn orbit_at_known_times() {
        let orbit = LightOrbit::from(&LightsConfig::default());
        let start = moving_light_position(0.0, &orbit);
        assert!(start.abs_diff_eq(Vec3::new(0.0, 5.0, 35.0), 1e-5));

        let half = moving_light_position(PI, &orbit);
        assert!(half.abs_diff_eq(Vec3::new(0.0, 8.0, -35.0), 1e-4), "{half:?}");
    }

    #[test]
    fn stopped_loop_is_inert() {
        let mut fx = fixture();
        let before = fx.scene.clone();
        let mut compositor = RecordingCompositor::default();
        assert!(!fx.tick(1.0, &mut compositor));
        assert_eq!(compositor.frames, 0);
        assert_eq!(fx.scene.mesh, before.mesh);
        assert_eq!(fx.render_loop.frame_count(), 0);
    }

    #[test]
    fn spin_accumulates_per_frame() {
        let mut fx = fixture();
        let mut compositor = RecordingCompositor::default();
        fx.render_loop.start();
        for i in 0..1000 {
            assert!(fx.tick(i as f64 / 60.0, &mut compositor));
        }
        assert!((fx.scene.mesh.rotation.z - 0.5).abs() < 1e-4);
        assert_eq!(fx.scene.mesh.rotation.x, -0.2);
        assert_eq!(fx.render_loop.frame_count(), 1000);
        assert_eq!(compositor.frames, 1000);
        assert_eq!(compositor.uploads, 1000);
    }

    #[test]
    fn frame_applies_transition_to_scene() {
        let mut fx = fixture();
        let mut compositor = RecordingCompositor::default();
        fx.render_loop.start();
        fx.transition
            .set_target(Theme::Light.base_color(), Theme::Light.directional_intensity());

        fx.tick(PI, &mut compositor);
        let tint = fx.transition.current_color();
        assert!(fx.scene.mesh.colors.colors().iter().all(|c| *c == tint));
        assert!((fx.scene.directional_light.intensity - 1.05).abs() < 1e-6);
        assert!(fx.scene.point_light.position.abs_diff_eq(Vec3::new(0.0, 8.0, -35.0), 1e-4));
        assert!(!fx.tracker.is_dirty());
    }

    #[test]
    fn stop_after_start_halts_frames() {
        let mut fx = fixture();
        let mut compositor = RecordingCompositor::default();
        fx.render_loop.start();
        fx.tick(0.0, &mut compositor);
        fx.render_loop.stop();
        fx.tick(1.0, &mut compositor);
        assert_eq!(fx.render_loop.state(), LoopState::Stopped);
        assert_eq!(compositor.frames, 1);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(10.0);
        clock.advance(0.5);
        assert_eq!(clock.now_secs(), 10.5);
        clock.set(1.0);
        assert_eq!(clock.now_secs(), 1.0);
    }
}
