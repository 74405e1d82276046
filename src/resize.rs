use log::debug;

use crate::scene::SceneGraph;

/// Outcome of a resize notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Scene updated; the GPU targets should be reallocated to this drawing-buffer size.
    Resized { width: u32, height: u32 },
    /// Zero-sized viewport (minimized window, hidden canvas); nothing changed.
    Ignored,
}

impl ResizeOutcome {
    pub fn drawing_buffer(self) -> Option<(u32, u32)> {
        match self {
            Self::Resized { width, height } => Some((width, height)),
            Self::Ignored => None,
        }
    }
}

/// Applies a viewport resize to the camera, renderer and composer.
///
/// `width`/`height` are logical pixels; `device_pixel_ratio` is capped by the
/// renderer settings before it is stored.
pub fn handle_resize(
    scene: &mut SceneGraph,
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
) -> ResizeOutcome {
    if width == 0 || height == 0 {
        debug!("Ignoring resize to {width}x{height}");
        return ResizeOutcome::Ignored;
    }

    scene.camera.aspect = width as f32 / height as f32;
    scene.camera.update_projection_matrix();

    scene.renderer.set_pixel_ratio(device_pixel_ratio);
    scene.renderer.set_size(width, height);
    scene.composer.size = scene.renderer.size;

    let (buffer_width, buffer_height) = scene.renderer.size.drawing_buffer();
    debug!(
        "Resized backdrop to {width}x{height} (buffer {buffer_width}x{buffer_height}, ratio {:.2})",
        scene.renderer.size.pixel_ratio
    );
    ResizeOutcome::Resized {
        width: buffer_width,
        height: buffer_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::SceneBuilder;
    use crate::theme::{Theme, ThemeTransition};
    use crate::viewport::StaticViewport;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scene() -> SceneGraph {
        let config = SceneConfig::default();
        SceneBuilder::new(&config).build(
            &StaticViewport::new(800, 600),
            &ThemeTransition::for_theme(Theme::Dark, 0.05),
            &mut ChaCha8Rng::seed_from_u64(5),
        )
    }

    #[test]
    fn resize_updates_camera_and_targets() {
        let mut scene = scene();
        let before = scene.camera.projection();
        let outcome = handle_resize(&mut scene, 1920, 1080, 1.0);

        assert_eq!(outcome, ResizeOutcome::Resized { width: 1920, height: 1080 });
        assert!((scene.camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_ne!(scene.camera.projection(), before);
        assert_eq!((scene.renderer.size.width, scene.renderer.size.height), (1920, 1080));
        assert_eq!((scene.composer.size.width, scene.composer.size.height), (1920, 1080));
    }

    #[test]
    fn resize_keeps_pixel_ratio_cap() {
        let mut scene = scene();
        let outcome = handle_resize(&mut scene, 1000, 400, 2.0);
        assert_eq!(outcome, ResizeOutcome::Resized { width: 1500, height: 600 });
        assert_eq!(scene.composer.size.pixel_ratio, 1.5);
    }

    #[test]
    fn zero_sized_viewport_is_ignored() {
        let mut scene = scene();
        let aspect = scene.camera.aspect;
        assert_eq!(handle_resize(&mut scene, 0, 600, 1.0), ResizeOutcome::Ignored);
        assert_eq!(scene.camera.aspect, aspect);
        assert_eq!(scene.renderer.size.width, 800);
    }
}
