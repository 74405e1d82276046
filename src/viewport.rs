use std::sync::Arc;

use parking_lot::RwLock;

/// Provides the logical viewport size and the device pixel ratio.
pub trait Viewport: Send + Sync {
    /// Width and height in logical (CSS) pixels.
    fn size(&self) -> (u32, u32);

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Width divided by height; 1.0 for a degenerate viewport.
    fn aspect(&self) -> f32 {
        let (width, height) = self.size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

/// Viewport that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub const fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

impl Viewport for StaticViewport {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}

/// Viewport tracking a live window, updated from resize notifications.
#[derive(Debug)]
pub struct WindowViewport {
    size: RwLock<(u32, u32)>,
    pixel_ratio: RwLock<f64>,
}

impl WindowViewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
            pixel_ratio: RwLock::new(pixel_ratio),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }

    pub fn set_pixel_ratio(&self, pixel_ratio: f64) {
        *self.pixel_ratio.write() = pixel_ratio;
    }
}

impl Viewport for WindowViewport {
    fn size(&self) -> (u32, u32) {
        *self.size.read()
    }

    fn device_pixel_ratio(&self) -> f64 {
        *self.pixel_ratio.read()
    }
}

impl<T> Viewport for Arc<T>
where
    T: Viewport + ?Sized,
{
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        (**self).device_pixel_ratio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_viewport_clamps_zero_sizes() {
        let viewport = WindowViewport::new(800, 600, 2.0);
        viewport.update(0, 0);
        assert_eq!(viewport.size(), (1, 1));
        viewport.update(1024, 512);
        assert_eq!(viewport.aspect(), 2.0);
    }

    #[test]
    fn shared_viewport_forwards() {
        let viewport: Arc<dyn Viewport> = Arc::new(StaticViewport::new(640, 480).with_pixel_ratio(3.0));
        assert_eq!(viewport.size(), (640, 480));
        assert_eq!(viewport.device_pixel_ratio(), 3.0);
    }
}
