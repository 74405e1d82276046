//! Animated 3D page backdrop.
//!
//! A randomly perturbed, flat-shaded plane slowly spins under an orbiting
//! point light. The frame goes through a bloom pass before it reaches the
//! screen, and switching between the dark and light page themes fades the
//! plane tint and light intensity instead of snapping them.
//!
//! [`Backdrop`] owns the CPU-side scene and advances it one frame at a time
//! through any [`Compositor`]. [`Renderer`] is the wgpu compositor used by
//! the desktop binary and the browser build; [`HeadlessRun`] drives the same
//! scene without a display.

pub mod app;
pub mod backdrop;
pub mod camera;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod headless;
pub mod interaction;
pub mod mesh;
pub mod platform;
pub mod render;
pub mod render_loop;
pub mod resize;
pub mod scene;
pub mod storage;
pub mod theme;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{attach_window, BackdropApp, BackdropEvent};
pub use backdrop::Backdrop;
pub use cli::CliArgs;
pub use color::{hex_to_rgb, ColorTriplet};
pub use config::SceneConfig;
pub use error::{BackdropError, ConfigError};
pub use headless::{HeadlessRun, NullCompositor, Summary};
#[cfg(not(target_arch = "wasm32"))]
pub use platform::Desktop;
pub use platform::{Headless, PlatformCheck, Simulated};
pub use render::{Renderer, SurfaceAction};
pub use render_loop::{
    moving_light_position, Clock, Compositor, ManualClock, RenderLoop, SystemClock,
};
pub use resize::{handle_resize, ResizeOutcome};
pub use scene::{SceneBuilder, SceneGraph};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
pub use storage::{MemoryStore, StorageError, ThemeStore};
pub use theme::{Theme, ThemeSelection, ThemeService, ThemeTransition};
pub use viewport::{StaticViewport, Viewport, WindowViewport};
