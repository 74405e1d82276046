//! Window host: wires winit events into a [`Backdrop`] and its [`Renderer`].

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::backdrop::Backdrop;
use crate::config::SceneConfig;
use crate::error::BackdropError;
use crate::platform::PlatformCheck;
use crate::render::{Renderer, SurfaceAction};
use crate::render_loop::{Clock, SystemClock};
use crate::theme::{Theme, ThemeService};
use crate::viewport::{Viewport, WindowViewport};

/// Notifications delivered to the event loop from outside winit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackdropEvent {
    /// The page or user switched color scheme.
    DarkModeChanged(bool),
    /// The host is going away; release the scene and stop.
    Teardown,
}

/// A backdrop bound to a live window.
pub struct Attached {
    pub backdrop: Backdrop,
    pub renderer: Renderer,
}

/// Builds the backdrop for `window` and the GPU renderer that draws it.
pub async fn attach_window(
    window: Arc<Window>,
    config: SceneConfig,
    theme: Theme,
    viewport: &WindowViewport,
    platform: &dyn PlatformCheck,
) -> Result<Attached> {
    sync_viewport(&window, viewport);
    let backdrop = Backdrop::attach(platform, viewport, theme.is_dark(), config)?;
    let scene = backdrop
        .scene()
        .context("backdrop attached without a scene")?;
    let renderer = Renderer::new(Arc::clone(&window), scene)
        .await
        .map_err(|err| BackdropError::HostInit {
            stage: "renderer",
            message: format!("{err:#}"),
        })?;
    Ok(Attached { backdrop, renderer })
}

/// Copies the window's logical size and scale factor into `viewport`.
fn sync_viewport(window: &Window, viewport: &WindowViewport) -> (u32, u32) {
    let scale = window.scale_factor();
    let logical = window.inner_size().to_logical::<u32>(scale);
    viewport.update(logical.width, logical.height);
    viewport.set_pixel_ratio(scale);
    viewport.size()
}

/// winit application driving one backdrop.
pub struct BackdropApp<P: PlatformCheck> {
    config: SceneConfig,
    themes: Option<ThemeService>,
    platform: P,
    theme_override: Option<Theme>,
    clock: SystemClock,
    viewport: Arc<WindowViewport>,
    state: Option<Attached>,
    torn_down: bool,
    error: Option<anyhow::Error>,
}

impl<P: PlatformCheck> BackdropApp<P> {
    pub fn new(config: SceneConfig, themes: Option<ThemeService>, platform: P) -> Self {
        Self {
            config,
            themes,
            platform,
            theme_override: None,
            clock: SystemClock,
            viewport: Arc::new(WindowViewport::new(1, 1, 1.0)),
            state: None,
            torn_down: false,
            error: None,
        }
    }

    /// Host whose window and renderer were prepared before the loop started.
    pub fn with_attached(
        config: SceneConfig,
        themes: Option<ThemeService>,
        platform: P,
        viewport: Arc<WindowViewport>,
        attached: Attached,
    ) -> Self {
        Self {
            viewport,
            state: Some(attached),
            ..Self::new(config, themes, platform)
        }
    }

    /// Starts on `theme` instead of the stored or system preference.
    /// The override is not written to the theme store.
    pub fn with_theme(mut self, theme: Option<Theme>) -> Self {
        self.theme_override = theme;
        self
    }

    /// The theme the window opens with.
    fn initial_theme(&self) -> Theme {
        self.theme_override.unwrap_or_else(|| self.current_theme())
    }

    /// The error that ended the loop, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn current_theme(&self) -> Theme {
        self.themes
            .as_ref()
            .map(ThemeService::current_theme)
            .unwrap_or(Theme::Light)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.error = Some(err);
        self.shutdown();
        event_loop.exit();
    }

    /// Tears the backdrop down and releases the GPU renderer with it.
    fn shutdown(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.backdrop.teardown();
        }
        self.torn_down = true;
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let (width, height) = sync_viewport(state.renderer.window(), &self.viewport);
        let outcome = state
            .backdrop
            .on_resize(width, height, self.viewport.device_pixel_ratio());
        if let Some(buffer) = outcome.drawing_buffer() {
            state.renderer.resize(size, buffer);
        }
    }

    fn apply_theme(&mut self, theme: Theme) {
        if let Some(state) = self.state.as_mut() {
            state.backdrop.on_dark_mode_change(theme.is_dark());
        }
    }

    fn toggle_theme(&mut self) {
        let theme = self
            .state
            .as_ref()
            .map(|state| state.backdrop.theme())
            .unwrap_or_else(|| self.current_theme())
            .toggled();
        if let Some(themes) = self.themes.as_ref() {
            themes.set_theme(theme);
        }
        info!("Switched to {theme} theme");
        self.apply_theme(theme);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => {
                self.shutdown();
                event_loop.exit();
            }
            Key::Character(text) if text.eq_ignore_ascii_case("t") => self.toggle_theme(),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.now_secs();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Err(err) = state.backdrop.frame(now, &mut state.renderer) else {
            return;
        };
        match state.renderer.handle_surface_error(&err) {
            SurfaceAction::Reconfigured => debug!("Surface reconfigured after {err}"),
            SurfaceAction::SkipFrame => {}
            SurfaceAction::Fatal => self.fail(event_loop, BackdropError::OutOfMemory.into()),
        }
    }
}

impl<P: PlatformCheck> ApplicationHandler<BackdropEvent> for BackdropApp<P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if self.state.is_some() || self.torn_down {
            return;
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let attributes = Window::default_attributes()
                .with_title("Backdrop")
                .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
            let window = match event_loop.create_window(attributes) {
                Ok(window) => Arc::new(window),
                Err(err) => {
                    let err = BackdropError::HostInit {
                        stage: "window",
                        message: err.to_string(),
                    };
                    self.fail(event_loop, err.into());
                    return;
                }
            };
            if let Some(themes) = self.themes.as_mut() {
                let system = window.theme().map(|theme| theme == winit::window::Theme::Dark);
                themes.set_system_preference(system.map(Theme::from_dark_mode));
            }
            let theme = self.initial_theme();
            let attached = pollster::block_on(attach_window(
                window,
                self.config.clone(),
                theme,
                &self.viewport,
                &self.platform,
            ));
            match attached {
                Ok(attached) => self.state = Some(attached),
                Err(err) => self.fail(event_loop, err),
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: BackdropEvent) {
        match event {
            BackdropEvent::DarkModeChanged(dark) => {
                self.apply_theme(Theme::from_dark_mode(dark));
            }
            BackdropEvent::Teardown => {
                self.shutdown();
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let matches = self
            .state
            .as_ref()
            .is_some_and(|state| state.renderer.window_id() == window_id);
        if !matches {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.state.as_ref().map(|s| s.renderer.window().inner_size()) {
                    self.resize(size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(self.viewport.device_pixel_ratio());
                if let Some(state) = self.state.as_mut() {
                    state
                        .backdrop
                        .on_pointer_move(logical.x, logical.y, self.viewport.as_ref());
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::ThemeChanged(system) => {
                let preference = Theme::from_dark_mode(system == winit::window::Theme::Dark);
                let theme = match self.themes.as_mut() {
                    Some(themes) => {
                        themes.set_system_preference(Some(preference));
                        themes.current_theme()
                    }
                    None => preference,
                };
                self.apply_theme(theme);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            if state.backdrop.is_attached() {
                state.renderer.window().request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
