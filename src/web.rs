//! Browser entry points exported through `wasm-bindgen`.

#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::dpi::LogicalSize;
use winit::event_loop::{EventLoop, EventLoopProxy};
use winit::platform::web::{EventLoopExtWebSys, WindowAttributesExtWebSys};
use winit::window::Window;

use crate::app::{attach_window, BackdropApp, BackdropEvent};
use crate::config::SceneConfig;
use crate::platform::{Browser, PlatformCheck};
use crate::storage::LocalStorageStore;
use crate::theme::{Theme, ThemeSelection, ThemeService};
use crate::viewport::WindowViewport;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Controls a mounted backdrop from page script.
#[wasm_bindgen]
pub struct BackdropHandle {
    proxy: Option<EventLoopProxy<BackdropEvent>>,
    selection: ThemeSelection,
}

#[wasm_bindgen]
impl BackdropHandle {
    /// Whether a scene is actually rendering behind this handle.
    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.proxy.is_some()
    }

    /// Last applied theme, `"dark"` or `"light"`.
    #[wasm_bindgen(getter)]
    pub fn theme(&self) -> String {
        self.selection.theme().to_string()
    }

    /// Applies a page-driven theme without touching the stored choice.
    #[wasm_bindgen(js_name = setDarkMode)]
    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        let theme = Theme::from_dark_mode(dark_mode);
        self.selection.apply(theme);
        mark_document(theme);
        self.send(BackdropEvent::DarkModeChanged(dark_mode));
    }

    /// Flips, persists and applies the theme. Returns the new one.
    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&mut self) -> String {
        let theme = self.selection.toggle();
        mark_document(theme);
        self.send(BackdropEvent::DarkModeChanged(theme.is_dark()));
        theme.to_string()
    }

    /// Stops the animation and releases the scene.
    pub fn teardown(&mut self) {
        self.send(BackdropEvent::Teardown);
        self.proxy = None;
    }
}

impl BackdropHandle {
    fn send(&self, event: BackdropEvent) {
        if let Some(proxy) = self.proxy.as_ref() {
            if proxy.send_event(event).is_err() {
                warn!("Backdrop event loop already closed");
            }
        }
    }
}

/// Mounts the backdrop on the canvas with id `canvas_id`.
///
/// `config` is an optional RON document; empty means defaults. Outside a
/// browser document the returned handle is inert.
#[wasm_bindgen(js_name = startBackdrop)]
pub async fn start_backdrop(
    canvas_id: String,
    config: Option<String>,
) -> Result<BackdropHandle, JsValue> {
    let config = match config.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => SceneConfig::from_ron(text).map_err(to_js)?,
        _ => SceneConfig::default(),
    };

    let themes = ThemeService::new(Arc::new(LocalStorageStore), prefers_dark());
    if !Browser.is_render_capable() {
        info!("No document available, backdrop not mounted");
        return Ok(BackdropHandle {
            proxy: None,
            selection: ThemeSelection::resolved(themes),
        });
    }

    let selection = ThemeSelection::new(themes);
    let theme = selection.theme();
    mark_document(theme);

    let canvas = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(&canvas_id))
        .ok_or_else(|| JsValue::from_str(&format!("canvas #{canvas_id} not found")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;
    let width = canvas.client_width().max(1) as f64;
    let height = canvas.client_height().max(1) as f64;

    let event_loop = EventLoop::<BackdropEvent>::with_user_event()
        .build()
        .map_err(to_js)?;
    #[allow(deprecated)]
    let window = Arc::new(
        event_loop
            .create_window(
                Window::default_attributes()
                    .with_canvas(Some(canvas))
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .map_err(to_js)?,
    );

    let viewport = Arc::new(WindowViewport::new(1, 1, 1.0));
    let attached = attach_window(window, config.clone(), theme, &viewport, &Browser)
        .await
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))?;

    let proxy = event_loop.create_proxy();
    let app_themes = ThemeService::new(Arc::new(LocalStorageStore), prefers_dark());
    let app = BackdropApp::with_attached(config, Some(app_themes), Browser, viewport, attached);
    event_loop.spawn_app(app);

    Ok(BackdropHandle {
        proxy: Some(proxy),
        selection,
    })
}

/// `prefers-color-scheme`, when the browser reports one.
fn prefers_dark() -> Option<Theme> {
    let query = web_sys::window()?
        .match_media("(prefers-color-scheme: dark)")
        .ok()??;
    Some(Theme::from_dark_mode(query.matches()))
}

/// Sets `data-theme` on the root element so page styles follow the backdrop.
fn mark_document(theme: Theme) {
    let root = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.document_element());
    if let Some(root) = root {
        if let Err(err) = root.set_attribute("data-theme", theme.as_str()) {
            warn!("Could not mark document theme: {err:?}");
        }
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
