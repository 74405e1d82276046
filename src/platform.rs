/// Answers whether the current environment can host a rendering surface.
///
/// Hosts check this before building the scene; when it returns `false` the
/// scene is never constructed.
pub trait PlatformCheck {
    fn is_render_capable(&self) -> bool;
}

/// Environment without any display, e.g. CI or a server-side pre-render.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl PlatformCheck for Headless {
    fn is_render_capable(&self) -> bool {
        false
    }
}

/// CPU-only host that drives the scene without presenting it, used for
/// summaries and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simulated;

impl PlatformCheck for Simulated {
    fn is_render_capable(&self) -> bool {
        true
    }
}

/// Desktop session; on Linux a display server must be advertised.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Desktop;

#[cfg(not(target_arch = "wasm32"))]
impl PlatformCheck for Desktop {
    fn is_render_capable(&self) -> bool {
        if cfg!(any(target_os = "linux", target_os = "freebsd", target_os = "openbsd")) {
            ["DISPLAY", "WAYLAND_DISPLAY"]
                .iter()
                .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
        } else {
            true
        }
    }
}

/// Browser page; false during server-side rendering where no window exists.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Browser;

#[cfg(target_arch = "wasm32")]
impl PlatformCheck for Browser {
    fn is_render_capable(&self) -> bool {
        web_sys::window().and_then(|window| window.document()).is_some()
    }
}
