#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = desktop::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod desktop {
    use std::any::Any;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use clap::Parser;
    use log::{debug, info, warn};
    use winit::event_loop::EventLoop;

    use backdrop_scene::{
        BackdropApp, BackdropError, BackdropEvent, CliArgs, Desktop, FileStore, HeadlessRun,
        MemoryStore, PlatformCheck, SceneConfig, Theme, ThemeService, ThemeStore,
    };

    pub fn run() -> Result<()> {
        let args = CliArgs::parse();
        let mut config = load_config(args.config.as_deref())?;
        args.apply(&mut config);
        init_logging(&config.log_level);

        let themes = ThemeService::new(open_store(&args), None);
        // --theme applies to this run only; the store keeps the saved choice.
        let theme = args.theme.unwrap_or_else(|| themes.current_theme());

        if args.summary_only {
            return run_headless(config, theme, &args);
        }

        if !Desktop.is_render_capable() {
            eprintln!(
                "No display available. Falling back to --summary-only mode (set DISPLAY or WAYLAND_DISPLAY to enable rendering)."
            );
            return run_headless(config, theme, &args);
        }

        let headless_config = config.clone();
        match run_interactive(config, themes, args.theme) {
            Ok(()) => Ok(()),
            Err(err) if is_host_failure(&err) => {
                eprintln!("{err}. Falling back to --summary-only mode.");
                run_headless(headless_config, theme, &args)
            }
            Err(err) => Err(err),
        }
    }

    fn load_config(path: Option<&std::path::Path>) -> Result<SceneConfig> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("backdrop-scene").join("config.ron"),
                None => return Ok(SceneConfig::default()),
            },
        };
        SceneConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))
    }

    fn open_store(args: &CliArgs) -> Arc<dyn ThemeStore> {
        match args.store.clone().or_else(FileStore::default_path) {
            Some(path) => {
                debug!("Theme preferences at {}", path.display());
                Arc::new(FileStore::open(path))
            }
            None => {
                warn!("No configuration directory; the theme choice will not persist");
                Arc::new(MemoryStore::new())
            }
        }
    }

    /// `RUST_LOG` wins over the configured level.
    fn init_logging(level: &str) {
        let mut builder = env_logger::Builder::new();
        match std::env::var("RUST_LOG") {
            Ok(filter) => builder.parse_filters(&filter),
            Err(_) => builder.parse_filters(level),
        };
        builder.init();
    }

    fn run_headless(config: SceneConfig, theme: Theme, args: &CliArgs) -> Result<()> {
        let mut run = HeadlessRun::new(config, theme, args.frames);
        run.toggle_at = args.toggle_at;
        let summary = run.run().context("simulated run failed")?;
        println!("{summary}");
        Ok(())
    }

    fn run_interactive(
        config: SceneConfig,
        themes: ThemeService,
        theme_override: Option<Theme>,
    ) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(|| {
            EventLoop::<BackdropEvent>::with_user_event().build()
        }));
        panic::set_hook(default_hook);

        let event_loop = event_loop
            .map_err(|panic| host_init("event loop", panic_message(panic)))?
            .map_err(|err| host_init("event loop", err.to_string()))?;

        info!("Press T to toggle the theme, Esc to quit");
        let mut app = BackdropApp::new(config, Some(themes), Desktop).with_theme(theme_override);
        event_loop
            .run_app(&mut app)
            .context("event loop terminated abnormally")?;

        match app.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn host_init(stage: &'static str, message: String) -> BackdropError {
        BackdropError::HostInit { stage, message }
    }

    fn is_host_failure(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<BackdropError>(),
            Some(BackdropError::HostInit { .. } | BackdropError::EnvironmentUnavailable)
        )
    }

    fn panic_message(panic: Box<dyn Any + Send>) -> String {
        match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        }
    }
}
