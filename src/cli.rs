//! Command-line arguments for the desktop runner.

use std::path::PathBuf;

use clap::Parser;

use crate::config::SceneConfig;
use crate::theme::Theme;

/// Animated plane backdrop with bloom and theme transitions.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "backdrop-scene", version, about)]
pub struct CliArgs {
    /// Path to a RON scene config. Missing files fall back to defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use this theme for the run without changing the stored choice.
    #[arg(long)]
    pub theme: Option<Theme>,

    /// Seed for the plane perturbation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the window and print a summary of a simulated run.
    #[arg(long)]
    pub summary_only: bool,

    /// Frames simulated by --summary-only.
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Flip the theme before this simulated frame.
    #[arg(long, requires = "summary_only")]
    pub toggle_at: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// File holding the persisted theme choice.
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl CliArgs {
    /// Apply CLI overrides to a loaded config.
    pub fn apply(&self, config: &mut SceneConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ref level) = self.log_level {
            config.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = CliArgs::try_parse_from([
            "backdrop-scene",
            "--theme",
            "Dark",
            "--seed",
            "7",
            "--summary-only",
            "--frames",
            "30",
        ])
        .unwrap();
        assert_eq!(args.theme, Some(Theme::Dark));
        assert_eq!(args.seed, Some(7));
        assert!(args.summary_only);
        assert_eq!(args.frames, 30);
        assert!(args.config.is_none());
    }

    #[test]
    fn rejects_unknown_theme() {
        assert!(CliArgs::try_parse_from(["backdrop-scene", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn toggle_needs_summary_mode() {
        assert!(CliArgs::try_parse_from(["backdrop-scene", "--toggle-at", "5"]).is_err());
        let args =
            CliArgs::try_parse_from(["backdrop-scene", "--summary-only", "--toggle-at", "5"])
                .unwrap();
        assert_eq!(args.toggle_at, Some(5));
    }

    #[test]
    fn overrides_only_given_fields() {
        let mut config = SceneConfig::default();
        let args = CliArgs::try_parse_from(["backdrop-scene", "--seed", "99"]).unwrap();
        args.apply(&mut config);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.log_level, "info");

        let original = SceneConfig::default();
        let mut untouched = SceneConfig::default();
        CliArgs::try_parse_from(["backdrop-scene"])
            .unwrap()
            .apply(&mut untouched);
        assert_eq!(untouched, original);
    }
}
