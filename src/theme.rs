use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::{hex_to_rgb, ColorTriplet, DARK_BASE_HEX, LIGHT_BASE_HEX};
use crate::storage::{get_stored_item, set_stored_item, ThemeStore};

/// Storage key holding the user's last chosen theme.
pub const THEME_STORAGE_KEY: &str = "theme";

/// Per-frame smoothing factor used by [`ThemeTransition`] unless configured otherwise.
pub const DEFAULT_SMOOTHING: f32 = 0.05;

/// Page color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Plane tint for this theme.
    pub fn base_color(self) -> ColorTriplet {
        match self {
            Self::Dark => hex_to_rgb(DARK_BASE_HEX),
            Self::Light => hex_to_rgb(LIGHT_BASE_HEX),
        }
    }

    /// Directional light intensity for this theme.
    pub fn directional_intensity(self) -> f32 {
        match self {
            Self::Dark => 1.0,
            Self::Light => 2.0,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(anyhow!("unknown theme: {other}. Expected dark or light")),
        }
    }
}

/// Exponentially smoothed color/intensity pair driven once per rendered frame.
///
/// Theme toggles only move the targets; [`ThemeTransition::tick`] walks the
/// current values a fixed fraction of the remaining distance each frame, so a
/// toggle never produces a visible jump.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeTransition {
    current_color: ColorTriplet,
    target_color: ColorTriplet,
    current_intensity: f32,
    target_intensity: f32,
    smoothing: f32,
}

impl ThemeTransition {
    /// Creates a transition resting at `color`/`intensity`.
    ///
    /// `smoothing` is clamped into `(0, 1]`.
    pub fn new(color: ColorTriplet, intensity: f32, smoothing: f32) -> Self {
        Self {
            current_color: color,
            target_color: color,
            current_intensity: intensity,
            target_intensity: intensity,
            smoothing: smoothing.clamp(f32::MIN_POSITIVE, 1.0),
        }
    }

    pub fn for_theme(theme: Theme, smoothing: f32) -> Self {
        Self::new(theme.base_color(), theme.directional_intensity(), smoothing)
    }

    /// Replaces the targets; current values are left untouched.
    pub fn set_target(&mut self, color: ColorTriplet, intensity: f32) {
        self.target_color = color;
        self.target_intensity = intensity;
    }

    /// Advances every channel and the intensity one smoothing step toward the target.
    pub fn tick(&mut self) {
        let f = self.smoothing;
        let current = &mut self.current_color;
        let target = self.target_color;
        current.r += (target.r - current.r) * f;
        current.g += (target.g - current.g) * f;
        current.b += (target.b - current.b) * f;
        self.current_intensity += (self.target_intensity - self.current_intensity) * f;
    }

    /// Jumps straight to the target without animating.
    pub fn snap_to_target(&mut self) {
        self.current_color = self.target_color;
        self.current_intensity = self.target_intensity;
    }

    pub fn current_color(&self) -> ColorTriplet {
        self.current_color
    }

    pub fn target_color(&self) -> ColorTriplet {
        self.target_color
    }

    pub fn current_intensity(&self) -> f32 {
        self.current_intensity
    }

    pub fn target_intensity(&self) -> f32 {
        self.target_intensity
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }
}

/// Resolves and persists the page theme.
///
/// The stored choice wins; otherwise the system color-scheme preference
/// decides, falling back to light when no preference is known.
pub struct ThemeService {
    store: Arc<dyn ThemeStore>,
    system_preference: Option<Theme>,
}

impl ThemeService {
    pub fn new(store: Arc<dyn ThemeStore>, system_preference: Option<Theme>) -> Self {
        Self {
            store,
            system_preference,
        }
    }

    /// Updates the system preference, e.g. after the OS switched color scheme.
    pub fn set_system_preference(&mut self, preference: Option<Theme>) {
        self.system_preference = preference;
    }

    pub fn default_theme(&self) -> Theme {
        match self.system_preference {
            Some(Theme::Dark) => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn current_theme(&self) -> Theme {
        get_stored_item::<Theme>(self.store.as_ref(), THEME_STORAGE_KEY)
            .unwrap_or_else(|| self.default_theme())
    }

    /// Persists `theme`. Storage failures are logged and otherwise ignored.
    pub fn set_theme(&self, theme: Theme) {
        debug!("theme set to {theme}");
        if let Err(err) = set_stored_item(self.store.as_ref(), THEME_STORAGE_KEY, &theme.as_str())
        {
            warn!("failed to persist theme: {err}");
        }
    }

    /// Re-applies the resolved theme and returns it.
    pub fn set_default_theme(&self) -> Theme {
        let theme = self.current_theme();
        self.set_theme(theme);
        theme
    }
}

/// The theme a mounted backdrop is showing, next to the persisted choice.
///
/// Page-driven changes only move the applied theme. Toggling is a user
/// choice and is written to the store as well.
pub struct ThemeSelection {
    service: ThemeService,
    applied: Theme,
}

impl ThemeSelection {
    /// Starts from the resolved theme and persists it.
    pub fn new(service: ThemeService) -> Self {
        let applied = service.set_default_theme();
        Self { service, applied }
    }

    /// Starts from the resolved theme without writing to the store.
    pub fn resolved(service: ThemeService) -> Self {
        let applied = service.current_theme();
        Self { service, applied }
    }

    pub fn theme(&self) -> Theme {
        self.applied
    }

    pub fn apply(&mut self, theme: Theme) {
        self.applied = theme;
    }

    pub fn toggle(&mut self) -> Theme {
        self.applied = self.applied.toggled();
        self.service.set_theme(self.applied);
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn single_tick_moves_by_smoothing_fraction() {
        let mut transition = ThemeTransition::new(ColorTriplet::BLACK, 0.0, 0.05);
        transition.set_target(ColorTriplet::WHITE, 1.0);
        transition.tick();
        let color = transition.current_color();
        assert!(close(color.r, 0.05) && close(color.g, 0.05) && close(color.b, 0.05));
        assert!(close(transition.current_intensity(), 0.05));
    }

    #[test]
    fn sixty_ticks_reach_ninety_five_percent() {
        let mut transition = ThemeTransition::new(ColorTriplet::BLACK, 0.0, 0.05);
        transition.set_target(ColorTriplet::WHITE, 1.0);
        for _ in 0..60 {
            transition.tick();
        }
        let color = transition.current_color();
        assert!(color.r >= 0.95 && color.g >= 0.95 && color.b >= 0.95, "{color:?}");
        assert!(transition.current_intensity() >= 0.95);
    }

    #[test]
    fn approach_is_monotonic_without_overshoot() {
        for smoothing in [0.01, 0.05, 0.5, 1.0] {
            let target = Theme::Light.base_color();
            let mut transition = ThemeTransition::new(ColorTriplet::BLACK, 1.0, smoothing);
            transition.set_target(target, 2.0);
            let mut previous = transition.current_color();
            // 0.99^2000 leaves well under 1e-3 of the gap at the slowest rate.
            for _ in 0..2000 {
                transition.tick();
                let current = transition.current_color();
                assert!(current.r >= previous.r && current.r <= target.r);
                assert!(current.g >= previous.g && current.g <= target.g);
                assert!(current.b >= previous.b && current.b <= target.b);
                assert!(transition.current_intensity() <= 2.0);
                previous = current;
            }
            assert!((previous.r - target.r).abs() < 1e-3);
        }
    }

    #[test]
    fn retarget_mid_transition_keeps_current() {
        let mut transition = ThemeTransition::for_theme(Theme::Dark, 0.05);
        transition.set_target(ColorTriplet::WHITE, 2.0);
        for _ in 0..10 {
            transition.tick();
        }
        let before = transition.current_color();
        transition.set_target(ColorTriplet::BLACK, 0.0);
        assert_eq!(transition.current_color(), before);

        transition.tick();
        let after = transition.current_color();
        assert!(after.r < before.r && after.g < before.g && after.b < before.b);
    }

    #[test]
    fn smoothing_one_reaches_target_in_one_tick() {
        let mut transition = ThemeTransition::new(ColorTriplet::BLACK, 0.0, 1.0);
        transition.set_target(ColorTriplet::WHITE, 2.0);
        transition.tick();
        assert_eq!(transition.current_color(), ColorTriplet::WHITE);
        assert_eq!(transition.current_intensity(), 2.0);
    }

    #[test]
    fn theme_palette_and_intensity() {
        assert_eq!(Theme::Dark.directional_intensity(), 1.0);
        assert_eq!(Theme::Light.directional_intensity(), 2.0);
        assert!(close(Theme::Light.base_color().r, 120.0 / 255.0));
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!("LIGHT".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn service_prefers_stored_theme() {
        let store = Arc::new(MemoryStore::new());
        let service = ThemeService::new(store.clone(), Some(Theme::Dark));
        assert_eq!(service.current_theme(), Theme::Dark);

        service.set_theme(Theme::Light);
        assert_eq!(store.get(THEME_STORAGE_KEY).as_deref(), Some("light"));
        assert_eq!(service.current_theme(), Theme::Light);
    }

    #[test]
    fn service_defaults_to_light_without_preference() {
        let service = ThemeService::new(Arc::new(MemoryStore::new()), None);
        assert_eq!(service.default_theme(), Theme::Light);
        assert_eq!(service.set_default_theme(), Theme::Light);
    }

    #[test]
    fn service_reads_json_encoded_theme() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_STORAGE_KEY, "\"dark\"").unwrap();
        let service = ThemeService::new(store, Some(Theme::Light));
        assert_eq!(service.current_theme(), Theme::Dark);
    }

    #[test]
    fn applied_theme_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_STORAGE_KEY, "light").unwrap();
        let mut selection = ThemeSelection::new(ThemeService::new(store.clone(), None));
        assert_eq!(selection.theme(), Theme::Light);

        selection.apply(Theme::Dark);
        assert_eq!(selection.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_STORAGE_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn resolved_selection_leaves_the_store_empty() {
        let store = Arc::new(MemoryStore::new());
        let service = ThemeService::new(store.clone(), Some(Theme::Dark));
        let selection = ThemeSelection::resolved(service);
        assert_eq!(selection.theme(), Theme::Dark);
        assert_eq!(store.get(THEME_STORAGE_KEY), None);
    }

    #[test]
    fn toggle_flips_the_applied_theme_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut selection = ThemeSelection::new(ThemeService::new(store.clone(), None));
        selection.apply(Theme::Dark);

        assert_eq!(selection.toggle(), Theme::Light);
        assert_eq!(selection.theme(), Theme::Light);
        assert_eq!(store.get(THEME_STORAGE_KEY).as_deref(), Some("light"));
    }
}
