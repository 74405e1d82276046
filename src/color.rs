use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Plane tint used while the dark theme is active.
pub const DARK_BASE_HEX: &str = "#000915ff";
/// Plane tint used while the light theme is active.
pub const LIGHT_BASE_HEX: &str = "#788083ff";

/// Normalized RGB color with each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorTriplet {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorTriplet {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Returns `false` when any channel came from malformed hex input.
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Converts a `#RRGGBB` (optionally `#RRGGBBAA`) string into a normalized triplet.
///
/// The alpha byte is ignored. Input is not validated: a channel whose two hex
/// digits are missing or malformed comes back as `NaN`.
pub fn hex_to_rgb(hex: &str) -> ColorTriplet {
    ColorTriplet::new(channel(hex, 1), channel(hex, 3), channel(hex, 5))
}

fn channel(hex: &str, start: usize) -> f32 {
    hex.get(start..start + 2)
        .and_then(|digits| u8::from_str_radix(digits, 16).ok())
        .map_or(f32::NAN, |byte| f32::from(byte) / 255.0)
}
