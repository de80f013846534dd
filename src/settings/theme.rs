use std::str::FromStr;

use crate::foundation::core::Rgb8;

/// Scanner tint: one of the built-in palette entries or an arbitrary color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    /// "Quantum cyan".
    Cyan,
    /// "Infra red".
    Crimson,
    /// "Matrix green".
    #[default]
    Matrix,
    /// User-chosen color.
    Custom(Rgb8),
}

const FALLBACK_HEX: &str = "32ff64";

impl Theme {
    /// Built-in palette entries.
    pub const PALETTE: [Theme; 3] = [Theme::Cyan, Theme::Crimson, Theme::Matrix];

    /// RGB value used for tinting.
    pub fn rgb(self) -> Rgb8 {
        match self {
            Theme::Cyan => Rgb8::new(0, 255, 240),
            Theme::Crimson => Rgb8::new(255, 50, 50),
            Theme::Matrix => Rgb8::new(50, 255, 100),
            Theme::Custom(c) => c,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Theme::Cyan => "QUANTUM CYAN",
            Theme::Crimson => "INFRA RED",
            Theme::Matrix => "MATRIX GREEN",
            Theme::Custom(_) => "CUSTOM",
        }
    }

    /// Parse a `#rrggbb` color leniently.
    ///
    /// Anything that is not six characters long is replaced by `#32ff64`. A channel containing any
    /// non-hex digit falls back to the matching channel of that color whole, so `1z` is not read
    /// as 1. A valid `00` channel stays 0 rather than taking the fallback.
    pub fn from_hex(hex: &str) -> Self {
        let value = hex.trim().trim_start_matches('#').trim();
        let safe = if value.len() == 6 && value.is_ascii() {
            value
        } else {
            FALLBACK_HEX
        };
        let channel = |range: std::ops::Range<usize>, fallback: u8| {
            u8::from_str_radix(&safe[range], 16).unwrap_or(fallback)
        };
        Theme::Custom(Rgb8::new(
            channel(0..2, 50),
            channel(2..4, 255),
            channel(4..6, 100),
        ))
    }
}

impl FromStr for Theme {
    type Err = std::convert::Infallible;

    /// Palette names (`cyan`, `crimson`, `matrix`) or a hex color.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "cyan" => Theme::Cyan,
            "crimson" => Theme::Crimson,
            "matrix" => Theme::Matrix,
            other => Theme::from_hex(other),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/theme.rs"]
mod tests;
