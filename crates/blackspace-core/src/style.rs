//! Overlay style configuration.
//!
//! [`StyleConfig`] is a plain `Copy` snapshot. It is never mutated in place by the engine: the
//! [`ConfigRegistry`](crate::ConfigRegistry) replaces the whole snapshot on every apply.

use crate::scanner::WhitespaceKind;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// An ARGB color (8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Alpha channel (`0xff` is opaque).
    pub a: u8,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_argb(0x00, 0x00, 0x00, 0x00);

    /// Create a color from alpha, red, green and blue channels.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Create an opaque color.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xff, r, g, b)
    }

    /// Returns `true` if the alpha channel is `0xff`.
    pub fn is_opaque(&self) -> bool {
        self.a == 0xff
    }

    /// Pack into a `0xAARRGGBB` value.
    pub fn to_argb_u32(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "transparent" => Self::TRANSPARENT,
            "black" => Self::from_rgb(0x00, 0x00, 0x00),
            "white" => Self::from_rgb(0xff, 0xff, 0xff),
            "red" => Self::from_rgb(0xff, 0x00, 0x00),
            "green" => Self::from_rgb(0x00, 0x80, 0x00),
            "blue" => Self::from_rgb(0x00, 0x00, 0xff),
            "yellow" => Self::from_rgb(0xff, 0xff, 0x00),
            "gray" | "grey" => Self::from_rgb(0x80, 0x80, 0x80),
            _ => return None,
        };
        Some(color)
    }
}

/// Errors produced when parsing a persisted color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("empty color string")]
    /// The string was empty (after trimming).
    Empty,

    #[error("color component '{0}' is out of range (0-255)")]
    /// A decimal component did not fit in a byte.
    ComponentOutOfRange(String),

    #[error("unrecognized color '{0}'")]
    /// The string matched none of the accepted forms.
    Unrecognized(String),
}

static DECIMAL_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})(?:\s*,\s*(\d{1,3}))?$")
        .expect("decimal color pattern is valid")
});

static HEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{8}|[0-9A-Fa-f]{6})$").expect("hex color pattern is valid")
});

/// Strip the quoting artefact (`1"…"`) left behind by older option pages.
fn strip_legacy_quoting(s: &str) -> &str {
    let s = s.strip_prefix("1\"").unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

fn component(text: &str) -> Result<u8, ColorParseError> {
    text.parse::<u8>()
        .map_err(|_| ColorParseError::ComponentOutOfRange(text.to_string()))
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `"A, R, G, B"`, `"R, G, B"`, `#AARRGGBB`, `#RRGGBB` and a few color names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = strip_legacy_quoting(s.trim()).trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }

        if let Some(caps) = DECIMAL_LIST.captures(s) {
            let first = component(&caps[1])?;
            let second = component(&caps[2])?;
            let third = component(&caps[3])?;
            return match caps.get(4) {
                Some(fourth) => Ok(Self::from_argb(first, second, third, component(fourth.as_str())?)),
                None => Ok(Self::from_rgb(first, second, third)),
            };
        }

        if let Some(caps) = HEX.captures(s) {
            let digits = &caps[1];
            let value = u32::from_str_radix(digits, 16)
                .map_err(|_| ColorParseError::Unrecognized(s.to_string()))?;
            let [a, r, g, b] = value.to_be_bytes();
            return Ok(if digits.len() == 6 {
                Self::from_rgb(r, g, b)
            } else {
                Self::from_argb(a, r, g, b)
            });
        }

        Self::named(s).ok_or_else(|| ColorParseError::Unrecognized(s.to_string()))
    }
}

impl fmt::Display for Color {
    /// Formats as a decimal list; the alpha channel is omitted for opaque colors.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "{}, {}, {}", self.r, self.g, self.b)
        } else {
            write!(f, "{}, {}, {}, {}", self.a, self.r, self.g, self.b)
        }
    }
}

/// Fill and stroke settings for one whitespace class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    /// Overlay fill color.
    pub background: Color,
    /// Overlay border (stroke) color.
    pub border: Color,
    /// Border thickness in device-independent pixels. Never negative in a live snapshot.
    pub border_thickness: f64,
}

impl BrushSettings {
    /// Create brush settings.
    pub const fn new(background: Color, border: Color, border_thickness: f64) -> Self {
        Self {
            background,
            border,
            border_thickness,
        }
    }
}

/// Default brush for trailing spaces.
pub const DEFAULT_SPACES: BrushSettings = BrushSettings::new(
    Color::from_argb(0xa0, 0x2b, 0x00, 0x95),
    Color::from_argb(0xff, 0x2b, 0x00, 0xb5),
    1.0,
);

/// Default brush for trailing tabs.
pub const DEFAULT_TABS: BrushSettings = BrushSettings::new(
    Color::from_argb(0xa0, 0x2b, 0x00, 0x65),
    Color::from_argb(0xff, 0x3b, 0x00, 0x85),
    1.0,
);

/// Trim-on-save is opt-in.
pub const DEFAULT_TRIM_ON_SAVE: bool = false;

/// Complete rendering and behavior settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleConfig {
    /// Brush for trailing spaces.
    pub spaces: BrushSettings,
    /// Brush for trailing tabs.
    pub tabs: BrushSettings,
    /// Strip trailing whitespace from every line before the buffer is saved.
    pub trim_on_save: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            spaces: DEFAULT_SPACES,
            tabs: DEFAULT_TABS,
            trim_on_save: DEFAULT_TRIM_ON_SAVE,
        }
    }
}

impl StyleConfig {
    /// The brush used for a whitespace kind.
    pub fn brush(&self, kind: WhitespaceKind) -> &BrushSettings {
        match kind {
            WhitespaceKind::Space => &self.spaces,
            WhitespaceKind::Tab => &self.tabs,
        }
    }

    /// Return a copy with negative or non-finite thicknesses clamped to `0.0`.
    pub fn normalized(mut self) -> Self {
        for (class, brush) in [("spaces", &mut self.spaces), ("tabs", &mut self.tabs)] {
            if !brush.border_thickness.is_finite() || brush.border_thickness < 0.0 {
                tracing::warn!(
                    class,
                    border_thickness = brush.border_thickness,
                    "border thickness must be a non-negative number, clamping to 0"
                );
                brush.border_thickness = 0.0;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_lists() {
        assert_eq!(
            "160, 43, 0, 149".parse::<Color>(),
            Ok(Color::from_argb(160, 43, 0, 149))
        );
        assert_eq!("43,0,181".parse::<Color>(), Ok(Color::from_rgb(43, 0, 181)));
        assert_eq!(
            "  10 , 20 , 30  ".parse::<Color>(),
            Ok(Color::from_rgb(10, 20, 30))
        );
    }

    #[test]
    fn test_parse_hex_and_names() {
        assert_eq!(
            "#A02B0095".parse::<Color>(),
            Ok(Color::from_argb(0xa0, 0x2b, 0x00, 0x95))
        );
        assert_eq!("#ff0000".parse::<Color>(), Ok(Color::from_rgb(0xff, 0, 0)));
        assert_eq!("Transparent".parse::<Color>(), Ok(Color::TRANSPARENT));
        assert_eq!("BLUE".parse::<Color>(), Ok(Color::from_rgb(0, 0, 0xff)));
    }

    #[test]
    fn test_parse_strips_legacy_quoting() {
        assert_eq!(
            "1\"160, 43, 0, 101\"".parse::<Color>(),
            Ok(Color::from_argb(160, 43, 0, 101))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Color>(), Err(ColorParseError::Empty));
        assert_eq!(
            "256, 0, 0".parse::<Color>(),
            Err(ColorParseError::ComponentOutOfRange("256".to_string()))
        );
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(ColorParseError::Unrecognized(_))
        ));
        assert!(matches!(
            "not a color".parse::<Color>(),
            Err(ColorParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for color in [
            DEFAULT_SPACES.background,
            DEFAULT_SPACES.border,
            DEFAULT_TABS.background,
            DEFAULT_TABS.border,
        ] {
            assert_eq!(color.to_string().parse::<Color>(), Ok(color));
        }
        assert_eq!(Color::from_rgb(43, 0, 181).to_string(), "43, 0, 181");
    }

    #[test]
    fn test_defaults_are_semi_transparent_fill_with_opaque_border() {
        let config = StyleConfig::default();
        assert_eq!(config.spaces.background.a, 0xa0);
        assert!(config.spaces.border.is_opaque());
        assert_eq!(config.tabs.background.to_argb_u32(), 0xa02b0065);
        assert!(!config.trim_on_save);
    }

    #[test]
    fn test_brush_selects_class() {
        let config = StyleConfig::default();
        assert_eq!(config.brush(WhitespaceKind::Space), &DEFAULT_SPACES);
        assert_eq!(config.brush(WhitespaceKind::Tab), &DEFAULT_TABS);
    }

    #[test]
    fn test_normalized_clamps_thickness() {
        let mut config = StyleConfig::default();
        config.spaces.border_thickness = -2.0;
        config.tabs.border_thickness = f64::NAN;
        let config = config.normalized();
        assert_eq!(config.spaces.border_thickness, 0.0);
        assert_eq!(config.tabs.border_thickness, 0.0);

        let untouched = StyleConfig::default().normalized();
        assert_eq!(untouched, StyleConfig::default());
    }
}
