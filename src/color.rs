use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// RGB color representation for configuration and drawing
///
/// Deserializes from either `"#RRGGBB"` or `{ r, g, b }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "ColorRepr")]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from hex string like "#FF0000" or "FF0000"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let hsl = Hsl::new(h, s, l);
        let rgb: Srgb = hsl.into_color();
        Self {
            r: (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
            g: (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
            b: (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgb { r: u8, g: u8, b: u8 },
}

impl TryFrom<ColorRepr> for RgbColor {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => {
                Self::from_hex(&hex).ok_or_else(|| format!("invalid hex color '{}'", hex))
            }
            ColorRepr::Rgb { r, g, b } => Ok(Self { r, g, b }),
        }
    }
}

/// The three colors a waveform frame is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformPalette {
    /// Unplayed bars
    pub base: RgbColor,
    /// Bars left of the playhead
    pub played: RgbColor,
    /// Playhead line
    pub marker: RgbColor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Cyan bars, gray played region, red playhead
    #[default]
    Classic,
    Ocean,
    Fire,
    Forest,
    #[serde(alias = "monochrome")]
    Mono,
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "ocean" => Ok(Self::Ocean),
            "fire" => Ok(Self::Fire),
            "forest" => Ok(Self::Forest),
            "mono" | "monochrome" => Ok(Self::Mono),
            _ => Err(format!("Unknown color scheme: {}", s)),
        }
    }
}

impl ColorScheme {
    pub fn palette(&self) -> WaveformPalette {
        match self {
            ColorScheme::Classic => WaveformPalette {
                base: RgbColor::new(0, 255, 255),
                played: RgbColor::new(128, 128, 128),
                marker: RgbColor::new(255, 0, 0),
            },
            // Played region keeps the hue but loses saturation
            ColorScheme::Ocean => WaveformPalette {
                base: RgbColor::from_hsl(195.0, 0.8, 0.55),
                played: RgbColor::from_hsl(215.0, 0.35, 0.35),
                marker: RgbColor::from_hsl(170.0, 0.9, 0.6),
            },
            ColorScheme::Fire => WaveformPalette {
                base: RgbColor::from_hsl(40.0, 0.95, 0.55),
                played: RgbColor::from_hsl(15.0, 0.6, 0.35),
                marker: RgbColor::from_hsl(0.0, 1.0, 0.6),
            },
            ColorScheme::Forest => WaveformPalette {
                base: RgbColor::from_hsl(100.0, 0.7, 0.45),
                played: RgbColor::from_hsl(120.0, 0.3, 0.3),
                marker: RgbColor::from_hsl(60.0, 0.9, 0.55),
            },
            ColorScheme::Mono => WaveformPalette {
                base: RgbColor::from_hsl(0.0, 0.0, 0.8),
                played: RgbColor::from_hsl(0.0, 0.0, 0.4),
                marker: RgbColor::from_hsl(0.0, 0.0, 1.0),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorScheme::Classic => "classic",
            ColorScheme::Ocean => "ocean",
            ColorScheme::Fire => "fire",
            ColorScheme::Forest => "forest",
            ColorScheme::Mono => "mono",
        }
    }

    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Classic,
            ColorScheme::Ocean,
            ColorScheme::Fire,
            ColorScheme::Forest,
            ColorScheme::Mono,
        ]
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|c| c == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }
}
