use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cli::Args;
use crate::color::{ColorScheme, RgbColor, WaveformPalette};
use crate::geometry::{SurfaceGeometry, MAX_BACKING_DIMENSION};
use crate::waveform::DEFAULT_BLOCK_WIDTH;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub display: DisplayConfig,
    pub player: PlayerConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Logical width in pixels
    pub width: f64,
    /// Logical height in pixels
    pub height: f64,
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Follow the terminal size instead of `width`/`height`
    #[serde(default)]
    pub fit_terminal: bool,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

fn default_fps() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub block_width: u32,
    #[serde(default = "default_true")]
    pub looping: bool,
    #[serde(default)]
    pub autoplay: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub scheme: ColorScheme,
    /// Overrides for individual scheme colors
    pub base: Option<RgbColor>,
    pub played: Option<RgbColor>,
    pub marker: Option<RgbColor>,
}

impl ColorConfig {
    /// The scheme's palette with any configured overrides applied.
    pub fn palette(&self) -> WaveformPalette {
        self.palette_for(self.scheme)
    }

    pub fn palette_for(&self, scheme: ColorScheme) -> WaveformPalette {
        let mut palette = scheme.palette();
        if let Some(c) = self.base {
            palette.base = c;
        }
        if let Some(c) = self.played {
            palette.played = c;
        }
        if let Some(c) = self.marker {
            palette.marker = c;
        }
        palette
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// PulseAudio sink (None = default)
    pub device: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig {
                width: 800.0,
                height: 400.0,
                device_pixel_ratio: 1.0,
                fps: 60,
                fit_terminal: false,
            },
            player: PlayerConfig {
                block_width: DEFAULT_BLOCK_WIDTH,
                looping: true,
                autoplay: false,
            },
            colors: ColorConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/wavestrip/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wavestrip").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse config at {}: {}. Using defaults.", path.display(), e);
                    None
                }
            }
        } else {
            None
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r##"# Wavestrip Configuration
# This file is auto-generated. Edit as needed.

[display]
# Logical size of the waveform surface in pixels
width = 800.0
height = 400.0
# Backing store scale; 2.0 renders at twice the logical resolution
device_pixel_ratio = 1.0
# Redraw rate while playing
fps = 60
# Size the waveform to the terminal (one block per column) and follow resizes
fit_terminal = false

[player]
# Width of one waveform block in pixels
block_width = 3
# Start over when the end is reached
looping = true
# Start playing as soon as the file is decoded
autoplay = false

[colors]
# Color scheme: "classic", "ocean", "fire", "forest", "mono"
scheme = "classic"
# Override individual colors ("#RRGGBB" or { r, g, b })
# base = "#00FFFF"
# played = "#808080"
# marker = { r = 255, g = 0, b = 0 }

[audio]
# PulseAudio sink (omit for the default sink)
# device = "alsa_output.pci-0000_00_1f.3.analog-stereo"
"##
        .to_string()
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub fn merge_args(&mut self, args: &Args) {
        if let Some(width) = args.width {
            self.display.width = width;
        }
        if let Some(height) = args.height {
            self.display.height = height;
        }
        if let Some(dpr) = args.dpr {
            self.display.device_pixel_ratio = dpr;
        }
        if args.fit {
            self.display.fit_terminal = true;
        }

        if let Some(block_width) = args.block_width {
            self.player.block_width = block_width;
        }
        if args.no_loop {
            self.player.looping = false;
        }
        if args.autoplay {
            self.player.autoplay = true;
        }

        if let Some(ref colors) = args.colors {
            match colors.parse() {
                Ok(scheme) => self.colors.scheme = scheme,
                Err(e) => warn!("{}, keeping {}", e, self.colors.scheme.name()),
            }
        }

        if let Some(ref device) = args.device {
            self.audio.device = Some(device.clone());
        }
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.display;
        if !(d.width.is_finite() && d.width > 0.0 && d.height.is_finite() && d.height > 0.0) {
            bail!("display size must be positive, got {}x{}", d.width, d.height);
        }
        if !(d.device_pixel_ratio.is_finite() && d.device_pixel_ratio > 0.0) {
            bail!("device_pixel_ratio must be positive, got {}", d.device_pixel_ratio);
        }
        let geometry = self.geometry();
        if !geometry.within_limits() {
            bail!(
                "display size {}x{} at ratio {} exceeds {} pixels per side",
                d.width,
                d.height,
                d.device_pixel_ratio,
                MAX_BACKING_DIMENSION
            );
        }
        if d.fps == 0 {
            bail!("fps must be at least 1");
        }
        if self.player.block_width == 0 {
            bail!("block_width must be at least 1");
        }
        Ok(())
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry::new(
            self.display.width,
            self.display.height,
            self.display.device_pixel_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::generate_config_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [display]
            width = 640.0
            height = 200.0

            [player]
            block_width = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.display.fps, 60);
        assert_eq!(parsed.display.device_pixel_ratio, 1.0);
        assert!(parsed.player.looping);
        assert_eq!(parsed.colors.scheme, ColorScheme::Classic);
        assert_eq!(parsed.audio.device, None);
    }

    #[test]
    fn color_overrides_apply() {
        let parsed: Config = toml::from_str(
            r##"
            [display]
            width = 800.0
            height = 400.0

            [player]
            block_width = 3

            [colors]
            scheme = "ocean"
            marker = { r = 1, g = 2, b = 3 }
            played = "#0A0B0C"
            "##,
        )
        .unwrap();
        let palette = parsed.colors.palette();
        assert_eq!(palette.marker, RgbColor::new(1, 2, 3));
        assert_eq!(palette.played, RgbColor::new(10, 11, 12));
        assert_eq!(palette.base, ColorScheme::Ocean.palette().base);
    }

    #[test]
    fn bad_hex_color_is_rejected() {
        let parsed: Result<Config, _> = toml::from_str(
            r##"
            [display]
            width = 800.0
            height = 400.0

            [player]
            block_width = 3

            [colors]
            base = "#12"
            "##,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let mut config = Config::default();
        let args = Args {
            width: Some(1024.0),
            dpr: Some(2.0),
            block_width: Some(4),
            colors: Some("fire".to_string()),
            no_loop: true,
            fit: true,
            device: Some("sink".to_string()),
            ..Default::default()
        };
        config.merge_args(&args);
        assert!(config.display.fit_terminal);

        assert_eq!(config.display.width, 1024.0);
        assert_eq!(config.display.height, 400.0);
        assert_eq!(config.display.device_pixel_ratio, 2.0);
        assert_eq!(config.player.block_width, 4);
        assert_eq!(config.colors.scheme, ColorScheme::Fire);
        assert!(!config.player.looping);
        assert_eq!(config.audio.device.as_deref(), Some("sink"));
    }

    #[test]
    fn unknown_color_scheme_is_ignored() {
        let mut config = Config::default();
        let args = Args {
            colors: Some("plaid".to_string()),
            ..Default::default()
        };
        config.merge_args(&args);
        assert_eq!(config.colors.scheme, ColorScheme::Classic);
    }

    #[test]
    fn validation() {
        assert!(Config::default().validate().is_ok());

        let mut bad = Config::default();
        bad.player.block_width = 0;
        assert!(bad.validate().is_err());

        let mut bad = Config::default();
        bad.display.width = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = Config::default();
        bad.display.device_pixel_ratio = f64::NAN;
        assert!(bad.validate().is_err());

        let mut bad = Config::default();
        bad.display.fps = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn huge_display_is_rejected() {
        let parsed: Config = toml::from_str(
            r#"
            [display]
            width = 1e10
            height = 1e10

            [player]
            block_width = 3
            "#,
        )
        .unwrap();
        assert!(parsed.validate().is_err());

        let mut config = Config::default();
        config.merge_args(&Args {
            width: Some(5000.0),
            dpr: Some(2.0),
            ..Default::default()
        });
        assert!(config.validate().is_err());

        config.display.device_pixel_ratio = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn geometry_from_display() {
        let mut config = Config::default();
        config.display.device_pixel_ratio = 2.0;
        let g = config.geometry();
        assert_eq!((g.width, g.height, g.device_pixel_ratio), (800.0, 400.0, 2.0));
    }
}
