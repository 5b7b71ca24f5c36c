//! Configuration for Tern
//!
//! Settings come from, in increasing priority: built-in defaults, the TOML
//! file at `$XDG_CONFIG_HOME/tern/config.toml`, `TERN_*` environment
//! variables and command-line arguments.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::{Palette, RenderOptions};

/// CLI arguments for Tern
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tern")]
#[command(version)]
#[command(about = "A small xterm-compatible terminal", long_about = None)]
pub struct CliArgs {
    /// Config file to read instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Font family name
    #[arg(long, value_name = "FONT")]
    pub font_family: Option<String>,

    /// Font size in pixels
    #[arg(long, value_name = "SIZE")]
    pub font_size: Option<f32>,

    /// Shell to run when no command is given
    #[arg(short, long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Columns at startup
    #[arg(long, value_name = "COLS")]
    pub columns: Option<u16>,

    /// Rows at startup
    #[arg(long, value_name = "ROWS")]
    pub rows: Option<u16>,

    /// Window title
    #[arg(short, long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Command to run instead of the shell, with its arguments
    #[arg(short = 'e', long = "exec", num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub exec: Vec<String>,
}

/// Font configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Family used for regular, bold and italic text
    #[serde(default = "default_font_family")]
    pub family: String,

    /// Font size in pixels
    #[serde(default = "default_font_size")]
    pub size: f32,

    /// Families searched, in order, for characters the primary font lacks
    #[serde(default)]
    pub fallbacks: Vec<String>,

    /// Cell width multiplier
    #[serde(default = "default_scale")]
    pub cw_scale: f32,

    /// Cell height multiplier
    #[serde(default = "default_scale")]
    pub ch_scale: f32,
}

fn default_font_family() -> String {
    "monospace".to_string()
}

fn default_font_size() -> f32 {
    14.0
}

fn default_scale() -> f32 {
    1.0
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: default_font_family(),
            size: default_font_size(),
            fallbacks: Vec::new(),
            cw_scale: default_scale(),
            ch_scale: default_scale(),
        }
    }
}

/// Color configuration, all hex `#RRGGBB`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    #[serde(default = "default_foreground")]
    pub foreground: String,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_cursor_color")]
    pub cursor: String,
    /// Cursor color over selected text or under reverse video
    #[serde(default = "default_reverse_cursor")]
    pub reverse_cursor: String,
    /// ANSI colors 0-15
    #[serde(default = "default_ansi")]
    pub ansi: [String; 16],
    /// Palette index drawn for text whose face lacks the requested style
    #[serde(default = "default_bad_style")]
    pub bad_style: usize,
}

fn default_foreground() -> String {
    "#e5e5e5".to_string()
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_cursor_color() -> String {
    "#cccccc".to_string()
}

fn default_reverse_cursor() -> String {
    "#555555".to_string()
}

fn default_ansi() -> [String; 16] {
    [
        "#000000", "#cd0000", "#00cd00", "#cdcd00", "#0000ee", "#cd00cd", "#00cdcd", "#e5e5e5",
        "#7f7f7f", "#ff0000", "#00ff00", "#ffff00", "#5c5cff", "#ff00ff", "#00ffff", "#ffffff",
    ]
    .map(String::from)
}

fn default_bad_style() -> usize {
    11
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            foreground: default_foreground(),
            background: default_background(),
            cursor: default_cursor_color(),
            reverse_cursor: default_reverse_cursor(),
            ansi: default_ansi(),
            bad_style: default_bad_style(),
        }
    }
}

impl ColorScheme {
    /// `#RRGGBB` or `RRGGBB`
    pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some((r, g, b))
    }

    fn rgb(hex: &str) -> u32 {
        Self::parse_hex(hex)
            .map(|(r, g, b)| (r as u32) << 16 | (g as u32) << 8 | b as u32)
            .unwrap_or(0)
    }

    /// The full 256-color palette plus the default and cursor slots
    pub fn palette(&self) -> Palette {
        let base = std::array::from_fn(|i| Self::rgb(&self.ansi[i]));
        Palette::new(
            &base,
            Self::rgb(&self.foreground),
            Self::rgb(&self.background),
            Self::rgb(&self.cursor),
            Self::rgb(&self.reverse_cursor),
        )
    }
}

/// Cursor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    /// 0-2 block, 3-4 underline, 5-6 bar, 7 snowman
    #[serde(default = "default_cursor_shape")]
    pub shape: u8,

    /// Underline and bar thickness in pixels
    #[serde(default = "default_cursor_thickness")]
    pub thickness: u32,
}

fn default_cursor_shape() -> u8 {
    2
}

fn default_cursor_thickness() -> u32 {
    2
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            shape: default_cursor_shape(),
            thickness: default_cursor_thickness(),
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
    #[serde(default = "default_triple_click_ms")]
    pub triple_click_ms: u64,
    /// Blink period; text blinks on and off once every two periods
    #[serde(default = "default_blink_ms")]
    pub blink_ms: u64,
    #[serde(default = "default_key_repeat_delay_ms")]
    pub key_repeat_delay_ms: u64,
    #[serde(default = "default_key_repeat_interval_ms")]
    pub key_repeat_interval_ms: u64,
}

fn default_double_click_ms() -> u64 {
    300
}

fn default_triple_click_ms() -> u64 {
    600
}

fn default_blink_ms() -> u64 {
    800
}

fn default_key_repeat_delay_ms() -> u64 {
    400
}

fn default_key_repeat_interval_ms() -> u64 {
    40
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            double_click_ms: default_double_click_ms(),
            triple_click_ms: default_triple_click_ms(),
            blink_ms: default_blink_ms(),
            key_repeat_delay_ms: default_key_repeat_delay_ms(),
            key_repeat_interval_ms: default_key_repeat_interval_ms(),
        }
    }
}

impl TimingConfig {
    pub fn double_click(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    pub fn triple_click(&self) -> Duration {
        Duration::from_millis(self.triple_click_ms)
    }

    pub fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }

    pub fn key_repeat_delay(&self) -> Duration {
        Duration::from_millis(self.key_repeat_delay_ms)
    }

    pub fn key_repeat_interval(&self) -> Duration {
        Duration::from_millis(self.key_repeat_interval_ms)
    }
}

/// Everything Tern reads at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub font: FontConfig,

    /// Empty space around the grid in pixels
    #[serde(default = "default_border_px")]
    pub border_px: u32,

    /// Initial columns and rows
    #[serde(default = "default_dimensions")]
    pub dimensions: (u16, u16),

    /// Shell (None = `$SHELL`, then /bin/sh)
    #[serde(default)]
    pub shell: Option<String>,

    /// Command run instead of the shell
    #[serde(default)]
    pub command: Vec<String>,

    /// TERM for the child
    #[serde(default = "default_term")]
    pub term: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub colors: ColorScheme,

    #[serde(default)]
    pub cursor: CursorConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    /// Characters that end a word for double-click selection
    #[serde(default = "default_word_delimiters")]
    pub word_delimiters: String,

    /// Bold text in colors 0-7 is drawn in the bright variants
    #[serde(default = "default_true")]
    pub bold_brightens: bool,
}

fn default_border_px() -> u32 {
    2
}

fn default_dimensions() -> (u16, u16) {
    (80, 24)
}

fn default_term() -> String {
    "xterm-256color".to_string()
}

fn default_title() -> String {
    "tern".to_string()
}

fn default_word_delimiters() -> String {
    " ".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: FontConfig::default(),
            border_px: default_border_px(),
            dimensions: default_dimensions(),
            shell: None,
            command: Vec::new(),
            term: default_term(),
            title: default_title(),
            colors: ColorScheme::default(),
            cursor: CursorConfig::default(),
            timing: TimingConfig::default(),
            word_delimiters: default_word_delimiters(),
            bold_brightens: true,
        }
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub message: String,
    pub field: Option<String>,
}

impl ConfigError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Config error in '{}': {}", field, self.message)
        } else {
            write!(f, "Config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Build the effective configuration. An unreadable file is logged and
    /// skipped; a configuration that fails validation is an error.
    pub fn load_with_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let config_path = args.config.clone().or_else(Self::default_config_path);
        if let Some(path) = &config_path {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(file_config) => config = file_config,
                    Err(e) => {
                        log::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        config.apply_env_vars();
        config.apply_cli_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Parse one TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            message: format!("Failed to read config file: {}", e),
            field: None,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError {
            message: format!("Failed to parse config file: {}", e),
            field: None,
        })
    }

    fn apply_env_vars(&mut self) {
        if let Ok(val) = env::var("TERN_FONT_FAMILY") {
            self.font.family = val;
        }
        if let Ok(val) = env::var("TERN_FONT_SIZE") {
            match val.parse() {
                Ok(size) => self.font.size = size,
                Err(_) => log::warn!("Ignoring TERN_FONT_SIZE={:?}", val),
            }
        }
        if let Ok(val) = env::var("TERN_SHELL") {
            self.shell = Some(val);
        }
    }

    fn apply_cli_args(&mut self, args: &CliArgs) {
        if let Some(family) = &args.font_family {
            self.font.family = family.clone();
        }
        if let Some(size) = args.font_size {
            self.font.size = size;
        }
        if let Some(shell) = &args.shell {
            self.shell = Some(shell.clone());
        }
        if let Some(cols) = args.columns {
            self.dimensions.0 = cols;
        }
        if let Some(rows) = args.rows {
            self.dimensions.1 = rows;
        }
        if let Some(title) = &args.title {
            self.title = title.clone();
        }
        if !args.exec.is_empty() {
            self.command = args.exec.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4.0..=200.0).contains(&self.font.size) {
            return Err(ConfigError::field(
                "font.size",
                "Font size must be between 4.0 and 200.0",
            ));
        }
        for (field, scale) in [
            ("font.cw_scale", self.font.cw_scale),
            ("font.ch_scale", self.font.ch_scale),
        ] {
            if !(0.5..=3.0).contains(&scale) {
                return Err(ConfigError::field(
                    field,
                    "Cell scale must be between 0.5 and 3.0",
                ));
            }
        }

        if self.dimensions.0 < 1 || self.dimensions.1 < 1 {
            return Err(ConfigError::field(
                "dimensions",
                "Window must have at least one column and one row",
            ));
        }

        if self.cursor.shape > 7 {
            return Err(ConfigError::field(
                "cursor.shape",
                "Cursor shape must be between 0 and 7",
            ));
        }

        if self.timing.double_click_ms > self.timing.triple_click_ms {
            return Err(ConfigError::field(
                "timing.double_click_ms",
                "Double click timeout must not exceed the triple click timeout",
            ));
        }
        if self.timing.blink_ms == 0 || self.timing.key_repeat_interval_ms == 0 {
            return Err(ConfigError::field(
                "timing",
                "Blink period and key repeat interval must be positive",
            ));
        }

        if self.colors.bad_style > 255 {
            return Err(ConfigError::field(
                "colors.bad_style",
                "Palette index must be at most 255",
            ));
        }
        self.validate_color(&self.colors.foreground, "colors.foreground")?;
        self.validate_color(&self.colors.background, "colors.background")?;
        self.validate_color(&self.colors.cursor, "colors.cursor")?;
        self.validate_color(&self.colors.reverse_cursor, "colors.reverse_cursor")?;
        for (i, color) in self.colors.ansi.iter().enumerate() {
            self.validate_color(color, &format!("colors.ansi[{}]", i))?;
        }

        Ok(())
    }

    fn validate_color(&self, color: &str, field: &str) -> Result<(), ConfigError> {
        if ColorScheme::parse_hex(color).is_none() {
            return Err(ConfigError::field(
                field,
                format!("Invalid hex color '{}'. Expected format: #RRGGBB", color),
            ));
        }
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/tern/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tern").join("config.toml"))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            border_px: self.border_px,
            cw_scale: self.font.cw_scale,
            ch_scale: self.font.ch_scale,
            cursor_shape: self.cursor.shape,
            cursor_thickness: self.cursor.thickness,
            bold_brightens: self.bold_brightens,
            bad_style_color: self.colors.bad_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.font.size, 14.0);
        assert_eq!(config.dimensions, (80, 24));
        assert_eq!(config.timing.double_click_ms, 300);
        assert_eq!(config.timing.triple_click_ms, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(ColorScheme::parse_hex("#ff0000"), Some((255, 0, 0)));
        assert_eq!(ColorScheme::parse_hex("00ff00"), Some((0, 255, 0)));
        assert_eq!(ColorScheme::parse_hex("#invalid"), None);
    }

    #[test]
    fn test_default_colors_match_default_palette() {
        let ours = ColorScheme::default().palette();
        let builtin = Palette::default();
        for i in 0..260 {
            assert_eq!(ours.get(i), builtin.get(i), "slot {}", i);
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.font.size = 2.0;
        assert!(config.validate().is_err());
        config.font.size = 14.0;

        config.cursor.shape = 8;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("cursor.shape"));
        config.cursor.shape = 2;

        config.colors.ansi[3] = "yellow".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("colors.ansi[3]"));
    }

    #[test]
    fn test_config_toml_parsing() {
        let config = Config::from_toml(
            r#"
            border_px = 4
            word_delimiters = " ,;"

            [font]
            family = "Iosevka Term"
            size = 16.0

            [timing]
            blink_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.border_px, 4);
        assert_eq!(config.word_delimiters, " ,;");
        assert_eq!(config.font.family, "Iosevka Term");
        assert_eq!(config.font.size, 16.0);
        assert_eq!(config.font.cw_scale, 1.0);
        assert_eq!(config.timing.blink_ms, 500);
        assert_eq!(config.timing.key_repeat_delay_ms, 400);
        assert_eq!(config.colors.bad_style, 11);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::from_toml("[font]\nsize = 20.0\n").unwrap();
        let args = CliArgs {
            font_size: Some(12.0),
            title: Some("work".to_string()),
            exec: vec!["htop".to_string(), "-d".to_string(), "5".to_string()],
            ..CliArgs::default()
        };
        config.apply_cli_args(&args);
        assert_eq!(config.font.size, 12.0);
        assert_eq!(config.title, "work");
        assert_eq!(config.command, vec!["htop", "-d", "5"]);
    }

    #[test]
    fn test_cli_parses_trailing_command() {
        let args = CliArgs::parse_from(["tern", "--rows", "30", "-e", "vim", "-u", "NONE"]);
        assert_eq!(args.rows, Some(30));
        assert_eq!(args.exec, vec!["vim", "-u", "NONE"]);
    }
}
