use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::chart_export::{ChartExportFormat, DEFAULT_EXPORT_SIZE};
use crate::pipeline::ReloadPolicy;
use crate::selection::{SelectionDefaults, YearRange, DEFAULT_GENRES, DEFAULT_YEAR_RANGE};

pub const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration template (commented TOML)
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write the default template to `config.toml`, refusing to overwrite unless `force`
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,
    pub data: DataConfig,
    pub selection: SelectionConfig,
    pub chart: ChartConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    pub path: Option<PathBuf>,
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub reload: ReloadPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub default_genres: Vec<String>,
    /// Inclusive [start, end]
    pub default_year_range: [i64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub show_legend: bool,
    /// "png" or "svg"
    pub export_format: String,
    pub export_width: u32,
    pub export_height: u32,
    /// Directory for exported charts; the working directory when unset
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "warn,genre_trends=debug"
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub error: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub keybind_hints: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub cell_editing: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub modal_border_error: String,
    pub chart_series_color_1: String,
    pub chart_series_color_2: String,
    pub chart_series_color_3: String,
    pub chart_series_color_4: String,
    pub chart_series_color_5: String,
    pub chart_series_color_6: String,
    pub chart_series_color_7: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            data: DataConfig::default(),
            selection: SelectionConfig::default(),
            chart: ChartConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            default_year_range: [DEFAULT_YEAR_RANGE.0, DEFAULT_YEAR_RANGE.1],
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            export_format: "png".to_string(),
            export_width: DEFAULT_EXPORT_SIZE.0,
            export_height: DEFAULT_EXPORT_SIZE.1,
            export_dir: None,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            colors: ColorConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            keybind_hints: "cyan".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "indexed(236)".to_string(),
            cell_editing: "yellow".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            modal_border_error: "red".to_string(),
            chart_series_color_1: "cyan".to_string(),
            chart_series_color_2: "magenta".to_string(),
            chart_series_color_3: "green".to_string(),
            chart_series_color_4: "yellow".to_string(),
            chart_series_color_5: "blue".to_string(),
            chart_series_color_6: "red".to_string(),
            chart_series_color_7: "bright_cyan".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    /// Load using an explicit config directory
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        if let Some(user_config) = Self::load_user_config(manager)? {
            config.merge(user_config);
        }
        config.validate()?;
        Ok(config)
    }

    fn load_user_config(manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = manager.config_path(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        let parsed = toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })?;
        tracing::debug!(path = %config_path.display(), "loaded user config");
        Ok(Some(parsed))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.data.merge(other.data);
        self.selection.merge(other.selection);
        self.chart.merge(other.chart);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.logging.merge(other.logging);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        let [start, end] = self.selection.default_year_range;
        if start > end {
            return Err(eyre!(
                "default_year_range start ({}) must not exceed end ({})",
                start,
                end
            ));
        }

        if self.chart.export_width == 0 || self.chart.export_height == 0 {
            return Err(eyre!("export_width and export_height must be greater than 0"));
        }
        self.chart.export_format()?;

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .map_err(|e| eyre!("Invalid logging level '{}': {}", self.logging.level, e))?;

        Ok(())
    }

    pub fn selection_defaults(&self) -> SelectionDefaults {
        let [start, end] = self.selection.default_year_range;
        SelectionDefaults {
            genres: self.selection.default_genres.clone(),
            year_range: YearRange::new(start, end),
        }
    }
}

// Merge implementations for each config section
impl DataConfig {
    pub fn merge(&mut self, other: Self) {
        if other.path.is_some() {
            self.path = other.path;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.reload != ReloadPolicy::default() {
            self.reload = other.reload;
        }
    }
}

impl SelectionConfig {
    pub fn merge(&mut self, other: Self) {
        let default = SelectionConfig::default();
        if other.default_genres != default.default_genres {
            self.default_genres = other.default_genres;
        }
        if other.default_year_range != default.default_year_range {
            self.default_year_range = other.default_year_range;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.show_legend != default.show_legend {
            self.show_legend = other.show_legend;
        }
        if other.export_format != default.export_format {
            self.export_format = other.export_format;
        }
        if other.export_width != default.export_width {
            self.export_width = other.export_width;
        }
        if other.export_height != default.export_height {
            self.export_height = other.export_height;
        }
        if other.export_dir.is_some() {
            self.export_dir = other.export_dir;
        }
    }

    pub fn export_format(&self) -> Result<ChartExportFormat> {
        ChartExportFormat::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(self.export_format.trim()))
            .ok_or_else(|| {
                eyre!(
                    "Invalid export_format: {}. Must be 'png' or 'svg'",
                    self.export_format
                )
            })
    }

    pub fn export_size(&self) -> (u32, u32) {
        (self.export_width, self.export_height)
    }

    /// Export directory with a leading `~` expanded; the working directory when unset
    pub fn export_dir(&self) -> PathBuf {
        match &self.export_dir {
            Some(dir) => match (dir.strip_prefix("~"), dirs::home_dir()) {
                (Ok(rest), Some(home)) => home.join(rest),
                _ => dir.clone(),
            },
            None => PathBuf::from("."),
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.level != LoggingConfig::default().level {
            self.level = other.level;
        }
    }
}

impl ColorConfig {
    /// Every (theme key, color string) pair
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("primary", self.primary.as_str()),
            ("secondary", self.secondary.as_str()),
            ("error", self.error.as_str()),
            ("dimmed", self.dimmed.as_str()),
            ("background", self.background.as_str()),
            ("controls_bg", self.controls_bg.as_str()),
            ("keybind_hints", self.keybind_hints.as_str()),
            ("text_primary", self.text_primary.as_str()),
            ("text_secondary", self.text_secondary.as_str()),
            ("table_header", self.table_header.as_str()),
            ("table_header_bg", self.table_header_bg.as_str()),
            ("cell_editing", self.cell_editing.as_str()),
            ("modal_border", self.modal_border.as_str()),
            ("modal_border_active", self.modal_border_active.as_str()),
            ("modal_border_error", self.modal_border_error.as_str()),
            ("chart_series_color_1", self.chart_series_color_1.as_str()),
            ("chart_series_color_2", self.chart_series_color_2.as_str()),
            ("chart_series_color_3", self.chart_series_color_3.as_str()),
            ("chart_series_color_4", self.chart_series_color_4.as_str()),
            ("chart_series_color_5", self.chart_series_color_5.as_str()),
            ("chart_series_color_6", self.chart_series_color_6.as_str()),
            ("chart_series_color_7", self.chart_series_color_7.as_str()),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();

        macro_rules! merge_colors {
            ($($field:ident),* $(,)?) => {
                $(
                    if other.$field != default.$field {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        merge_colors!(
            primary,
            secondary,
            error,
            dimmed,
            background,
            controls_bg,
            keybind_hints,
            text_primary,
            text_secondary,
            table_header,
            table_header_bg,
            cell_editing,
            modal_border,
            modal_border_active,
            modal_border_error,
            chart_series_color_1,
            chart_series_color_2,
            chart_series_color_3,
            chart_series_color_4,
            chart_series_color_5,
            chart_series_color_6,
            chart_series_color_7,
        );
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parser with fixed capabilities, ignoring the environment
    pub fn with_capabilities(supports_true_color: bool, supports_256: bool) -> Self {
        Self {
            supports_true_color,
            supports_256,
            no_color: false,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        let trimmed = s.trim();
        let color = Self::parse_spec(trimmed)?;
        if self.no_color {
            return Ok(Color::Reset);
        }
        Ok(match color {
            Color::Rgb(r, g, b) => self.convert_rgb_to_terminal_color(r, g, b),
            other => other,
        })
    }

    fn parse_spec(trimmed: &str) -> Result<Color> {
        if trimmed.starts_with('#') {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(Color::Rgb(r, g, b));
        }

        let lower = trimmed.to_lowercase();
        if let Some(num_str) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = num_str.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.replace(' ', "_").as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" => Ok(Color::Indexed(8)),
            "bright_red" => Ok(Color::Indexed(9)),
            "bright_green" => Ok(Color::Indexed(10)),
            "bright_yellow" => Ok(Color::Indexed(11)),
            "bright_blue" => Ok(Color::Indexed(12)),
            "bright_magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" => Ok(Color::Indexed(14)),
            "bright_white" => Ok(Color::Indexed(15)),

            "gray" | "grey" | "dark_gray" | "dark_grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light_grey" => Ok(Color::Indexed(7)),

            "reset" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 || !s.is_ascii() {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| eyre!("Invalid hex color: {}", s))
    };
    Ok((component(1..3)?, component(3..5)?, component(5..7)?))
}

/// Nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        return match gray {
            0..=7 => 16,
            248..=u16::MAX => 231,
            _ => 232 + ((gray - 8) * 24 / 240) as u8,
        };
    }

    // 6x6x6 color cube (16-231)
    let level = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Parse every color in the theme config
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Self::from_config_with(config, &ColorParser::new())
    }

    pub fn from_config_with(config: &ThemeConfig, parser: &ColorParser) -> Result<Self> {
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config_with(
            &ThemeConfig::default(),
            &ColorParser::with_capabilities(false, true),
        )
        .unwrap_or_else(|_| Self {
            colors: HashMap::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
