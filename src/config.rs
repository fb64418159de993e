//! Application configuration.
//!
//! Handles loading, validating, and merging `quotecard.toml`. The file is
//! sparse: stock defaults are the base layer and user values are merged on
//! top, so a config only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [queue]
//! target_size = 7          # Backlog size to maintain (pending + approved)
//! synthetic_ratio = 0.4    # Share of each batch drawn from the synthetic source
//! retention_days = 30      # Age after which rejected/published items are purged
//!
//! [pacing]
//! strategy = "fixed"       # fixed | backoff | none
//! delay_ms = 2000
//! max_delay_ms = 30000     # Cap for backoff
//!
//! [layout]
//! width = 1080
//! height = 1350
//! chars_per_line = 25
//! # ... see `stock_config_toml()` for every key
//!
//! [store]
//! path = "quotecard-store.json"
//!
//! [providers]
//! timeout_secs = 30
//!
//! [pipeline]
//! record_failures = false
//!
//! [daemon]
//! fill_hour = 6
//! cleanup_weekday = "sun"
//! cleanup_hour = 3
//! stats_interval_minutes = 60
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! API keys are never read from this file. `ANTHROPIC_API_KEY` and
//! `GEMINI_API_KEY` come from the environment (or a `.env` file).
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{FontSpec, LayoutParams, Quality};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quotecard.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `quotecard.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub pacing: PacingConfig,
    pub layout: LayoutConfig,
    pub store: StoreConfig,
    pub providers: ProvidersConfig,
    pub pipeline: PipelineConfig,
    pub daemon: DaemonConfig,
    pub logging: LoggingConfig,
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.target_size == 0 {
            return Err(validation("queue.target_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.queue.synthetic_ratio) {
            return Err(validation("queue.synthetic_ratio must be between 0 and 1"));
        }
        if self.queue.retention_days == 0 {
            return Err(validation("queue.retention_days must be at least 1"));
        }
        if self.pacing.strategy == PacingStrategy::Backoff
            && self.pacing.max_delay_ms < self.pacing.delay_ms
        {
            return Err(validation("pacing.max_delay_ms must be >= pacing.delay_ms"));
        }

        let layout = &self.layout;
        if layout.width == 0 || layout.height == 0 {
            return Err(validation("layout.width and layout.height must be non-zero"));
        }
        if layout.chars_per_line == 0 {
            return Err(validation("layout.chars_per_line must be at least 1"));
        }
        if layout.line_height == 0 {
            return Err(validation("layout.line_height must be non-zero"));
        }
        if layout.quote_font_size == 0 || layout.author_font_size == 0 {
            return Err(validation("layout font sizes must be non-zero"));
        }
        if !(0.0..=1.0).contains(&layout.overlay_opacity) {
            return Err(validation("layout.overlay_opacity must be between 0 and 1"));
        }
        if !(1..=100).contains(&layout.quality) {
            return Err(validation("layout.quality must be 1-100"));
        }

        if self.store.path.as_os_str().is_empty() {
            return Err(validation("store.path must not be empty"));
        }
        if self.providers.timeout_secs == 0 {
            return Err(validation("providers.timeout_secs must be at least 1"));
        }
        if self.providers.synthetic.max_chars < 4 {
            return Err(validation("providers.synthetic.max_chars must be at least 4"));
        }

        if self.daemon.fill_hour > 23 || self.daemon.cleanup_hour > 23 {
            return Err(validation("daemon hours must be 0-23"));
        }
        if self.daemon.stats_interval_minutes == 0 {
            return Err(validation("daemon.stats_interval_minutes must be at least 1"));
        }
        Ok(())
    }
}

/// Backlog sizing and retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub target_size: usize,
    pub synthetic_ratio: f64,
    pub retention_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            target_size: 7,
            synthetic_ratio: 0.4,
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingStrategy {
    Fixed,
    Backoff,
    None,
}

/// Delay between successive items in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    pub strategy: PacingStrategy,
    pub delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            strategy: PacingStrategy::Fixed,
            delay_ms: 2000,
            max_delay_ms: 30_000,
        }
    }
}

/// Card geometry and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub chars_per_line: usize,
    pub line_height: u32,
    pub block_padding: u32,
    pub top_bias: i32,
    pub author_gap: u32,
    pub quote_font_size: u32,
    pub author_font_size: u32,
    pub quote_font_family: String,
    pub author_font_family: String,
    /// Extra font file; when set it also backs the generic families.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    pub overlay_opacity: f32,
    pub quality: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1350,
            chars_per_line: 25,
            line_height: 80,
            block_padding: 120,
            top_bias: 80,
            author_gap: 60,
            quote_font_size: 64,
            author_font_size: 40,
            quote_font_family: "serif".to_string(),
            author_font_family: "sans-serif".to_string(),
            font_path: None,
            overlay_opacity: 0.4,
            quality: 90,
        }
    }
}

impl LayoutConfig {
    /// Layout parameters for the renderer.
    pub fn params(&self) -> LayoutParams {
        LayoutParams {
            width: self.width,
            height: self.height,
            chars_per_line: self.chars_per_line,
            line_height: self.line_height,
            block_padding: self.block_padding,
            top_bias: self.top_bias,
            author_gap: self.author_gap,
            quote_font: FontSpec {
                family: self.quote_font_family.clone(),
                size: self.quote_font_size,
                italic: true,
                stroke_width: 3.0,
            },
            author_font: FontSpec {
                family: self.author_font_family.clone(),
                size: self.author_font_size,
                italic: false,
                stroke_width: 2.0,
            },
            overlay_opacity: self.overlay_opacity,
            quality: Quality::new(self.quality),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("quotecard-store.json"),
        }
    }
}

/// External provider endpoints. Keys come from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Per-request timeout for every provider call.
    pub timeout_secs: u64,
    pub curated: CuratedConfig,
    pub synthetic: SyntheticConfig,
    pub art: ArtConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            curated: CuratedConfig::default(),
            synthetic: SyntheticConfig::default(),
            art: ArtConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CuratedConfig {
    pub zenquotes_url: String,
    pub quotable_url: String,
}

impl Default for CuratedConfig {
    fn default() -> Self {
        Self {
            zenquotes_url: "https://zenquotes.io/api/random".to_string(),
            quotable_url: "https://api.quotable.io/random?tags=inspirational|motivational|wisdom"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Generated quotes longer than this are truncated with an ellipsis.
    pub max_chars: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 150,
            max_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtKind {
    Imagen,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtConfig {
    pub kind: ArtKind,
    pub api_url: String,
    pub model: String,
    pub aspect_ratio: String,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            kind: ArtKind::Imagen,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "imagen-4.0-generate-001".to_string(),
            aspect_ratio: "3:4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Persist a `failed` row when a generation run fails after the quote
    /// was chosen.
    pub record_failures: bool,
}

/// Schedule for the long-running `daemon` command, in local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub fill_hour: u32,
    #[serde(with = "weekday_name")]
    pub cleanup_weekday: Weekday,
    pub cleanup_hour: u32,
    pub stats_interval_minutes: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            fill_hour: 6,
            cleanup_weekday: Weekday::Sun,
            cleanup_hour: 3,
            stats_interval_minutes: 60,
        }
    }
}

/// Weekdays as lowercase three-letter names (`"sun"`); parsing accepts any
/// form chrono understands (`"Sunday"`, `"SUN"`).
mod weekday_name {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&day.to_string().to_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| D::Error::custom(format!("invalid weekday '{raw}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive; `QUOTECARD_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults. Otherwise user values are
/// merged on top of the defaults, unknown keys rejected, and the result
/// validated.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `quotecard.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Quotecard Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# API keys are read from the environment (or a .env file), never from here:
#   ANTHROPIC_API_KEY  enables synthetic quotes
#   GEMINI_API_KEY     enables Imagen background art
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Queue
# ---------------------------------------------------------------------------
[queue]
# Number of items to keep in the backlog (pending + approved).
target_size = 7

# Share of each batch drawn from the synthetic quote source (0.0 - 1.0).
# Ignored when ANTHROPIC_API_KEY is not set.
synthetic_ratio = 0.4

# Rejected and published items older than this are removed by cleanup.
retention_days = 30

# ---------------------------------------------------------------------------
# Pacing between items in a batch
# ---------------------------------------------------------------------------
[pacing]
# fixed   - wait delay_ms after every item
# backoff - double the wait after each consecutive failure, up to max_delay_ms
# none    - no waiting
strategy = "fixed"
delay_ms = 2000
max_delay_ms = 30000

# ---------------------------------------------------------------------------
# Card layout
# ---------------------------------------------------------------------------
[layout]
width = 1080
height = 1350

# Words wrap once a line would exceed this many characters.
chars_per_line = 25
line_height = 80

# Extra block height below the quote lines, reserved for the author line.
block_padding = 120

# Pushes the centred block down by this many pixels.
top_bias = 80

# Distance from the last quote line to the author line.
author_gap = 60

quote_font_size = 64
author_font_size = 40
quote_font_family = "serif"
author_font_family = "sans-serif"

# Optional font file (TTF/OTF). When set it is also used for the generic
# "serif" and "sans-serif" families.
# font_path = "fonts/Lora-Italic.ttf"

# Opacity of the dark scrim drawn over the background (0.0 - 1.0).
overlay_opacity = 0.4

# JPEG quality (1 - 100).
quality = 90

# ---------------------------------------------------------------------------
# Item store
# ---------------------------------------------------------------------------
[store]
# JSON document holding every item. Written atomically after each change.
path = "quotecard-store.json"

# ---------------------------------------------------------------------------
# Providers
# ---------------------------------------------------------------------------
[providers]
# Per-request timeout for all provider calls.
timeout_secs = 30

[providers.curated]
# Tried in order; the built-in default quote is used if both fail.
zenquotes_url = "https://zenquotes.io/api/random"
quotable_url = "https://api.quotable.io/random?tags=inspirational|motivational|wisdom"

[providers.synthetic]
api_url = "https://api.anthropic.com"
model = "claude-3-haiku-20240307"
max_tokens = 150

# Longer output is cut to max_chars - 3 characters plus "...".
max_chars = 150

[providers.art]
# imagen - Google Imagen (needs GEMINI_API_KEY)
# flat   - offline solid colour background
kind = "imagen"
api_url = "https://generativelanguage.googleapis.com/v1beta"
model = "imagen-4.0-generate-001"
aspect_ratio = "3:4"

# ---------------------------------------------------------------------------
# Pipeline
# ---------------------------------------------------------------------------
[pipeline]
# Store a "failed" item with the error message when generation fails.
record_failures = false

# ---------------------------------------------------------------------------
# Daemon schedule (local time)
# ---------------------------------------------------------------------------
[daemon]
fill_hour = 6
cleanup_weekday = "sun"
cleanup_hour = 3
stats_interval_minutes = 60

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Filter directive, e.g. "debug" or "quotecard=debug,reqwest=warn".
# The QUOTECARD_LOG environment variable takes precedence.
level = "info"

# text | json
format = "text"
"##
}
