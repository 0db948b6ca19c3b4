//! Configuration types for Mural sessions.
//!
//! All types implement [`serde::Deserialize`] with defaults for every field,
//! so a partial configuration file only overrides what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`SessionConfig`] - Starting style and the base address for share links.
//! - [`SchedulerConfig`] - Debounce timing for edits.
//! - [`ViewportConfig`] - Fit-to-view padding.
//! - [`RendererConfig`] - The external renderer command.
//! - [`ThemeConfig`] - Theme options handed to the renderer.
//! - [`CodecConfig`] - Compression backend preference and decode limits.
//!
//! # Example
//!
//! ```
//! # use mural::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.scheduler().debounce().as_millis(), 120);
//! assert!(config.validate().is_ok());
//! ```

use std::{str::FromStr, time::Duration};

use color::DynamicColor;
use serde::Deserialize;

use mural_codec::{DEFAULT_MAX_DECODED_LEN, ShareCodec, backend::BackendPreference};
use mural_core::{artifact::RenderStyle, viewport::DEFAULT_FIT_PADDING};

use crate::error::MuralError;

/// Default quiet period before an edit is rendered.
pub const DEFAULT_DEBOUNCE_MS: u64 = 120;

/// Default base address for share links.
pub const DEFAULT_BASE_URL: &str = "https://mural.dev/";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    session: SessionConfig,

    #[serde(default)]
    scheduler: SchedulerConfig,

    #[serde(default)]
    viewport: ViewportConfig,

    #[serde(default)]
    renderer: RendererConfig,

    #[serde(default)]
    theme: ThemeConfig,

    #[serde(default)]
    codec: CodecConfig,
}

impl AppConfig {
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn renderer(&self) -> &RendererConfig {
        &self.renderer
    }

    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }

    pub fn codec(&self) -> &CodecConfig {
        &self.codec
    }

    /// Sets the style sessions start with.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.session.style = style;
        self
    }

    /// Replaces the renderer section.
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the scheduler section.
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Config`] for an unparsable background color,
    /// a negative or non-finite fit padding, or an unparsable base URL.
    pub fn validate(&self) -> Result<(), MuralError> {
        self.theme.background_color().map_err(MuralError::Config)?;

        let padding = self.viewport.fit_padding;
        if !padding.is_finite() || padding < 0.0 {
            return Err(MuralError::Config(format!(
                "viewport.fit_padding must be a non-negative number, got {padding}"
            )));
        }

        url::Url::parse(&self.session.base_url).map_err(|err| {
            MuralError::Config(format!(
                "session.base_url `{}` is not a valid address: {err}",
                self.session.base_url
            ))
        })?;

        Ok(())
    }
}

/// Session defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Style used when a session opens.
    #[serde(default)]
    style: RenderStyle,

    /// Address share links are built on.
    #[serde(default = "default_base_url")]
    base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            style: RenderStyle::default(),
            base_url: default_base_url(),
        }
    }
}

impl SessionConfig {
    pub fn style(&self) -> RenderStyle {
        self.style
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Render scheduling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Quiet period, in milliseconds, before an edit is rendered.
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl SchedulerConfig {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce_ms: u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Viewport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    /// Margin, in container pixels, kept around a fitted surface.
    #[serde(default = "default_fit_padding")]
    fit_padding: f32,
}

fn default_fit_padding() -> f32 {
    DEFAULT_FIT_PADDING
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_padding: DEFAULT_FIT_PADDING,
        }
    }
}

impl ViewportConfig {
    pub fn fit_padding(&self) -> f32 {
        self.fit_padding
    }
}

/// External renderer settings.
///
/// The command is run once per render with the diagram source on stdin; it
/// must print the rendered markup on stdout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RendererConfig {
    /// Program followed by its arguments.
    #[serde(default)]
    command: Vec<String>,
}

impl RendererConfig {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

/// Theme options passed through to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeConfig {
    /// Renderer-specific theme name.
    #[serde(default)]
    name: Option<String>,

    /// Background color, as a CSS color string.
    #[serde(default)]
    background_color: Option<String>,
}

impl ThemeConfig {
    pub fn new(name: Option<String>, background_color: Option<String>) -> Self {
        Self {
            name,
            background_color,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the configured background color string as written.
    pub fn background_color_str(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    /// Returns the parsed background color, or `None` if none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<DynamicColor>, String> {
        self.background_color
            .as_deref()
            .map(DynamicColor::from_str)
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

/// Share codec settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    backend: BackendPreference,

    /// Largest diagram, in bytes, a share link may decode to.
    #[serde(default = "default_max_decoded_len")]
    max_decoded_len: usize,
}

fn default_max_decoded_len() -> usize {
    DEFAULT_MAX_DECODED_LEN
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            max_decoded_len: DEFAULT_MAX_DECODED_LEN,
        }
    }
}

impl CodecConfig {
    pub fn backend(&self) -> BackendPreference {
        self.backend
    }

    pub fn max_decoded_len(&self) -> usize {
        self.max_decoded_len
    }

    /// Builds the codec described by this section.
    pub fn build(&self) -> ShareCodec {
        ShareCodec::new(self.backend).with_max_decoded_len(self.max_decoded_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> AppConfig {
        toml::from_str(content).expect("test config is valid TOML")
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        assert_eq!(config.scheduler().debounce(), Duration::from_millis(120));
        assert_eq!(config.viewport().fit_padding(), 48.0);
        assert_eq!(config.session().style(), RenderStyle::Vector);
        assert_eq!(config.session().base_url(), DEFAULT_BASE_URL);
        assert!(config.renderer().command().is_empty());
        assert_eq!(config.codec().backend(), BackendPreference::Auto);
        assert_eq!(config.codec().max_decoded_len(), DEFAULT_MAX_DECODED_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = from_toml(
            r##"
            [session]
            style = "text-color"

            [scheduler]
            debounce_ms = 300

            [renderer]
            command = ["mmdc", "--input", "-"]

            [theme]
            name = "forest"
            background_color = "#ffffff"

            [codec]
            backend = "in-process"
            "##,
        );

        assert_eq!(config.session().style(), RenderStyle::TextWithColor);
        assert_eq!(config.session().base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.scheduler().debounce(), Duration::from_millis(300));
        assert_eq!(config.viewport().fit_padding(), 48.0);
        assert_eq!(config.renderer().command(), ["mmdc", "--input", "-"]);
        assert_eq!(config.theme().name(), Some("forest"));
        assert_eq!(config.codec().backend(), BackendPreference::InProcess);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scheduler_config_from_duration() {
        let config = SchedulerConfig::new(Duration::from_millis(250));
        assert_eq!(config.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_background_color() {
        let theme = ThemeConfig::new(Some("dark".to_string()), Some("#1e1e2e".to_string()));
        assert!(matches!(theme.background_color(), Ok(Some(_))));

        let theme = ThemeConfig::new(None, Some("not-a-color".to_string()));
        assert!(theme.background_color().is_err());

        assert!(matches!(ThemeConfig::default().background_color(), Ok(None)));
    }

    #[test]
    fn test_validate_rejects_bad_theme() {
        let mut config = AppConfig::default();
        config.theme = ThemeConfig::new(None, Some("nope(".to_string()));
        assert!(matches!(config.validate(), Err(MuralError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_padding() {
        let mut config = AppConfig::default();
        config.viewport = ViewportConfig { fit_padding: -1.0 };
        assert!(matches!(config.validate(), Err(MuralError::Config(_))));
    }

    #[test]
    fn test_codec_config_builds_codec() {
        let codec = CodecConfig::default().build();
        let token = codec.encode("graph TD").unwrap();
        assert_eq!(codec.decode(&token).unwrap(), "graph TD");
    }
}
