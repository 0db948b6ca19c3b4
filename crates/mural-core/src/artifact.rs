//! Render styles, render results and export planning.
//!
//! The external renderer turns diagram source into one of two artifact kinds:
//! structured vector markup (SVG) or a text grid. This module models those
//! artifacts and measures them so the viewport and exporters know how large
//! the rendered surface is.
//!
//! # Overview
//!
//! - [`RenderStyle`] - Which kind of artifact the renderer should produce.
//! - [`RenderResult`] - The current outcome of a render: an artifact or a failure.
//! - [`ExportScale`] - The fixed set of raster multipliers offered for export.
//! - [`ExportPlan`] - Markup plus measured size plus scale, ready for an exporter.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Size;

/// Error returned when a style or scale name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseArtifactError {
    #[error("unknown render style `{0}` (expected vector, text-color or text-plain)")]
    Style(String),

    #[error("unsupported export scale `{0}` (expected 1, 2, 8 or 16)")]
    Scale(String),
}

/// The kind of artifact requested from the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderStyle {
    /// Structured vector graphics (SVG markup).
    #[default]
    Vector,

    /// A text grid that keeps the renderer's color markup.
    #[serde(rename = "text-color", alias = "text-with-color")]
    TextWithColor,

    /// A plain text grid.
    TextPlain,
}

impl RenderStyle {
    /// All styles, in the order they are offered to users.
    pub const ALL: [RenderStyle; 3] = [
        RenderStyle::Vector,
        RenderStyle::TextWithColor,
        RenderStyle::TextPlain,
    ];

    /// Returns the stable name used in configuration, CLI flags and the
    /// renderer environment.
    pub fn as_str(self) -> &'static str {
        match self {
            RenderStyle::Vector => "vector",
            RenderStyle::TextWithColor => "text-color",
            RenderStyle::TextPlain => "text-plain",
        }
    }

    /// Returns `true` for the two text-grid styles.
    pub fn is_text(self) -> bool {
        !matches!(self, RenderStyle::Vector)
    }
}

impl fmt::Display for RenderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderStyle {
    type Err = ParseArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" | "svg" => Ok(RenderStyle::Vector),
            "text-color" | "text-with-color" => Ok(RenderStyle::TextWithColor),
            "text-plain" | "text" => Ok(RenderStyle::TextPlain),
            _ => Err(ParseArtifactError::Style(s.to_string())),
        }
    }
}

/// Outcome of a render as seen by the rest of the session.
///
/// Exactly one result is current at a time. A failure carries only the
/// renderer's message; it never keeps a stale artifact alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    /// Vector markup for the visual surface.
    Visual(String),

    /// Text-grid markup.
    TextGrid(String),

    /// The renderer rejected the source.
    Failed(String),
}

impl RenderResult {
    /// Returns the artifact markup, or `None` for a failure.
    pub fn markup(&self) -> Option<&str> {
        match self {
            RenderResult::Visual(markup) | RenderResult::TextGrid(markup) => Some(markup),
            RenderResult::Failed(_) => None,
        }
    }

    /// Returns the failure message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            RenderResult::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RenderResult::Failed(_))
    }

    /// Measures the artifact in content units.
    ///
    /// Vector markup is measured from its root element; text grids are
    /// measured in character cells. Failures and unmeasurable markup yield
    /// `None`.
    pub fn measure(&self) -> Option<Size> {
        match self {
            RenderResult::Visual(markup) => measure_svg(markup),
            RenderResult::TextGrid(markup) => measure_text_grid(markup),
            RenderResult::Failed(_) => None,
        }
    }
}

static SVG_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("root element pattern is valid"));

static SVG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s(width|height|viewBox)\s*=\s*["']([^"']*)["']"#)
        .expect("attribute pattern is valid")
});

/// Measures the intrinsic size of SVG markup.
///
/// Uses the root element's `width` and `height` when both are absolute
/// lengths, and falls back to the `viewBox` dimensions otherwise.
///
/// # Examples
///
/// ```
/// # use mural_core::artifact::measure_svg;
/// # use mural_core::geometry::Size;
/// let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300"></svg>"#;
/// assert_eq!(measure_svg(svg), Some(Size::new(400.0, 300.0)));
///
/// let svg = r#"<svg viewBox="0 0 120.5 80" width="100%"></svg>"#;
/// assert_eq!(measure_svg(svg), Some(Size::new(120.5, 80.0)));
/// ```
pub fn measure_svg(markup: &str) -> Option<Size> {
    let root = SVG_ROOT.find(markup)?.as_str();

    let mut width = None;
    let mut height = None;
    let mut view_box = None;
    for caps in SVG_ATTR.captures_iter(root) {
        let value = &caps[2];
        match &caps[1] {
            "width" => width = parse_length(value),
            "height" => height = parse_length(value),
            "viewBox" => view_box = parse_view_box(value),
            _ => {}
        }
    }

    let size = match (width, height) {
        (Some(width), Some(height)) => Size::new(width, height),
        _ => view_box?,
    };
    size.is_usable().then_some(size)
}

/// Parses an absolute SVG length such as `400`, `400px` or `12.5`.
/// Relative lengths (percentages, `em`) are not measurable.
fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|n| n.is_finite())
}

fn parse_view_box(value: &str) -> Option<Size> {
    let numbers: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse::<f32>)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [_, _, width, height] => Some(Size::new(*width, *height)),
        _ => None,
    }
}

/// Measures a text grid in character cells: the widest line by the number of
/// lines. An empty grid has no measurable size.
pub fn measure_text_grid(markup: &str) -> Option<Size> {
    let mut rows = 0usize;
    let mut columns = 0usize;
    for line in markup.lines() {
        rows += 1;
        columns = columns.max(line.chars().count());
    }
    let size = Size::new(columns as f32, rows as f32);
    size.is_usable().then_some(size)
}

/// Raster multipliers offered by exporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExportScale {
    #[default]
    X1,
    X2,
    X8,
    X16,
}

impl ExportScale {
    pub const ALL: [ExportScale; 4] = [
        ExportScale::X1,
        ExportScale::X2,
        ExportScale::X8,
        ExportScale::X16,
    ];

    /// Returns the numeric multiplier.
    pub fn factor(self) -> u32 {
        match self {
            ExportScale::X1 => 1,
            ExportScale::X2 => 2,
            ExportScale::X8 => 8,
            ExportScale::X16 => 16,
        }
    }
}

impl TryFrom<u32> for ExportScale {
    type Error = ParseArtifactError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|scale| scale.factor() == value)
            .ok_or_else(|| ParseArtifactError::Scale(value.to_string()))
    }
}

impl FromStr for ExportScale {
    type Err = ParseArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        trimmed
            .parse::<u32>()
            .map_err(|_| ParseArtifactError::Scale(s.to_string()))
            .and_then(ExportScale::try_from)
    }
}

impl fmt::Display for ExportScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Everything an external exporter needs to rasterize the current surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan<'a> {
    markup: &'a str,
    size: Size,
    scale: ExportScale,
}

impl<'a> ExportPlan<'a> {
    /// Builds a plan for a render result. Returns `None` for failures and
    /// artifacts whose size cannot be measured.
    pub fn for_result(result: &'a RenderResult, scale: ExportScale) -> Option<Self> {
        let markup = result.markup()?;
        let size = result.measure()?;
        Some(Self {
            markup,
            size,
            scale,
        })
    }

    pub fn markup(&self) -> &'a str {
        self.markup
    }

    /// Returns the measured size in content units.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale(&self) -> ExportScale {
        self.scale
    }

    /// Returns the output raster dimensions in pixels, rounded up.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scaled = self.size.scale(self.scale.factor() as f32);
        (scaled.width().ceil() as u32, scaled.height().ceil() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_style_names_roundtrip() {
        for style in RenderStyle::ALL {
            assert_eq!(style.as_str().parse::<RenderStyle>(), Ok(style));
        }
        assert_eq!("SVG".parse::<RenderStyle>(), Ok(RenderStyle::Vector));
        assert!("pdf".parse::<RenderStyle>().is_err());
    }

    #[test]
    fn test_render_style_is_text() {
        assert!(!RenderStyle::Vector.is_text());
        assert!(RenderStyle::TextWithColor.is_text());
        assert!(RenderStyle::TextPlain.is_text());
    }

    #[test]
    fn test_measure_svg_prefers_width_and_height() {
        let svg = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" width="640px" height="480px">
  <rect width="5" height="5"/>
</svg>"#;
        assert_eq!(measure_svg(svg), Some(Size::new(640.0, 480.0)));
    }

    #[test]
    fn test_measure_svg_falls_back_to_view_box() {
        let svg = r#"<svg width="100%" height="100%" viewBox="-8,-8 216 116"><g/></svg>"#;
        assert_eq!(measure_svg(svg), Some(Size::new(216.0, 116.0)));
    }

    #[test]
    fn test_measure_svg_ignores_child_attributes() {
        // The first `width` in the document belongs to a child, not the root.
        let svg = r#"<svg viewBox="0 0 50 60"><rect width="999" height="999"/></svg>"#;
        assert_eq!(measure_svg(svg), Some(Size::new(50.0, 60.0)));
    }

    #[test]
    fn test_measure_svg_unmeasurable() {
        assert_eq!(measure_svg("not markup"), None);
        assert_eq!(measure_svg(r#"<svg width="50%"></svg>"#), None);
        assert_eq!(measure_svg(r#"<svg viewBox="0 0 0 0"></svg>"#), None);
    }

    #[test]
    fn test_measure_text_grid() {
        let grid = "┌───┐\n│ a │\n└───┘\n";
        assert_eq!(measure_text_grid(grid), Some(Size::new(5.0, 3.0)));
        assert_eq!(measure_text_grid(""), None);
    }

    #[test]
    fn test_render_result_accessors() {
        let visual = RenderResult::Visual(r#"<svg width="4" height="2"/>"#.to_string());
        assert_eq!(visual.measure(), Some(Size::new(4.0, 2.0)));
        assert!(visual.markup().is_some());
        assert!(!visual.is_failed());

        let failed = RenderResult::Failed("syntax error".to_string());
        assert_eq!(failed.markup(), None);
        assert_eq!(failed.error_message(), Some("syntax error"));
        assert_eq!(failed.measure(), None);
    }

    #[test]
    fn test_export_scale_parsing() {
        assert_eq!("8".parse::<ExportScale>(), Ok(ExportScale::X8));
        assert_eq!("16x".parse::<ExportScale>(), Ok(ExportScale::X16));
        assert!("4".parse::<ExportScale>().is_err());
        assert!(ExportScale::try_from(3).is_err());
        assert_eq!(ExportScale::X2.to_string(), "2x");
    }

    #[test]
    fn test_export_plan_pixel_size() {
        let result = RenderResult::Visual(r#"<svg width="100.5" height="40"/>"#.to_string());
        let plan = ExportPlan::for_result(&result, ExportScale::X2).expect("measurable");
        assert_eq!(plan.pixel_size(), (201, 80));

        let plan = ExportPlan::for_result(&result, ExportScale::X16).expect("measurable");
        assert_eq!(plan.pixel_size(), (1608, 640));
    }

    #[test]
    fn test_export_plan_rejects_failures() {
        let failed = RenderResult::Failed("boom".to_string());
        assert!(ExportPlan::for_result(&failed, ExportScale::X1).is_none());
    }
}
