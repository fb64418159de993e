//! Parameter types for card rendering.
//!
//! These structs describe *what* to draw, not *how*. [`LayoutParams`] feeds
//! the pure layout planner in [`operations`](super::operations);
//! [`ComposeParams`] is the interface to the [`backend`](super::backend),
//! which does the pixel work. The split lets tests swap in a mock backend
//! without touching layout logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`FontSpec`]: family, size, style and outline for one text run.
//! - [`LayoutParams`]: canvas size, wrap budget, vertical metrics and fonts.
//! - [`ComposeParams`]: background bytes + overlay markup + output settings.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// How one run of text is drawn: white fill with a black outline.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
    pub italic: bool,
    pub stroke_width: f32,
}

/// Full description of a quote card's geometry and typography.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub width: u32,
    pub height: u32,
    /// Wrap budget per line, in characters.
    pub chars_per_line: usize,
    pub line_height: u32,
    pub block_padding: u32,
    pub top_bias: i32,
    pub author_gap: u32,
    pub quote_font: FontSpec,
    pub author_font: FontSpec,
    /// Opacity of the black scrim drawn over the whole background.
    pub overlay_opacity: f32,
    pub quality: Quality,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1350,
            chars_per_line: 25,
            line_height: 80,
            block_padding: 120,
            top_bias: 80,
            author_gap: 60,
            quote_font: FontSpec {
                family: "serif".to_string(),
                size: 64,
                italic: true,
                stroke_width: 3.0,
            },
            author_font: FontSpec {
                family: "sans-serif".to_string(),
                size: 40,
                italic: false,
                stroke_width: 2.0,
            },
            overlay_opacity: 0.4,
            quality: Quality::default(),
        }
    }
}

/// Parameters for one compose operation: fill the canvas with the
/// background, draw the overlay on top, encode as JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeParams<'a> {
    pub background: &'a [u8],
    pub overlay_svg: &'a str,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
