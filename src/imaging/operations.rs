//! High-level card operations.
//!
//! [`plan_card`] is pure: it validates the quote, wraps it, places every
//! line and builds the overlay markup. [`QuoteCardRenderer`] pairs a plan
//! with a backend to produce the final JPEG.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{BlockMetrics, place_block, wrap_text};
use super::markup::{TextRun, overlay_svg};
use super::params::{ComposeParams, LayoutParams};
use std::sync::Arc;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// A fully laid-out card, ready for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPlan {
    /// Quote lines as drawn, with the opening mark on the first line and the
    /// closing mark on the last.
    pub lines: Vec<String>,
    pub line_baselines: Vec<i32>,
    /// `"— Author"`, absent when the quote has no author.
    pub author_line: Option<String>,
    pub author_baseline: i32,
    pub overlay_svg: String,
}

/// Lay out `quote` and `author` on the card described by `params`.
///
/// Fails with [`BackendError::InvalidInput`] when the quote has no visible
/// text. A blank author is treated as no author.
pub fn plan_card(quote: &str, author: Option<&str>, params: &LayoutParams) -> Result<CardPlan> {
    let mut lines = wrap_text(quote, params.chars_per_line);
    if lines.is_empty() {
        return Err(BackendError::InvalidInput("quote text is empty".to_string()));
    }
    if let Some(first) = lines.first_mut() {
        first.insert(0, '"');
    }
    if let Some(last) = lines.last_mut() {
        last.push('"');
    }

    let author_line = author
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| format!("— {a}"));

    let placement = place_block(
        lines.len(),
        &BlockMetrics {
            canvas_height: params.height,
            line_height: params.line_height,
            block_padding: params.block_padding,
            top_bias: params.top_bias,
            author_gap: params.author_gap,
        },
    );

    let mut runs: Vec<TextRun<'_>> = lines
        .iter()
        .zip(&placement.line_baselines)
        .map(|(line, &baseline)| TextRun {
            text: line,
            baseline,
            font: &params.quote_font,
        })
        .collect();
    if let Some(author_line) = &author_line {
        runs.push(TextRun {
            text: author_line,
            baseline: placement.author_baseline,
            font: &params.author_font,
        });
    }
    let overlay_svg = overlay_svg(params, &runs);

    Ok(CardPlan {
        lines,
        line_baselines: placement.line_baselines,
        author_line,
        author_baseline: placement.author_baseline,
        overlay_svg,
    })
}

/// Renders quote cards with a shared backend.
#[derive(Clone)]
pub struct QuoteCardRenderer {
    backend: Arc<dyn ImageBackend>,
    params: LayoutParams,
}

impl QuoteCardRenderer {
    pub fn new(backend: Arc<dyn ImageBackend>, params: LayoutParams) -> Self {
        Self { backend, params }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Synchronous render: plan, then composite onto `background`.
    pub fn render(&self, background: &[u8], quote: &str, author: Option<&str>) -> Result<Vec<u8>> {
        let plan = plan_card(quote, author, &self.params)?;
        debug!(
            lines = plan.lines.len(),
            has_author = plan.author_line.is_some(),
            "planned quote card"
        );
        self.backend.compose(&ComposeParams {
            background,
            overlay_svg: &plan.overlay_svg,
            width: self.params.width,
            height: self.params.height,
            quality: self.params.quality,
        })
    }

    /// Render on the blocking pool so decoding and rasterizing never stall
    /// the async runtime.
    pub async fn render_blocking(
        &self,
        background: Vec<u8>,
        quote: String,
        author: Option<String>,
    ) -> Result<Vec<u8>> {
        let renderer = self.clone();
        tokio::task::spawn_blocking(move || {
            renderer.render(&background, &quote, author.as_deref())
        })
        .await
        .map_err(|e| BackendError::Task(e.to_string()))?
    }
}
