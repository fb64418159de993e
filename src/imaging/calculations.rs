//! Pure layout and dimension math.
//!
//! All functions here are pure and testable without any I/O or images.

/// Greedily wrap `text` into lines of at most `max_chars` characters.
///
/// Words are accumulated while the candidate line (current + space + next
/// word) still fits; otherwise the current line is flushed. A word longer
/// than the budget is placed alone on its own line, never split. Length is
/// counted in Unicode scalar values, so identical input always wraps the
/// same way regardless of font.
///
/// # Examples
/// ```
/// # use quotecard::imaging::wrap_text;
/// assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
/// ```
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Vertical metrics for a quote block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMetrics {
    pub canvas_height: u32,
    pub line_height: u32,
    /// Extra height reserved below the quote lines (covers the author line).
    pub block_padding: u32,
    /// Added to the centred start position.
    pub top_bias: i32,
    /// Distance from the last quote baseline slot to the author baseline.
    pub author_gap: u32,
}

/// Baselines for one laid-out block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlacement {
    /// Baseline of each quote line, top to bottom.
    pub line_baselines: Vec<i32>,
    pub author_baseline: i32,
}

/// Centre a block of `line_count` lines on the canvas.
///
/// ```text
/// block_height = line_count × line_height + block_padding
/// start_y      = (canvas_height − block_height) / 2 + top_bias
/// baseline[i]  = start_y + i × line_height
/// author       = start_y + line_count × line_height + author_gap
/// ```
pub fn place_block(line_count: usize, metrics: &BlockMetrics) -> BlockPlacement {
    let line_height = metrics.line_height as i32;
    let lines = line_count as i32;
    let block_height = lines * line_height + metrics.block_padding as i32;
    let start_y = (metrics.canvas_height as i32 - block_height) / 2 + metrics.top_bias;

    BlockPlacement {
        line_baselines: (0..lines).map(|i| start_y + i * line_height).collect(),
        author_baseline: start_y + lines * line_height + metrics.author_gap as i32,
    }
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Wider: height matches, width overflows
        let w = ((tgt_h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, tgt_h)
    } else {
        // Taller: width matches, height overflows
        let h = ((tgt_w as f64 / src_aspect).round() as u32).max(tgt_h);
        (tgt_w, h)
    }
}

/// Top-left offset that centres a `target` crop inside `filled`.
pub fn center_crop_offset(filled: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(target.0) / 2,
        filled.1.saturating_sub(target.1) / 2,
    )
}
