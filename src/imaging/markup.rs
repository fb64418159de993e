//! SVG overlay markup for a planned card.
//!
//! Everything user-controlled (quote text, author, font family names) passes
//! through [`escape_markup`] before it is spliced into the document, so
//! arbitrary input can never break the overlay structure.

use super::params::{FontSpec, LayoutParams};

/// Escape the five XML special characters.
///
/// Single pass over the input, so the entities it emits are never re-escaped.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// A single positioned text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub baseline: i32,
    pub font: &'a FontSpec,
}

fn text_element(run: &TextRun<'_>, center_x: u32) -> String {
    let style = if run.font.italic { "italic" } else { "normal" };
    format!(
        r#"  <text x="{center_x}" y="{y}" text-anchor="middle" font-family="{family}" font-size="{size}" font-style="{style}" fill="white" stroke="black" stroke-width="{stroke}" paint-order="stroke">{text}</text>
"#,
        y = run.baseline,
        family = escape_markup(&run.font.family),
        size = run.font.size,
        stroke = run.font.stroke_width,
        text = escape_markup(run.text),
    )
}

/// Build the overlay document: a translucent scrim over the whole canvas
/// followed by the centred text runs.
pub fn overlay_svg(params: &LayoutParams, runs: &[TextRun<'_>]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
"#,
        w = params.width,
        h = params.height,
    );
    svg.push_str(&format!(
        r#"  <rect x="0" y="0" width="{}" height="{}" fill="black" fill-opacity="{}"/>
"#,
        params.width, params.height, params.overlay_opacity,
    ));
    let center_x = params.width / 2;
    for run in runs {
        svg.push_str(&text_element(run, center_x));
    }
    svg.push_str("</svg>\n");
    svg
}
