//! Standalone SVG rendering of a computed [`OrgChartLayout`].
//!
//! Connectors are drawn first so cards sit on top of the lines.

use crate::layout::{OrgChartLayout, PositionedEntry};

/// Connector stroke colour.
pub const CONNECTOR_STROKE: &str = "#94a3b8";

/// Connector stroke width.
pub const CONNECTOR_WIDTH: u32 = 2;

const ACCENT_WIDTH: f64 = 4.0;
const PHOTO_SIZE: f64 = 56.0;
const PADDING: f64 = 10.0;

/// Render `layout` as a complete SVG document.
pub fn render_svg(layout: &OrgChartLayout) -> String {
    let width = layout.canvas_width();
    let height = layout.canvas_height();

    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );

    out.push_str(&format!(
        "  <g class=\"connectors\" fill=\"none\" stroke=\"{CONNECTOR_STROKE}\" stroke-width=\"{CONNECTOR_WIDTH}\">\n"
    ));
    for connector in &layout.connectors {
        out.push_str(&format!(
            "    <path data-parent=\"{}\" data-child=\"{}\" d=\"{}\"/>\n",
            connector.parent_id,
            connector.child_id,
            connector.svg_path()
        ));
    }
    out.push_str("  </g>\n");

    out.push_str("  <g class=\"cards\">\n");
    for placed in &layout.entries {
        out.push_str(&render_card(placed, layout));
    }
    out.push_str("  </g>\n</svg>\n");
    out
}

fn render_card(placed: &PositionedEntry, layout: &OrgChartLayout) -> String {
    let w = layout.config.card_width;
    let h = layout.config.card_height;
    let (x, y) = (placed.x, placed.y);
    let entry = &placed.entry;

    let mut out = format!("    <g class=\"card\" data-id=\"{}\">\n", entry.id);
    out.push_str(&format!(
        "      <rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"8\" fill=\"#ffffff\" stroke=\"#e2e8f0\"/>\n"
    ));
    out.push_str(&format!(
        "      <rect x=\"{x}\" y=\"{y}\" width=\"{ACCENT_WIDTH}\" height=\"{h}\" fill=\"{}\"/>\n",
        entry.role.accent_color()
    ));

    let photo_x = x + PADDING;
    let photo_y = y + (h - PHOTO_SIZE) / 2.0;
    if entry.has_photo() {
        out.push_str(&format!(
            "      <image x=\"{photo_x}\" y=\"{photo_y}\" width=\"{PHOTO_SIZE}\" height=\"{PHOTO_SIZE}\" href=\"{}\"/>\n",
            escape(&entry.photo)
        ));
    } else {
        out.push_str(&format!(
            "      <rect x=\"{photo_x}\" y=\"{photo_y}\" width=\"{PHOTO_SIZE}\" height=\"{PHOTO_SIZE}\" fill=\"#f1f5f9\"/>\n"
        ));
    }

    let text_x = photo_x + PADDING + PHOTO_SIZE;
    out.push_str(&format!(
        "      <text x=\"{text_x}\" y=\"{}\" font-size=\"14\" font-weight=\"600\">{}</text>\n",
        y + h / 2.0 - 4.0,
        escape(entry.display_name())
    ));
    out.push_str(&format!(
        "      <text x=\"{text_x}\" y=\"{}\" font-size=\"12\" fill=\"#64748b\">{}</text>\n",
        y + h / 2.0 + 14.0,
        escape(&entry.position)
    ));
    out.push_str("    </g>\n");
    out
}

/// Escape text for use in XML content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
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
