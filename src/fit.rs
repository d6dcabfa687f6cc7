//! Auto-fit font sizing.
//!
//! Binary search for the largest integer font size whose wrapped text block
//! fits a field's box. Runs per field per row; different values wrap into
//! different line counts at the same size, so the result cannot be cached
//! across rows.

use crate::fonts::FontRegistry;
use crate::layout::{block_height, wrap};
use crate::template::FontStyle;

/// Smallest size the search will return. Text that still overflows at the
/// floor is rendered anyway; overflow is accepted, not reported.
pub const MIN_FONT_SIZE: u32 = 6;

/// Upper bound when a field has no configured starting size.
pub const DEFAULT_MAX_FONT_SIZE: u32 = 200;

/// Find the largest integer font size in `[MIN_FONT_SIZE, max_size]` such
/// that `text`, wrapped to `box_width`, has a total rendered height within
/// `box_height`.
///
/// `measure(size, line)` reports the rendered width of one line at one
/// candidate size. Total height per candidate is
/// `lines * size * LINE_HEIGHT_FACTOR`, the same formula the renderer uses.
pub fn fit_font_size(
    text: &str,
    box_width: f32,
    box_height: f32,
    max_size: u32,
    measure: impl Fn(u32, &str) -> f32,
) -> u32 {
    let mut lo = MIN_FONT_SIZE;
    let mut hi = max_size.max(MIN_FONT_SIZE);
    let mut best = MIN_FONT_SIZE;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let lines = wrap(text, box_width, |line| measure(mid, line));
        if block_height(lines.len(), mid as f32) <= box_height {
            best = mid;
            lo = mid + 1;
        } else if mid == MIN_FONT_SIZE {
            break;
        } else {
            hi = mid - 1;
        }
    }
    best
}

/// [`fit_font_size`] measured against a registry face.
pub fn fit_to_box(
    registry: &FontRegistry,
    style: FontStyle,
    text: &str,
    box_width: f32,
    box_height: f32,
    max_size: u32,
) -> u32 {
    fit_font_size(text, box_width, box_height, max_size, |size, line| {
        registry.line_width(style, size as f32, line)
    })
}
