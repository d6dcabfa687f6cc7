//! Greedy word-wrapping for field text.
//!
//! The layout engine is deliberately font-agnostic: it takes a measurement
//! closure so the same wrapping runs identically at design time (editor
//! previews) and at generation time. Words are split on single spaces and
//! never hyphenated; a word wider than the box goes on its own line and the
//! overflow is accepted.

/// Line height as a multiple of font size.
///
/// Fixed multiplier rather than real ascent/descent metrics: the auto-fit
/// search and the renderer must agree on this value, so it lives here.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Wrap `text` into lines no wider than `max_width`, as measured by `measure`.
///
/// Never returns an empty vector: empty input produces a single empty line.
pub fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut started = false;

    for word in text.split(' ') {
        if !started {
            current.push_str(word);
            started = true;
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    lines.push(current);
    lines
}

/// Total rendered height of `line_count` lines at `font_size`.
pub fn block_height(line_count: usize, font_size: f32) -> f32 {
    line_count as f32 * font_size * LINE_HEIGHT_FACTOR
}
