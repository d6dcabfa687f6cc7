//! Field rendering: one positioned field descriptor + one resolved value,
//! drawn onto an RGBA surface.
//!
//! Text is rendered with ab_glyph outlines, anti-aliased via coverage
//! blending. Line placement is top-anchored: the top of each line box lands
//! on its computed y-offset, the same convention the auto-fit math uses, so
//! text that passed the fit check cannot visually overflow its box.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::fit::{DEFAULT_MAX_FONT_SIZE, fit_to_box};
use crate::fonts::FontRegistry;
use crate::layout::{LINE_HEIGHT_FACTOR, wrap};
use crate::template::{Align, TemplateField, VerticalAlign};

/// Draw `text` for `field` onto `surface`.
///
/// Empty text is never drawn (callers skip it; this is a second guard).
/// The font size comes from auto-fit when the field has a box, else from
/// the field's configured size.
pub fn render_field(
    surface: &mut RgbaImage,
    registry: &FontRegistry,
    field: &TemplateField,
    text: &str,
) {
    if text.is_empty() {
        return;
    }

    let font_size = if field.has_box() {
        let max_size = if field.font_size > 0.0 {
            field.font_size.round() as u32
        } else {
            DEFAULT_MAX_FONT_SIZE
        };
        fit_to_box(
            registry,
            field.font_style,
            text,
            field.width,
            field.height,
            max_size,
        ) as f32
    } else {
        field.font_size
    };
    if font_size <= 0.0 {
        return;
    }

    // Without a box there is nothing to wrap against: single line.
    let wrap_width = if field.width > 0.0 {
        field.width
    } else {
        f32::INFINITY
    };
    let lines = wrap(text, wrap_width, |line| {
        registry.line_width(field.font_style, font_size, line)
    });

    let line_height = font_size * LINE_HEIGHT_FACTOR;
    let total_height = lines.len() as f32 * line_height;
    let box_height = if field.height > 0.0 {
        field.height
    } else {
        total_height
    };

    let y_offset = match field.vertical_align {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Middle => (box_height - total_height) / 2.0,
        VerticalAlign::Bottom => box_height - total_height,
    };

    // Box-relative start x per line. Can be negative when a line is wider
    // than the box (overflow is accepted) or for centered point fields.
    let box_width = field.width.max(0.0);
    let line_starts: Vec<f32> = lines
        .iter()
        .map(|line| {
            let line_width = registry.line_width(field.font_style, font_size, line);
            match field.align {
                Align::Left => 0.0,
                Align::Center => (box_width - line_width) / 2.0,
                Align::Right => box_width - line_width,
            }
        })
        .collect();

    let color = parse_fill(&field.fill);
    let font = registry.face(field.font_style);

    if field.rotation == 0.0 {
        for (i, line) in lines.iter().enumerate() {
            draw_line(
                surface,
                font,
                font_size,
                line,
                field.x + line_starts[i],
                field.y + y_offset + i as f32 * line_height,
                color,
            );
        }
    } else {
        draw_rotated(
            surface, font, font_size, &lines, &line_starts, field, y_offset, line_height, color,
        );
    }
}

/// Rotated path: render the text block into a transparent scratch buffer,
/// then composite it with a clockwise rotation about the field's top-left
/// corner. Offsets inside the rotated frame are box-relative, matching the
/// unrotated path's formulas.
#[allow(clippy::too_many_arguments)]
fn draw_rotated(
    surface: &mut RgbaImage,
    font: &FontArc,
    font_size: f32,
    lines: &[String],
    line_starts: &[f32],
    field: &TemplateField,
    y_offset: f32,
    line_height: f32,
    color: Rgba<u8>,
) {
    let scaled = font.as_scaled(font_size);

    // Shift so negative start offsets (overflowing lines) stay in the buffer.
    let min_start = line_starts.iter().copied().fold(0.0f32, f32::min);
    let max_end = lines
        .iter()
        .zip(line_starts)
        .map(|(line, start)| {
            start
                + line
                    .chars()
                    .map(|ch| scaled.h_advance(font.glyph_id(ch)))
                    .sum::<f32>()
        })
        .fold(field.width.max(1.0), f32::max);

    let block_width = (max_end - min_start).ceil().max(1.0) as u32;
    let block_height = (lines.len() as f32 * line_height).ceil().max(1.0) as u32;
    let mut block = RgbaImage::new(block_width, block_height);

    for (i, line) in lines.iter().enumerate() {
        draw_line(
            &mut block,
            font,
            font_size,
            line,
            line_starts[i] - min_start,
            i as f32 * line_height,
            color,
        );
    }

    // Clockwise rotation in screen coordinates (y down).
    let radians = field.rotation.to_radians();
    let (sin, cos) = radians.sin_cos();
    let origin = (field.x, field.y);

    // Block pixel (u, v) sits at box-relative (u + min_start, v + y_offset).
    let to_dest = |u: f32, v: f32| -> (f32, f32) {
        let bx = u + min_start;
        let by = v + y_offset;
        (
            origin.0 + bx * cos - by * sin,
            origin.1 + bx * sin + by * cos,
        )
    };

    // Destination bounding box of the rotated block, clamped to the surface.
    let corners = [
        to_dest(0.0, 0.0),
        to_dest(block_width as f32, 0.0),
        to_dest(0.0, block_height as f32),
        to_dest(block_width as f32, block_height as f32),
    ];
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_x = (corners.iter().map(|c| c.0).fold(0.0f32, f32::max).ceil() as i64)
        .clamp(0, surface.width() as i64) as u32;
    let max_y = (corners.iter().map(|c| c.1).fold(0.0f32, f32::max).ceil() as i64)
        .clamp(0, surface.height() as i64) as u32;

    // Inverse mapping with nearest sampling avoids holes in the output.
    for dy in min_y..max_y {
        for dx in min_x..max_x {
            let rx = dx as f32 + 0.5 - origin.0;
            let ry = dy as f32 + 0.5 - origin.1;
            let bx = rx * cos + ry * sin;
            let by = -rx * sin + ry * cos;
            let u = bx - min_start;
            let v = by - y_offset;
            if u < 0.0 || v < 0.0 || u >= block_width as f32 || v >= block_height as f32 {
                continue;
            }
            let src = block.get_pixel(u as u32, v as u32);
            if src[3] > 0 {
                blend_pixel(surface, dx, dy, *src, 1.0);
            }
        }
    }
}

/// Draw one line of text with its top at `top_y` and its first glyph's caret
/// at `origin_x`. The baseline sits one ascent below the top.
fn draw_line(
    img: &mut RgbaImage,
    font: &FontArc,
    px: f32,
    text: &str,
    origin_x: f32,
    top_y: f32,
    color: Rgba<u8>,
) {
    let scaled = font.as_scaled(px);
    let baseline = top_y + scaled.ascent();
    let mut caret = origin_x;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(px, ab_glyph::point(caret, baseline));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = gx as i32 + bounds.min.x as i32;
                let y = gy as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                    blend_pixel(img, x as u32, y as u32, color, coverage);
                }
            });
        }
        caret += scaled.h_advance(glyph_id);
    }
}

/// Source-over blend of `color` at `coverage` onto one surface pixel.
fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage == 0.0 {
        return;
    }
    let alpha = coverage * color[3] as f32 / 255.0;
    let dst = img.get_pixel_mut(x, y);
    for c in 0..3 {
        dst[c] = (color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    dst[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}

/// Parse a `#RRGGBB` (or `#RGB`) fill color. Malformed values fall back to
/// opaque black rather than failing the row.
fn parse_fill(fill: &str) -> Rgba<u8> {
    let hex = fill.trim().trim_start_matches('#');
    // Length checks below are byte counts; reject multi-byte input before
    // slicing rather than panic on a char boundary.
    if !hex.is_ascii() {
        return Rgba([0, 0, 0, 255]);
    }
    let expanded;
    let hex = match hex.len() {
        6 => hex,
        3 => {
            expanded = hex
                .chars()
                .flat_map(|c| [c, c])
                .collect::<String>();
            &expanded
        }
        _ => return Rgba([0, 0, 0, 255]),
    };
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => Rgba([r, g, b, 255]),
        _ => Rgba([0, 0, 0, 255]),
    }
}
