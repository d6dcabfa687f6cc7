//! Badge generation: one job in, one ordered set of PNG buffers out.
//!
//! The template is decoded (and, on dimension mismatch, stretched) exactly
//! once per job; each row then gets a fresh copy of that background, its
//! fields drawn, and the result PNG-encoded. Rows are processed strictly
//! sequentially and output order always matches input order, so downstream
//! consumers name files `badge-{i}.png` against `rows[i]`.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::error::LanyardError;
use crate::fonts::FontRegistry;
use crate::render::render_field;
use crate::template::{DataRow, FieldMapping, TemplateField, resolve_value};

/// Load a template image from disk.
pub fn load_template(path: &Path) -> Result<DynamicImage, LanyardError> {
    image::open(path)
        .map_err(|e| LanyardError::Template(format!("failed to load {}: {}", path.display(), e)))
}

/// Fetch a template image over HTTP.
pub async fn fetch_template(url: &str) -> Result<DynamicImage, LanyardError> {
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| LanyardError::Template(format!("failed to fetch {url}: {e}")))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| LanyardError::Template(format!("failed to read {url}: {e}")))?;
    image::load_from_memory(&bytes)
        .map_err(|e| LanyardError::Template(format!("failed to decode {url}: {e}")))
}

/// Generate one PNG badge per row, in row order.
///
/// Fields whose id is unmapped, or whose mapped column is absent, null, or
/// empty in a row, are silently skipped for that row. Any drawing or
/// encoding failure aborts the whole job; there is no partial success.
///
/// `on_progress(current, total)` fires after each row completes, with
/// `current` 1-indexed and monotonically increasing.
pub fn generate_badges(
    template: &DynamicImage,
    width: u32,
    height: u32,
    fields: &[TemplateField],
    mapping: &FieldMapping,
    rows: &[DataRow],
    registry: &FontRegistry,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Vec<Vec<u8>>, LanyardError> {
    if width == 0 || height == 0 {
        return Err(LanyardError::Template(format!(
            "invalid badge dimensions {width}x{height}"
        )));
    }

    // Decode/stretch once for the whole job. A declared size that differs
    // from the template's intrinsic size stretches the background; it is
    // not an error.
    let background: RgbaImage = if template.width() == width && template.height() == height {
        template.to_rgba8()
    } else {
        template
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgba8()
    };

    let total = rows.len();
    let mut badges = Vec::with_capacity(total);

    for (i, row) in rows.iter().enumerate() {
        let mut surface = background.clone();

        for field in fields {
            let value = resolve_value(field, mapping, row);
            if value.is_empty() {
                continue;
            }
            render_field(&mut surface, registry, field, &value);
        }

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(surface)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| LanyardError::Render(format!("row {}: PNG encode failed: {}", i + 1, e)))?;
        badges.push(png);

        on_progress(i + 1, total);
    }

    Ok(badges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Align, FontStyle, VerticalAlign};
    use pretty_assertions::assert_eq;

    fn white_template(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([255, 255, 255, 255]),
        ))
    }

    fn name_field() -> TemplateField {
        TemplateField {
            id: "f1".into(),
            text: "Name".into(),
            x: 20.0,
            y: 20.0,
            width: 360.0,
            height: 60.0,
            font_size: 40.0,
            font_family: "Arial".into(),
            fill: "#000000".into(),
            font_style: FontStyle::Normal,
            align: Align::Left,
            vertical_align: VerticalAlign::Top,
            rotation: 0.0,
        }
    }

    fn row(name: &str) -> DataRow {
        DataRow::from([("name".to_string(), serde_json::json!(name))])
    }

    #[test]
    fn test_one_buffer_per_row_in_order() {
        let registry = FontRegistry::global().unwrap();
        let template = white_template(400, 200);
        let mapping = FieldMapping::from([("f1".to_string(), "name".to_string())]);
        let rows = vec![row("Alice"), row("Bob"), row("Carol")];

        let mut ticks = Vec::new();
        let badges = generate_badges(
            &template,
            400,
            200,
            &[name_field()],
            &mapping,
            &rows,
            registry,
            |current, total| ticks.push((current, total)),
        )
        .unwrap();

        assert_eq!(badges.len(), 3);
        assert_eq!(ticks, vec![(1, 3), (2, 3), (3, 3)]);
        for png in &badges {
            let decoded = image::load_from_memory(png).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (400, 200));
        }
        // Distinct values render distinct images.
        assert_ne!(badges[0], badges[1]);
        assert_ne!(badges[1], badges[2]);
    }

    #[test]
    fn test_unmapped_field_pixel_equal_to_omitted_field() {
        let registry = FontRegistry::global().unwrap();
        let template = white_template(400, 200);
        let rows = vec![row("Alice")];

        // Field present but unmapped.
        let with_unmapped = generate_badges(
            &template,
            400,
            200,
            &[name_field()],
            &FieldMapping::new(),
            &rows,
            registry,
            |_, _| {},
        )
        .unwrap();

        // Field omitted entirely.
        let without_field = generate_badges(
            &template,
            400,
            200,
            &[],
            &FieldMapping::new(),
            &rows,
            registry,
            |_, _| {},
        )
        .unwrap();

        assert_eq!(with_unmapped[0], without_field[0]);
    }

    #[test]
    fn test_missing_and_empty_values_skip_field() {
        let registry = FontRegistry::global().unwrap();
        let template = white_template(400, 200);
        let mapping = FieldMapping::from([("f1".to_string(), "name".to_string())]);
        let rows = vec![
            DataRow::new(),
            DataRow::from([("name".to_string(), serde_json::Value::Null)]),
            DataRow::from([("name".to_string(), serde_json::json!(""))]),
        ];

        let badges = generate_badges(
            &template,
            400,
            200,
            &[name_field()],
            &mapping,
            &rows,
            registry,
            |_, _| {},
        )
        .unwrap();

        // Every row should be a plain background.
        let plain = generate_badges(
            &template,
            400,
            200,
            &[],
            &FieldMapping::new(),
            &[DataRow::new()],
            registry,
            |_, _| {},
        )
        .unwrap();
        for badge in &badges {
            assert_eq!(badge, &plain[0]);
        }
    }

    #[test]
    fn test_template_stretch_on_dimension_mismatch() {
        let registry = FontRegistry::global().unwrap();
        let template = white_template(100, 50);
        let badges = generate_badges(
            &template,
            400,
            200,
            &[],
            &FieldMapping::new(),
            &[DataRow::new()],
            registry,
            |_, _| {},
        )
        .unwrap();
        let decoded = image::load_from_memory(&badges[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 200));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let registry = FontRegistry::global().unwrap();
        let template = white_template(100, 50);
        let err = generate_badges(
            &template,
            0,
            200,
            &[],
            &FieldMapping::new(),
            &[],
            registry,
            |_, _| {},
        )
        .unwrap_err();
        assert!(matches!(err, LanyardError::Template(_)));
    }

    #[test]
    fn test_longer_text_fits_at_smaller_or_equal_size() {
        // The second attendee's longer name must auto-fit at a size no
        // larger than the first's.
        use crate::fit::fit_to_box;

        let registry = FontRegistry::global().unwrap();
        let template = white_template(400, 200);
        let mapping = FieldMapping::from([("f1".to_string(), "name".to_string())]);
        let rows = vec![row("Alice"), row("Bob Smith The Third Esquire")];

        let badges = generate_badges(
            &template,
            400,
            200,
            &[name_field()],
            &mapping,
            &rows,
            registry,
            |_, _| {},
        )
        .unwrap();
        assert_eq!(badges.len(), 2);

        let size_short = fit_to_box(registry, FontStyle::Normal, "Alice", 360.0, 60.0, 40);
        let size_long = fit_to_box(
            registry,
            FontStyle::Normal,
            "Bob Smith The Third Esquire",
            360.0,
            60.0,
            40,
        );
        assert!(size_long <= size_short);
        assert_eq!(size_short, 40);
        assert!(size_long < 40);
    }
}
