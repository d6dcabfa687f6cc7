//! Font discovery and registration.
//!
//! Badges are rendered with a single bundled family (DejaVu Sans) so that
//! auto-fit measurement and final drawing share identical metrics everywhere.
//! Requests for common system families (Arial, Helvetica, Roboto, system-ui)
//! collapse onto the bundled family; bold and italic are distinct font files,
//! never synthesized from the regular face.
//!
//! The registry is an immutable value: once constructed it always holds a
//! usable regular face, so "registered but empty" is unrepresentable. The
//! process-wide copy lives behind a `OnceLock`; a failed discovery is not
//! cached and is retried on the next call.

use ab_glyph::{Font, FontArc, ScaleFont};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::LanyardError;
use crate::template::FontStyle;

/// The single family all rendering uses.
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";

const REGULAR_FILE: &str = "DejaVuSans.ttf";
const BOLD_FILE: &str = "DejaVuSans-Bold.ttf";
const ITALIC_FILE: &str = "DejaVuSans-Oblique.ttf";

/// Candidate directories, in search order. The first one containing the
/// regular-weight file wins.
const FONT_DIRS: &[&str] = &[
    "assets/fonts",
    "fonts",
    "/usr/share/fonts/truetype/dejavu",
];

static REGISTRY: OnceLock<FontRegistry> = OnceLock::new();

/// Loaded font faces for badge rendering.
///
/// Constructed once per process via [`FontRegistry::global`], or explicitly
/// via [`FontRegistry::load_dir`] for callers that want to inject their own.
#[derive(Debug)]
pub struct FontRegistry {
    regular: FontArc,
    bold: FontArc,
    italic: FontArc,
    source_dir: PathBuf,
    fonts_registered: usize,
}

impl FontRegistry {
    /// Get the process-wide registry, discovering fonts on first use.
    ///
    /// Idempotent: after the first success this returns the same registry
    /// without touching the filesystem. A failure is not cached, so a later
    /// call can succeed once the font files become available.
    pub fn global() -> Result<&'static FontRegistry, LanyardError> {
        if let Some(registry) = REGISTRY.get() {
            return Ok(registry);
        }
        let registry = Self::discover()?;
        // A concurrent first call may have won the race; keep whichever
        // registry landed first.
        Ok(REGISTRY.get_or_init(|| registry))
    }

    /// Search the candidate directories and load the first bundled font set.
    pub fn discover() -> Result<FontRegistry, LanyardError> {
        for dir in FONT_DIRS {
            let dir = Path::new(dir);
            if dir.join(REGULAR_FILE).is_file() {
                return Self::load_dir(dir);
            }
        }
        Err(LanyardError::Font(format!(
            "no bundled fonts found; searched: {}",
            FONT_DIRS.join(", ")
        )))
    }

    /// Load the bundled font set from a specific directory.
    ///
    /// The regular face is required. Bold and italic are optional and fall
    /// back to the regular face when their files are absent, so text still
    /// renders (with wrong weight) rather than failing the job.
    pub fn load_dir(dir: &Path) -> Result<FontRegistry, LanyardError> {
        let regular = load_face(&dir.join(REGULAR_FILE))?;
        let mut fonts_registered = 1;

        let bold = match load_face(&dir.join(BOLD_FILE)) {
            Ok(face) => {
                fonts_registered += 1;
                face
            }
            Err(_) => regular.clone(),
        };
        let italic = match load_face(&dir.join(ITALIC_FILE)) {
            Ok(face) => {
                fonts_registered += 1;
                face
            }
            Err(_) => regular.clone(),
        };

        Ok(FontRegistry {
            regular,
            bold,
            italic,
            source_dir: dir.to_path_buf(),
            fonts_registered,
        })
    }

    /// Number of distinct faces loaded (1..=3).
    pub fn fonts_registered(&self) -> usize {
        self.fonts_registered
    }

    /// Directory the faces were loaded from.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The face for a given style. The family is already normalized away;
    /// every request maps onto the bundled family.
    pub fn face(&self, style: FontStyle) -> &FontArc {
        match style {
            FontStyle::Normal => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }

    /// Width in pixels of a single line of text at `px` font size.
    ///
    /// Sum of horizontal advances, matching the renderer's caret layout.
    pub fn line_width(&self, style: FontStyle, px: f32, text: &str) -> f32 {
        let font = self.face(style);
        let scaled = font.as_scaled(px);
        text.chars()
            .map(|ch| scaled.h_advance(font.glyph_id(ch)))
            .sum()
    }

    /// Scaled ascent of the face, used to place the baseline so the top of
    /// the line box lands on the computed y-offset.
    pub fn ascent(&self, style: FontStyle, px: f32) -> f32 {
        self.face(style).as_scaled(px).ascent()
    }
}

/// Normalize a template's requested font family onto the bundled family.
///
/// Templates commonly name system families (Arial, Helvetica, Roboto,
/// system-ui); all of them, unknown families included, collapse onto the
/// bundle. Substituting a real system font here would change the metrics
/// the auto-fit math was computed against.
pub fn normalize_family(_family: &str) -> &'static str {
    BUNDLED_FAMILY
}

fn load_face(path: &Path) -> Result<FontArc, LanyardError> {
    let data = std::fs::read(path)
        .map_err(|e| LanyardError::Font(format!("failed to read {}: {}", path.display(), e)))?;
    FontArc::try_from_vec(data)
        .map_err(|e| LanyardError::Font(format!("failed to parse {}: {}", path.display(), e)))
}
