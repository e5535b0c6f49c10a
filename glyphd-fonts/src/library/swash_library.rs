//! swash-backed [`FontLibrary`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;
use swash::{FontRef, GlyphId};

use super::font_data::FontData;
use super::loader;
use super::{FaceId, FontLibrary, FontNames};
use crate::error::FontError;
use crate::types::{FontMetrics, GlyphBitmap, RawGlyph, Vec2};

/// Rasterization settings applied to every glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Grid-fit outlines; advances are rounded to whole pixels
    pub hinting: bool,
    /// Render multi-channel sub-pixel masks instead of grayscale coverage
    pub subpixel: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            hinting: true,
            subpixel: false,
        }
    }
}

impl From<&glyphd_config::Config> for RasterOptions {
    fn from(config: &glyphd_config::Config) -> Self {
        Self {
            hinting: config.hinting,
            subpixel: config.subpixel,
        }
    }
}

struct LoadedFace {
    font: FontData,
    /// Whole-pixel size set by `set_pixel_size`
    pixel_size: Option<f32>,
}

/// Font library built on swash, with optional fontdb system font discovery.
pub struct SwashLibrary {
    options: RasterOptions,
    system_fonts: bool,
    faces: Vec<LoadedFace>,
    /// family → style → face
    lookup: HashMap<String, HashMap<String, FaceId>>,
    context: ScaleContext,
}

impl SwashLibrary {
    pub fn new(options: RasterOptions) -> Self {
        Self {
            options,
            system_fonts: false,
            faces: Vec::new(),
            lookup: HashMap::new(),
            context: ScaleContext::new(),
        }
    }

    /// Also register installed system fonts during `load_fonts`.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }

    /// Number of faces registered so far.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn register(&mut self, font: FontData, path: &Path, names: &mut FontNames) {
        let family = font
            .family_name()
            .or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let style = font.style_name().unwrap_or_else(|| "Regular".to_string());

        let font_ref = font.font_ref();
        let metrics = font_ref.metrics(&[]);
        log::info!(
            "    Family: {}, Style: {}, Glyphs: {}, Monospace: {}",
            family,
            style,
            metrics.glyph_count,
            metrics.is_monospace
        );

        let id = FaceId(self.faces.len());
        self.faces.push(LoadedFace {
            font,
            pixel_size: None,
        });
        names.insert(family.clone(), path.to_path_buf());
        self.lookup.entry(family).or_default().insert(style, id);
    }
}

impl FontLibrary for SwashLibrary {
    fn load_fonts(&mut self, directory: &Path) -> Result<FontNames, FontError> {
        let files = loader::font_files(directory).map_err(|e| {
            FontError::Initialization(format!(
                "cannot read font directory '{}': {}",
                directory.display(),
                e
            ))
        })?;

        let mut names = FontNames::new();
        for path in files {
            log::info!("Loading font: {}", path.display());
            let faces = loader::load_font_file(&path);
            if faces.is_empty() {
                log::error!("Cannot load font: {}", path.display());
                continue;
            }
            for font in faces {
                self.register(font, &path, &mut names);
            }
        }

        if self.system_fonts {
            let known: HashSet<String> = self.lookup.keys().cloned().collect();
            for (font, path) in loader::load_system_faces(&known) {
                self.register(font, &path, &mut names);
            }
        }

        if self.faces.is_empty() {
            return Err(FontError::NoFonts {
                directory: directory.to_path_buf(),
            });
        }
        Ok(names)
    }

    fn face(&self, family: &str, style: &str) -> Option<FaceId> {
        self.lookup.get(family)?.get(style).copied()
    }

    fn set_pixel_size(&mut self, face: FaceId, size: f32) -> bool {
        let pixels = size.trunc();
        if !pixels.is_finite() || pixels < 1.0 {
            log::debug!("Rejected pixel size {} for face {:?}", size, face);
            return false;
        }
        match self.faces.get_mut(face.0) {
            Some(loaded) => {
                loaded.pixel_size = Some(pixels);
                true
            }
            None => false,
        }
    }

    fn metrics(&self, face: FaceId) -> Option<FontMetrics> {
        let loaded = self.faces.get(face.0)?;
        let size = loaded.pixel_size?;
        let metrics = loaded.font.font_ref().metrics(&[]);
        if metrics.units_per_em == 0 {
            return None;
        }
        let scale = size / metrics.units_per_em as f32;

        let ascender = metrics.ascent * scale;
        let descender = -metrics.descent * scale;
        let line_height = (metrics.ascent + metrics.descent + metrics.leading) * scale;
        Some(if self.options.hinting {
            FontMetrics {
                ascender: ascender.ceil(),
                descender: descender.floor(),
                line_height: line_height.round(),
            }
        } else {
            FontMetrics {
                ascender,
                descender,
                line_height,
            }
        })
    }

    fn render_glyph(&mut self, face: FaceId, code: u32) -> Option<RawGlyph> {
        let loaded = self.faces.get(face.0)?;
        let size = loaded.pixel_size?;
        let character = char::from_u32(code)?;
        let font = loaded.font.font_ref();
        let glyph_id = font.charmap().map(character);
        if glyph_id == 0 {
            return None;
        }

        let format = if self.options.subpixel {
            Format::Subpixel
        } else {
            Format::Alpha
        };
        let mut scaler = self
            .context
            .builder(font)
            .size(size)
            .hint(self.options.hinting)
            .build();
        // Color sources first so emoji fonts keep their bitmaps; plain text
        // fonts fall through to the outline.
        let image = Render::new(&[
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::ColorOutline(0),
            Source::Outline,
        ])
        .format(format)
        .render(&mut scaler, glyph_id)?;

        let width = image.placement.width;
        let height = image.placement.height;
        let pixels = width as usize * height as usize;
        let channels = match image.content {
            Content::Mask => 1,
            Content::SubpixelMask | Content::Color if pixels > 0 => {
                (image.data.len() / pixels).clamp(1, 4) as u8
            }
            Content::SubpixelMask | Content::Color => 4,
        };

        let units_per_em = font.metrics(&[]).units_per_em.max(1) as f32;
        let unhinted_advance =
            font.glyph_metrics(&[]).advance_width(glyph_id) * size / units_per_em;

        let (advance, lsb_delta, rsb_delta) = if self.options.hinting {
            let advance = unhinted_advance.round();
            let hinted = outline_edges(&mut self.context, font, size, true, glyph_id);
            let unhinted = outline_edges(&mut self.context, font, size, false, glyph_id);
            let (lsb_delta, rsb_delta) = match (unhinted, hinted) {
                (Some(unhinted), Some(hinted)) => {
                    bearing_deltas(unhinted, hinted, unhinted_advance, advance)
                }
                // Bitmap-only glyphs have no outline to compare.
                _ => (0, 0),
            };
            (advance, lsb_delta, rsb_delta)
        } else {
            (unhinted_advance, 0, 0)
        };

        Some(RawGlyph {
            bitmap: GlyphBitmap {
                width,
                height,
                channels,
                data: image.data,
            },
            offset: Vec2::new(image.placement.left as f32, image.placement.top as f32),
            advance,
            lsb_delta,
            rsb_delta,
        })
    }
}

/// Horizontal ink extent of a scaled outline, in pixels from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edges {
    left: f32,
    right: f32,
}

fn outline_edges(
    context: &mut ScaleContext,
    font: FontRef,
    size: f32,
    hint: bool,
    glyph_id: GlyphId,
) -> Option<Edges> {
    let mut scaler = context.builder(font).size(size).hint(hint).build();
    let outline = scaler.scale_outline(glyph_id)?;
    if outline.points().is_empty() {
        return Some(Edges {
            left: 0.0,
            right: 0.0,
        });
    }
    let bounds = outline.bounds();
    Some(Edges {
        left: bounds.min.x,
        right: bounds.max.x,
    })
}

/// Side-bearing changes introduced by hinting, in 26.6 fixed point.
///
/// `lsb_delta` is how far hinting pulled the ink left of its unhinted left
/// edge. `rsb_delta` is how much the right side bearing grew, counting the
/// advance rounding. A pair of glyphs gains `prev.rsb_delta - next.lsb_delta`
/// of extra space between its ink.
fn bearing_deltas(
    unhinted: Edges,
    hinted: Edges,
    unhinted_advance: f32,
    hinted_advance: f32,
) -> (i32, i32) {
    let lsb_delta = ((unhinted.left - hinted.left) * 64.0).round() as i32;
    let unhinted_rsb = unhinted_advance - unhinted.right;
    let hinted_rsb = hinted_advance - hinted.right;
    let rsb_delta = ((hinted_rsb - unhinted_rsb) * 64.0).round() as i32;
    (lsb_delta, rsb_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn edges(left: f32, right: f32) -> Edges {
        Edges { left, right }
    }

    #[test]
    fn test_bearing_deltas_without_outline_movement() {
        // Only the advance rounding (9.75 -> 10) reaches the right bearing.
        let ink = edges(1.0, 8.0);
        assert_eq!(bearing_deltas(ink, ink, 9.75, 10.0), (0, 16));
        assert_eq!(bearing_deltas(ink, ink, 10.0, 10.0), (0, 0));
    }

    #[test]
    fn test_bearing_deltas_with_snapped_edges() {
        // Left edge snapped right from 1.0 to 1.25 shrinks the left bearing;
        // right edge snapped left from 8.25 to 8.0 widens the right bearing.
        let (lsb, rsb) = bearing_deltas(edges(1.0, 8.25), edges(1.25, 8.0), 10.0, 10.0);
        assert_eq!((lsb, rsb), (-16, 16));
    }

    #[test]
    fn test_rigid_outline_never_triggers_kerning_correction() {
        use crate::layout::kerning_correction;
        // Worst-case advance rounding with no edge movement stays inside the band.
        let ink = edges(0.5, 6.0);
        for unhinted_advance in [6.5f32, 7.49, 7.5, 7.51, 8.0] {
            let (lsb, rsb) = bearing_deltas(ink, ink, unhinted_advance, unhinted_advance.round());
            assert_eq!(kerning_correction(rsb, lsb), 0.0, "advance {}", unhinted_advance);
        }
    }

    #[test]
    fn test_empty_directory_has_no_fonts() {
        let dir = TempDir::new().unwrap();
        let mut library = SwashLibrary::new(RasterOptions::default());
        assert_eq!(
            library.load_fonts(dir.path()),
            Err(FontError::NoFonts {
                directory: dir.path().to_path_buf()
            })
        );
    }

    #[test]
    fn test_missing_directory_is_initialization_error() {
        let dir = TempDir::new().unwrap();
        let mut library = SwashLibrary::new(RasterOptions::default());
        let result = library.load_fonts(&dir.path().join("missing"));
        assert!(matches!(result, Err(FontError::Initialization(_))));
    }

    #[test]
    fn test_unknown_face_rejects_pixel_size() {
        let mut library = SwashLibrary::new(RasterOptions::default());
        assert!(!library.set_pixel_size(FaceId(0), 12.0));
        assert!(library.metrics(FaceId(0)).is_none());
        assert!(library.render_glyph(FaceId(0), 'a' as u32).is_none());
        assert!(library.face("Noto Sans", "Regular").is_none());
    }

    #[test]
    fn test_raster_options_from_config() {
        let config = glyphd_config::Config {
            hinting: false,
            subpixel: true,
            ..Default::default()
        };
        assert_eq!(
            RasterOptions::from(&config),
            RasterOptions {
                hinting: false,
                subpixel: true
            }
        );
    }
}
