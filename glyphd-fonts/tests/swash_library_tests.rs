//! Integration tests for the swash-backed font library.
//!
//! No font ships with the repository, so these copy an installed system font
//! into a temporary font directory. On machines without one they return early.

use std::path::PathBuf;

use fontdb::{Database, Source};
use glyphd_fonts::library::FontData;
use glyphd_fonts::{FontLibrary, FontSpec, FontSystem, RasterOptions, SwashLibrary};
use tempfile::TempDir;

/// A font directory holding one installed font that can render 'a'.
struct SystemFont {
    dir: TempDir,
    family: String,
    style: String,
}

fn system_font() -> Option<SystemFont> {
    let mut db = Database::new();
    db.load_system_fonts();

    let path: PathBuf = db.faces().find_map(|info| {
        let Source::File(path) = &info.source else {
            return None;
        };
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        (info.index == 0 && (ext == "ttf" || ext == "otf")).then(|| path.clone())
    })?;
    let bytes = std::fs::read(&path).ok()?;
    let font = FontData::new(bytes.clone())?;
    if font.font_ref().charmap().map('a') == 0 {
        return None;
    }

    let dir = TempDir::new().ok()?;
    std::fs::write(dir.path().join(path.file_name()?), bytes).ok()?;
    Some(SystemFont {
        dir,
        family: font.family_name()?,
        style: font.style_name().unwrap_or_else(|| "Regular".to_string()),
    })
}

#[test]
fn test_loads_and_renders_a_font_file() {
    let Some(font) = system_font() else {
        eprintln!("no installed TrueType/OpenType font; skipping");
        return;
    };
    let mut library = SwashLibrary::new(RasterOptions::default());
    let names = library.load_fonts(font.dir.path()).unwrap();
    assert!(names.contains_key(&font.family));
    assert_eq!(library.face_count(), 1);

    let face = library.face(&font.family, &font.style).unwrap();
    assert!(library.set_pixel_size(face, 24.0));
    let metrics = library.metrics(face).unwrap();
    assert!(metrics.line_height > 0.0);
    assert!(metrics.ascender > 0.0);
    assert!(metrics.descender <= 0.0);

    let glyph = library.render_glyph(face, 'a' as u32).unwrap();
    assert!(!glyph.bitmap.is_empty());
    assert_eq!(glyph.bitmap.channels, 1);
    assert_eq!(
        glyph.bitmap.data.len(),
        (glyph.bitmap.width * glyph.bitmap.height) as usize
    );
    assert!(glyph.advance > 0.0);
    assert_eq!(glyph.advance.fract(), 0.0, "hinted advances are whole pixels");

    // A private use codepoint the font almost certainly lacks.
    assert!(library.render_glyph(face, 0x10FFFD).is_none());
}

#[test]
fn test_unhinted_rendering_keeps_fractional_metrics() {
    let Some(font) = system_font() else {
        return;
    };
    let mut library = SwashLibrary::new(RasterOptions {
        hinting: false,
        subpixel: false,
    });
    library.load_fonts(font.dir.path()).unwrap();
    let face = library.face(&font.family, &font.style).unwrap();
    assert!(library.set_pixel_size(face, 13.0));
    let glyph = library.render_glyph(face, 'a' as u32).unwrap();
    assert_eq!((glyph.lsb_delta, glyph.rsb_delta), (0, 0));
}

#[test]
fn test_font_system_over_swash() {
    let Some(font) = system_font() else {
        return;
    };
    let config = glyphd_config::Config {
        font_directory: Some(font.dir.path().to_path_buf()),
        ..Default::default()
    };
    let fonts = FontSystem::new(&config).unwrap();
    let names = fonts.font_names().wait().unwrap();
    assert!(names.contains_key(&font.family));

    let spec = FontSpec::new(font.family.as_str(), font.style.as_str(), 16.0, 96);
    let glyphs = fonts.glyphs("a", &spec).wait().unwrap();
    assert_eq!(glyphs.len(), 1);

    let metrics = fonts.metrics(&spec).wait().unwrap();
    let size = fonts.measure("aa", &spec).wait().unwrap();
    assert_eq!(size.y, metrics.line_height);
}

#[test]
fn test_glyph_run_width_matches_sum_of_advances() {
    let Some(font) = system_font() else {
        return;
    };
    let config = glyphd_config::Config {
        font_directory: Some(font.dir.path().to_path_buf()),
        ..Default::default()
    };
    let fonts = FontSystem::new(&config).unwrap();
    let spec = FontSpec::new(font.family.as_str(), font.style.as_str(), 16.0, 96);

    for text in ["aaaaaaaaaa", "mmmmmmmmmm", "abcdefghij"] {
        let glyphs = fonts.glyphs(text, &spec).wait().unwrap();
        if glyphs.len() != text.len() {
            continue;
        }
        let sum: f32 = glyphs.iter().map(|g| g.advance).sum();
        let size = fonts.measure(text, &spec).wait().unwrap();
        // Hinting may nudge a pair by one pixel, never every pair.
        assert!(
            (size.x - sum).abs() <= 1.0,
            "{:?} measured {} vs sum {}",
            text,
            size.x,
            sum
        );

        let lines = fonts.text_lines(text, f32::MAX, &spec).wait().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, text);
        assert_eq!(lines[0].size, size);
    }
}

#[test]
fn test_repeated_glyph_has_balanced_bearing_deltas() {
    let Some(font) = system_font() else {
        return;
    };
    let mut library = SwashLibrary::new(RasterOptions::default());
    library.load_fonts(font.dir.path()).unwrap();
    let face = library.face(&font.family, &font.style).unwrap();
    for size in [12.0, 16.0, 24.0] {
        assert!(library.set_pixel_size(face, size));
        let glyph = library.render_glyph(face, 'a' as u32).unwrap();
        let diff = glyph.rsb_delta - glyph.lsb_delta;
        assert!(
            (-31..=32).contains(&diff),
            "size {}: deltas ({}, {})",
            size,
            glyph.lsb_delta,
            glyph.rsb_delta
        );
    }
}
