//! Shared integration test helpers for glyphd-fonts.
//!
//! Provides [`FakeLibrary`], a deterministic in-memory [`FontLibrary`] so the
//! worker can be driven end to end without font files on disk.
//!
//! Metrics of the fake faces at pixel size `s`:
//! - advance `s / 2` for most characters, `s / 4` for space and tab, `s` for 'W'
//! - 'K' has a right bearing delta of +40, 'R' of -40 (26.6 fixed point)
//! - 'J' has a left bearing delta of -40, 'V' of +40
//! - '\n', '\r' and U+FFFF have no glyph
//! - line height `s * 1.2`, ascender `ceil(s * 0.9)`, descender `floor(-s * 0.3)`

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use glyphd_fonts::{
    FaceId, FontError, FontLibrary, FontMetrics, FontNames, FontSpec, FontSystem,
    GlyphBitmap, GlyphIdRegistry, RawGlyph, Vec2, WorkerOptions, WorkerState,
};

pub const SANS: &str = "Test Sans";
pub const MONO: &str = "Test Mono";

/// Pixel size used by most tests: advances of 10, line height 24.
pub const SIZE: f32 = 20.0;

pub struct FakeLibrary {
    faces: Vec<(&'static str, &'static str)>,
    sizes: Vec<Option<f32>>,
    fail_with: Option<FontError>,
    load_delay: Duration,
    renders: Arc<AtomicUsize>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        let faces = vec![(SANS, "Regular"), (MONO, "Regular"), (MONO, "Bold")];
        Self {
            sizes: vec![None; faces.len()],
            faces,
            fail_with: None,
            load_delay: Duration::ZERO,
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A library whose `load_fonts` fails with `error`.
    pub fn failing(error: FontError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new()
        }
    }

    /// Sleep for `delay` inside `load_fonts`.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Count `render_glyph` calls that produced a glyph into `counter`.
    pub fn with_render_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.renders = counter;
        self
    }
}

impl FontLibrary for FakeLibrary {
    fn load_fonts(&mut self, directory: &Path) -> Result<FontNames, FontError> {
        std::thread::sleep(self.load_delay);
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        let mut names = FontNames::new();
        names.insert(SANS.to_string(), directory.join("test-sans.ttf"));
        names.insert(MONO.to_string(), directory.join("test-mono.ttc"));
        Ok(names)
    }

    fn face(&self, family: &str, style: &str) -> Option<FaceId> {
        self.faces
            .iter()
            .position(|(f, s)| *f == family && *s == style)
            .map(FaceId)
    }

    fn set_pixel_size(&mut self, face: FaceId, size: f32) -> bool {
        let pixels = size.trunc();
        if !pixels.is_finite() || pixels < 1.0 {
            return false;
        }
        match self.sizes.get_mut(face.0) {
            Some(slot) => {
                *slot = Some(pixels);
                true
            }
            None => false,
        }
    }

    fn metrics(&self, face: FaceId) -> Option<FontMetrics> {
        let size = (*self.sizes.get(face.0)?)?;
        Some(FontMetrics {
            ascender: (size * 0.9).ceil(),
            descender: (-size * 0.3).floor(),
            line_height: size * 1.2,
        })
    }

    fn render_glyph(&mut self, face: FaceId, code: u32) -> Option<RawGlyph> {
        let size = (*self.sizes.get(face.0)?)?;
        let c = char::from_u32(code)?;
        if matches!(c, '\n' | '\r' | '\u{FFFF}') {
            return None;
        }
        let advance = match c {
            ' ' | '\t' => size / 4.0,
            'W' => size,
            _ => size / 2.0,
        };
        let rsb_delta = match c {
            'K' => 40,
            'R' => -40,
            _ => 0,
        };
        let lsb_delta = match c {
            'J' => -40,
            'V' => 40,
            _ => 0,
        };
        let width = advance as u32;
        let height = size as u32;
        self.renders.fetch_add(1, Ordering::SeqCst);
        Some(RawGlyph {
            bitmap: GlyphBitmap {
                width,
                height,
                channels: 1,
                data: vec![0xff; (width * height) as usize],
            },
            offset: Vec2::new(0.0, size * 0.9),
            advance,
            lsb_delta,
            rsb_delta,
        })
    }
}

/// Worker options with an isolated uid registry and a short poll interval.
pub fn options(glyph_cache_capacity: usize) -> WorkerOptions {
    WorkerOptions {
        font_directory: PathBuf::from("/fonts/test"),
        glyph_cache_capacity,
        poll_interval: Duration::from_millis(10),
        stats_interval: None,
        registry: Arc::new(GlyphIdRegistry::new()),
    }
}

pub fn start_with(library: FakeLibrary, glyph_cache_capacity: usize) -> FontSystem {
    FontSystem::with_options(move || Ok(library), options(glyph_cache_capacity))
        .expect("spawn font worker")
}

/// A font system over [`FakeLibrary`] that has finished loading.
pub fn start() -> FontSystem {
    let fonts = start_with(FakeLibrary::new(), 1000);
    fonts.font_names().wait().expect("fake fonts load");
    fonts
}

pub fn sans() -> FontSpec {
    FontSpec::new(SANS, "Regular", SIZE, 96)
}

/// Poll until the worker reaches `state`, failing after a few seconds.
pub fn wait_for_state(fonts: &FontSystem, state: WorkerState) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while fonts.state() != state {
        assert!(
            Instant::now() < deadline,
            "worker stuck in {} waiting for {}",
            fonts.state(),
            state
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}
