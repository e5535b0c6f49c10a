//! Value types shared by the font service and its callers.

use std::hash::{Hash, Hasher};

/// A 2D size or position in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Identifies a font configuration: family, face (style), pixel size and dpi.
///
/// Equality and hashing cover all four fields; the size compares by bit
/// pattern so the type can key hash maps.
#[derive(Debug, Clone)]
pub struct FontSpec {
    /// Family name, e.g. "Noto Sans"
    pub family: String,
    /// Face (style) name within the family, e.g. "Regular" or "Bold Italic"
    pub face: String,
    /// Pixel size
    pub size: f32,
    /// Display resolution the size was derived for
    pub dpi: u16,
}

impl FontSpec {
    pub const FAMILY_DEFAULT: &'static str = "Noto Sans";
    pub const FAMILY_MONO: &'static str = "Noto Sans Mono";
    pub const FACE_DEFAULT: &'static str = "Regular";
    pub const SIZE_DEFAULT: f32 = 14.0;
    pub const DPI_DEFAULT: u16 = 96;

    pub fn new(family: impl Into<String>, face: impl Into<String>, size: f32, dpi: u16) -> Self {
        Self {
            family: family.into(),
            face: face.into(),
            size,
            dpi,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(
            Self::FAMILY_DEFAULT,
            Self::FACE_DEFAULT,
            Self::SIZE_DEFAULT,
            Self::DPI_DEFAULT,
        )
    }
}

impl PartialEq for FontSpec {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.face == other.face
            && self.size.to_bits() == other.size.to_bits()
            && self.dpi == other.dpi
    }
}

impl Eq for FontSpec {}

impl Hash for FontSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.face.hash(state);
        self.size.to_bits().hash(state);
        self.dpi.hash(state);
    }
}

/// Vertical font metrics in pixels at a given pixel size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyphs
    pub ascender: f32,
    /// Distance from the baseline to the bottom of the lowest glyphs (negative)
    pub descender: f32,
    /// Baseline-to-baseline distance
    pub line_height: f32,
}

/// One line of wrapped text and its size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub size: Vec2,
}

impl TextLine {
    pub fn new(text: impl Into<String>, size: Vec2) -> Self {
        Self {
            text: text.into(),
            size,
        }
    }
}

/// A codepoint rendered with a particular font configuration: the glyph
/// cache key domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphIdentity {
    pub code: u32,
    pub spec: FontSpec,
}

impl GlyphIdentity {
    pub fn new(code: u32, spec: FontSpec) -> Self {
        Self { code, spec }
    }
}

/// Stable numeric id assigned to each distinct [`GlyphIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphUid(pub u64);

/// Decoded glyph coverage bitmap, rows tightly packed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Bytes per pixel: 1 for grayscale coverage, 3 or 4 for sub-pixel or color
    pub channels: u8,
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    /// Bytes of row `y`, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width as usize * self.channels as usize;
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rasterizer output for one codepoint, before it is given an identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGlyph {
    pub bitmap: GlyphBitmap,
    /// Bitmap placement relative to the pen position: (left, top)
    pub offset: Vec2,
    /// Horizontal advance in pixels
    pub advance: f32,
    /// Hinting shift of the left side bearing (26.6 fixed point)
    pub lsb_delta: i32,
    /// Hinting shift of the right side bearing (26.6 fixed point)
    pub rsb_delta: i32,
}

/// A rendered glyph shared by every caller asking for the same identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub identity: GlyphIdentity,
    pub uid: GlyphUid,
    pub bitmap: GlyphBitmap,
    pub offset: Vec2,
    pub advance: f32,
    pub lsb_delta: i32,
    pub rsb_delta: i32,
}

impl Glyph {
    pub fn new(identity: GlyphIdentity, uid: GlyphUid, raw: RawGlyph) -> Self {
        Self {
            identity,
            uid,
            bitmap: raw.bitmap,
            offset: raw.offset,
            advance: raw.advance,
            lsb_delta: raw.lsb_delta,
            rsb_delta: raw.rsb_delta,
        }
    }
}
