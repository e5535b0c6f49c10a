//! Font library binding.
//!
//! The [`FontLibrary`] trait is the only surface through which the worker
//! touches font files: load a directory, look faces up by family/style, set a
//! face's pixel size and rasterize codepoints at that size. Implementations
//! keep mutable per-face state (the pixel size), so a library is created,
//! used and dropped on the font worker thread only.

mod font_data;
mod loader;
mod swash_library;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::FontError;
use crate::types::{FontMetrics, RawGlyph};

pub use font_data::FontData;
pub use loader::font_files;
pub use swash_library::{RasterOptions, SwashLibrary};

/// Family name → path of the file that provided it.
pub type FontNames = BTreeMap<String, PathBuf>;

/// Handle to a face loaded by a [`FontLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub usize);

/// A font rasterization backend owned by the font worker.
pub trait FontLibrary {
    /// Scan `directory` and register every usable face.
    ///
    /// Files that fail to load are logged and skipped. Returns
    /// [`FontError::Initialization`] when the directory cannot be read and
    /// [`FontError::NoFonts`] when nothing usable was found.
    fn load_fonts(&mut self, directory: &Path) -> Result<FontNames, FontError>;

    /// Look up a face by family and style name.
    fn face(&self, family: &str, style: &str) -> Option<FaceId>;

    /// Set the pixel size used by `metrics` and `render_glyph` for `face`.
    ///
    /// Returns false when the size cannot be applied; callers treat that as
    /// "nothing available" for the request.
    fn set_pixel_size(&mut self, face: FaceId, size: f32) -> bool;

    /// Vertical metrics of `face` at its current pixel size.
    fn metrics(&self, face: FaceId) -> Option<FontMetrics>;

    /// Rasterize `code` with `face` at its current pixel size.
    ///
    /// `None` when the face has no glyph for the codepoint or rasterization
    /// fails.
    fn render_glyph(&mut self, face: FaceId, code: u32) -> Option<RawGlyph>;
}
