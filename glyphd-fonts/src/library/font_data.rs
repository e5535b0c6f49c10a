//! Owned font bytes with a borrowable swash font reference.

use std::sync::Arc;

use swash::{CacheKey, FontDataRef, FontRef, StringId};

/// Stores font data together with the location of one face inside it.
///
/// Faces of a font collection share the same `data` allocation.
#[derive(Clone)]
pub struct FontData {
    /// Raw font data bytes (TTF/OTF/TTC)
    pub data: Arc<Vec<u8>>,
    /// Face index within `data`
    pub index: usize,
    offset: u32,
    key: CacheKey,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl FontData {
    /// Create a new FontData from bytes using face index 0.
    ///
    /// Returns `None` if the bytes are not a valid font.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::from_shared(Arc::new(data), 0)
    }

    /// Create a FontData for face `index` of shared font bytes.
    ///
    /// This is needed for TrueType Collection (.ttc) files where multiple
    /// font faces share the same data but have different face indices.
    pub fn from_shared(data: Arc<Vec<u8>>, index: usize) -> Option<Self> {
        let font_ref = FontRef::from_index(data.as_slice(), index)?;
        let (offset, key) = (font_ref.offset, font_ref.key);
        Some(FontData {
            data,
            index,
            offset,
            key,
        })
    }

    /// Load every face contained in `data`.
    ///
    /// A single-face file yields one entry, a collection one per face, and
    /// invalid bytes none.
    pub fn all_faces(data: Vec<u8>) -> Vec<Self> {
        let count = FontDataRef::new(&data).map(|d| d.len()).unwrap_or(0);
        let data = Arc::new(data);
        (0..count)
            .filter_map(|index| Self::from_shared(Arc::clone(&data), index))
            .collect()
    }

    /// Swash font reference for glyph operations.
    pub fn font_ref(&self) -> FontRef<'_> {
        FontRef {
            data: self.data.as_slice(),
            offset: self.offset,
            key: self.key,
        }
    }

    /// Family name from the font's name table.
    pub fn family_name(&self) -> Option<String> {
        self.name_string(StringId::Family)
    }

    /// Style (subfamily) name from the font's name table, e.g. "Bold Italic".
    pub fn style_name(&self) -> Option<String> {
        self.name_string(StringId::SubFamily)
    }

    fn name_string(&self, id: StringId) -> Option<String> {
        let strings = self.font_ref().localized_strings();
        let name = strings
            .find_by_id(id, Some("en"))
            .or_else(|| strings.find_by_id(id, None))?;
        let name: String = name.chars().collect();
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}
