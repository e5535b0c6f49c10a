//! Font discovery for the font directory and installed system fonts.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdb::{Database, Source};

use super::font_data::FontData;

/// Regular files directly inside `directory`, sorted by name.
pub fn font_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every face of the font file at `path`.
///
/// Returns an empty list when the file cannot be read or holds no valid font.
pub fn load_font_file(path: &Path) -> Vec<FontData> {
    match fs::read(path) {
        Ok(data) => FontData::all_faces(data),
        Err(e) => {
            log::error!("Cannot read font file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Load installed system fonts whose family is not in `known_families`.
pub fn load_system_faces(known_families: &HashSet<String>) -> Vec<(FontData, PathBuf)> {
    let mut db = Database::new();
    db.load_system_fonts();
    log::info!("Loaded {} system fonts", db.len());

    let mut shared: HashMap<PathBuf, Arc<Vec<u8>>> = HashMap::new();
    let mut faces = Vec::new();
    for info in db.faces() {
        let Some((family, _)) = info.families.first() else {
            continue;
        };
        if known_families.contains(family) {
            continue;
        }
        let path = match &info.source {
            Source::File(path) | Source::SharedFile(path, _) => path.clone(),
            Source::Binary(_) => continue,
        };

        let data = match shared.get(&path) {
            Some(data) => Arc::clone(data),
            None => {
                let Some(data) = db.with_face_data(info.id, |bytes, _| Arc::new(bytes.to_vec()))
                else {
                    log::warn!("System font {} could not be read", path.display());
                    continue;
                };
                shared.insert(path.clone(), Arc::clone(&data));
                data
            }
        };

        if let Some(font) = FontData::from_shared(data, info.index as usize) {
            log::debug!("Added system font: {} ({})", family, path.display());
            faces.push((font, path));
        }
    }
    faces
}
