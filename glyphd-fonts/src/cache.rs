//! Rendered glyph cache and glyph identity registry.
//!
//! Both are shared between the font worker (writer) and diagnostic readers on
//! other threads, so each guards its state with its own lock.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use lru::LruCache;
use parking_lot::Mutex;

use crate::types::{Glyph, GlyphIdentity, GlyphUid};

/// Append-only mapping from glyph identity to a stable uid.
///
/// A uid, once handed out, always refers to the same identity.
#[derive(Debug, Default)]
pub struct GlyphIdRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    ids: HashMap<GlyphIdentity, GlyphUid>,
    next: u64,
}

impl GlyphIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by every font system.
    pub fn global() -> Arc<GlyphIdRegistry> {
        static GLOBAL: OnceLock<Arc<GlyphIdRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(GlyphIdRegistry::new())))
    }

    /// Uid for `identity`, assigning the next free one on first sight.
    pub fn uid(&self, identity: &GlyphIdentity) -> GlyphUid {
        let mut inner = self.inner.lock();
        if let Some(uid) = inner.ids.get(identity) {
            return *uid;
        }
        inner.next += 1;
        let uid = GlyphUid(inner.next);
        inner.ids.insert(identity.clone(), uid);
        uid
    }

    /// Number of identities registered.
    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capacity-bounded LRU cache of rendered glyphs keyed by uid.
///
/// Entries are immutable `Arc<Glyph>`s, so evicting one never invalidates a
/// glyph a caller already holds.
pub struct GlyphCache {
    entries: Mutex<LruCache<GlyphUid, Arc<Glyph>>>,
}

impl GlyphCache {
    /// Create a cache holding at most `capacity` glyphs (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, uid: GlyphUid) -> Option<Arc<Glyph>> {
        self.entries.lock().get(&uid).cloned()
    }

    /// Insert or replace the glyph for `uid`, evicting the least recently
    /// used entry when full.
    pub fn put(&self, uid: GlyphUid, glyph: Arc<Glyph>) {
        self.entries.lock().put(uid, glyph);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Fill level in percent.
    pub fn percentage_used(&self) -> f32 {
        let entries = self.entries.lock();
        entries.len() as f32 / entries.cap().get() as f32 * 100.0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("GlyphCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish()
    }
}
