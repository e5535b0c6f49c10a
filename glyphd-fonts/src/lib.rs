//! Background font service for glyphd.
//!
//! This crate provides:
//! - Font loading from a directory (plus optional system fonts) via swash and fontdb
//! - A bounded, thread-safe cache of rendered glyphs keyed by stable glyph uids
//! - Text measurement and word-wrapped line breaking with hinting-aware kerning
//! - A background worker that batches requests from any thread
//!
//! # Architecture
//!
//! Callers talk to [`FontSystem`], which turns each call into a request on the
//! [`RequestQueue`](queue::RequestQueue) and hands back a [`Deferred`] result.
//! A single worker thread owns the [`FontLibrary`] and drains the queue:
//! 1. Metrics requests
//! 2. Measure requests
//! 3. Text line requests
//! 4. Glyph requests
//!
//! Glyphs are looked up in the [`GlyphCache`] first and rendered on a miss.

pub mod cache;
pub mod error;
pub mod layout;
pub mod library;
pub mod queue;
pub mod system;
pub mod types;
pub mod worker;

// Re-export main types for convenience
pub use cache::{GlyphCache, GlyphIdRegistry};
pub use error::FontError;
pub use layout::{GlyphSource, LayoutEngine};
pub use library::{FaceId, FontLibrary, FontNames, RasterOptions, SwashLibrary};
pub use queue::Deferred;
pub use system::FontSystem;
pub use types::{
    FontMetrics, FontSpec, Glyph, GlyphBitmap, GlyphIdentity, GlyphUid, RawGlyph, TextLine, Vec2,
};
pub use worker::{WorkerOptions, WorkerState};
