//! Default values for configuration fields.

/// Glyph cache bound (number of rendered glyphs kept).
pub fn glyph_cache_capacity() -> usize {
    10_000
}

/// How long the font worker waits for work before re-checking its running flag.
pub fn poll_interval_ms() -> u64 {
    100
}

/// Interval between glyph cache statistics log lines.
pub fn stats_interval_ms() -> u64 {
    10_000
}

pub fn hinting() -> bool {
    true
}
