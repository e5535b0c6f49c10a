//! Text measurement, line breaking and glyph lists.
//!
//! Layout walks the codepoints of a text left to right with a pen position,
//! applying the hinting-aware kerning correction between neighbouring glyphs
//! and greedy word wrap at space/tab break opportunities.

use std::sync::Arc;

use crate::types::{Glyph, TextLine, Vec2};

/// Supplies rendered glyphs for one font configuration.
pub trait GlyphSource {
    /// The glyph for `code`, or `None` when the font has none.
    fn glyph(&mut self, code: u32) -> Option<Arc<Glyph>>;
}

/// Space and tab: content that may end a wrapped line.
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Line feed and carriage return: forced line breaks.
pub fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Whole-pixel correction between two glyphs from the right side bearing
/// shift of the previous glyph and the left side bearing shift of the next,
/// both in 26.6 fixed point.
pub fn kerning_correction(prev_rsb_delta: i32, lsb_delta: i32) -> f32 {
    let diff = prev_rsb_delta - lsb_delta;
    if diff > 32 {
        -1.0
    } else if diff < -31 {
        1.0
    } else {
        0.0
    }
}

/// A laid out line: a char range of the input and its width.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineSpan {
    start: usize,
    end: usize,
    width: f32,
}

/// Lays text out with glyphs from `S` at a fixed line height.
pub struct LayoutEngine<S> {
    source: S,
    line_height: f32,
}

impl<S: GlyphSource> LayoutEngine<S> {
    pub fn new(source: S, line_height: f32) -> Self {
        Self {
            source,
            line_height,
        }
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Size of `text` wrapped at `max_line_width`: the widest line by the
    /// number of lines times the line height.
    ///
    /// Empty text measures as one empty line.
    pub fn measure(&mut self, text: &str, max_line_width: f32) -> Vec2 {
        let chars: Vec<char> = text.chars().collect();
        let lines = self.break_lines(&chars, max_line_width);
        let width = lines.iter().fold(0.0f32, |w, line| w.max(line.width));
        Vec2::new(width, lines.len() as f32 * self.line_height)
    }

    /// `text` split into lines at forced breaks and wrap points.
    ///
    /// Line text excludes the break characters. A trailing newline yields a
    /// final empty line; empty text yields no lines.
    pub fn text_lines(&mut self, text: &str, max_line_width: f32) -> Vec<TextLine> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        self.break_lines(&chars, max_line_width)
            .into_iter()
            .map(|line| {
                let text: String = chars[line.start..line.end].iter().collect();
                TextLine::new(text, Vec2::new(line.width, self.line_height))
            })
            .collect()
    }

    /// Glyphs for every codepoint of `text` in order, skipping codepoints the
    /// font cannot render.
    pub fn glyphs(&mut self, text: &str) -> Vec<Arc<Glyph>> {
        text.chars()
            .filter_map(|c| self.source.glyph(c as u32))
            .collect()
    }

    /// Pen advance for `c` after kerning against the previous glyph.
    fn advance(&mut self, c: char, prev_rsb_delta: &mut i32) -> f32 {
        match self.source.glyph(c as u32) {
            Some(glyph) => {
                let advance = glyph.advance + kerning_correction(*prev_rsb_delta, glyph.lsb_delta);
                *prev_rsb_delta = glyph.rsb_delta;
                advance
            }
            None => {
                *prev_rsb_delta = 0;
                0.0
            }
        }
    }

    /// Split `chars` into lines at hard breaks and, past `max_line_width`, at
    /// the last space or tab.
    ///
    /// A line with no space or tab to break at is never split mid-token: an
    /// over-wide word stays whole on one line, wider than the limit.
    fn break_lines(&mut self, chars: &[char], max_line_width: f32) -> Vec<LineSpan> {
        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut pen = 0.0f32;
        let mut prev_rsb_delta = 0;
        // Most recent space on the current line and the pen x before it.
        let mut opportunity: Option<(usize, f32)> = None;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if is_newline(c) {
                lines.push(LineSpan {
                    start: line_start,
                    end: i,
                    width: pen,
                });
                i += if c == '\r' && chars.get(i + 1) == Some(&'\n') {
                    2
                } else {
                    1
                };
                line_start = i;
                pen = 0.0;
                prev_rsb_delta = 0;
                opportunity = None;
                continue;
            }

            let advance = self.advance(c, &mut prev_rsb_delta);
            let space = is_space(c);
            if !space
                && pen > 0.0
                && pen + advance > max_line_width
                && let Some((at, width)) = opportunity.take()
            {
                lines.push(LineSpan {
                    start: line_start,
                    end: at,
                    width,
                });
                i = at + 1;
                line_start = i;
                pen = 0.0;
                prev_rsb_delta = 0;
                continue;
            }

            if space && i > line_start {
                opportunity = Some((i, pen));
            }
            pen += advance;
            i += 1;
        }

        lines.push(LineSpan {
            start: line_start,
            end: chars.len(),
            width: pen,
        });
        lines
    }
}
