//! The font system facade used by the rest of the application.

use std::sync::Arc;

use crate::error::FontError;
use crate::library::{FontLibrary, FontNames, RasterOptions, SwashLibrary};
use crate::queue::{
    Deferred, GlyphsRequest, MeasureRequest, MetricsRequest, Request, TextLinesRequest,
};
use crate::types::{FontMetrics, FontSpec, Glyph, TextLine, Vec2};
use crate::worker::{FontWorker, WorkerOptions, WorkerState};

/// Asynchronous font metrics, text measurement and glyph rendering.
///
/// Every request returns a [`Deferred`] immediately; the work happens on a
/// background thread. Dropping the system stops that thread.
///
/// # Example
///
/// ```no_run
/// use glyphd_fonts::{FontSpec, FontSystem};
///
/// let config = glyphd_config::Config::default();
/// let fonts = FontSystem::new(&config)?;
/// let size = fonts.measure("Hello", &FontSpec::default()).wait()?;
/// println!("{} x {}", size.x, size.y);
/// # Ok::<(), glyphd_fonts::FontError>(())
/// ```
pub struct FontSystem {
    worker: FontWorker,
}

impl FontSystem {
    /// Start a font system backed by swash, configured from `config`.
    pub fn new(config: &glyphd_config::Config) -> Result<Self, FontError> {
        let options = RasterOptions::from(config);
        let system_fonts = config.system_fonts;
        Self::with_library(
            move || Ok(SwashLibrary::new(options).with_system_fonts(system_fonts)),
            config,
        )
    }

    /// Start a font system whose library is built by `make_library` on the
    /// worker thread.
    pub fn with_library<F, L>(
        make_library: F,
        config: &glyphd_config::Config,
    ) -> Result<Self, FontError>
    where
        F: FnOnce() -> Result<L, FontError> + Send + 'static,
        L: FontLibrary,
    {
        Self::with_options(make_library, WorkerOptions::from_config(config))
    }

    pub fn with_options<F, L>(make_library: F, options: WorkerOptions) -> Result<Self, FontError>
    where
        F: FnOnce() -> Result<L, FontError> + Send + 'static,
        L: FontLibrary,
    {
        Ok(Self {
            worker: FontWorker::spawn(make_library, options)?,
        })
    }

    /// Font families found in the font directory, resolved once loading
    /// finishes.
    pub fn font_names(&self) -> Deferred<FontNames> {
        self.worker.font_names()
    }

    pub fn metrics(&self, spec: &FontSpec) -> Deferred<FontMetrics> {
        let (request, deferred) = MetricsRequest::new(spec.clone());
        self.worker.submit(Request::Metrics(request));
        deferred
    }

    /// Size of `text` without wrapping.
    pub fn measure(&self, text: &str, spec: &FontSpec) -> Deferred<Vec2> {
        self.measure_wrapped(text, f32::MAX, spec)
    }

    /// Size of `text` word-wrapped at `max_line_width`.
    pub fn measure_wrapped(&self, text: &str, max_line_width: f32, spec: &FontSpec) -> Deferred<Vec2> {
        let (request, deferred) = MeasureRequest::new(text.to_string(), spec.clone(), max_line_width);
        self.worker.submit(Request::Measure(request));
        deferred
    }

    /// `text` broken into lines no wider than `max_line_width` where possible.
    pub fn text_lines(
        &self,
        text: &str,
        max_line_width: f32,
        spec: &FontSpec,
    ) -> Deferred<Vec<TextLine>> {
        let (request, deferred) =
            TextLinesRequest::new(text.to_string(), spec.clone(), max_line_width);
        self.worker.submit(Request::TextLines(request));
        deferred
    }

    /// Rendered glyphs for the codepoints of `text` the font can render.
    pub fn glyphs(&self, text: &str, spec: &FontSpec) -> Deferred<Vec<Arc<Glyph>>> {
        let (request, deferred) = GlyphsRequest::new(text.to_string(), spec.clone());
        self.worker.submit(Request::Glyphs(request));
        deferred
    }

    /// Number of glyphs in the cache.
    pub fn glyph_cache_size(&self) -> usize {
        self.worker.cache().len()
    }

    /// Glyph cache fill level in percent.
    pub fn glyph_cache_percentage(&self) -> f32 {
        self.worker.cache().percentage_used()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// True once fonts are loaded and requests are being served.
    pub fn is_ready(&self) -> bool {
        self.state() == WorkerState::Serving
    }

    pub fn init_error(&self) -> Option<FontError> {
        self.worker.init_error()
    }
}

impl std::fmt::Debug for FontSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSystem")
            .field("state", &self.state())
            .field("glyph_cache", self.worker.cache())
            .finish()
    }
}
