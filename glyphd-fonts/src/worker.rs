//! Background font worker.
//!
//! The worker thread builds the [`FontLibrary`], loads the font directory
//! once, then drains the [`RequestQueue`] in batches until it is dropped. The
//! library never leaves that thread; callers only reach it through the queue.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{GlyphCache, GlyphIdRegistry};
use crate::error::FontError;
use crate::layout::{GlyphSource, LayoutEngine};
use crate::library::{FaceId, FontLibrary, FontNames};
use crate::queue::{Batch, Deferred, OnceSlot, Request, RequestQueue};
use crate::types::{FontMetrics, FontSpec, Glyph, GlyphIdentity};

/// Name of the worker thread.
pub const THREAD_NAME: &str = "glyphd-font-worker";

/// Lifecycle of a font worker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Thread spawned, not yet running
    Idle = 0,
    /// Building the library and loading fonts
    Initializing = 1,
    /// Handling requests
    Serving = 2,
    /// Asked to stop; finishing the current batch
    ShuttingDown = 3,
    /// Thread finished, either after shutdown or a failed initialization
    Terminated = 4,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Initializing,
            2 => WorkerState::Serving,
            3 => WorkerState::ShuttingDown,
            _ => WorkerState::Terminated,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Initializing => "initializing",
            WorkerState::Serving => "serving",
            WorkerState::ShuttingDown => "shutting down",
            WorkerState::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Settings for one worker.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Directory scanned once at startup
    pub font_directory: PathBuf,
    pub glyph_cache_capacity: usize,
    /// Longest idle wait before the worker re-checks its running flag
    pub poll_interval: Duration,
    /// How often to log glyph cache statistics; `None` disables them
    pub stats_interval: Option<Duration>,
    /// Identity → uid registry; the process-wide one unless a test isolates it
    pub registry: Arc<GlyphIdRegistry>,
}

impl WorkerOptions {
    pub fn from_config(config: &glyphd_config::Config) -> Self {
        Self {
            font_directory: config.resolved_font_directory(),
            glyph_cache_capacity: config.glyph_cache_capacity,
            poll_interval: config.poll_interval(),
            stats_interval: config.stats_interval(),
            registry: GlyphIdRegistry::global(),
        }
    }
}

/// State shared between the worker thread and its handle.
struct Shared {
    queue: RequestQueue,
    cache: GlyphCache,
    registry: Arc<GlyphIdRegistry>,
    font_names: OnceSlot<FontNames>,
    state: AtomicU8,
    running: AtomicBool,
    init_error: Mutex<Option<FontError>>,
}

impl Shared {
    fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Record a fatal initialization error and fail everyone waiting.
    fn fail_init(&self, error: FontError) {
        log::error!("Font worker failed to initialize: {}", error);
        *self.init_error.lock() = Some(error.clone());
        self.font_names.fail(error.clone());
        let failed = self.queue.close(error);
        if failed > 0 {
            log::warn!("Failed {} queued font requests", failed);
        }
    }
}

/// Runs when the worker thread exits, normally or by unwinding.
struct ExitGuard<'a> {
    shared: &'a Shared,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let failed = self.shared.queue.close(FontError::ShutDown);
        if failed > 0 {
            log::debug!("Failed {} font requests left at shutdown", failed);
        }
        self.shared.font_names.fail(FontError::ShutDown);
        self.shared.set_state(WorkerState::Terminated);
        log::info!("Font worker stopped");
    }
}

/// Handle to the font worker thread.
///
/// Dropping it stops the thread: the batch in progress completes, requests
/// still queued fail with [`FontError::ShutDown`], and the call returns once
/// the thread has exited.
pub struct FontWorker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl FontWorker {
    /// Start a worker whose library is built by `make_library` on the worker
    /// thread.
    pub fn spawn<F, L>(make_library: F, options: WorkerOptions) -> Result<Self, FontError>
    where
        F: FnOnce() -> Result<L, FontError> + Send + 'static,
        L: FontLibrary,
    {
        let shared = Arc::new(Shared {
            queue: RequestQueue::new(),
            cache: GlyphCache::new(options.glyph_cache_capacity),
            registry: Arc::clone(&options.registry),
            font_names: OnceSlot::new(),
            state: AtomicU8::new(WorkerState::Idle as u8),
            running: AtomicBool::new(true),
            init_error: Mutex::new(None),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(&thread_shared, make_library, options))
            .map_err(|e| FontError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            shared,
            thread: Some(handle),
        })
    }

    /// Queue a request for the worker.
    pub fn submit(&self, request: Request) {
        log::trace!("Queued font request: {:?}", request);
        self.shared.queue.push(request);
    }

    /// Family names found at startup, once loading finishes.
    pub fn font_names(&self) -> Deferred<FontNames> {
        self.shared.font_names.subscribe()
    }

    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// The error that stopped initialization, if any.
    pub fn init_error(&self) -> Option<FontError> {
        self.shared.init_error.lock().clone()
    }

    pub fn cache(&self) -> &GlyphCache {
        &self.shared.cache
    }

    /// Requests waiting for the worker.
    pub fn pending_requests(&self) -> usize {
        self.shared.queue.pending_len()
    }
}

impl Drop for FontWorker {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        let _ = self
            .shared
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (state != WorkerState::Terminated as u8)
                    .then_some(WorkerState::ShuttingDown as u8)
            });
        self.shared.queue.wake();
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            log::error!("Font worker thread panicked");
        }
    }
}

fn run<F, L>(shared: &Shared, make_library: F, options: WorkerOptions)
where
    F: FnOnce() -> Result<L, FontError>,
    L: FontLibrary,
{
    let _exit = ExitGuard { shared };
    shared.set_state(WorkerState::Initializing);
    log::info!("Loading fonts from {}", options.font_directory.display());

    let mut library = match make_library() {
        Ok(library) => library,
        Err(error) => {
            shared.fail_init(error);
            return;
        }
    };
    let names = match library.load_fonts(&options.font_directory) {
        Ok(names) => names,
        Err(error) => {
            shared.fail_init(error);
            return;
        }
    };
    log::info!("Loaded {} font families", names.len());
    shared.font_names.resolve(names);

    // Drop may already have asked us to stop while fonts were loading.
    let _ = shared.state.compare_exchange(
        WorkerState::Initializing as u8,
        WorkerState::Serving as u8,
        Ordering::SeqCst,
        Ordering::SeqCst,
    );

    let mut next_stats = options.stats_interval.map(|interval| Instant::now() + interval);
    while shared.running.load(Ordering::SeqCst) {
        let batch = shared.queue.wait_batch(options.poll_interval);
        if !batch.is_empty() {
            log::debug!("Handling {} font requests", batch.len());
            BatchHandler {
                library: &mut library,
                cache: &shared.cache,
                registry: &shared.registry,
            }
            .handle(batch);
        }

        if let (Some(due), Some(interval)) = (next_stats, options.stats_interval)
            && Instant::now() >= due
        {
            log::debug!(
                "Glyph cache: {} ({:.1}%)",
                shared.cache.len(),
                shared.cache.percentage_used()
            );
            next_stats = Some(Instant::now() + interval);
        }
    }
}

/// Resolves one batch against the library and glyph cache.
struct BatchHandler<'a, L> {
    library: &'a mut L,
    cache: &'a GlyphCache,
    registry: &'a GlyphIdRegistry,
}

impl<L: FontLibrary> BatchHandler<'_, L> {
    fn handle(&mut self, batch: Batch) {
        for request in batch.metrics {
            let metrics = self.metrics(&request.spec);
            request.resolve(metrics);
        }
        for request in batch.measure {
            let size = self
                .layout(&request.spec)
                .map(|mut engine| engine.measure(&request.text, request.max_line_width))
                .unwrap_or_default();
            request.resolve(size);
        }
        for request in batch.text_lines {
            let lines = self
                .layout(&request.spec)
                .map(|mut engine| engine.text_lines(&request.text, request.max_line_width))
                .unwrap_or_default();
            request.resolve(lines);
        }
        for request in batch.glyphs {
            let glyphs = self
                .layout(&request.spec)
                .map(|mut engine| engine.glyphs(&request.text))
                .unwrap_or_default();
            request.resolve(glyphs);
        }
    }

    /// Face for `spec` with its pixel size applied.
    fn select(&mut self, spec: &FontSpec) -> Option<FaceId> {
        let Some(face) = self.library.face(&spec.family, &spec.face) else {
            log::debug!("No font face {} {}", spec.family, spec.face);
            return None;
        };
        self.library.set_pixel_size(face, spec.size).then_some(face)
    }

    fn metrics(&mut self, spec: &FontSpec) -> FontMetrics {
        self.select(spec)
            .and_then(|face| self.library.metrics(face))
            .unwrap_or_default()
    }

    fn layout<'s>(&'s mut self, spec: &'s FontSpec) -> Option<LayoutEngine<FaceGlyphs<'s, L>>> {
        let face = self.select(spec)?;
        let line_height = self
            .library
            .metrics(face)
            .map(|metrics| metrics.line_height)
            .unwrap_or_default();
        let source = FaceGlyphs {
            library: &mut *self.library,
            cache: self.cache,
            registry: self.registry,
            face,
            spec,
        };
        Some(LayoutEngine::new(source, line_height))
    }
}

/// Glyphs of one sized face, served from the cache and rendered on a miss.
struct FaceGlyphs<'a, L> {
    library: &'a mut L,
    cache: &'a GlyphCache,
    registry: &'a GlyphIdRegistry,
    face: FaceId,
    spec: &'a FontSpec,
}

impl<L: FontLibrary> GlyphSource for FaceGlyphs<'_, L> {
    fn glyph(&mut self, code: u32) -> Option<Arc<Glyph>> {
        let identity = GlyphIdentity::new(code, self.spec.clone());
        let uid = self.registry.uid(&identity);
        if let Some(glyph) = self.cache.get(uid) {
            return Some(glyph);
        }
        let raw = self.library.render_glyph(self.face, code)?;
        let glyph = Arc::new(Glyph::new(identity, uid, raw));
        self.cache.put(uid, Arc::clone(&glyph));
        Some(glyph)
    }
}
