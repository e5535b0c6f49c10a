//! Deferred results and the request queue between callers and the font worker.
//!
//! Callers push typed requests; each carries the sending half of a oneshot
//! channel and the caller keeps a [`Deferred`] for the receiving half. The
//! worker drains everything pending in one [`Batch`] per wake-up.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::FontError;
use crate::types::{FontMetrics, FontSpec, Glyph, TextLine, Vec2};

/// Sending half of a deferred result.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Result<T, FontError>>,
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        self.send(Ok(value));
    }

    pub fn fail(self, error: FontError) {
        self.send(Err(error));
    }

    fn send(self, result: Result<T, FontError>) {
        if self.tx.send(result).is_err() {
            // The caller dropped its handle; nobody is waiting.
            log::trace!("Deferred result discarded, receiver dropped");
        }
    }
}

/// A result the font worker will produce later.
///
/// Wait for it from a plain thread with [`Deferred::wait`], poll it with
/// [`Deferred::try_take`], or `.await` it from async code.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T, FontError>>,
}

impl<T> Deferred<T> {
    /// A connected resolver/deferred pair.
    pub fn channel() -> (Resolver<T>, Deferred<T>) {
        let (tx, rx) = oneshot::channel();
        (Resolver { tx }, Deferred { rx })
    }

    /// A deferred that is already resolved.
    pub fn ready(result: Result<T, FontError>) -> Self {
        let (resolver, deferred) = Self::channel();
        resolver.send(result);
        deferred
    }

    /// Block the current thread until the result is available.
    ///
    /// Must not be called from inside an async runtime; `.await` instead.
    pub fn wait(self) -> Result<T, FontError> {
        self.rx.blocking_recv().unwrap_or(Err(FontError::WorkerGone))
    }

    /// The result if it is ready, without blocking.
    ///
    /// Once a result has been returned the deferred is spent and further
    /// calls report [`FontError::WorkerGone`].
    pub fn try_take(&mut self) -> Option<Result<T, FontError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(FontError::WorkerGone)),
        }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, FontError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(FontError::WorkerGone)))
    }
}

/// Vertical metrics for a font.
#[derive(Debug)]
pub struct MetricsRequest {
    pub spec: FontSpec,
    resolver: Resolver<FontMetrics>,
}

impl MetricsRequest {
    pub fn new(spec: FontSpec) -> (Self, Deferred<FontMetrics>) {
        let (resolver, deferred) = Deferred::channel();
        (Self { spec, resolver }, deferred)
    }

    pub fn resolve(self, metrics: FontMetrics) {
        self.resolver.resolve(metrics);
    }
}

/// Size of a text block, optionally word-wrapped.
#[derive(Debug)]
pub struct MeasureRequest {
    pub text: String,
    pub spec: FontSpec,
    pub max_line_width: f32,
    resolver: Resolver<Vec2>,
}

impl MeasureRequest {
    pub fn new(text: String, spec: FontSpec, max_line_width: f32) -> (Self, Deferred<Vec2>) {
        let (resolver, deferred) = Deferred::channel();
        let request = Self {
            text,
            spec,
            max_line_width,
            resolver,
        };
        (request, deferred)
    }

    pub fn resolve(self, size: Vec2) {
        self.resolver.resolve(size);
    }
}

/// Text broken into wrapped lines.
#[derive(Debug)]
pub struct TextLinesRequest {
    pub text: String,
    pub spec: FontSpec,
    pub max_line_width: f32,
    resolver: Resolver<Vec<TextLine>>,
}

impl TextLinesRequest {
    pub fn new(
        text: String,
        spec: FontSpec,
        max_line_width: f32,
    ) -> (Self, Deferred<Vec<TextLine>>) {
        let (resolver, deferred) = Deferred::channel();
        let request = Self {
            text,
            spec,
            max_line_width,
            resolver,
        };
        (request, deferred)
    }

    pub fn resolve(self, lines: Vec<TextLine>) {
        self.resolver.resolve(lines);
    }
}

/// Rendered glyphs for every codepoint of a text.
#[derive(Debug)]
pub struct GlyphsRequest {
    pub text: String,
    pub spec: FontSpec,
    resolver: Resolver<Vec<Arc<Glyph>>>,
}

impl GlyphsRequest {
    pub fn new(text: String, spec: FontSpec) -> (Self, Deferred<Vec<Arc<Glyph>>>) {
        let (resolver, deferred) = Deferred::channel();
        (Self { text, spec, resolver }, deferred)
    }

    pub fn resolve(self, glyphs: Vec<Arc<Glyph>>) {
        self.resolver.resolve(glyphs);
    }
}

/// Any request the font worker handles.
#[derive(Debug)]
pub enum Request {
    Metrics(MetricsRequest),
    Measure(MeasureRequest),
    TextLines(TextLinesRequest),
    Glyphs(GlyphsRequest),
}

impl Request {
    pub fn fail(self, error: FontError) {
        match self {
            Request::Metrics(r) => r.resolver.fail(error),
            Request::Measure(r) => r.resolver.fail(error),
            Request::TextLines(r) => r.resolver.fail(error),
            Request::Glyphs(r) => r.resolver.fail(error),
        }
    }
}

/// Requests drained from the queue in one go, grouped by kind.
///
/// Within a kind, requests keep their submission order.
#[derive(Debug, Default)]
pub struct Batch {
    pub metrics: Vec<MetricsRequest>,
    pub measure: Vec<MeasureRequest>,
    pub text_lines: Vec<TextLinesRequest>,
    pub glyphs: Vec<GlyphsRequest>,
}

impl Batch {
    pub fn push(&mut self, request: Request) {
        match request {
            Request::Metrics(r) => self.metrics.push(r),
            Request::Measure(r) => self.measure.push(r),
            Request::TextLines(r) => self.text_lines.push(r),
            Request::Glyphs(r) => self.glyphs.push(r),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.metrics.len() + self.measure.len() + self.text_lines.len() + self.glyphs.len()
    }

    /// Fail every request with `error`, returning how many there were.
    pub fn fail_all(self, error: &FontError) -> usize {
        let count = self.len();
        for r in self.metrics {
            r.resolver.fail(error.clone());
        }
        for r in self.measure {
            r.resolver.fail(error.clone());
        }
        for r in self.text_lines {
            r.resolver.fail(error.clone());
        }
        for r in self.glyphs {
            r.resolver.fail(error.clone());
        }
        count
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: Batch,
    /// Set once the worker can no longer serve; later pushes fail with it
    closed: Option<FontError>,
    woken: bool,
}

/// Multi-producer request queue drained by the font worker.
#[derive(Debug, Default)]
pub struct RequestQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `request` and wake the worker.
    ///
    /// If the queue is closed the request fails immediately with the close
    /// error instead.
    pub fn push(&self, request: Request) {
        let mut state = self.state.lock();
        if let Some(error) = state.closed.clone() {
            drop(state);
            request.fail(error);
            return;
        }
        state.pending.push(request);
        drop(state);
        self.ready.notify_one();
    }

    /// Take everything pending, first waiting up to `timeout` if nothing is.
    ///
    /// Returns an empty batch on timeout, on [`RequestQueue::wake`] and once
    /// the queue is closed.
    pub fn wait_batch(&self, timeout: Duration) -> Batch {
        let mut state = self.state.lock();
        if state.pending.is_empty() && state.closed.is_none() && !state.woken {
            self.ready.wait_for(&mut state, timeout);
        }
        state.woken = false;
        std::mem::take(&mut state.pending)
    }

    /// Interrupt a worker blocked in [`RequestQueue::wait_batch`].
    pub fn wake(&self) {
        self.state.lock().woken = true;
        self.ready.notify_all();
    }

    /// Stop accepting requests and fail everything still pending.
    ///
    /// The first close error sticks. Returns the number of requests failed.
    pub fn close(&self, error: FontError) -> usize {
        let mut state = self.state.lock();
        let error = state.closed.get_or_insert(error).clone();
        let pending = std::mem::take(&mut state.pending);
        drop(state);
        self.ready.notify_all();
        pending.fail_all(&error)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed.is_some()
    }

    /// Number of requests waiting for the worker.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}

#[derive(Debug)]
enum SlotState<T> {
    Pending(Vec<Resolver<T>>),
    Ready(T),
    Failed(FontError),
}

/// A value produced once by the worker and handed to any number of callers,
/// whether they subscribe before or after it is ready.
#[derive(Debug)]
pub struct OnceSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending(Vec::new())),
        }
    }
}

impl<T: Clone> OnceSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Deferred<T> {
        let mut state = self.state.lock();
        match &mut *state {
            SlotState::Pending(waiters) => {
                let (resolver, deferred) = Deferred::channel();
                waiters.push(resolver);
                deferred
            }
            SlotState::Ready(value) => Deferred::ready(Ok(value.clone())),
            SlotState::Failed(error) => Deferred::ready(Err(error.clone())),
        }
    }

    /// Publish the value. Ignored if the slot is already settled.
    pub fn resolve(&self, value: T) {
        let waiters = {
            let mut state = self.state.lock();
            let SlotState::Pending(waiters) = &mut *state else {
                return;
            };
            let waiters = std::mem::take(waiters);
            *state = SlotState::Ready(value.clone());
            waiters
        };
        for waiter in waiters {
            waiter.resolve(value.clone());
        }
    }

    /// Settle the slot with `error`. Ignored if it is already settled.
    pub fn fail(&self, error: FontError) {
        let waiters = {
            let mut state = self.state.lock();
            let SlotState::Pending(waiters) = &mut *state else {
                return;
            };
            let waiters = std::mem::take(waiters);
            *state = SlotState::Failed(error.clone());
            waiters
        };
        for waiter in waiters {
            waiter.fail(error.clone());
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(*self.state.lock(), SlotState::Pending(_))
    }
}
