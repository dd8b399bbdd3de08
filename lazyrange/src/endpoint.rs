use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::future::Future;
use core::marker::PhantomData;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::cache::PageCache;
use crate::emitter::{Emitter, SubscriptionId};
use crate::segments;
use crate::{
    EndpointEvent, FetchError, LoadedStatus, Page, QueryEndpointOptions, Window,
};

/// The paginated request a [`QueryEndpoint`] is built on.
///
/// Implementations typically wrap an HTTP `list` call. The returned future must not borrow
/// `filter`; clone what you need out of it.
pub trait Request<T, F>: Send + Sync + 'static {
    fn request(
        &self,
        offset: usize,
        limit: usize,
        filter: &F,
    ) -> BoxFuture<'static, Result<Page<T>, FetchError>>;
}

struct FnRequest<R, Fut> {
    f: R,
    _fut: PhantomData<fn() -> Fut>,
}

impl<T, F, R, Fut> Request<T, F> for FnRequest<R, Fut>
where
    R: Fn(usize, usize, &F) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, FetchError>> + Send + 'static,
{
    fn request(
        &self,
        offset: usize,
        limit: usize,
        filter: &F,
    ) -> BoxFuture<'static, Result<Page<T>, FetchError>> {
        Box::pin((self.f)(offset, limit, filter))
    }
}

type Done = Shared<BoxFuture<'static, bool>>;

struct Inflight {
    id: u64,
    window: Window,
    /// Set when a local `remove`/`insert` shifted indexes under this request.
    stale: bool,
    done: Done,
}

struct State<T, F> {
    filter: F,
    cache: PageCache<T>,
    inflight: Vec<Inflight>,
    next_request_id: u64,
    failures: u64,
}

struct Inner<T, F> {
    request: Box<dyn Request<T, F>>,
    options: QueryEndpointOptions,
    state: Mutex<State<T, F>>,
    events: Emitter<EndpointEvent>,
}

/// A cached view over a remote paginated collection.
///
/// Synchronous operations (`find`, `retrieve`, `count`, `modify`, ...) only look at the cache
/// and never perform I/O. Asynchronous queries fetch whatever is missing, reuse in-flight
/// requests that already cover the missing items, and resolve to empty results on failure
/// (the failure itself goes to `QueryEndpointOptions::handle_error`).
///
/// Cloning is cheap and yields a handle to the same cache.
pub struct QueryEndpoint<T, F = ()> {
    inner: Arc<Inner<T, F>>,
}

impl<T, F> Clone for QueryEndpoint<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> core::fmt::Debug for QueryEndpoint<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("QueryEndpoint")
            .field("generation", &state.cache.generation())
            .field("total", &state.cache.total())
            .field("inflight", &state.inflight.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl<T, F> QueryEndpoint<T, F> {
    pub fn subscribe(
        &self,
        listener: impl Fn(&EndpointEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }
}

impl<T, F> QueryEndpoint<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(request: impl Request<T, F>, filter: F, options: QueryEndpointOptions) -> Self {
        vdebug!(segment_size = options.segment_size, "QueryEndpoint::new");
        Self {
            inner: Arc::new(Inner {
                request: Box::new(request),
                options,
                state: Mutex::new(State {
                    filter,
                    cache: PageCache::default(),
                    inflight: Vec::new(),
                    next_request_id: 1,
                    failures: 0,
                }),
                events: Emitter::new(),
            }),
        }
    }

    /// Creates an endpoint from an async function `(offset, limit, &filter) -> Result<Page<T>>`.
    pub fn from_fn<R, Fut>(request: R, filter: F, options: QueryEndpointOptions) -> Self
    where
        R: Fn(usize, usize, &F) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, FetchError>> + Send + 'static,
    {
        Self::new(
            FnRequest {
                f: request,
                _fut: PhantomData,
            },
            filter,
            options,
        )
    }

    pub fn options(&self) -> &QueryEndpointOptions {
        &self.inner.options
    }

    pub fn filter(&self) -> F {
        self.inner.state.lock().filter.clone()
    }

    /// Replaces the filter. The whole cache is dropped and `count()` is `None` until the first
    /// request under the new filter resolves.
    pub fn set_filter(&self, filter: F) {
        {
            let mut state = self.inner.state.lock();
            state.filter = filter;
            let generation = state.cache.reset();
            state.inflight.clear();
            vdebug!(generation, "QueryEndpoint::set_filter");
        }
        self.inner.events.emit(&EndpointEvent::Refresh);
    }

    /// Drops the cache. Requests still in flight complete, but their results are discarded.
    pub fn refresh(&self) {
        {
            let mut state = self.inner.state.lock();
            let generation = state.cache.reset();
            state.inflight.clear();
            vdebug!(generation, "QueryEndpoint::refresh");
        }
        self.inner.events.emit(&EndpointEvent::Refresh);
    }

    /// Cache generation; it changes on every `refresh`/`set_filter`.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().cache.generation()
    }

    /// The logical size of the collection, or `None` before the first response.
    pub fn count(&self) -> Option<usize> {
        self.inner.state.lock().cache.total()
    }

    /// Number of failed requests so far, each of which went to `handle_error`.
    pub(crate) fn failures(&self) -> u64 {
        self.inner.state.lock().failures
    }

    pub fn is_range_loaded(&self, offset: usize, limit: usize) -> LoadedStatus {
        let state = self.inner.state.lock();
        if state.cache.total().is_none() {
            return if state.inflight.is_empty() {
                LoadedStatus::NotLoaded
            } else {
                LoadedStatus::Loading
            };
        }
        let window = state.cache.clamp(Window::new(offset, limit));
        let runs = segments::missing_runs(window, |i| state.cache.is_loaded(i));
        if runs.is_empty() {
            LoadedStatus::Loaded
        } else if runs
            .iter()
            .all(|run| segments::subtract(*run, &pending(&state.inflight)).is_empty())
        {
            LoadedStatus::Loading
        } else {
            LoadedStatus::NotLoaded
        }
    }

    /// Returns the item at `index`, fetching it when it is not cached.
    ///
    /// Resolves to `None` when `index` is outside `[0, count)` or the request failed.
    pub async fn query_one(&self, index: usize) -> Option<T> {
        {
            let state = self.inner.state.lock();
            if let Some(total) = state.cache.total() {
                if index >= total {
                    return None;
                }
            }
            if let Some(item) = state.cache.get(index) {
                return Some(item.clone());
            }
        }

        let (generation, waits) = self.ensure(Window::new(index, 1), false);
        if !future::join_all(waits).await.into_iter().all(|ok| ok) {
            return None;
        }
        let state = self.inner.state.lock();
        if state.cache.generation() != generation {
            return None;
        }
        state.cache.get(index).cloned()
    }

    /// Returns the items `[start, start + count)` in logical order, clamped to the total.
    ///
    /// Only the missing sub-ranges are requested. Resolves to an empty `Vec` when any request
    /// failed or the cache was refreshed meanwhile.
    pub async fn query_range(&self, start: usize, count: usize) -> Vec<T> {
        let window = Window::new(start, count);
        let (generation, waits) = self.ensure(window, true);
        if !waits.is_empty() && !future::join_all(waits).await.into_iter().all(|ok| ok) {
            return Vec::new();
        }
        let state = self.inner.state.lock();
        if state.cache.generation() != generation {
            return Vec::new();
        }
        state.cache.collect(window)
    }

    /// Fetches several arbitrary indexes; each entry is `None` when unavailable.
    pub async fn query_list(&self, indexes: &[usize]) -> Vec<Option<T>> {
        future::join_all(indexes.iter().map(|&i| self.query_one(i))).await
    }

    /// Searches the cached items only, starting around `priority` (usually the rendered
    /// window) and spreading outward. Never performs I/O.
    pub fn find(&self, predicate: impl FnMut(&T) -> bool, priority: Option<Window>) -> Option<usize> {
        let state = self.inner.state.lock();
        state.cache.find(
            predicate,
            priority.unwrap_or(Window::EMPTY),
            self.inner.options.segment_size,
        )
    }

    /// Returns the cached item at `index`. Never performs I/O.
    pub fn retrieve(&self, index: usize) -> Option<T> {
        self.inner.state.lock().cache.get(index).cloned()
    }

    /// Returns the whole window if every item of it is cached. Never performs I/O.
    pub fn retrieve_range(&self, offset: usize, limit: usize) -> Option<Vec<T>> {
        let state = self.inner.state.lock();
        let window = Window::new(offset, limit);
        if !state.cache.is_window_loaded(window) {
            return None;
        }
        Some(state.cache.collect(window))
    }

    /// Replaces a cached item after a local edit.
    pub fn modify(&self, index: usize, item: T) -> bool {
        let ok = self.inner.state.lock().cache.modify(index, item);
        if ok {
            vtrace!(index, "QueryEndpoint::modify");
            self.inner.events.emit(&EndpointEvent::Modify { index });
        }
        ok
    }

    /// Removes an item after a local delete; the total shrinks by one.
    pub fn remove(&self, index: usize) -> bool {
        let ok = {
            let mut state = self.inner.state.lock();
            let ok = state.cache.remove(index);
            if ok {
                mark_stale_after(&mut state.inflight, index);
            }
            ok
        };
        if ok {
            vtrace!(index, "QueryEndpoint::remove");
            self.inner.events.emit(&EndpointEvent::Remove { index });
        }
        ok
    }

    /// Inserts an item after a local add; the total grows by one.
    pub fn insert(&self, index: usize, item: T) -> bool {
        let ok = {
            let mut state = self.inner.state.lock();
            let ok = state.cache.insert(index, item);
            if ok {
                mark_stale_after(&mut state.inflight, index);
            }
            ok
        };
        if ok {
            vtrace!(index, "QueryEndpoint::insert");
            self.inner.events.emit(&EndpointEvent::Add { index });
        }
        ok
    }

    /// Registers the requests needed to load `window` and returns what to wait for.
    ///
    /// `widen` aligns missing runs to segment boundaries; single-item lookups skip it.
    fn ensure(&self, window: Window, widen: bool) -> (u64, Vec<Done>) {
        let mut state = self.inner.state.lock();
        let generation = state.cache.generation();
        let total = state.cache.total();
        let window = state.cache.clamp(window);
        if window.is_empty() {
            return (generation, Vec::new());
        }

        let runs = segments::missing_runs(window, |i| state.cache.is_loaded(i));
        let pending = pending(&state.inflight);
        let mut waits = Vec::new();
        let mut reused: Vec<u64> = Vec::new();
        let mut fresh = Vec::new();
        for run in runs {
            // Wait on every live request overlapping the run; only fetch what none of them covers.
            for f in state.inflight.iter().filter(|f| !f.stale && overlaps(f.window, run)) {
                if !reused.contains(&f.id) {
                    vtrace!(
                        id = f.id,
                        offset = run.offset,
                        limit = run.limit,
                        "reusing in-flight request"
                    );
                    reused.push(f.id);
                    waits.push(f.done.clone());
                }
            }
            for gap in segments::subtract(run, &pending) {
                let wanted = if widen {
                    segments::align(gap, self.inner.options.segment_size, total)
                } else {
                    gap
                };
                fresh.extend(segments::subtract(wanted, &pending));
            }
        }
        for w in segments::coalesce(fresh) {
            waits.push(self.start_request(&mut state, generation, w));
        }
        (generation, waits)
    }

    fn start_request(&self, state: &mut State<T, F>, generation: u64, window: Window) -> Done {
        let id = state.next_request_id;
        state.next_request_id += 1;
        vdebug!(
            id,
            generation,
            offset = window.offset,
            limit = window.limit,
            "request"
        );

        let response = self
            .inner
            .request
            .request(window.offset, window.limit, &state.filter);
        let weak: Weak<Inner<T, F>> = Arc::downgrade(&self.inner);
        let done = async move {
            let result = response.await;
            match weak.upgrade() {
                Some(inner) => complete(&inner, id, generation, window, result),
                None => false,
            }
        }
        .boxed()
        .shared();

        state.inflight.push(Inflight {
            id,
            window,
            stale: false,
            done: done.clone(),
        });
        done
    }
}

fn complete<T, F>(
    inner: &Inner<T, F>,
    id: u64,
    generation: u64,
    window: Window,
    result: Result<Page<T>, FetchError>,
) -> bool {
    let mut state = inner.state.lock();
    if state.cache.generation() != generation {
        vdebug!(id, generation, "discarding response of an outdated generation");
        return false;
    }
    let stale = match state.inflight.iter().position(|f| f.id == id) {
        Some(pos) => state.inflight.swap_remove(pos).stale,
        None => false,
    };
    match result {
        Ok(page) => {
            if stale {
                vdebug!(id, "discarding response shifted by a local edit");
            } else {
                vtrace!(id, total = page.total, len = page.result.len(), "response");
                state.cache.apply_page(window.offset, page);
            }
            true
        }
        Err(error) => {
            state.failures += 1;
            drop(state);
            vwarn!(id, offset = window.offset, limit = window.limit, %error, "request failed");
            if let Some(handle_error) = &inner.options.handle_error {
                handle_error(&error);
            }
            false
        }
    }
}

/// Windows of the requests whose responses will still be applied.
fn pending(inflight: &[Inflight]) -> Vec<Window> {
    inflight.iter().filter(|f| !f.stale).map(|f| f.window).collect()
}

fn overlaps(a: Window, b: Window) -> bool {
    a.offset < b.end() && b.offset < a.end()
}

fn mark_stale_after(inflight: &mut [Inflight], index: usize) {
    for f in inflight.iter_mut() {
        if f.window.end() > index {
            f.stale = true;
        }
    }
}
