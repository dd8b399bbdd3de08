//! Append-only loading ("load more") over the same paginated request as [`crate::QueryEndpoint`].

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use parking_lot::Mutex;

use crate::emitter::{Emitter, SubscriptionId};
use crate::{ContinuousOptions, FetchError, Page, Request};

/// Items loaded so far plus the last reported total.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuousData<T> {
    pub total: usize,
    pub result: Vec<T>,
}

impl<T> Default for ContinuousData<T> {
    fn default() -> Self {
        Self {
            total: 0,
            result: Vec::new(),
        }
    }
}

impl<T> ContinuousData<T> {
    /// `true` while the backend reports more items than are loaded.
    pub fn has_more(&self) -> bool {
        self.result.len() < self.total
    }
}

struct State<T, F> {
    filter: F,
    /// Bumped by `refresh`, `clear` and `set_filter`; responses of older versions are dropped.
    version: u64,
    loading: bool,
    data: ContinuousData<T>,
}

struct Inner<T, F> {
    request: Box<dyn Request<T, F>>,
    options: ContinuousOptions,
    state: Mutex<State<T, F>>,
    events: Emitter<ContinuousData<T>>,
}

/// Loads a collection from the start and appends further chunks on demand.
pub struct ContinuousEndpoint<T, F = ()> {
    inner: Arc<Inner<T, F>>,
}

impl<T, F> Clone for ContinuousEndpoint<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> core::fmt::Debug for ContinuousEndpoint<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ContinuousEndpoint")
            .field("version", &state.version)
            .field("loading", &state.loading)
            .field("loaded", &state.data.result.len())
            .field("total", &state.data.total)
            .finish()
    }
}

impl<T, F> ContinuousEndpoint<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(request: impl Request<T, F>, filter: F, options: ContinuousOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                request: Box::new(request),
                options,
                state: Mutex::new(State {
                    filter,
                    version: 0,
                    loading: false,
                    data: ContinuousData::default(),
                }),
                events: Emitter::new(),
            }),
        }
    }

    pub fn options(&self) -> &ContinuousOptions {
        &self.inner.options
    }

    pub fn data(&self) -> ContinuousData<T> {
        self.inner.state.lock().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ContinuousData<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Replaces the filter, drops the loaded items and loads the first chunk again.
    pub async fn set_filter(&self, filter: F) -> bool {
        self.inner.state.lock().filter = filter;
        self.refresh().await
    }

    /// Replaces the loaded items with the first `init_size` items.
    ///
    /// Returns `false` when the request failed or a newer `refresh`/`clear` superseded it.
    pub async fn refresh(&self) -> bool {
        let (version, response) = {
            let mut state = self.inner.state.lock();
            state.version += 1;
            state.loading = true;
            let response = self
                .inner
                .request
                .request(0, self.inner.options.init_size, &state.filter);
            (state.version, response)
        };
        vdebug!(version, init_size = self.inner.options.init_size, "continuous refresh");
        let result = response.await;

        let data = {
            let mut state = self.inner.state.lock();
            if state.version != version {
                vtrace!(version, "continuous refresh superseded");
                return false;
            }
            state.loading = false;
            match result {
                Ok(Page { total, result }) => {
                    state.data = ContinuousData { total, result };
                    state.data.clone()
                }
                Err(error) => {
                    drop(state);
                    self.report(&error);
                    return false;
                }
            }
        };
        self.inner.events.emit(&data);
        true
    }

    /// Appends the next `continue_size` items. No-op while a load is running.
    pub async fn next(&self) -> bool {
        let (version, loaded, response) = {
            let mut state = self.inner.state.lock();
            if state.loading {
                return false;
            }
            state.loading = true;
            let loaded = state.data.result.len();
            let response =
                self.inner
                    .request
                    .request(loaded, self.inner.options.step(), &state.filter);
            (state.version, loaded, response)
        };
        vtrace!(version, loaded, "continuous next");
        let result = response.await;

        let data = {
            let mut state = self.inner.state.lock();
            if state.version != version {
                return false;
            }
            state.loading = false;
            if state.data.result.len() != loaded {
                vdebug!(version, loaded, "continuous next: data changed meanwhile");
                return false;
            }
            match result {
                Ok(page) => {
                    state.data.total = page.total;
                    state.data.result.extend(page.result);
                    state.data.clone()
                }
                Err(error) => {
                    drop(state);
                    self.report(&error);
                    return false;
                }
            }
        };
        self.inner.events.emit(&data);
        true
    }

    /// Drops the loaded items without loading anything. Pending loads are discarded.
    pub fn clear(&self) {
        let data = {
            let mut state = self.inner.state.lock();
            state.version += 1;
            state.loading = false;
            state.data = ContinuousData::default();
            state.data.clone()
        };
        self.inner.events.emit(&data);
    }

    fn report(&self, error: &FetchError) {
        vwarn!(%error, "continuous request failed");
        if let Some(handle_error) = &self.inner.options.handle_error {
            handle_error(error);
        }
    }
}
