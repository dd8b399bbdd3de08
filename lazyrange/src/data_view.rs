use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use core::time::Duration;

use parking_lot::Mutex;

use crate::emitter::{Emitter, SubscriptionId};
use crate::{
    DataViewOptions, EndpointEvent, LoadedStatus, Metrics, PaginationData, QueryEndpoint, Window,
};

struct ViewInner<T, F> {
    endpoint: QueryEndpoint<T, F>,
    options: DataViewOptions,
    data: Mutex<PaginationData<T>>,
    loading: AtomicBool,
    /// Id of the latest `data_update`; older calls never publish.
    query_id: AtomicU64,
    endpoint_subscription: SubscriptionId,
    events: Emitter<PaginationData<T>>,
}

impl<T, F> Drop for ViewInner<T, F> {
    fn drop(&mut self) {
        self.endpoint.unsubscribe(self.endpoint_subscription);
    }
}

/// The slice of a [`QueryEndpoint`] that one list view renders.
///
/// The rendering surface reports its window through [`Self::data_update`]; the view publishes
/// the matching items once they are available. Only the latest update ever publishes, so a
/// burst of scroll events resolves to the final window.
pub struct PaginationDataView<T, F = ()> {
    inner: Arc<ViewInner<T, F>>,
}

impl<T, F> Clone for PaginationDataView<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> core::fmt::Debug for PaginationDataView<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaginationDataView")
            .field("metrics", &self.inner.data.lock().metrics)
            .field("loading", &self.inner.loading.load(Ordering::Relaxed))
            .field("options", &self.inner.options)
            .finish()
    }
}

impl<T, F> PaginationDataView<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(endpoint: QueryEndpoint<T, F>, options: DataViewOptions) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ViewInner<T, F>>| {
            let weak = weak.clone();
            let endpoint_subscription = endpoint.subscribe(move |event| {
                if let Some(inner) = weak.upgrade() {
                    PaginationDataView { inner }.on_endpoint_event(*event);
                }
            });
            ViewInner {
                endpoint,
                options,
                data: Mutex::new(PaginationData::default()),
                loading: AtomicBool::new(false),
                query_id: AtomicU64::new(0),
                endpoint_subscription,
                events: Emitter::new(),
            }
        });
        Self { inner }
    }

    pub fn endpoint(&self) -> &QueryEndpoint<T, F> {
        &self.inner.endpoint
    }

    pub fn options(&self) -> DataViewOptions {
        self.inner.options
    }

    pub fn data(&self) -> PaginationData<T> {
        self.inner.data.lock().clone()
    }

    pub fn metrics(&self) -> Metrics {
        self.inner.data.lock().metrics
    }

    /// The window currently published (may be shorter than requested at the end of the list).
    pub fn window(&self) -> Window {
        self.metrics().window()
    }

    /// `true` while a delayed or fetching update is pending.
    pub fn loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&PaginationData<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Requests that `[offset, offset + limit)` becomes the published window.
    ///
    /// Cached windows publish immediately. Otherwise the request waits `query_delay_ms` (no wait
    /// while the total is unknown) and is dropped if a newer update arrived meanwhile.
    pub async fn data_update(&self, offset: usize, limit: usize) {
        let query_id = self.inner.query_id.fetch_add(1, Ordering::AcqRel) + 1;
        let endpoint = &self.inner.endpoint;

        if endpoint.is_range_loaded(offset, limit) == LoadedStatus::Loaded {
            let result = endpoint.query_range(offset, limit).await;
            if self.is_latest(query_id) {
                self.publish(offset, result);
                self.inner.loading.store(false, Ordering::Release);
            }
            return;
        }

        self.inner.loading.store(true, Ordering::Release);
        if endpoint.count().is_some() && self.inner.options.query_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.inner.options.query_delay_ms)).await;
        }
        if !self.is_latest(query_id) {
            vtrace!(query_id, "data_update superseded before fetch");
            return;
        }

        let result = endpoint.query_range(offset, limit).await;
        if !self.is_latest(query_id) {
            vtrace!(query_id, "data_update superseded after fetch");
            return;
        }
        let expected = endpoint
            .count()
            .map(|total| Window::new(offset, limit).clamp(total).limit)
            .unwrap_or(0);
        if result.is_empty() && expected > 0 {
            // The request failed; keep what is on screen.
            vdebug!(query_id, offset, limit, "data_update failed");
        } else {
            self.publish(offset, result);
        }
        self.inner.loading.store(false, Ordering::Release);
    }

    /// Drops the endpoint cache and reloads the current window.
    pub async fn refresh(&self) {
        let window = self.window();
        self.inner.endpoint.refresh();
        self.data_update(window.offset, window.limit).await;
    }

    /// Clears the published data. Pending updates are discarded.
    pub fn reset(&self) {
        self.inner.query_id.fetch_add(1, Ordering::AcqRel);
        self.inner.loading.store(false, Ordering::Release);
        let data = {
            let mut data = self.inner.data.lock();
            *data = PaginationData::default();
            data.clone()
        };
        self.inner.events.emit(&data);
    }

    fn is_latest(&self, query_id: u64) -> bool {
        self.inner.query_id.load(Ordering::Acquire) == query_id
    }

    fn publish(&self, offset: usize, result: alloc::vec::Vec<T>) {
        let data = {
            let mut data = self.inner.data.lock();
            data.metrics = Metrics {
                total: self.inner.endpoint.count(),
                offset,
                limit: result.len(),
            };
            data.result = result;
            data.clone()
        };
        vtrace!(
            offset,
            limit = data.metrics.limit,
            total = ?data.metrics.total,
            "publish"
        );
        self.inner.events.emit(&data);
    }

    /// Re-slices the published window from the cache after a local edit.
    fn resync(&self) {
        let window = self.window();
        let Some(total) = self.inner.endpoint.count() else {
            return;
        };
        let window = window.clamp(total);
        match self.inner.endpoint.retrieve_range(window.offset, window.limit) {
            Some(result) => self.publish(window.offset, result),
            None => vdebug!(
                offset = window.offset,
                limit = window.limit,
                "resync skipped: window no longer cached"
            ),
        }
    }

    fn on_endpoint_event(&self, event: EndpointEvent) {
        match event {
            EndpointEvent::Refresh => self.reset(),
            EndpointEvent::Modify { index } => {
                if self.window().contains(index) {
                    self.resync();
                }
            }
            EndpointEvent::Remove { index } | EndpointEvent::Add { index } => {
                if index < self.window().end() {
                    self.resync();
                }
            }
        }
    }
}
