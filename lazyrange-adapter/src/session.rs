use alloc::sync::Arc;

use lazyrange::{
    DataViewOptions, EndpointEvent, ItemId, Keyed, PaginationDataView, QueryEndpoint, Selector,
    SelectorOptions, SubscriptionId, Viewport,
};

use crate::{
    ClickAction, Controller, Key, KeyAction, Modifiers, Platform, SharedController, WindowOptions,
    WindowRequest,
};

/// Everything one list view needs, wired together.
///
/// The adapter forwards UI events (`on_viewport`, `on_scroll`, `click`, `key`) and renders
/// [`Self::view`]. Each session owns its endpoint; sessions never share caches.
pub struct ListSession<T, F = ()> {
    endpoint: QueryEndpoint<T, F>,
    view: PaginationDataView<T, F>,
    controller: SharedController,
    selector: Selector<T, F>,
    platform: Platform,
    endpoint_subscription: SubscriptionId,
}

impl<T, F> Drop for ListSession<T, F> {
    fn drop(&mut self) {
        self.endpoint.unsubscribe(self.endpoint_subscription);
    }
}

impl<T, F> core::fmt::Debug for ListSession<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListSession")
            .field("controller", &self.controller)
            .field("selector", &self.selector)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl<T, F> ListSession<T, F>
where
    T: Keyed + Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(
        endpoint: QueryEndpoint<T, F>,
        window: WindowOptions,
        data_view: DataViewOptions,
        selection: SelectorOptions,
        platform: Platform,
    ) -> Self {
        let view = PaginationDataView::new(endpoint.clone(), data_view);
        let controller = SharedController::new(Controller::new(window));
        let selector = Selector::new(view.clone(), Arc::new(controller.clone()), selection);

        // Local removals and inserts change the scroll height right away.
        let endpoint_subscription = endpoint.subscribe({
            let controller = controller.clone();
            move |event| {
                let mut c = controller.lock();
                let total = match *event {
                    EndpointEvent::Remove { .. } => c.total().map(|t| t.saturating_sub(1)),
                    EndpointEvent::Add { .. } => c.total().map(|t| t + 1),
                    EndpointEvent::Modify { .. } | EndpointEvent::Refresh => return,
                };
                if total.is_some() {
                    c.set_total(total);
                }
            }
        });

        Self {
            endpoint,
            view,
            controller,
            selector,
            platform,
            endpoint_subscription,
        }
    }

    pub fn endpoint(&self) -> &QueryEndpoint<T, F> {
        &self.endpoint
    }

    pub fn view(&self) -> &PaginationDataView<T, F> {
        &self.view
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    pub fn selector(&self) -> &Selector<T, F> {
        &self.selector
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub async fn on_viewport(&self, viewport: Viewport) {
        let request = self.controller.lock().on_viewport(viewport);
        self.load(request).await;
    }

    pub async fn on_scroll(&self, scroll_top: f64) {
        let request = self.controller.lock().on_scroll(scroll_top);
        self.load(request).await;
    }

    pub async fn set_column_count(&self, column_count: usize) {
        let request = self.controller.lock().set_column_count(column_count);
        self.load(request).await;
    }

    /// Replaces the filter and starts over from the top of the new result.
    pub async fn set_filter(&self, filter: F) {
        self.endpoint.set_filter(filter);
        let request = {
            let mut c = self.controller.lock();
            c.set_total(None);
            c.refresh_window()
        };
        self.load(request).await;
    }

    /// Reloads the current window from the backend, keeping the scroll position.
    pub async fn refresh(&self) {
        self.view.refresh().await;
        if let Some(total) = self.endpoint.count() {
            self.controller.lock().set_total(Some(total));
        }
    }

    pub async fn click(&self, index: usize, id: ItemId, modifiers: Modifiers) {
        match ClickAction::from_click(modifiers, self.platform) {
            ClickAction::Select => self.selector.select(index, id),
            ClickAction::Append => self.selector.append_select(index, id),
            ClickAction::Range => self.selector.shift_select(index, id).await,
        }
    }

    /// Handles a key press. Enter yields the anchor item to open.
    pub async fn key(&self, key: Key, modifiers: Modifiers) -> Option<ItemId> {
        match KeyAction::from_key(key, modifiers) {
            KeyAction::Move { direction, extend } => {
                self.selector.move_select(direction, extend).await;
                None
            }
            KeyAction::Enter => self.selector.last_selected(),
            KeyAction::Ignore => None,
        }
    }

    async fn load(&self, request: Option<WindowRequest>) {
        let Some(request) = request else {
            return;
        };
        self.view
            .data_update(request.window.offset, request.window.limit)
            .await;
        let total = self.endpoint.count();
        let mut c = self.controller.lock();
        if c.complete(request.ticket) {
            if total.is_some() {
                c.set_total(total);
            }
        } else {
            vtrace!(
                offset = request.window.offset,
                limit = request.window.limit,
                "window completed after being superseded"
            );
        }
    }
}
