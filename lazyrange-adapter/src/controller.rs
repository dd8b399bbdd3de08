use alloc::sync::Arc;

use lazyrange::{
    Emitter, Geometry, Layout, Navigator, Padding, Proposal, SubscriptionId, Viewport, Window,
};
use parking_lot::{Mutex, MutexGuard};

/// Default number of rows rendered beyond each end of the viewport.
pub const DEFAULT_BUFFER_ROWS: usize = 2;

/// Layout and update policy of a [`Controller`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowOptions {
    pub layout: Layout,
    pub padding: Padding,
    pub buffer_rows: usize,
    /// Minimum offset change, in rows, before a new window is requested. Zero propagates every
    /// change.
    pub min_update_delta: usize,
}

impl WindowOptions {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            padding: Padding::default(),
            buffer_rows: DEFAULT_BUFFER_ROWS,
            min_update_delta: 0,
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_buffer_rows(mut self, buffer_rows: usize) -> Self {
        self.buffer_rows = buffer_rows;
        self
    }

    pub fn with_min_update_delta(mut self, min_update_delta: usize) -> Self {
        self.min_update_delta = min_update_delta;
        self
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.layout)
            .with_padding(self.padding)
            .with_buffer_rows(self.buffer_rows)
    }
}

/// Identifies one propagated window request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    /// A window was handed to the data layer and has not completed yet.
    Requesting { target: Window, ticket: Ticket },
}

/// A window the data layer should load, with the ticket to report completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowRequest {
    pub window: Window,
    pub ticket: Ticket,
}

/// What the user currently sees, for navigation widgets (page indicators, jump bars).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewState {
    pub item_offset: usize,
    pub item_limit: usize,
    pub item_total: Option<usize>,
}

/// A framework-neutral virtual window controller.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_viewport` / `on_scroll` when UI events occur
/// - `set_total` when the data layer learns (or forgets) the collection size
/// - `complete` when the data for a propagated window arrived
///
/// Methods that may move the scroll position (`on_viewport`, `set_column_count`,
/// `navigate_to`) leave the new position in [`Self::scroll_top`]; the adapter applies it to the
/// real scroll container.
#[derive(Clone, Debug)]
pub struct Controller {
    options: WindowOptions,
    viewport: Option<Viewport>,
    scroll_top: f64,
    total: Option<usize>,
    last_request: Option<Window>,
    state: RequestState,
    next_ticket: u64,
}

impl Controller {
    pub fn new(options: WindowOptions) -> Self {
        Self {
            options,
            viewport: None,
            scroll_top: 0.0,
            total: None,
            last_request: None,
            state: RequestState::Idle,
            next_ticket: 0,
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn geometry(&self) -> Geometry {
        self.options.geometry()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn last_request(&self) -> Option<Window> {
        self.last_request
    }

    pub fn request_state(&self) -> RequestState {
        self.state
    }

    /// The pixel span to render at the current scroll position, or `None` before the first
    /// viewport report.
    pub fn proposal(&self) -> Option<Proposal> {
        let viewport = self.viewport?;
        Some(
            self.geometry()
                .propose(viewport, self.scroll_top, self.total),
        )
    }

    /// Decides whether a window change is worth a data request.
    ///
    /// The first window always propagates. Afterwards an offset change must reach
    /// `min_update_delta` rows; a different limit always propagates. A propagated window
    /// supersedes the one still in flight.
    pub fn on_update(&mut self, offset: usize, limit: usize) -> Option<Ticket> {
        let window = Window::new(offset, limit);
        if let Some(last) = self.last_request {
            if last == window {
                return None;
            }
            let threshold = self.options.min_update_delta * self.geometry().column_count();
            if offset.abs_diff(last.offset) < threshold && limit == last.limit {
                vtrace!(offset, limit, threshold, "window change below threshold");
                return None;
            }
        }

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        if let RequestState::Requesting { target, .. } = self.state {
            vdebug!(
                superseded_offset = target.offset,
                offset,
                limit,
                "window request superseded"
            );
        }
        self.last_request = Some(window);
        self.state = RequestState::Requesting {
            target: window,
            ticket,
        };
        Some(ticket)
    }

    /// Marks `ticket` as done. Returns `false` for a superseded ticket, whose data must be
    /// discarded.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        match self.state {
            RequestState::Requesting { ticket: current, .. } if current == ticket => {
                self.state = RequestState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Call this when the scroll container is resized.
    ///
    /// A width change keeps the first visible item in place (grid rows change height with the
    /// width).
    pub fn on_viewport(&mut self, viewport: Viewport) -> Option<WindowRequest> {
        let previous = self.viewport.replace(viewport);
        if let Some(previous) = previous {
            if previous.width != viewport.width {
                self.reanchor(self.geometry(), previous);
            }
        }
        self.refresh_window()
    }

    /// Call this when the UI reports a scroll offset change.
    pub fn on_scroll(&mut self, scroll_top: f64) -> Option<WindowRequest> {
        self.scroll_top = scroll_top.max(0.0);
        self.refresh_window()
    }

    /// Updates the collection size. `None` means the content was reset: the controller scrolls
    /// back to the top and forgets the last request.
    pub fn set_total(&mut self, total: Option<usize>) {
        match total {
            None => {
                vdebug!("controller reset");
                self.total = None;
                self.scroll_top = 0.0;
                self.last_request = None;
                self.state = RequestState::Idle;
            }
            Some(total) => {
                self.total = Some(total);
                if let Some(viewport) = self.viewport {
                    let max = self.geometry().max_scroll_top(viewport, total);
                    self.scroll_top = self.scroll_top.min(max);
                }
            }
        }
    }

    /// Changes the column count of a grid layout, keeping the first visible item anchored.
    ///
    /// Lists ignore this call.
    pub fn set_column_count(&mut self, column_count: usize) -> Option<WindowRequest> {
        let Layout::Grid {
            column_count: current,
            aspect_ratio,
        } = self.options.layout
        else {
            return None;
        };
        let column_count = column_count.max(1);
        if current == column_count {
            return None;
        }
        let old = self.geometry();
        self.options.layout = Layout::Grid {
            column_count,
            aspect_ratio,
        };
        if let Some(viewport) = self.viewport {
            self.reanchor(old, viewport);
        }
        self.refresh_window()
    }

    /// Recomputes the window for the current state and propagates it if needed.
    pub fn refresh_window(&mut self) -> Option<WindowRequest> {
        let viewport = self.viewport?;
        let geometry = self.geometry();
        if geometry.layout.unit_height(viewport.width) <= 0.0 {
            return None;
        }
        let proposal = geometry.propose(viewport, self.scroll_top, self.total);
        let window = geometry.window_for(viewport, proposal, self.total);
        let ticket = self.on_update(window.offset, window.limit)?;
        Some(WindowRequest { window, ticket })
    }

    /// Items whose rows are mostly inside the viewport.
    pub fn visible_window(&self) -> Window {
        match (self.viewport, self.total) {
            (Some(viewport), Some(total)) => {
                self.geometry().visible(viewport, self.scroll_top, total)
            }
            _ => Window::EMPTY,
        }
    }

    pub fn view_state(&self) -> ViewState {
        let visible = self.visible_window();
        ViewState {
            item_offset: visible.offset,
            item_limit: visible.limit,
            item_total: self.total,
        }
    }

    /// Scrolls the minimal distance that brings `index` into view.
    ///
    /// Returns the new scroll offset, or `None` when nothing had to move.
    pub fn navigate_to(&mut self, index: usize) -> Option<f64> {
        let viewport = self.viewport?;
        let total = self.total?;
        let target = self
            .geometry()
            .navigate_offset(viewport, self.scroll_top, total, index)?;
        self.scroll_top = target;
        Some(target)
    }

    /// Keeps the first visible item at the same distance from the viewport top after the
    /// geometry changed from `old` (measured with `old_viewport`).
    fn reanchor(&mut self, old: Geometry, old_viewport: Viewport) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let old_unit = old.layout.unit_height(old_viewport.width);
        let unit = self.options.layout.unit_height(viewport.width);
        if old_unit <= 0.0 || unit <= 0.0 {
            return;
        }
        let padding_top = self.options.padding.top;
        let top_in_list = (self.scroll_top - padding_top).max(0.0);
        let old_first_row = (top_in_list / old_unit).round();
        let first_item = old_first_row as usize * old.column_count();
        let row_shift = old_first_row * old_unit - top_in_list;

        let geometry = self.geometry();
        let row = (first_item / geometry.column_count()) as f64;
        let max = match self.total {
            Some(total) => geometry.max_scroll_top(viewport, total),
            None => f64::INFINITY,
        };
        let target = (row * unit - row_shift + padding_top).clamp(0.0, max);
        vtrace!(first_item, from = self.scroll_top, to = target, "re-anchored scroll");
        self.scroll_top = target;
    }
}

/// A [`Controller`] shared between the UI adapter and a `lazyrange::Selector`.
///
/// Keyboard navigation scrolls through [`Navigator::navigate_to`]; the adapter listens with
/// [`Self::on_navigate`] and applies the offset to the real scroll container.
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<Controller>>,
    scrolls: Arc<Emitter<f64>>,
}

impl SharedController {
    pub fn new(controller: Controller) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
            scrolls: Arc::new(Emitter::new()),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Controller> {
        self.inner.lock()
    }

    pub fn on_navigate(&self, listener: impl Fn(&f64) + Send + Sync + 'static) -> SubscriptionId {
        self.scrolls.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.scrolls.unsubscribe(id)
    }
}

impl core::fmt::Debug for SharedController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedController")
            .field("controller", &*self.inner.lock())
            .finish_non_exhaustive()
    }
}

impl Navigator for SharedController {
    fn visible_window(&self) -> Window {
        self.inner.lock().visible_window()
    }

    fn navigate_to(&self, index: usize) {
        let target = self.inner.lock().navigate_to(index);
        if let Some(scroll_top) = target {
            vtrace!(index, scroll_top, "navigate");
            self.scrolls.emit(&scroll_top);
        }
    }

    fn column_count(&self) -> Option<usize> {
        match self.inner.lock().options().layout {
            Layout::List { .. } => None,
            Layout::Grid { column_count, .. } => Some(column_count.max(1)),
        }
    }
}
