use alloc::sync::Arc;
use alloc::vec::Vec;

use parking_lot::Mutex;

use crate::emitter::{Emitter, SubscriptionId};
use crate::{
    Direction, ItemId, Keyed, PaginationDataView, QueryEndpoint, SelectionState, SelectorOptions,
    Window,
};

/// The scroll surface a [`Selector`] drives.
///
/// Implemented by the adapter's window controller; tests use simple stand-ins.
pub trait Navigator: Send + Sync {
    /// Items currently visible in the viewport (buffer rows excluded).
    fn visible_window(&self) -> Window;
    /// Scrolls so that `index` is visible.
    fn navigate_to(&self, index: usize);
    /// Items per row of a grid surface; `None` for one-dimensional lists.
    fn column_count(&self) -> Option<usize> {
        None
    }
}

/// Why a selection gesture was rejected. The selection is left unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionWarning {
    #[error("selection limit exceeded: at most {max} items can be selected")]
    LimitExceeded { max: usize },
    /// A range endpoint could not be located in the cached items or its range could not be loaded.
    #[error("internal error: cannot resolve the selection range")]
    Unresolvable,
}

struct SelectorInner<T, F> {
    view: PaginationDataView<T, F>,
    navigator: Arc<dyn Navigator>,
    options: SelectorOptions,
    state: Mutex<SelectionState>,
    events: Emitter<SelectionState>,
}

/// Click, modifier-click, shift-click and arrow-key selection over a partially loaded list.
///
/// Ranges are resolved through the view's [`QueryEndpoint`], fetching unloaded rows when
/// needed. `shift_select` and `move_select` may therefore suspend; the state they apply is
/// computed from the selection as it is when the fetch completes.
pub struct Selector<T, F = ()> {
    inner: Arc<SelectorInner<T, F>>,
}

impl<T, F> Clone for Selector<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F> core::fmt::Debug for Selector<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Selector")
            .field("state", &*self.inner.state.lock())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<T, F> Selector<T, F>
where
    T: Keyed + Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    pub fn new(
        view: PaginationDataView<T, F>,
        navigator: Arc<dyn Navigator>,
        options: SelectorOptions,
    ) -> Self {
        Self {
            inner: Arc::new(SelectorInner {
                view,
                navigator,
                options,
                state: Mutex::new(SelectionState::default()),
                events: Emitter::new(),
            }),
        }
    }

    pub fn view(&self) -> &PaginationDataView<T, F> {
        &self.inner.view
    }

    pub fn endpoint(&self) -> &QueryEndpoint<T, F> {
        self.inner.view.endpoint()
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.inner.options
    }

    pub fn state(&self) -> SelectionState {
        self.inner.state.lock().clone()
    }

    pub fn selected(&self) -> Vec<ItemId> {
        self.inner.state.lock().selected.clone()
    }

    pub fn last_selected(&self) -> Option<ItemId> {
        self.inner.state.lock().last_selected
    }

    /// Replaces the state, e.g. when the owning view restores a saved selection.
    ///
    /// Duplicates are dropped and a `last_selected` that is not selected is cleared.
    pub fn set_state(&self, state: SelectionState) {
        let mut selected: Vec<ItemId> = Vec::with_capacity(state.selected.len());
        for id in state.selected {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        let last_selected = state.last_selected.filter(|id| selected.contains(id));
        self.apply(selected, last_selected);
    }

    /// Clears the selection, e.g. after a pick/commit action consumed it.
    pub fn clear(&self) {
        self.apply(Vec::new(), None);
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&SelectionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Plain click: selects only `id`, unless it is already selected.
    ///
    /// Clicking an item that is part of a multi-selection keeps the selection, so that it can
    /// be dragged as a whole.
    pub fn select(&self, index: usize, id: ItemId) {
        vtrace!(index, id, "select");
        if self.inner.state.lock().contains(id) {
            return;
        }
        self.apply(alloc::vec![id], Some(id));
    }

    /// Modifier click: toggles `id`. Adding makes it the range anchor; removing clears the
    /// anchor.
    pub fn append_select(&self, index: usize, id: ItemId) {
        vtrace!(index, id, "append_select");
        let (selected, last_selected) = {
            let state = self.inner.state.lock();
            let mut selected = state.selected.clone();
            match selected.iter().position(|&i| i == id) {
                Some(pos) => {
                    selected.remove(pos);
                    (selected, None)
                }
                None => {
                    if selected.len() + 1 > self.inner.options.max_selected {
                        drop(state);
                        self.warn(crate::SelectionWarning::LimitExceeded {
                            max: self.inner.options.max_selected,
                        });
                        return;
                    }
                    selected.push(id);
                    (selected, Some(id))
                }
            }
        };
        self.apply(selected, last_selected);
    }

    /// Shift click: adds every item between the anchor and `index` (inclusive).
    ///
    /// Without an anchor this behaves like [`Self::select`]. Previously selected ids outside the
    /// range keep their order; the range is appended in logical order.
    pub async fn shift_select(&self, index: usize, id: ItemId) {
        vtrace!(index, id, "shift_select");
        self.range_select(index, id).await;
    }

    /// Returns whether the selection was applied; rejected or unresolvable ranges leave the
    /// state untouched and return `false`.
    async fn range_select(&self, index: usize, id: ItemId) -> bool {
        let anchor = self.inner.state.lock().last_selected;
        let anchor = match anchor {
            None => {
                self.apply(alloc::vec![id], Some(id));
                return true;
            }
            Some(anchor) if anchor == id => return true,
            Some(anchor) => anchor,
        };

        let endpoint = self.endpoint();
        let priority = self.inner.view.window();
        let target_index = match endpoint.retrieve(index) {
            Some(item) if item.key() == id => Some(index),
            None if endpoint.count().is_some_and(|total| index < total) => Some(index),
            _ => endpoint.find(|item| item.key() == id, Some(priority)),
        };
        let anchor_index = endpoint.find(|item| item.key() == anchor, Some(priority));
        let (Some(target_index), Some(anchor_index)) = (target_index, anchor_index) else {
            self.warn(crate::SelectionWarning::Unresolvable);
            return false;
        };

        let range = Window::between(anchor_index, target_index);
        let failures = endpoint.failures();
        let items = endpoint.query_range(range.offset, range.limit).await;
        if items.len() != range.limit {
            vdebug!(
                offset = range.offset,
                limit = range.limit,
                got = items.len(),
                "shift_select: range unavailable"
            );
            // Failed requests were already reported through `handle_error`.
            if endpoint.failures() == failures {
                self.warn(crate::SelectionWarning::Unresolvable);
            }
            return false;
        }
        let ids: Vec<ItemId> = items.iter().map(Keyed::key).collect();
        if !ids.contains(&id) {
            self.warn(crate::SelectionWarning::Unresolvable);
            return false;
        }

        let selected = {
            let state = self.inner.state.lock();
            let mut selected: Vec<ItemId> = state
                .selected
                .iter()
                .copied()
                .filter(|i| !ids.contains(i))
                .collect();
            selected.extend_from_slice(&ids);
            selected
        };
        if selected.len() > self.inner.options.max_selected {
            self.warn(crate::SelectionWarning::LimitExceeded {
                max: self.inner.options.max_selected,
            });
            return false;
        }
        self.apply(selected, Some(id));
        true
    }

    /// Arrow key: moves the anchor by one step (a whole row vertically in grids), clamped to
    /// the list. With `extend` the move extends the selection like a shift click.
    ///
    /// Without an anchor the first (backward keys) or last (forward keys) visible item is
    /// selected.
    pub async fn move_select(&self, direction: Direction, extend: bool) {
        let endpoint = self.endpoint();
        let Some(anchor) = self.last_selected() else {
            let visible = self.inner.navigator.visible_window();
            if visible.is_empty() {
                return;
            }
            let index = if direction.is_backward() {
                visible.offset
            } else {
                visible.end() - 1
            };
            if let Some(item) = endpoint.query_one(index).await {
                let id = item.key();
                self.apply(alloc::vec![id], Some(id));
                self.inner.navigator.navigate_to(index);
            }
            return;
        };

        let Some(count) = endpoint.count().filter(|&c| c > 0) else {
            return;
        };
        let priority = self.inner.view.window();
        let Some(anchor_index) = endpoint.find(|item| item.key() == anchor, Some(priority)) else {
            vdebug!(anchor, "move_select: anchor is not cached");
            return;
        };
        let column_count = self
            .inner
            .options
            .column_count
            .or_else(|| self.inner.navigator.column_count());
        let step = direction.offset(column_count);
        let target = (anchor_index as isize + step).clamp(0, count as isize - 1) as usize;
        vtrace!(anchor_index, target, extend, "move_select");

        let Some(item) = endpoint.query_one(target).await else {
            return;
        };
        let id = item.key();
        let applied = if extend {
            self.range_select(target, id).await
        } else {
            self.apply(alloc::vec![id], Some(id));
            true
        };
        if applied {
            self.inner.navigator.navigate_to(target);
        }
    }

    /// Items carried by a drag that starts on `dragged`.
    ///
    /// Dragging a selected item drags the whole selection (in selection order, limited to the
    /// cached items); dragging anything else drags only that item.
    pub fn drag_items(&self, dragged: &T) -> Vec<T> {
        let selected = self.selected();
        let dragged_id = dragged.key();
        if !selected.contains(&dragged_id) {
            return alloc::vec![dragged.clone()];
        }
        let endpoint = self.endpoint();
        let priority = self.inner.view.window();
        selected
            .into_iter()
            .filter_map(|id| {
                if id == dragged_id {
                    return Some(dragged.clone());
                }
                let index = endpoint.find(|item| item.key() == id, Some(priority))?;
                endpoint.retrieve(index)
            })
            .collect()
    }

    fn warn(&self, warning: crate::SelectionWarning) {
        vwarn!(%warning, "selection rejected");
        if let Some(on_warning) = &self.inner.options.on_warning {
            on_warning(&warning);
        }
    }

    fn apply(&self, selected: Vec<ItemId>, last_selected: Option<ItemId>) {
        debug_assert!(last_selected.is_none_or(|id| selected.contains(&id)));
        let state = {
            let mut state = self.inner.state.lock();
            state.selected = selected;
            state.last_selected = last_selected;
            state.clone()
        };
        vtrace!(
            len = state.selected.len(),
            last_selected = ?state.last_selected,
            "selection changed"
        );
        self.inner.events.emit(&state);
    }
}
