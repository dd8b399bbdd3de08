use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::segments;
use crate::{Page, Window};

/// Item-granular cache over the logical sequence of one filter generation.
///
/// Only loaded items are stored, keyed by index, so memory follows what was fetched rather
/// than the size of the remote collection.
#[derive(Clone, Debug)]
pub(crate) struct PageCache<T> {
    generation: u64,
    total: Option<usize>,
    items: BTreeMap<usize, T>,
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            total: None,
            items: BTreeMap::new(),
        }
    }
}

impl<T> PageCache<T> {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops every cached item and starts a new generation.
    pub(crate) fn reset(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.total = None;
        self.items.clear();
        self.generation
    }

    pub(crate) fn total(&self) -> Option<usize> {
        self.total
    }

    pub(crate) fn is_loaded(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.items.get(&index)
    }

    #[cfg(test)]
    pub(crate) fn loaded_len(&self) -> usize {
        self.items.len()
    }

    /// Clamps `window` to the known total. Unknown totals leave the window unchanged.
    pub(crate) fn clamp(&self, window: Window) -> Window {
        match self.total {
            Some(total) => window.clamp(total),
            None => window,
        }
    }

    pub(crate) fn is_window_loaded(&self, window: Window) -> bool {
        if self.total.is_none() {
            return false;
        }
        self.clamp(window).range().all(|i| self.is_loaded(i))
    }

    /// Writes a response for a request that started at `offset`.
    pub(crate) fn apply_page(&mut self, offset: usize, page: Page<T>) {
        let total = page.total;
        if self.total.is_some_and(|known| known > total) {
            // The collection shrank; drop items past the new end.
            self.items.retain(|&i, _| i < total);
        }
        self.total = Some(total);
        for (i, item) in page.result.into_iter().enumerate() {
            let index = offset + i;
            if index >= total {
                break;
            }
            self.items.insert(index, item);
        }
    }

    /// Searches loaded items, starting with the segments overlapping `priority`.
    pub(crate) fn find(
        &self,
        mut predicate: impl FnMut(&T) -> bool,
        priority: Window,
        segment_size: usize,
    ) -> Option<usize> {
        let total = self.total?;
        for segment in segments::search_order(priority, segment_size, total) {
            let window = segments::segment_window(segment, segment_size, total);
            for (&i, item) in self.items.range(window.range()) {
                if predicate(item) {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Replaces a loaded item. Unloaded or out-of-range indexes are rejected.
    pub(crate) fn modify(&mut self, index: usize, item: T) -> bool {
        match self.items.get_mut(&index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Removes the item at `index`; later items shift down by one.
    pub(crate) fn remove(&mut self, index: usize) -> bool {
        let Some(total) = self.total else {
            return false;
        };
        if index >= total {
            return false;
        }
        self.items.remove(&index);
        let tail = self.items.split_off(&index);
        self.items
            .extend(tail.into_iter().map(|(i, item)| (i - 1, item)));
        self.total = Some(total - 1);
        true
    }

    /// Inserts an item at `index` (`index == total` appends); later items shift up by one.
    pub(crate) fn insert(&mut self, index: usize, item: T) -> bool {
        let Some(total) = self.total else {
            return false;
        };
        if index > total {
            return false;
        }
        let tail = self.items.split_off(&index);
        self.items
            .extend(tail.into_iter().map(|(i, item)| (i + 1, item)));
        self.items.insert(index, item);
        self.total = Some(total + 1);
        true
    }
}

impl<T: Clone> PageCache<T> {
    /// Clones the loaded items of `window` up to the first gap.
    pub(crate) fn collect(&self, window: Window) -> Vec<T> {
        let window = self.clamp(window);
        let mut out = Vec::with_capacity(window.limit);
        for i in window.range() {
            match self.get(i) {
                Some(item) => out.push(item.clone()),
                None => break,
            }
        }
        out
    }
}
