use alloc::vec::Vec;

/// Stable identity of a list item.
pub type ItemId = u64;

/// Items stored in a [`crate::QueryEndpoint`] expose a stable identity.
///
/// The payload may change (see `QueryEndpoint::modify`), the key must not.
pub trait Keyed {
    fn key(&self) -> ItemId;
}

/// One response of the backing collection for `[offset, offset + limit)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    /// Logical size of the whole collection at the time of the request.
    pub total: usize,
    pub result: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: usize, result: Vec<T>) -> Self {
        Self { total, result }
    }
}

/// A contiguous slice `[offset, offset + limit)` of the logical sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl Window {
    pub const EMPTY: Self = Self {
        offset: 0,
        limit: 0,
    };

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Builds the closed interval between two indexes, in either order.
    pub fn between(a: usize, b: usize) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self {
            offset: lo,
            limit: hi - lo + 1,
        }
    }

    /// Exclusive end.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.offset <= index && index < self.end()
    }

    /// Clamps the window so that `offset + limit <= total`.
    pub fn clamp(&self, total: usize) -> Self {
        let offset = self.offset.min(total);
        let end = self.end().min(total);
        Self {
            offset,
            limit: end - offset,
        }
    }

    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.end()
    }
}

/// Whether a range of the logical sequence is available in the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadedStatus {
    Loaded,
    /// Not fully cached, but every missing item is covered by an in-flight request.
    Loading,
    NotLoaded,
}

/// Emitted by a [`crate::QueryEndpoint`] after its cache changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndpointEvent {
    /// The cache was dropped (refresh or filter change).
    Refresh,
    Modify { index: usize },
    Remove { index: usize },
    Add { index: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    /// `None` until the first response arrived.
    pub total: Option<usize>,
    pub offset: usize,
    pub limit: usize,
}

impl Metrics {
    pub fn window(&self) -> Window {
        Window::new(self.offset, self.limit)
    }
}

/// The slice a list view currently renders.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaginationData<T> {
    pub metrics: Metrics,
    pub result: Vec<T>,
}

impl<T> Default for PaginationData<T> {
    fn default() -> Self {
        Self {
            metrics: Metrics::default(),
            result: Vec::new(),
        }
    }
}

/// Selected ids of one list view plus the anchor of range selection.
///
/// `last_selected`, when set, is always an element of `selected`; `selected` never holds
/// duplicates and keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionState {
    pub selected: Vec<ItemId>,
    pub last_selected: Option<ItemId>,
}

impl SelectionState {
    pub fn single(id: ItemId) -> Self {
        Self {
            selected: alloc::vec![id],
            last_selected: Some(id),
        }
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Arrow key directions understood by `Selector::move_select`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Signed index offset of one step. Lists (`column_count == None`) move by one item in every
    /// direction; grids move by a whole row vertically.
    pub fn offset(self, column_count: Option<usize>) -> isize {
        match (self, column_count) {
            (Self::Left | Self::Up, None) => -1,
            (Self::Right | Self::Down, None) => 1,
            (Self::Left, Some(_)) => -1,
            (Self::Right, Some(_)) => 1,
            (Self::Up, Some(cols)) => -(cols.max(1) as isize),
            (Self::Down, Some(cols)) => cols.max(1) as isize,
        }
    }

    pub fn is_backward(self) -> bool {
        matches!(self, Self::Left | Self::Up)
    }
}
