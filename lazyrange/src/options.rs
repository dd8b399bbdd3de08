use alloc::sync::Arc;

use crate::{ErrorHandler, FetchError, SelectionWarning};

/// A hook receiving selection warnings (limit exceeded, unresolvable range endpoint).
pub type WarningHandler = Arc<dyn Fn(&SelectionWarning) + Send + Sync>;

/// Default number of items per cache segment.
pub const DEFAULT_SEGMENT_SIZE: usize = 100;
/// Default delay before an uncached window is actually requested.
pub const DEFAULT_QUERY_DELAY_MS: u64 = 250;
/// Default upper bound of a multi-selection.
pub const DEFAULT_MAX_SELECTED: usize = 256;

/// Configuration for [`crate::QueryEndpoint`].
pub struct QueryEndpointOptions {
    /// Granularity of range fetches. Missing sub-ranges are widened to segment boundaries so
    /// that scrolling issues few, aligned requests.
    pub segment_size: usize,
    /// Receives request failures. Callers of the endpoint only observe empty results.
    pub handle_error: Option<ErrorHandler>,
}

impl Clone for QueryEndpointOptions {
    fn clone(&self) -> Self {
        Self {
            segment_size: self.segment_size,
            handle_error: self.handle_error.clone(),
        }
    }
}

impl Default for QueryEndpointOptions {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            handle_error: None,
        }
    }
}

impl QueryEndpointOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size.max(1);
        self
    }

    pub fn with_handle_error(
        mut self,
        handle_error: impl Fn(&FetchError) + Send + Sync + 'static,
    ) -> Self {
        self.handle_error = Some(Arc::new(handle_error));
        self
    }
}

impl core::fmt::Debug for QueryEndpointOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryEndpointOptions")
            .field("segment_size", &self.segment_size)
            .field("handle_error", &self.handle_error.is_some())
            .finish()
    }
}

/// Configuration for [`crate::PaginationDataView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataViewOptions {
    /// How long an uncached window waits before it is requested. A newer `data_update` within
    /// the delay replaces the pending one. The very first request (total unknown) is not delayed.
    pub query_delay_ms: u64,
}

impl Default for DataViewOptions {
    fn default() -> Self {
        Self {
            query_delay_ms: DEFAULT_QUERY_DELAY_MS,
        }
    }
}

impl DataViewOptions {
    pub fn with_query_delay_ms(mut self, query_delay_ms: u64) -> Self {
        self.query_delay_ms = query_delay_ms;
        self
    }
}

/// Configuration for [`crate::ContinuousEndpoint`].
pub struct ContinuousOptions {
    /// Number of items loaded by `refresh`.
    pub init_size: usize,
    /// Number of items appended by `next`; defaults to `init_size`.
    pub continue_size: Option<usize>,
    pub handle_error: Option<ErrorHandler>,
}

impl Clone for ContinuousOptions {
    fn clone(&self) -> Self {
        Self {
            init_size: self.init_size,
            continue_size: self.continue_size,
            handle_error: self.handle_error.clone(),
        }
    }
}

impl ContinuousOptions {
    pub fn new(init_size: usize) -> Self {
        Self {
            init_size,
            continue_size: None,
            handle_error: None,
        }
    }

    pub fn with_continue_size(mut self, continue_size: usize) -> Self {
        self.continue_size = Some(continue_size);
        self
    }

    pub fn with_handle_error(
        mut self,
        handle_error: impl Fn(&FetchError) + Send + Sync + 'static,
    ) -> Self {
        self.handle_error = Some(Arc::new(handle_error));
        self
    }

    pub(crate) fn step(&self) -> usize {
        self.continue_size.unwrap_or(self.init_size)
    }
}

impl core::fmt::Debug for ContinuousOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContinuousOptions")
            .field("init_size", &self.init_size)
            .field("continue_size", &self.continue_size)
            .field("handle_error", &self.handle_error.is_some())
            .finish()
    }
}

/// Configuration for [`crate::ObjectEndpoint`].
#[derive(Clone, Default)]
pub struct ObjectOptions {
    /// Default receiver of failed `get`/`update`/`delete` calls. `NOT_FOUND` on `get` is never
    /// reported.
    pub handle_error: Option<ErrorHandler>,
}

impl ObjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle_error(
        mut self,
        handle_error: impl Fn(&FetchError) + Send + Sync + 'static,
    ) -> Self {
        self.handle_error = Some(Arc::new(handle_error));
        self
    }
}

impl core::fmt::Debug for ObjectOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectOptions")
            .field("handle_error", &self.handle_error.is_some())
            .finish()
    }
}

/// Configuration for [`crate::Selector`].
pub struct SelectorOptions {
    /// Selections never grow beyond this many ids.
    pub max_selected: usize,
    /// Column count of a grid layout. `None` defers to the navigator; when neither knows, every
    /// arrow key moves by a single item.
    pub column_count: Option<usize>,
    pub on_warning: Option<WarningHandler>,
}

impl Clone for SelectorOptions {
    fn clone(&self) -> Self {
        Self {
            max_selected: self.max_selected,
            column_count: self.column_count,
            on_warning: self.on_warning.clone(),
        }
    }
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            max_selected: DEFAULT_MAX_SELECTED,
            column_count: None,
            on_warning: None,
        }
    }
}

impl SelectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_selected(mut self, max_selected: usize) -> Self {
        self.max_selected = max_selected;
        self
    }

    pub fn with_column_count(mut self, column_count: Option<usize>) -> Self {
        self.column_count = column_count;
        self
    }

    pub fn with_on_warning(
        mut self,
        on_warning: impl Fn(&SelectionWarning) + Send + Sync + 'static,
    ) -> Self {
        self.on_warning = Some(Arc::new(on_warning));
        self
    }
}

impl core::fmt::Debug for SelectorOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SelectorOptions")
            .field("max_selected", &self.max_selected)
            .field("column_count", &self.column_count)
            .finish_non_exhaustive()
    }
}
