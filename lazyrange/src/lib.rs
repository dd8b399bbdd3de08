//! Headless paginated windowing and selection for virtual lists.
//!
//! For adapter-level utilities (window controller, dialogs, input dispatch), see the
//! `lazyrange-adapter` crate.
//!
//! This crate implements the protocol between a huge remote collection and a list view that only
//! ever renders a few rows of it:
//! - [`QueryEndpoint`]: an item cache over a paginated request, fetching only what is missing
//! - [`PaginationDataView`]: the window one view renders, with delayed, last-writer-wins updates
//! - [`Geometry`]: viewport and scroll offset to `[offset, limit)` math for lists and grids
//! - [`Selector`]: click, modifier-click, shift-click and arrow-key selection over unloaded rows
//!
//! It is UI-agnostic and transport-agnostic. The host provides:
//! - the paginated request (see [`Request`])
//! - viewport size and scroll offset
//! - a [`Navigator`] that can scroll an index into view
#![forbid(unsafe_code)]

extern crate alloc;

#[macro_use]
mod macros;

mod cache;
mod continuous;
mod data_view;
mod emitter;
mod endpoint;
mod error;
mod geometry;
mod object;
mod options;
mod segments;
mod selection;
mod types;


pub use continuous::{ContinuousData, ContinuousEndpoint};
pub use data_view::PaginationDataView;
pub use emitter::{Emitter, SubscriptionId};
pub use endpoint::{QueryEndpoint, Request};
pub use error::{ApiError, ErrorCode, ErrorHandler, FetchError};
pub use geometry::{Geometry, Layout, Padding, Proposal, Viewport};
pub use object::{ObjectEndpoint, ObjectSource};
pub use options::{
    ContinuousOptions, DataViewOptions, ObjectOptions, QueryEndpointOptions, SelectorOptions,
    WarningHandler, DEFAULT_MAX_SELECTED, DEFAULT_QUERY_DELAY_MS, DEFAULT_SEGMENT_SIZE,
};
pub use selection::{Navigator, SelectionWarning, Selector};
pub use types::{
    Direction, EndpointEvent, ItemId, Keyed, LoadedStatus, Metrics, Page, PaginationData,
    SelectionState, Window,
};
