//! Paginated virtual-list windowing, caching and selection.
//!
//! This package bundles the headless core ([`lazyrange`]) with its adapter utilities
//! ([`lazyrange_adapter`]). Most applications only need the re-exports below:
//!
//! - a [`QueryEndpoint`] over the backend's paginated `list` call
//! - a [`ListSession`] per list view, fed with viewport, scroll, click and key events
//! - [`ContinuousEndpoint`] / [`ObjectEndpoint`] for infinite feeds and single-object pages
#![forbid(unsafe_code)]

pub use lazyrange;
pub use lazyrange_adapter;

pub use lazyrange::{
    ContinuousEndpoint, ContinuousOptions, DataViewOptions, Direction, FetchError, ItemId, Keyed,
    Layout, ObjectEndpoint, ObjectOptions, ObjectSource, Page, PaginationDataView, QueryEndpoint,
    QueryEndpointOptions, Request, SelectionState, Selector, SelectorOptions, Viewport, Window,
};
pub use lazyrange_adapter::{
    Controller, DialogRequest, DialogSlot, Key, ListSession, Modifiers, Platform, SettleGate,
    SharedController, WindowOptions,
};
