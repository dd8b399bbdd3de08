//! Adapter utilities for the `lazyrange` crate.
//!
//! The `lazyrange` crate is UI-agnostic and focuses on caching, windowing math and selection.
//! This crate provides the framework-neutral pieces a list view adapter needs on top of it:
//!
//! - [`Controller`]: viewport and scroll events to propagated window requests, with update
//!   thresholds and scroll re-anchoring on resize
//! - [`ListSession`]: endpoint, data view, controller and selector wired together
//! - [`DialogSlot`]: one awaitable dialog at a time
//! - [`SettleGate`]: debounced input (search boxes)
//! - [`ClickAction`] / [`KeyAction`]: modifier-aware input dispatch
//! - [`ViewStack`]: stacked detail views that close when their list empties
//!
//! No UI toolkit bindings live here.
#![forbid(unsafe_code)]

extern crate alloc;

#[macro_use]
mod macros;

mod controller;
mod dialog;
mod input;
mod session;
mod settle;
mod view_stack;

#[cfg(test)]
mod tests;

pub use controller::{
    Controller, DEFAULT_BUFFER_ROWS, RequestState, SharedController, Ticket, ViewState,
    WindowOptions, WindowRequest,
};
pub use dialog::{
    AddToFolder, DialogOutcome, DialogRequest, DialogSlot, DialogTicket, Duplicate,
    DuplicateChoice,
};
pub use input::{ClickAction, Key, KeyAction, Modifiers, Platform};
pub use session::ListSession;
pub use settle::{DEFAULT_SETTLE_MS, SettleGate};
pub use view_stack::ViewStack;
