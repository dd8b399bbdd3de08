use alloc::vec::Vec;

use lazyrange::EndpointEvent;

/// Detail views opened on top of a list (image, collection, album ...).
///
/// The top view is the visible one. Views are plain values; the owner keeps their state.
#[derive(Clone, Debug)]
pub struct ViewStack<V> {
    views: Vec<V>,
}

impl<V> Default for ViewStack<V> {
    fn default() -> Self {
        Self { views: Vec::new() }
    }
}

impl<V> ViewStack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, view: V) {
        self.views.push(view);
    }

    pub fn pop(&mut self) -> Option<V> {
        self.views.pop()
    }

    pub fn peek(&self) -> Option<&V> {
        self.views.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut V> {
        self.views.last_mut()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.views.iter()
    }

    /// Closes every view, returning them bottom first.
    pub fn close_all(&mut self) -> Vec<V> {
        core::mem::take(&mut self.views)
    }

    /// Reacts to an edit of the list shown by the top view.
    ///
    /// A removal that leaves the list empty closes the top view, which is returned.
    pub fn on_endpoint_event(&mut self, event: EndpointEvent, count: Option<usize>) -> Option<V> {
        match event {
            EndpointEvent::Remove { .. } if count == Some(0) => {
                vdebug!(depth = self.views.len(), "top view emptied; closing");
                self.views.pop()
            }
            EndpointEvent::Remove { .. }
            | EndpointEvent::Add { .. }
            | EndpointEvent::Modify { .. }
            | EndpointEvent::Refresh => None,
        }
    }
}
