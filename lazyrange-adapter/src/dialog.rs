use alloc::vec::Vec;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use lazyrange::{Emitter, ItemId, SubscriptionId};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// How a pushed dialog ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogOutcome<R> {
    Resolved(R),
    /// Closed without an answer, or replaced by another dialog.
    Cancelled,
}

impl<R> DialogOutcome<R> {
    pub fn resolved(self) -> Option<R> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

/// Resolves once the pushed dialog is resolved or cancelled.
#[derive(Debug)]
#[must_use = "a dialog ticket does nothing unless awaited"]
pub struct DialogTicket<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> Future for DialogTicket<R> {
    type Output = DialogOutcome<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| match result {
            Ok(value) => DialogOutcome::Resolved(value),
            Err(_) => DialogOutcome::Cancelled,
        })
    }
}

struct Pending<C, R> {
    context: C,
    tx: oneshot::Sender<R>,
}

/// The single active-dialog slot of a window.
///
/// Opening a dialog while another one is pending cancels the pending one first. Every pushed
/// dialog yields exactly one [`DialogOutcome`].
pub struct DialogSlot<C, R> {
    current: Mutex<Option<Pending<C, R>>>,
    events: Emitter<Option<C>>,
}

impl<C, R> Default for DialogSlot<C, R> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
            events: Emitter::new(),
        }
    }
}

impl<C, R> core::fmt::Debug for DialogSlot<C, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DialogSlot")
            .field("open", &self.current.lock().is_some())
            .finish()
    }
}

impl<C: Clone, R> DialogSlot<C, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a dialog for `context`.
    pub fn push(&self, context: C) -> DialogTicket<R> {
        let (tx, rx) = oneshot::channel();
        let previous = self.current.lock().replace(Pending {
            context: context.clone(),
            tx,
        });
        if previous.is_some() {
            vdebug!("dialog replaced; previous one cancelled");
        }
        // Dropping the previous sender cancels its ticket.
        drop(previous);
        self.events.emit(&Some(context));
        DialogTicket { rx }
    }

    /// Answers the open dialog. Returns `false` when no dialog is open.
    pub fn resolve(&self, value: R) -> bool {
        let Some(pending) = self.current.lock().take() else {
            return false;
        };
        // The receiver may already be gone; the dialog is closed either way.
        let _ = pending.tx.send(value);
        self.events.emit(&None);
        true
    }

    /// Closes the open dialog without an answer.
    pub fn cancel(&self) -> bool {
        let Some(pending) = self.current.lock().take() else {
            return false;
        };
        drop(pending);
        self.events.emit(&None);
        true
    }

    /// Context of the open dialog.
    pub fn current(&self) -> Option<C> {
        self.current.lock().as_ref().map(|p| p.context.clone())
    }

    pub fn is_open(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Notified with the new context on push and with `None` on close.
    pub fn subscribe(&self, listener: impl Fn(&Option<C>) + Send + Sync + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}

/// An item that is already part of the target container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duplicate {
    pub id: ItemId,
    /// Current position inside the target.
    pub ordinal: usize,
}

/// What to do with items that are already in the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicateChoice {
    /// Move duplicates to the new position.
    Move,
    /// Leave duplicates where they are.
    Ignore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddToFolder {
    /// Some images already are in `folder_id`; ask how to handle them.
    ExistsCheck {
        folder_id: ItemId,
        images: Vec<ItemId>,
        duplicates: Vec<Duplicate>,
    },
    /// No target yet; ask the user to pick a folder.
    ChooseFolder { images: Vec<ItemId> },
}

/// Contexts of the dialogs a list view can open.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DialogRequest {
    AddToFolder(AddToFolder),
    AddToCollection {
        collection_id: ItemId,
        images: Vec<ItemId>,
    },
    AddToAlbum {
        album_id: ItemId,
        images: Vec<ItemId>,
        duplicates: Vec<Duplicate>,
    },
    /// Copy tags, sources and relations from one image to another.
    CloneProperties {
        from: Option<ItemId>,
        to: Option<ItemId>,
    },
}

impl DialogRequest {
    pub fn title(&self) -> &'static str {
        match self {
            Self::AddToFolder(AddToFolder::ExistsCheck { .. }) => "Add to folder",
            Self::AddToFolder(AddToFolder::ChooseFolder { .. }) => "Choose folder",
            Self::AddToCollection { .. } => "Add to collection",
            Self::AddToAlbum { .. } => "Add to album",
            Self::CloneProperties { .. } => "Clone image properties",
        }
    }

    /// Images that end up added when the user answers with `choice`.
    ///
    /// Requests that do not carry duplicates return their images unchanged; property cloning
    /// adds nothing.
    pub fn images_to_add(&self, choice: DuplicateChoice) -> Vec<ItemId> {
        match self {
            Self::AddToFolder(AddToFolder::ExistsCheck {
                images, duplicates, ..
            })
            | Self::AddToAlbum {
                images, duplicates, ..
            } => match choice {
                DuplicateChoice::Move => images.clone(),
                DuplicateChoice::Ignore => images
                    .iter()
                    .copied()
                    .filter(|id| !duplicates.iter().any(|d| d.id == *id))
                    .collect(),
            },
            Self::AddToFolder(AddToFolder::ChooseFolder { images })
            | Self::AddToCollection { images, .. } => images.clone(),
            Self::CloneProperties { .. } => Vec::new(),
        }
    }
}
