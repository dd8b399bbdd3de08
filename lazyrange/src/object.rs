//! A single detail object addressed by a path, with update and delete.

use alloc::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::emitter::{Emitter, SubscriptionId};
use crate::{FetchError, ObjectOptions};

/// Backend operations on one kind of detail object.
pub trait ObjectSource<P, M, Form>: Send + Sync + 'static {
    fn get(&self, path: &P) -> BoxFuture<'static, Result<M, FetchError>>;
    /// Returns the updated model, or `None` when the backend does not echo it (the endpoint then
    /// re-fetches it).
    fn update(&self, path: &P, form: Form) -> BoxFuture<'static, Result<Option<M>, FetchError>>;
    fn delete(&self, path: &P) -> BoxFuture<'static, Result<(), FetchError>>;
}

struct State<P, M> {
    path: Option<P>,
    generation: u64,
    loading: bool,
    updating: bool,
    deleting: bool,
    data: Option<M>,
}

struct Inner<P, M, Form> {
    source: Arc<dyn ObjectSource<P, M, Form>>,
    options: ObjectOptions,
    state: Mutex<State<P, M>>,
    events: Emitter<Option<M>>,
}

/// Loads the object at the current path and keeps it while it is edited.
///
/// Changing the path discards any `get` still in flight for the previous one.
pub struct ObjectEndpoint<P, M, Form> {
    inner: Arc<Inner<P, M, Form>>,
}

impl<P, M, Form> Clone for ObjectEndpoint<P, M, Form> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: core::fmt::Debug, M, Form> core::fmt::Debug for ObjectEndpoint<P, M, Form> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ObjectEndpoint")
            .field("path", &state.path)
            .field("generation", &state.generation)
            .field("loading", &state.loading)
            .field("loaded", &state.data.is_some())
            .finish_non_exhaustive()
    }
}

impl<P, M, Form> ObjectEndpoint<P, M, Form>
where
    P: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    Form: Send + 'static,
{
    pub fn new(source: impl ObjectSource<P, M, Form>, options: ObjectOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                source: Arc::new(source),
                options,
                state: Mutex::new(State {
                    path: None,
                    generation: 0,
                    loading: false,
                    updating: false,
                    deleting: false,
                    data: None,
                }),
                events: Emitter::new(),
            }),
        }
    }

    pub fn path(&self) -> Option<P> {
        self.inner.state.lock().path.clone()
    }

    pub fn data(&self) -> Option<M> {
        self.inner.state.lock().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn updating(&self) -> bool {
        self.inner.state.lock().updating
    }

    pub fn deleting(&self) -> bool {
        self.inner.state.lock().deleting
    }

    pub fn subscribe(&self, listener: impl Fn(&Option<M>) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Points the endpoint at another object and loads it. `None` clears the data.
    ///
    /// `NOT_FOUND` leaves the data empty without reporting an error.
    pub async fn set_path(&self, path: Option<P>) {
        let (generation, response) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.data = None;
            state.path = path;
            let response = state.path.as_ref().map(|p| self.inner.source.get(p));
            state.loading = response.is_some();
            (state.generation, response)
        };
        vdebug!(generation, "object path changed");
        self.inner.events.emit(&None);
        let Some(response) = response else {
            return;
        };

        let result = response.await;
        let data = {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                vtrace!(generation, "object get superseded by a path change");
                return;
            }
            state.loading = false;
            match result {
                Ok(model) => {
                    state.data = Some(model);
                    state.data.clone()
                }
                Err(error) => {
                    drop(state);
                    if !error.is_not_found() {
                        self.report(&error);
                    }
                    return;
                }
            }
        };
        self.inner.events.emit(&data);
    }

    /// Submits `form`; failures go to the default error handler.
    pub async fn set_data(&self, form: Form) -> bool {
        self.set_data_with(form, Some).await
    }

    /// Submits `form`. An update failure is first offered to `handle_error`, which either
    /// consumes it (`None`) or hands it back for the default error handler.
    pub async fn set_data_with(
        &self,
        form: Form,
        handle_error: impl FnOnce(FetchError) -> Option<FetchError>,
    ) -> bool {
        let (generation, path, response) = {
            let mut state = self.inner.state.lock();
            let Some(path) = state.path.clone() else {
                return false;
            };
            if state.updating {
                return false;
            }
            state.updating = true;
            let response = self.inner.source.update(&path, form);
            (state.generation, path, response)
        };

        let result = response.await;
        let ok = match result {
            Ok(Some(model)) => {
                self.store(generation, Some(model));
                true
            }
            Ok(None) => {
                match self.inner.source.get(&path).await {
                    Ok(model) => self.store(generation, Some(model)),
                    Err(error) => {
                        if !error.is_not_found() {
                            self.report(&error);
                        }
                        self.store(generation, None);
                    }
                }
                true
            }
            Err(error) => {
                vdebug!(%error, "object update failed");
                if let Some(error) = handle_error(error) {
                    self.report(&error);
                }
                false
            }
        };
        self.inner.state.lock().updating = false;
        ok
    }

    /// Deletes the object at the current path and clears the data.
    pub async fn delete_data(&self) -> bool {
        let (generation, response) = {
            let mut state = self.inner.state.lock();
            let Some(path) = state.path.as_ref() else {
                return false;
            };
            if state.deleting {
                return false;
            }
            let response = self.inner.source.delete(path);
            state.deleting = true;
            (state.generation, response)
        };

        let result = response.await;
        self.inner.state.lock().deleting = false;
        match result {
            Ok(()) => {
                self.store(generation, None);
                true
            }
            Err(error) => {
                self.report(&error);
                false
            }
        }
    }

    fn store(&self, generation: u64, data: Option<M>) {
        {
            let mut state = self.inner.state.lock();
            if state.generation != generation {
                return;
            }
            state.data = data.clone();
        }
        self.inner.events.emit(&data);
    }

    fn report(&self, error: &FetchError) {
        vwarn!(%error, "object request failed");
        if let Some(handle_error) = &self.inner.options.handle_error {
            handle_error(error);
        }
    }
}
