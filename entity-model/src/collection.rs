//! Ordered collection of models

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use crate::entity::{Event, EventListener, ListenerId, ObservableEntity};
use crate::error::Result;
use crate::events::Events;
use crate::model::Model;

struct CollectionInner {
    models: Mutex<Vec<Model>>,
    events: Events,
}

/// Observable ordered list of [`Model`]s
///
/// `push` fires `add` and `pop` fires `remove`, each with the affected
/// model's snapshot as payload. The JSON form is the array of member
/// snapshots. Cloning yields another handle to the same collection.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                models: Mutex::new(Vec::new()),
                events: Events::new(),
            }),
        }
    }

    /// Create a collection seeded with one model per attribute object
    pub fn from_attributes<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let models = items
            .into_iter()
            .map(Model::new)
            .collect::<Result<Vec<_>>>()?;
        let collection = Self::new();
        *collection.inner.models.lock() = models;
        Ok(collection)
    }

    /// Append a model built from `attributes`
    pub fn push(&self, attributes: Value) -> Result<Model> {
        let model = Model::new(attributes)?;
        self.inner.models.lock().push(model.clone());
        trace!(len = self.len(), "model added");
        self.inner.events.trigger("add", &model.to_json())?;
        Ok(model)
    }

    /// Remove and return the last model
    pub fn pop(&self) -> Result<Option<Model>> {
        let removed = self.inner.models.lock().pop();
        if let Some(model) = &removed {
            trace!(len = self.len(), "model removed");
            self.inner.events.trigger("remove", &model.to_json())?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, index: usize) -> Option<Model> {
        self.inner.models.lock().get(index).cloned()
    }

    pub fn last(&self) -> Option<Model> {
        self.inner.models.lock().last().cloned()
    }

    pub fn models(&self) -> Vec<Model> {
        self.inner.models.lock().clone()
    }

    /// Register a handler that receives this collection along with the event
    pub fn react<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&Collection, &Event<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let weak: Weak<CollectionInner> = Arc::downgrade(&self.inner);
        let listener: EventListener = Arc::new(move |event: &Event<'_>| match weak.upgrade() {
            Some(inner) => handler(&Collection { inner }, event),
            None => Ok(()),
        });
        self.inner.events.on(event, listener)
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.events.listener_count(event)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableEntity for Collection {
    fn listen(&self, event: &str, id: ListenerId, listener: EventListener) {
        self.inner.events.listen(event, id, listener);
    }

    fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    fn trigger(&self, event: &str, payload: &Value) -> Result<()> {
        self.inner.events.trigger(event, payload)
    }

    fn trigger_tracked(
        &self,
        event: &str,
        payload: &Value,
        delivered: &mut HashSet<ListenerId>,
    ) -> Result<()> {
        self.inner.events.trigger_tracked(event, payload, delivered)
    }

    fn to_json(&self) -> Value {
        Value::Array(self.models().iter().map(Model::to_json).collect())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("len", &self.len()).finish()
    }
}
