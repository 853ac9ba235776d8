//! Attribute-map entity
//!
//! `Model` holds a flat JSON object of attributes and emits change events
//! when an attribute actually changes. Cloning a `Model` yields another
//! handle to the same entity.
//!
//! ```rust
//! use entity_model::Model;
//! use serde_json::json;
//!
//! let model = Model::new(json!({ "num": 3 })).unwrap();
//! model.react("INCREMENT", |model, _event| {
//!     let num = model.get("num").and_then(|v| v.as_i64()).unwrap_or(0);
//!     model.set("num", json!(num + 1))?;
//!     Ok(())
//! });
//!
//! use entity_model::ObservableEntity;
//! model.trigger("INCREMENT", &json!(null)).unwrap();
//! assert_eq!(model.get("num"), Some(json!(4)));
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::trace;

use crate::entity::{Event, EventListener, ListenerId, ObservableEntity};
use crate::error::{EntityError, Result};
use crate::events::Events;

struct ModelInner {
    attributes: Mutex<Map<String, Value>>,
    events: Events,
}

/// Observable attribute map
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create a model from a JSON object (`null` means no attributes)
    pub fn new(attributes: Value) -> Result<Self> {
        match attributes {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Ok(Self::from_map(Map::new())),
            other => Err(EntityError::InvalidAttributes(other.to_string())),
        }
    }

    pub fn from_map(attributes: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                attributes: Mutex::new(attributes),
                events: Events::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.attributes.lock().get(key).cloned()
    }

    /// Set one attribute, returning whether its value changed
    ///
    /// A change fires `change:<key>` with the new value, then `change` with
    /// the full snapshot.
    pub fn set(&self, key: &str, value: Value) -> Result<bool> {
        let changed = {
            let mut attributes = self.inner.attributes.lock();
            if attributes.get(key) == Some(&value) {
                false
            } else {
                attributes.insert(key.to_string(), value.clone());
                true
            }
        };

        if changed {
            trace!(attribute = key, "model attribute changed");
            self.inner.events.trigger(&format!("change:{}", key), &value)?;
            self.inner.events.trigger("change", &self.to_json())?;
        }
        Ok(changed)
    }

    /// Remove one attribute, returning whether it existed
    pub fn unset(&self, key: &str) -> Result<bool> {
        let removed = self.inner.attributes.lock().remove(key).is_some();
        if removed {
            self.inner
                .events
                .trigger(&format!("change:{}", key), &Value::Null)?;
            self.inner.events.trigger("change", &self.to_json())?;
        }
        Ok(removed)
    }

    pub fn attributes(&self) -> Map<String, Value> {
        self.inner.attributes.lock().clone()
    }

    /// Register a handler that receives this model along with the event
    ///
    /// The registration keeps only a weak reference to the model, so a model
    /// reacting to its own events does not keep itself alive.
    pub fn react<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&Model, &Event<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let weak: Weak<ModelInner> = Arc::downgrade(&self.inner);
        let listener: EventListener = Arc::new(move |event: &Event<'_>| match weak.upgrade() {
            Some(inner) => handler(&Model { inner }, event),
            None => Ok(()),
        });
        self.inner.events.on(event, listener)
    }

    /// Whether both handles refer to the same model
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.events.listener_count(event)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::from_map(Map::new())
    }
}

impl ObservableEntity for Model {
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
        Value::Object(self.attributes())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("attributes", &*self.inner.attributes.lock())
            .finish()
    }
}
