//! The observable entity contract
//!
//! An observable entity is anything that can register listeners for named
//! events, trigger those events synchronously, and serialize itself to a
//! plain JSON snapshot. The bridge only ever talks to entities through this
//! trait.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use entity_model::{Event, Model, ObservableEntity};
//! use serde_json::json;
//!
//! let model = Model::new(json!({ "num": 3 })).unwrap();
//! model.on("ping", Arc::new(|event: &Event<'_>| {
//!     println!("{} {}", event.name, event.payload);
//!     Ok(())
//! }));
//! model.trigger("ping", &json!(1)).unwrap();
//! assert_eq!(model.to_json(), json!({ "num": 3 }));
//! ```

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Wildcard event name; its listeners run for every triggered event
pub const ALL_EVENTS: &str = "all";

/// An event as seen by a listener
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Name the event was triggered with (never `"all"` for wildcard listeners)
    pub name: &'a str,
    pub payload: &'a Value,
}

/// Listener callback
///
/// Returning an error stops the fan-out and surfaces from `trigger`.
pub type EventListener = Arc<dyn Fn(&Event<'_>) -> Result<()> + Send + Sync>;

/// Shared, type-erased entity
pub type SharedEntity = Arc<dyn ObservableEntity>;

/// Identifier of a listener registration
///
/// Ids are unique process-wide, so an aggregate can register the same id on
/// each of its members and remove them together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Concrete type of an entity, used to detect incompatible replacements
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full type path, e.g. `entity_model::model::Model`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, e.g. `Model`
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Capability contract of an observable entity
///
/// Invariants implementors must uphold:
/// - `trigger` runs listeners synchronously on the calling thread, named
///   listeners first, then `"all"` listeners
/// - `trigger` may be called from inside a listener
/// - listeners registered or removed during a trigger do not change which
///   listeners that trigger reaches
pub trait ObservableEntity: Send + Sync + 'static {
    /// Register `listener` for `event` under a caller-chosen id
    fn listen(&self, event: &str, id: ListenerId, listener: EventListener);

    /// Remove every registration with `id`, returning whether any existed
    fn off(&self, id: ListenerId) -> bool;

    /// Synchronously run all listeners for `event` (and `"all"`)
    fn trigger(&self, event: &str, payload: &Value) -> Result<()>;

    /// Like `trigger`, but skip registrations whose id is in `delivered`
    ///
    /// Ids of listeners that ran are added to `delivered`. An aggregate
    /// threads one set through all of its members, so a registration it
    /// made on every member runs once per aggregate trigger. The default
    /// ignores the set.
    fn trigger_tracked(
        &self,
        event: &str,
        payload: &Value,
        _delivered: &mut HashSet<ListenerId>,
    ) -> Result<()> {
        self.trigger(event, payload)
    }

    /// Plain-data snapshot of the current state
    fn to_json(&self) -> Value;

    /// Register `listener` for `event` under a fresh id
    fn on(&self, event: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId::next();
        self.listen(event, id, listener);
        id
    }

    fn entity_type(&self) -> EntityType {
        EntityType::of::<Self>()
    }
}

/// Wrap a concrete entity into a `SharedEntity`
pub fn shared<E: ObservableEntity>(entity: E) -> SharedEntity {
    Arc::new(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;
    struct Other;

    #[test]
    fn test_listener_ids_are_unique() {
        let a = ListenerId::next();
        let b = ListenerId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_entity_type_equality() {
        assert_eq!(EntityType::of::<Probe>(), EntityType::of::<Probe>());
        assert_ne!(EntityType::of::<Probe>(), EntityType::of::<Other>());
        assert_eq!(EntityType::of::<Probe>().short_name(), "Probe");
        assert_eq!(format!("{}", EntityType::of::<Other>()), "Other");
    }
}
