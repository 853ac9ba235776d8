//! Entity aggregation
//!
//! One entity or a named set of entities can be treated uniformly through
//! [`aggregate`]: a single entity passes through untouched, a map becomes a
//! [`CombinedEntity`] that fans every call out to all members.
//!
//! ```rust
//! use std::sync::Arc;
//! use entity_model::{aggregate, shared, Collection, EntityMap, EntitySource, Model, ObservableEntity};
//! use serde_json::json;
//!
//! let model = shared(Model::new(json!({ "num": 3 })).unwrap());
//! let single = aggregate(EntitySource::Single(Arc::clone(&model)));
//! assert!(Arc::ptr_eq(&single, &model));
//!
//! let map = EntityMap::new()
//!     .with("model", model)
//!     .with("collection", shared(Collection::new()));
//! let combined = aggregate(EntitySource::Map(map));
//! assert_eq!(combined.to_json(), json!({ "model": { "num": 3 }, "collection": [] }));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::entity::{EventListener, ListenerId, ObservableEntity, SharedEntity};
use crate::error::Result;

/// Ordered mapping `name -> entity`
///
/// Iteration and serialization follow insertion order. Inserting an
/// existing name replaces that member in place.
#[derive(Clone, Default)]
pub struct EntityMap {
    entries: Vec<(String, SharedEntity)>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, entity: SharedEntity) -> Self {
        self.insert(name, entity);
        self
    }

    /// Insert or replace, returning the previous member under `name`
    pub fn insert(&mut self, name: impl Into<String>, entity: SharedEntity) -> Option<SharedEntity> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, entity)),
            None => {
                self.entries.push((name, entity));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SharedEntity> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entity)| entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedEntity)> {
        self.entries.iter().map(|(key, entity)| (key.as_str(), entity))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{ name: member.to_json(), ... }` in insertion order
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .entries
            .iter()
            .map(|(key, entity)| (key.clone(), entity.to_json()))
            .collect();
        Value::Object(object)
    }
}

impl<K: Into<String>> FromIterator<(K, SharedEntity)> for EntityMap {
    fn from_iter<T: IntoIterator<Item = (K, SharedEntity)>>(iter: T) -> Self {
        let mut map = EntityMap::new();
        for (key, entity) in iter {
            map.insert(key, entity);
        }
        map
    }
}

impl std::fmt::Debug for EntityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(key, entity)| (key, entity.entity_type().short_name())),
            )
            .finish()
    }
}

/// What to aggregate
#[derive(Clone)]
pub enum EntitySource {
    /// Already an entity; aggregated as itself
    Single(SharedEntity),
    /// Named members combined into one entity
    Map(EntityMap),
}

impl From<SharedEntity> for EntitySource {
    fn from(entity: SharedEntity) -> Self {
        EntitySource::Single(entity)
    }
}

impl From<EntityMap> for EntitySource {
    fn from(map: EntityMap) -> Self {
        EntitySource::Map(map)
    }
}

/// Collapse an entity source into one entity
///
/// `Single` is returned as the very same `Arc`; `Map` is wrapped in a
/// [`CombinedEntity`]. An empty map yields an entity that ignores
/// everything and serializes to `{}`.
pub fn aggregate(source: EntitySource) -> SharedEntity {
    match source {
        EntitySource::Single(entity) => entity,
        EntitySource::Map(map) => combine_entities(map),
    }
}

/// Combine named entities into one entity
pub fn combine_entities(map: EntityMap) -> SharedEntity {
    Arc::new(CombinedEntity { members: map })
}

/// Synthetic entity fanning out to a fixed set of members
///
/// Every operation affects the whole set; there is no per-member dispatch
/// through the combined handle. A registration made through the combined
/// handle lives on every member but runs once per combined trigger.
pub struct CombinedEntity {
    members: EntityMap,
}

impl CombinedEntity {
    pub fn members(&self) -> &EntityMap {
        &self.members
    }
}

impl ObservableEntity for CombinedEntity {
    fn listen(&self, event: &str, id: ListenerId, listener: EventListener) {
        for (_, member) in self.members.iter() {
            member.listen(event, id, Arc::clone(&listener));
        }
    }

    fn off(&self, id: ListenerId) -> bool {
        self.members
            .iter()
            .fold(false, |removed, (_, member)| member.off(id) || removed)
    }

    fn trigger(&self, event: &str, payload: &Value) -> Result<()> {
        let mut delivered = HashSet::new();
        self.trigger_tracked(event, payload, &mut delivered)
    }

    fn trigger_tracked(
        &self,
        event: &str,
        payload: &Value,
        delivered: &mut HashSet<ListenerId>,
    ) -> Result<()> {
        for (_, member) in self.members.iter() {
            member.trigger_tracked(event, payload, delivered)?;
        }
        Ok(())
    }

    fn to_json(&self) -> Value {
        self.members.to_json()
    }
}
