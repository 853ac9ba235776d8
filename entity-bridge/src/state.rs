//! State held by a bridged store
//!
//! A bridged store keeps either plain JSON (the entity snapshot, or whatever
//! a JSON reducer computes) or the entities themselves when a user reducer
//! returns them. [`BridgeState::to_json`] flattens both into the same plain
//! snapshot.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use entity_model::{shared, EntityMap, EntitySource, ObservableEntity, SharedEntity};

#[derive(Clone)]
pub enum BridgeState {
    /// Plain data
    Json(Value),
    /// A single entity returned by a reducer
    Entity(SharedEntity),
    /// Named entities returned by a reducer
    Entities(EntityMap),
}

impl BridgeState {
    /// Wrap a concrete entity
    pub fn entity<E: ObservableEntity>(entity: E) -> Self {
        BridgeState::Entity(shared(entity))
    }

    /// Plain snapshot of this state
    pub fn to_json(&self) -> Value {
        match self {
            BridgeState::Json(value) => value.clone(),
            BridgeState::Entity(entity) => entity.to_json(),
            BridgeState::Entities(map) => map.to_json(),
        }
    }

    /// This state with every entity replaced by its snapshot
    pub fn snapshot(&self) -> BridgeState {
        match self {
            BridgeState::Json(_) => self.clone(),
            _ => BridgeState::Json(self.to_json()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            BridgeState::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The entity handle, for `Entity` states
    pub fn as_entity(&self) -> Option<&SharedEntity> {
        match self {
            BridgeState::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// The entities this state carries, in aggregatable form
    pub fn entity_source(&self) -> Option<EntitySource> {
        match self {
            BridgeState::Json(_) => None,
            BridgeState::Entity(entity) => Some(EntitySource::Single(Arc::clone(entity))),
            BridgeState::Entities(map) => Some(EntitySource::Map(map.clone())),
        }
    }

    pub fn is_entity(&self) -> bool {
        !matches!(self, BridgeState::Json(_))
    }

    /// Short description used in mismatch reports
    pub(crate) fn describe(&self) -> String {
        match self {
            BridgeState::Json(value) => match value {
                Value::Null => "null".to_string(),
                Value::Bool(_) => "a boolean".to_string(),
                Value::Number(_) => "a number".to_string(),
                Value::String(_) => "a string".to_string(),
                Value::Array(_) => "a plain array".to_string(),
                Value::Object(_) => "a plain object".to_string(),
            },
            BridgeState::Entity(entity) => entity.entity_type().short_name().to_string(),
            BridgeState::Entities(_) => "an entity map".to_string(),
        }
    }
}

impl Default for BridgeState {
    fn default() -> Self {
        BridgeState::Json(Value::Null)
    }
}

impl From<Value> for BridgeState {
    fn from(value: Value) -> Self {
        BridgeState::Json(value)
    }
}

impl From<SharedEntity> for BridgeState {
    fn from(entity: SharedEntity) -> Self {
        BridgeState::Entity(entity)
    }
}

impl From<EntityMap> for BridgeState {
    fn from(map: EntityMap) -> Self {
        BridgeState::Entities(map)
    }
}

impl fmt::Debug for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Json(value) => f.debug_tuple("Json").field(value).finish(),
            BridgeState::Entity(entity) => f
                .debug_tuple("Entity")
                .field(&entity.entity_type().short_name())
                .finish(),
            BridgeState::Entities(map) => f.debug_tuple("Entities").field(map).finish(),
        }
    }
}
