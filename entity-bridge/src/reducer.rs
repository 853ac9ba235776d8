//! Reducers synthesized by the bridge
//!
//! - [`SnapshotReducer`] ignores the action and returns the current
//!   serialized form of an entity aggregate. Entity-mode bridges use it, so
//!   the store's state is always whatever the entities say.
//! - [`ValidatingReducer`] wraps a user reducer and rejects results whose
//!   entities are not of the same concrete type as the default state's.
//!   Swapping in a different kind of entity would silently detach it from
//!   the forwarding listener.

use std::sync::Arc;

use tracing::trace;

use entity_model::{EntityType, SharedEntity};
use state_store::{Action, Reducer, SharedReducer, StoreError};

use crate::state::BridgeState;

/// `(_, _) -> aggregate.to_json()`
pub struct SnapshotReducer {
    aggregate: SharedEntity,
}

impl SnapshotReducer {
    pub fn new(aggregate: SharedEntity) -> Self {
        Self { aggregate }
    }
}

impl Reducer<BridgeState> for SnapshotReducer {
    fn reduce(&self, _: &BridgeState, action: &Action) -> state_store::Result<BridgeState> {
        trace!(action = action.action_type(), "snapshot reducer");
        Ok(BridgeState::Json(self.aggregate.to_json()))
    }
}

/// Entity types a reducer must keep producing
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Entity(EntityType),
    Entities(Vec<(String, EntityType)>),
}

impl Shape {
    fn of(state: &BridgeState) -> Option<Shape> {
        match state {
            BridgeState::Json(_) => None,
            BridgeState::Entity(entity) => Some(Shape::Entity(entity.entity_type())),
            BridgeState::Entities(map) => Some(Shape::Entities(
                map.iter()
                    .map(|(name, entity)| (name.to_string(), entity.entity_type()))
                    .collect(),
            )),
        }
    }

    fn check(&self, next: &BridgeState) -> state_store::Result<()> {
        match (self, next) {
            (Shape::Entity(expected), BridgeState::Entity(entity)) => {
                let found = entity.entity_type();
                if found == *expected {
                    Ok(())
                } else {
                    Err(mismatch(expected.short_name(), found.short_name(), None))
                }
            }
            (Shape::Entities(expected), BridgeState::Entities(map)) => {
                for (name, expected_type) in expected {
                    match map.get(name) {
                        Some(entity) if entity.entity_type() == *expected_type => {}
                        Some(entity) => {
                            return Err(mismatch(
                                expected_type.short_name(),
                                entity.entity_type().short_name(),
                                Some(name),
                            ))
                        }
                        None => {
                            return Err(mismatch(expected_type.short_name(), "nothing", Some(name)))
                        }
                    }
                }
                match map.keys().find(|key| !expected.iter().any(|(name, _)| name == key)) {
                    Some(extra) => {
                        let found = map
                            .get(extra)
                            .map(|entity| entity.entity_type().short_name())
                            .unwrap_or("nothing");
                        Err(mismatch("nothing", found, Some(extra)))
                    }
                    None => Ok(()),
                }
            }
            (Shape::Entity(expected), other) => {
                Err(mismatch(expected.short_name(), &other.describe(), None))
            }
            (Shape::Entities(_), other) => Err(mismatch("an entity map", &other.describe(), None)),
        }
    }
}

fn mismatch(expected: &str, found: &str, key: Option<&str>) -> StoreError {
    StoreError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
        key: key.map(str::to_string),
    }
}

/// Reducer decorator enforcing the default state's entity types
pub struct ValidatingReducer {
    inner: SharedReducer<BridgeState>,
    shape: Shape,
}

impl ValidatingReducer {
    /// Wrap `inner` when `default_state` holds entities
    ///
    /// Plain JSON default states impose nothing, so the reducer is returned
    /// unchanged.
    pub fn wrap(
        inner: SharedReducer<BridgeState>,
        default_state: &BridgeState,
    ) -> SharedReducer<BridgeState> {
        match Shape::of(default_state) {
            Some(shape) => Arc::new(ValidatingReducer { inner, shape }),
            None => inner,
        }
    }
}

impl Reducer<BridgeState> for ValidatingReducer {
    fn reduce(&self, state: &BridgeState, action: &Action) -> state_store::Result<BridgeState> {
        let next = self.inner.reduce(state, action)?;
        self.shape.check(&next)?;
        Ok(next)
    }
}
