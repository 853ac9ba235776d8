//! Bridge construction
//!
//! [`BridgeBuilder`] assembles a working bridge from an entity, an entity
//! map or a reducer, plus an optional user enhancer, on top of any store
//! constructor (the built-in minimal store when none is injected).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use entity_bridge::{create_bridge, entity_dispatch, Store};
//! use entity_model::{shared, Model};
//! use serde_json::json;
//! use state_store::Action;
//!
//! let model = Model::new(json!({ "num": 3 })).unwrap();
//! model.react("INCREMENT", |model, _| {
//!     let num = model.get("num").and_then(|n| n.as_i64()).unwrap_or(0);
//!     model.set("num", json!(num + 1))?;
//!     Ok(())
//! });
//!
//! let bridge = create_bridge(None).entity(shared(model.clone())).build().unwrap();
//!
//! entity_dispatch(&model, "INCREMENT", None).unwrap();
//! bridge.dispatch(Action::new("INCREMENT")).unwrap();
//!
//! assert_eq!(model.get("num"), Some(json!(5)));
//! assert_eq!(bridge.get_state().to_json(), json!({ "num": 5 }));
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use entity_model::{
    aggregate, EntityError, EntityMap, EntitySource, Event, EventListener, ListenerId,
    ObservableEntity, SharedEntity,
};
use state_store::{
    minimal_constructor, Action, Reducer, Reserved, SharedReducer, SharedStore, Store,
    StoreConstructor, StoreCreator, StoreEnhancer, StoreListener, Unsubscribe,
};

use crate::config::{BridgeConfig, StateAccess, UnboundForward};
use crate::enhancer::dispatch_enhancer;
use crate::error::{BridgeError, Result};
use crate::reducer::{SnapshotReducer, ValidatingReducer};
use crate::state::BridgeState;

/// What a bridge is built from
#[derive(Clone)]
pub enum BridgeInput {
    /// One entity; the store state is its snapshot
    Entity(SharedEntity),
    /// Named entities; the store state is `{ name: snapshot, ... }`
    Entities(EntityMap),
    /// A user reducer, optionally with its default state
    Reducer {
        reducer: SharedReducer<BridgeState>,
        default_state: Option<BridgeState>,
    },
}

impl From<SharedEntity> for BridgeInput {
    fn from(entity: SharedEntity) -> Self {
        BridgeInput::Entity(entity)
    }
}

impl From<EntityMap> for BridgeInput {
    fn from(map: EntityMap) -> Self {
        BridgeInput::Entities(map)
    }
}

impl From<EntitySource> for BridgeInput {
    fn from(source: EntitySource) -> Self {
        match source {
            EntitySource::Single(entity) => BridgeInput::Entity(entity),
            EntitySource::Map(map) => BridgeInput::Entities(map),
        }
    }
}

/// Start building a bridge on top of `constructor`
///
/// `None` selects the built-in minimal store.
pub fn create_bridge(constructor: Option<StoreConstructor<BridgeState>>) -> BridgeBuilder {
    let builder = BridgeBuilder::new();
    match constructor {
        Some(constructor) => builder.with_constructor(constructor),
        None => builder,
    }
}

/// Fluent builder for [`Bridge`]
///
/// # Validation
///
/// `build()` fails when:
/// - no input was given (`MissingReducer`)
/// - a default state was given without a reducer (`Config`)
/// - a reducer yields no entity to bind and the config says `Throw`
///   (`MissingDefaultState`)
/// - the store constructor, the bootstrap dispatch or the reducer type check
///   fails (`Store`)
pub struct BridgeBuilder {
    constructor: StoreConstructor<BridgeState>,
    input: Option<BridgeInput>,
    default_state: Option<BridgeState>,
    enhancer: Option<StoreEnhancer<BridgeState>>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            constructor: minimal_constructor(),
            input: None,
            default_state: None,
            enhancer: None,
            config: BridgeConfig::default(),
        }
    }

    /// Build on top of an external store constructor
    pub fn with_constructor(mut self, constructor: StoreConstructor<BridgeState>) -> Self {
        self.constructor = constructor;
        self
    }

    /// Bridge a single entity
    pub fn entity(mut self, entity: SharedEntity) -> Self {
        self.input = Some(BridgeInput::Entity(entity));
        self
    }

    /// Bridge a set of named entities
    pub fn entities(mut self, entities: EntityMap) -> Self {
        self.input = Some(BridgeInput::Entities(entities));
        self
    }

    /// Bridge through a user reducer
    pub fn reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<BridgeState> + 'static,
    {
        self.input = Some(BridgeInput::Reducer {
            reducer: Arc::new(reducer),
            default_state: None,
        });
        self
    }

    /// Initial state for a reducer input
    ///
    /// When it holds entities, the reducer must keep returning entities of
    /// the same concrete types.
    pub fn default_state(mut self, state: impl Into<BridgeState>) -> Self {
        self.default_state = Some(state.into());
        self
    }

    pub fn input(mut self, input: BridgeInput) -> Self {
        self.input = Some(input);
        self
    }

    /// User enhancer; the entity forwarding always wraps outside it
    pub fn with_enhancer(mut self, enhancer: StoreEnhancer<BridgeState>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Bridge> {
        let BridgeBuilder {
            constructor,
            input,
            default_state,
            enhancer,
            config,
        } = self;

        let input = input.ok_or(BridgeError::MissingReducer)?;
        let (reducer, initial_state, bound) = match input {
            BridgeInput::Entity(entity) => {
                Self::reject_default_state(&default_state)?;
                Self::snapshot_mode(aggregate(EntitySource::Single(entity)))
            }
            BridgeInput::Entities(map) => {
                Self::reject_default_state(&default_state)?;
                Self::snapshot_mode(aggregate(EntitySource::Map(map)))
            }
            BridgeInput::Reducer {
                reducer,
                default_state: inline_default,
            } => Self::reducer_mode(reducer, inline_default.or(default_state), &config)?,
        };

        let forwarding = dispatch_enhancer::<BridgeState>(bound.clone());
        let final_enhancer: StoreEnhancer<BridgeState> =
            Arc::new(move |creator: StoreCreator<BridgeState>| {
                let creator = match &enhancer {
                    Some(user) => user(creator),
                    None => creator,
                };
                forwarding(creator)
            });

        let store = constructor(reducer, initial_state, Some(final_enhancer))?;
        let listener = bound
            .as_ref()
            .map(|entity| (Arc::clone(entity), bind_entity(entity, &store)));

        debug!(bound = bound.is_some(), state_access = ?config.state_access, "bridge created");
        Ok(Bridge {
            store,
            entity: bound,
            listener,
            config,
        })
    }

    fn reject_default_state(default_state: &Option<BridgeState>) -> Result<()> {
        match default_state {
            Some(_) => Err(BridgeError::Config(
                "a default state only applies to reducer input".to_string(),
            )),
            None => Ok(()),
        }
    }

    fn snapshot_mode(
        aggregate: SharedEntity,
    ) -> (SharedReducer<BridgeState>, BridgeState, Option<SharedEntity>) {
        let initial_state = BridgeState::Json(aggregate.to_json());
        let reducer: SharedReducer<BridgeState> =
            Arc::new(SnapshotReducer::new(Arc::clone(&aggregate)));
        (reducer, initial_state, Some(aggregate))
    }

    fn reducer_mode(
        reducer: SharedReducer<BridgeState>,
        default_state: Option<BridgeState>,
        config: &BridgeConfig,
    ) -> Result<(SharedReducer<BridgeState>, BridgeState, Option<SharedEntity>)> {
        let default_state = match default_state {
            Some(state) => state,
            None => {
                trace!("probing reducer for its default state");
                reducer.reduce(&BridgeState::default(), &Action::bootstrap())?
            }
        };

        let bound = default_state.entity_source().map(aggregate);
        if bound.is_none() {
            match config.on_unbound_forward {
                UnboundForward::Throw => return Err(BridgeError::MissingDefaultState),
                UnboundForward::Ignore => {
                    warn!("reducer state holds no entity; entity dispatches will not reach the store")
                }
            }
        }

        let reducer = ValidatingReducer::wrap(reducer, &default_state);
        Ok((reducer, default_state, bound))
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the entity-to-store listener on `entity`
///
/// The listener holds the store weakly, so a dropped bridge leaves behind
/// nothing but a no-op.
fn bind_entity(entity: &SharedEntity, store: &SharedStore<BridgeState>) -> ListenerId {
    let store = Arc::downgrade(store);
    let listener: EventListener = Arc::new(move |event: &Event<'_>| -> entity_model::Result<()> {
        let Some(store) = store.upgrade() else {
            trace!("bridge dropped; ignoring entity dispatch");
            return Ok(());
        };
        let action = Action::try_from(event.payload.clone())
            .map_err(|err| EntityError::listener(event.name, err))?;
        trace!(action = action.action_type(), "entity dispatch");
        store
            .dispatch(action)
            .map(|_| ())
            .map_err(|err| EntityError::listener(event.name, err))
    });
    entity.on(Reserved::BridgeDispatch.as_str(), listener)
}

/// A store kept in sync with an entity aggregate
///
/// Dispatching on the bridge triggers the action on the entity first, then
/// runs the reducer. Calling [`crate::entity_dispatch`] on the entity runs the
/// same path from the other side. Dropping the bridge removes its entity
/// listener.
pub struct Bridge {
    store: SharedStore<BridgeState>,
    entity: Option<SharedEntity>,
    listener: Option<(SharedEntity, ListenerId)>,
    config: BridgeConfig,
}

impl Bridge {
    /// The entity aggregate bound for forwarding, if any
    pub fn entity(&self) -> Option<&SharedEntity> {
        self.entity.as_ref()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The store as built by the constructor and enhancers
    pub fn store(&self) -> &SharedStore<BridgeState> {
        &self.store
    }

    /// Plain snapshot of the current state, whatever the access mode
    pub fn snapshot(&self) -> Value {
        self.store.get_state().to_json()
    }

    fn present(&self, state: BridgeState) -> BridgeState {
        match self.config.state_access {
            StateAccess::Snapshot => state.snapshot(),
            StateAccess::Live => state,
        }
    }
}

impl Store<BridgeState> for Bridge {
    fn get_state(&self) -> BridgeState {
        self.present(self.store.get_state())
    }

    fn dispatch(&self, action: Action) -> state_store::Result<BridgeState> {
        let next = self.store.dispatch(action)?;
        Ok(self.present(next))
    }

    fn subscribe(&self, listener: StoreListener<BridgeState>) -> Unsubscribe {
        match self.config.state_access {
            StateAccess::Live => self.store.subscribe(listener),
            StateAccess::Snapshot => self.store.subscribe(Arc::new(move |state: &BridgeState| {
                listener(&state.snapshot())
            })),
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Some((entity, id)) = self.listener.take() {
            entity.off(id);
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("bound", &self.entity.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_model::{shared, Collection, Model};
    use serde_json::json;
    use state_store::{reducer, StoreError};

    #[test]
    fn test_missing_input() {
        assert!(matches!(
            create_bridge(None).build(),
            Err(BridgeError::MissingReducer)
        ));
    }

    #[test]
    fn test_default_state_without_reducer_is_config_error() {
        let err = create_bridge(None)
            .entity(shared(Model::default()))
            .default_state(json!({}))
            .build()
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_plain_reducer_is_unbound() {
        let plain = |_: &BridgeState, _: &Action| Some(BridgeState::Json(json!({})));

        assert!(matches!(
            create_bridge(None).reducer(plain).build(),
            Err(BridgeError::MissingDefaultState)
        ));

        let bridge = create_bridge(None)
            .reducer(plain)
            .with_config(BridgeConfig::default().with_unbound_forward(UnboundForward::Ignore))
            .build()
            .unwrap();
        assert!(bridge.entity().is_none());
        assert_eq!(bridge.get_state().to_json(), json!({}));
    }

    #[test]
    fn test_reducer_probe_binds_returned_entity() {
        let collection = Collection::new();
        let returned = collection.clone();
        let bridge = create_bridge(None)
            .reducer(move |_: &BridgeState, _: &Action| Some(BridgeState::entity(returned.clone())))
            .build()
            .unwrap();

        assert!(bridge.entity().is_some());
        assert_eq!(collection.listener_count(Reserved::BridgeDispatch.as_str()), 1);
    }

    #[test]
    fn test_state_access_modes() {
        let collection = Collection::from_attributes(vec![json!({})]).unwrap();
        let returned = collection.clone();
        let reducer = reducer::shared(move |_: &BridgeState, _: &Action| {
            Some(BridgeState::entity(returned.clone()))
        });

        let snapshot = create_bridge(None)
            .input(BridgeInput::Reducer {
                reducer: Arc::clone(&reducer),
                default_state: None,
            })
            .build()
            .unwrap();
        assert_eq!(snapshot.get_state().as_json(), Some(&json!([{}])));

        let live = create_bridge(None)
            .input(BridgeInput::Reducer {
                reducer,
                default_state: None,
            })
            .with_config(BridgeConfig::default().with_state_access(StateAccess::Live))
            .build()
            .unwrap();
        assert!(live.get_state().as_entity().is_some());
    }

    #[test]
    fn test_drop_removes_entity_listener() {
        let model = Model::default();
        let bridge = create_bridge(None).entity(shared(model.clone())).build().unwrap();
        let reserved = Reserved::BridgeDispatch.as_str();
        assert_eq!(model.listener_count(reserved), 1);

        drop(bridge);
        assert_eq!(model.listener_count(reserved), 0);
        assert!(crate::entity_dispatch(&model, "INCREMENT", None).is_ok());
    }

    #[test]
    fn test_type_mismatch_at_dispatch() {
        let default_state = BridgeState::entity(Collection::new());
        let reducer = move |state: &BridgeState, action: &Action| match action.action_type() {
            "SWAP" => Some(BridgeState::entity(Model::default())),
            _ => Some(state.clone()),
        };
        let bridge = create_bridge(None)
            .reducer(reducer)
            .default_state(default_state)
            .build()
            .unwrap();

        let err = bridge.dispatch(Action::new("SWAP")).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert_eq!(bridge.get_state().to_json(), json!([]));
    }
}
