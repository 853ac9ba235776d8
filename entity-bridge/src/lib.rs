//! Entity Bridge
//!
//! Keeps an event-emitting entity model and a reducer store mutually
//! consistent. Mutating either side (triggering an event on the entity, or
//! dispatching an action on the store) reaches the other side exactly once.
//!
//! # Features
//!
//! - **Entity or reducer input**: bridge one entity, a named set of
//!   entities, or a reducer that returns entities
//! - **Any store**: built on the minimal store by default, or on an injected
//!   store constructor that honours enhancers
//! - **Loop protection**: entity listeners may dispatch further actions, but
//!   an action type re-entering its own echo fails with `ForwardCycle`
//! - **Type checks**: reducers may not swap bound entities for entities of
//!   another type
//!
//! # Quick Start
//!
//! ```rust
//! use entity_bridge::prelude::*;
//! use entity_model::{shared, Collection, EntityMap, Model};
//! use serde_json::json;
//!
//! let model = Model::new(json!({ "num": 3 })).unwrap();
//! model.react("DECREMENT", |model, _| {
//!     let num = model.get("num").and_then(|n| n.as_i64()).unwrap_or(0);
//!     model.set("num", json!(num - 1))?;
//!     Ok(())
//! });
//! let collection = Collection::from_attributes(vec![json!({}), json!({})]).unwrap();
//! collection.react("POP", |collection, _| {
//!     collection.pop()?;
//!     Ok(())
//! });
//!
//! let bridge = create_bridge(None)
//!     .entities(
//!         EntityMap::new()
//!             .with("model", shared(model))
//!             .with("collection", shared(collection.clone())),
//!     )
//!     .build()
//!     .unwrap();
//!
//! bridge.dispatch(Action::new("DECREMENT")).unwrap();
//! entity_dispatch(&collection, "POP", None).unwrap();
//!
//! assert_eq!(
//!     bridge.get_state().to_json(),
//!     json!({ "model": { "num": 2 }, "collection": [{}] })
//! );
//! ```
//!
//! # Architecture
//!
//! ```text
//! create_bridge(constructor?)
//!     .entity(e) | .entities(map) | .reducer(r).default_state(s)
//!     .with_enhancer(user)
//!     .build()
//!         │
//!         ├── reducer:   SnapshotReducer(aggregate) | ValidatingReducer(r)
//!         ├── enhancer:  dispatch_enhancer(aggregate) ∘ user
//!         ├── store:     constructor(reducer, state, enhancer)
//!         └── listener:  aggregate.on(__BRIDGE_DISPATCH__) ──► store.dispatch
//!
//! store.dispatch(action) ──► entity.trigger(type, payload) ──► reducer ──► listeners
//! entity_dispatch(e, ..) ──► e.trigger(__BRIDGE_DISPATCH__) ──► store.dispatch(action)
//! ```

// Modules
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod enhancer;
pub mod error;
pub mod logging;
pub mod reducer;
pub mod state;

// Re-exports - Public API
pub use bridge::{create_bridge, Bridge, BridgeBuilder, BridgeInput};
pub use config::{BridgeConfig, StateAccess, UnboundForward};
pub use dispatch::entity_dispatch;
pub use enhancer::{dispatch_enhancer, ForwardingStore, MAX_FORWARD_DEPTH};
pub use error::{find_in_chain, BridgeError, Result};
pub use reducer::{SnapshotReducer, ValidatingReducer};
pub use state::BridgeState;

// Re-exports from the store and entity crates
pub use entity_model::{EntityError, EntityMap, ObservableEntity, SharedEntity};
pub use state_store::{
    Action, Reserved, SharedStore, Store, StoreConstructor, StoreEnhancer, StoreError,
    StoreListener, Unsubscribe,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bridge::{create_bridge, Bridge, BridgeInput};
    pub use crate::config::{BridgeConfig, StateAccess, UnboundForward};
    pub use crate::dispatch::entity_dispatch;
    pub use crate::error::BridgeError;
    pub use crate::state::BridgeState;
    pub use entity_model::ObservableEntity;
    pub use state_store::{Action, Store};
}
