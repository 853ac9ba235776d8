//! Observable Entities
//!
//! The entity side of the bridge: the [`ObservableEntity`] contract, a
//! re-entrant listener registry, aggregation of several named entities into
//! one, and two reference entities ([`Model`], [`Collection`]).
//!
//! # Architecture
//!
//! ```text
//! ObservableEntity (listen / off / trigger / to_json)
//!     │
//!     ├── Model        attributes: Map<String, Value>, Events
//!     ├── Collection   models: Vec<Model>, Events
//!     └── CombinedEntity
//!             └── EntityMap: [(name, SharedEntity)]   fan-out to every member
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use entity_model::{shared, aggregate, Collection, EntityMap, Model, ObservableEntity};
//! use serde_json::json;
//!
//! let model = Model::new(json!({ "num": 3 })).unwrap();
//! let collection = Collection::new();
//! collection.react("PUSH", |collection, event| {
//!     collection.push(event.payload.clone())?;
//!     Ok(())
//! });
//!
//! let entities = aggregate(
//!     EntityMap::new()
//!         .with("model", shared(model))
//!         .with("collection", shared(collection.clone()))
//!         .into(),
//! );
//! entities.trigger("PUSH", &json!({})).unwrap();
//!
//! assert_eq!(collection.len(), 1);
//! assert_eq!(entities.to_json(), json!({ "model": { "num": 3 }, "collection": [{}] }));
//! ```

// Modules
pub mod aggregate;
pub mod collection;
pub mod entity;
pub mod error;
pub mod events;
pub mod model;

// Re-exports - Public API
pub use aggregate::{aggregate, combine_entities, CombinedEntity, EntityMap, EntitySource};
pub use collection::Collection;
pub use entity::{
    shared, EntityType, Event, EventListener, ListenerId, ObservableEntity, SharedEntity,
    ALL_EVENTS,
};
pub use error::{BoxError, EntityError, Result};
pub use events::Events;
pub use model::Model;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::{aggregate, EntityMap, EntitySource};
    pub use crate::collection::Collection;
    pub use crate::entity::{shared, Event, ObservableEntity, SharedEntity};
    pub use crate::error::EntityError;
    pub use crate::model::Model;
}
