//! Minimal Reducer Store
//!
//! A small, synchronous reducer store with a pluggable constructor, used as
//! the default store behind an entity bridge and interchangeable with any
//! other implementation of the [`Store`] contract.
//!
//! # Features
//!
//! - **Typed Actions**: `Action` with reserved sentinel types rejected at dispatch
//! - **Pure Reducers**: any `Fn(&S, &Action) -> Option<S>` is a reducer
//! - **Safe Fan-out**: listeners may subscribe, unsubscribe or dispatch while
//!   being notified
//! - **Enhancers**: wrap store creation with `compose`-able decorators
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use state_store::{create_store, reducer, Action, Store};
//!
//! let counter = reducer::shared(|state: &i64, action: &Action| match action.action_type() {
//!     "INCREMENT" => Some(state + 1),
//!     _ => Some(*state),
//! });
//!
//! let store = create_store(counter, 0, None).unwrap();
//! store.subscribe(Arc::new(|state: &i64| println!("now {}", state)));
//!
//! assert_eq!(store.dispatch(Action::new("INCREMENT")).unwrap(), 1);
//! assert_eq!(store.get_state(), 1);
//! ```
//!
//! # Architecture
//!
//! ```text
//! create_store(reducer, initial, enhancer)
//!     │
//!     ├── enhancer given ──► enhancer(create_store)(reducer, initial)
//!     │
//!     └── MinimalStore<S>
//!             ├── state: Mutex<S>            (committed after reducer succeeds)
//!             ├── listeners: Listeners<S>    (snapshot fan-out)
//!             └── bootstrap dispatch on construction
//! ```

// Modules
pub mod action;
pub mod enhancer;
pub mod error;
pub mod reducer;
pub mod store;

// Re-exports - Public API
pub use action::{Action, Reserved};
pub use enhancer::{
    compose, identity, logging_enhancer, minimal_constructor, StoreConstructor, StoreCreator,
    StoreEnhancer,
};
pub use error::{BoxError, Result, StoreError};
pub use reducer::{Reducer, SharedReducer, TryReducer};
pub use store::{
    create_store, Listeners, MinimalStore, SharedStore, Store, StoreListener, Unsubscribe,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{Action, Reserved};
    pub use crate::enhancer::{StoreConstructor, StoreCreator, StoreEnhancer};
    pub use crate::error::StoreError;
    pub use crate::reducer::{Reducer, SharedReducer};
    pub use crate::store::{create_store, SharedStore, Store, StoreListener, Unsubscribe};
}
