//! Store-to-entity forwarding
//!
//! [`dispatch_enhancer`] decorates whatever store a creator builds so that
//! every dispatched action is first triggered on the entity aggregate as an
//! event of the same name and payload, then handed to the inner store.
//!
//! ```text
//! store.dispatch(action)
//!     │
//!     ├── validate (empty or reserved types never reach the entity)
//!     ├── entity.trigger(action.type, action.payload)   [type pushed on the forwarding chain]
//!     └── inner.dispatch(action)                         [store listeners run]
//! ```
//!
//! Entity listeners therefore observe the action before store listeners
//! observe the post-reducer state. Entity listeners may dispatch other
//! actions; only an action type that re-enters its own echo, or a chain
//! deeper than [`MAX_FORWARD_DEPTH`], is rejected as a cycle.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use entity_model::SharedEntity;
use state_store::{
    Action, SharedReducer, SharedStore, Store, StoreCreator, StoreEnhancer, StoreError,
    StoreListener, Unsubscribe,
};

use crate::error::BridgeError;

/// Longest chain of nested entity echoes one dispatch may start
pub const MAX_FORWARD_DEPTH: usize = 32;

/// Enhancer echoing every dispatch onto `entity`
///
/// With no entity the enhancer still wraps the store, but dispatches go
/// straight to the inner store.
pub fn dispatch_enhancer<S>(entity: Option<SharedEntity>) -> StoreEnhancer<S>
where
    S: Send + Sync + 'static,
{
    Arc::new(move |creator: StoreCreator<S>| {
        let entity = entity.clone();
        Arc::new(move |reducer: SharedReducer<S>, initial_state: S| {
            let inner = creator(reducer, initial_state)?;
            let store: SharedStore<S> = Arc::new(ForwardingStore {
                inner,
                entity: entity.clone(),
                chain: ReentrantMutex::new(RefCell::new(Vec::new())),
            });
            Ok(store)
        })
    })
}

/// Store decorator produced by [`dispatch_enhancer`]
///
/// Dispatches from different threads are serialized; the dispatching
/// thread may re-enter from entity or store listeners.
pub struct ForwardingStore<S> {
    inner: SharedStore<S>,
    entity: Option<SharedEntity>,
    /// Action types whose entity echo is in progress, outermost first
    chain: ReentrantMutex<RefCell<Vec<String>>>,
}

impl<S> ForwardingStore<S> {
    fn forward(
        &self,
        chain: &RefCell<Vec<String>>,
        entity: &SharedEntity,
        action: &Action,
    ) -> state_store::Result<()> {
        {
            let mut chain = chain.borrow_mut();
            let action_type = action.action_type();
            if chain.iter().any(|t| t == action_type) || chain.len() >= MAX_FORWARD_DEPTH {
                return Err(StoreError::enhancer(BridgeError::ForwardCycle {
                    in_flight: chain.join(" -> "),
                    action_type: action_type.to_string(),
                }));
            }
            chain.push(action_type.to_string());
        }
        let _link = ChainLink(chain);

        trace!(action = action.action_type(), "forwarding to entity");
        entity
            .trigger(action.action_type(), &action.payload_or_null())
            .map_err(StoreError::enhancer)
    }
}

/// Pops this echo off the forwarding chain when it ends, even on error
struct ChainLink<'a>(&'a RefCell<Vec<String>>);

impl Drop for ChainLink<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().pop();
    }
}

impl<S> Store<S> for ForwardingStore<S>
where
    S: Send + Sync + 'static,
{
    fn get_state(&self) -> S {
        self.inner.get_state()
    }

    fn dispatch(&self, action: Action) -> state_store::Result<S> {
        action.validate()?;
        let chain = self.chain.lock();
        if let Some(entity) = &self.entity {
            self.forward(&chain, entity, &action)?;
        }
        debug!(action = action.action_type(), "dispatching to inner store");
        self.inner.dispatch(action)
    }

    fn subscribe(&self, listener: StoreListener<S>) -> Unsubscribe {
        self.inner.subscribe(listener)
    }
}
