//! Store constructors and enhancers
//!
//! An enhancer takes a store creator and returns a new one, which lets
//! behaviour be layered around any store implementation:
//!
//! ```text
//! enhancer(create_store)(reducer, initial_state) -> store
//! ```
//!
//! `compose` chains several enhancers right-to-left, so the first enhancer in
//! the list ends up outermost.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::Action;
use crate::error::Result;
use crate::reducer::SharedReducer;
use crate::store::{SharedStore, Store, StoreListener, Unsubscribe};

/// `(reducer, initial_state) -> store`
pub type StoreCreator<S> =
    Arc<dyn Fn(SharedReducer<S>, S) -> Result<SharedStore<S>> + Send + Sync>;

/// Decorator around a store creator
pub type StoreEnhancer<S> = Arc<dyn Fn(StoreCreator<S>) -> StoreCreator<S> + Send + Sync>;

/// `(reducer, initial_state, enhancer) -> store`
///
/// The shape of [`crate::create_store`]; external store implementations are
/// injected through this type.
pub type StoreConstructor<S> = Arc<
    dyn Fn(SharedReducer<S>, S, Option<StoreEnhancer<S>>) -> Result<SharedStore<S>> + Send + Sync,
>;

/// The built-in constructor as a `StoreConstructor`
pub fn minimal_constructor<S>() -> StoreConstructor<S>
where
    S: Clone + Send + Sync + 'static,
{
    Arc::new(
        |reducer: SharedReducer<S>, initial_state: S, enhancer: Option<StoreEnhancer<S>>| {
            crate::store::create_store(reducer, initial_state, enhancer)
        },
    )
}

/// Enhancer that returns the creator unchanged
pub fn identity<S: 'static>() -> StoreEnhancer<S> {
    Arc::new(|creator: StoreCreator<S>| creator)
}

/// Chain enhancers right-to-left: `compose([f, g])(c) == f(g(c))`
///
/// An empty list composes to [`identity`].
pub fn compose<S: 'static>(enhancers: Vec<StoreEnhancer<S>>) -> StoreEnhancer<S> {
    Arc::new(move |creator: StoreCreator<S>| {
        enhancers
            .iter()
            .rev()
            .fold(creator, |creator, enhancer| enhancer(creator))
    })
}

// ============================================================================
// Logging enhancer
// ============================================================================

/// Enhancer that logs every dispatched action and its outcome
///
/// Actions and resulting states are emitted at `debug` under the given
/// label; failed dispatches are logged at `warn` and returned unchanged.
pub fn logging_enhancer<S>(label: impl Into<String>) -> StoreEnhancer<S>
where
    S: Debug + Send + Sync + 'static,
{
    let label: Arc<str> = Arc::from(label.into());
    Arc::new(move |creator: StoreCreator<S>| {
        let label = Arc::clone(&label);
        Arc::new(move |reducer: SharedReducer<S>, initial_state: S| {
            let inner = creator(reducer, initial_state)?;
            let store: SharedStore<S> = Arc::new(LoggedStore {
                inner,
                label: Arc::clone(&label),
            });
            Ok(store)
        })
    })
}

struct LoggedStore<S> {
    inner: SharedStore<S>,
    label: Arc<str>,
}

impl<S> Store<S> for LoggedStore<S>
where
    S: Debug + Send + Sync + 'static,
{
    fn get_state(&self) -> S {
        self.inner.get_state()
    }

    fn dispatch(&self, action: Action) -> Result<S> {
        debug!(store = %self.label, action = action.action_type(), payload = ?action.payload(), "dispatch");
        match self.inner.dispatch(action) {
            Ok(next) => {
                debug!(store = %self.label, state = ?next, "next state");
                Ok(next)
            }
            Err(err) => {
                warn!(store = %self.label, error = %err, "dispatch failed");
                Err(err)
            }
        }
    }

    fn subscribe(&self, listener: StoreListener<S>) -> Unsubscribe {
        self.inner.subscribe(listener)
    }
}
