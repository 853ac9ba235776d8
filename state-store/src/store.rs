//! Store contract and the minimal reducer store
//!
//! This module provides the core storage primitives:
//! - `Store<S>`: the `get_state` / `dispatch` / `subscribe` contract every
//!   store (built-in or injected) satisfies
//! - `Listeners<S>`: ordered subscriber list with identity-based removal
//! - `MinimalStore<S>`: the fallback store used when no external
//!   constructor is supplied
//! - `create_store`: the constructor, with enhancer delegation

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use tracing::{debug, trace};

use crate::action::Action;
use crate::enhancer::{StoreCreator, StoreEnhancer};
use crate::error::{Result, StoreError};
use crate::reducer::SharedReducer;

/// Callback invoked with the post-reducer state after every dispatch
pub type StoreListener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Shared, type-erased store
pub type SharedStore<S> = Arc<dyn Store<S>>;

/// The reducer-store contract
///
/// Any implementation can stand in for the built-in [`MinimalStore`] as
/// long as it honours these semantics:
/// - `dispatch` rejects invalid or reserved actions without touching state
/// - listeners are notified once per successful dispatch, with the new state
/// - the function returned by `subscribe` removes exactly that registration
pub trait Store<S>: Send + Sync {
    /// Current state
    fn get_state(&self) -> S;

    /// Run `action` through the reducer, notify listeners, return the new state
    fn dispatch(&self, action: Action) -> Result<S>;

    /// Register a listener; the returned handle removes it again
    fn subscribe(&self, listener: StoreListener<S>) -> Unsubscribe;

    /// Dispatch an untyped JSON action
    ///
    /// `null`, non-objects and objects without a `type` fail with
    /// `InvalidAction` before reaching the store.
    fn dispatch_json(&self, raw: Value) -> Result<S> {
        let action = Action::try_from(raw)?;
        self.dispatch(action)
    }
}

// ============================================================================
// Unsubscribe
// ============================================================================

/// Handle returned by `Store::subscribe`
///
/// Calling it more than once is harmless: only the first call removes the
/// registration, later calls return `false`.
pub struct Unsubscribe {
    remove: Box<dyn Fn() -> bool + Send + Sync>,
}

impl Unsubscribe {
    pub fn new<F>(remove: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            remove: Box::new(remove),
        }
    }

    /// Handle that removes nothing
    pub fn noop() -> Self {
        Self::new(|| false)
    }

    /// Remove the listener, returning whether it was still registered
    pub fn call(&self) -> bool {
        (self.remove)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").finish_non_exhaustive()
    }
}

// ============================================================================
// Listeners<S>
// ============================================================================

type ListenerEntries<S> = Vec<(u64, StoreListener<S>)>;

/// Ordered list of store listeners
///
/// Each registration gets its own id, so subscribing the same callback
/// twice yields two independent registrations. Notification works on a
/// snapshot taken before the first callback runs: listeners added during
/// fan-out wait for the next dispatch, listeners removed during fan-out
/// still receive the current one.
pub struct Listeners<S> {
    entries: Arc<Mutex<ListenerEntries<S>>>,
    next_id: AtomicU64,
}

impl<S: 'static> Listeners<S> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, listener: StoreListener<S>) -> Unsubscribe {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, listener));

        let entries: Weak<Mutex<ListenerEntries<S>>> = Arc::downgrade(&self.entries);
        Unsubscribe::new(move || {
            let Some(entries) = entries.upgrade() else {
                return false;
            };
            let mut entries = entries.lock();
            match entries.iter().position(|(entry_id, _)| *entry_id == id) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    pub fn notify(&self, state: &S) {
        let snapshot: Vec<StoreListener<S>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(listeners = snapshot.len(), "notifying store listeners");
        for listener in snapshot {
            listener(state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: 'static> Default for Listeners<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MinimalStore<S>
// ============================================================================

/// Built-in reducer store
///
/// Lifecycle: construction dispatches the reserved bootstrap action through
/// the reducer once, after which the store stays ready for its lifetime.
/// There is no teardown; unsubscribing is the only cleanup.
///
/// `get_state` hands out a clone of the committed state. For entity-valued
/// states that clone shares the underlying entity.
///
/// Dispatches from different threads run one after another. The thread
/// holding the dispatch may dispatch again from a listener, but not from
/// inside the reducer.
pub struct MinimalStore<S> {
    reducer: SharedReducer<S>,
    state: Mutex<S>,
    listeners: Listeners<S>,
    /// Type of the action whose reducer call is in progress
    dispatching: ReentrantMutex<RefCell<Option<String>>>,
}

/// Clears the in-reducer marker when the reducer returns or fails
struct ReducerScope<'a>(&'a RefCell<Option<String>>);

impl Drop for ReducerScope<'_> {
    fn drop(&mut self) {
        *self.0.borrow_mut() = None;
    }
}

impl<S> MinimalStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create the store and run the bootstrap dispatch
    pub fn new(reducer: SharedReducer<S>, initial_state: S) -> Result<Self> {
        let store = Self {
            reducer,
            state: Mutex::new(initial_state),
            listeners: Listeners::new(),
            dispatching: ReentrantMutex::new(RefCell::new(None)),
        };
        store.apply(Action::bootstrap())?;
        Ok(store)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn apply(&self, action: Action) -> Result<S> {
        let dispatching = self.dispatching.lock();
        if let Some(in_progress) = dispatching.borrow().clone() {
            return Err(StoreError::DispatchInReducer {
                action_type: in_progress,
            });
        }

        let current = self.state.lock().clone();
        let next = {
            *dispatching.borrow_mut() = Some(action.action_type().to_string());
            let _scope = ReducerScope(&dispatching);
            self.reducer.reduce(&current, &action)?
        };

        *self.state.lock() = next.clone();
        debug!(action = action.action_type(), "state committed");

        self.listeners.notify(&next);
        Ok(next)
    }
}

impl<S> Store<S> for MinimalStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn get_state(&self) -> S {
        self.state.lock().clone()
    }

    fn dispatch(&self, action: Action) -> Result<S> {
        action.validate()?;
        self.apply(action)
    }

    fn subscribe(&self, listener: StoreListener<S>) -> Unsubscribe {
        self.listeners.subscribe(listener)
    }
}

impl<S: 'static> fmt::Debug for MinimalStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinimalStore")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

/// Create a store from a reducer and initial state
///
/// With an `enhancer`, construction is delegated entirely:
/// `enhancer(create_store)(reducer, initial_state)`. The enhancer is
/// expected to call back into the creator it receives.
pub fn create_store<S>(
    reducer: SharedReducer<S>,
    initial_state: S,
    enhancer: Option<StoreEnhancer<S>>,
) -> Result<SharedStore<S>>
where
    S: Clone + Send + Sync + 'static,
{
    if let Some(enhancer) = enhancer {
        let creator: StoreCreator<S> = Arc::new(|reducer: SharedReducer<S>, initial_state: S| {
            create_store(reducer, initial_state, None)
        });
        return enhancer(creator)(reducer, initial_state);
    }

    let store = MinimalStore::new(reducer, initial_state)?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{shared, TryReducer};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> SharedReducer<i64> {
        shared(|state: &i64, action: &Action| match action.action_type() {
            "INCREMENT" => Some(state + 1),
            "DECREMENT" => Some(state - 1),
            _ => Some(*state),
        })
    }

    fn counting_listener(count: &Arc<AtomicUsize>) -> StoreListener<i64> {
        let count = Arc::clone(count);
        Arc::new(move |_: &i64| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_bootstrap_runs_reducer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reducer = {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            shared(move |state: &i64, action: &Action| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().push(action.action_type().to_string());
                Some(*state)
            })
        };

        let store = MinimalStore::new(reducer, 5).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Action::new(seen.lock()[0].clone()).is_bootstrap());
        assert_eq!(store.get_state(), 5);
    }

    #[test]
    fn test_dispatch_notifies_all_subscribers() {
        let store = MinimalStore::new(counter(), 0).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&count);

        store.subscribe(Arc::clone(&listener));
        store.subscribe(Arc::clone(&listener));
        store.subscribe(listener);

        let next = store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(next, 1);
        assert_eq!(store.get_state(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_listener_receives_new_state() {
        let store = MinimalStore::new(counter(), 10).unwrap();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            store.subscribe(Arc::new(move |state: &i64| *seen.lock() = Some(*state)));
        }
        store.dispatch(Action::new("DECREMENT")).unwrap();
        assert_eq!(*seen.lock(), Some(9));
    }

    #[test]
    fn test_invalid_action_leaves_state_untouched() {
        let store = MinimalStore::new(counter(), 3).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting_listener(&count));

        assert!(matches!(
            store.dispatch_json(Value::Null),
            Err(StoreError::InvalidAction(_))
        ));
        assert!(matches!(
            store.dispatch_json(serde_json::json!({})),
            Err(StoreError::InvalidAction(_))
        ));
        assert!(matches!(
            store.dispatch(Action::new("")),
            Err(StoreError::InvalidAction(_))
        ));
        assert!(matches!(
            store.dispatch(Action::new("@@entity-bridge/INIT")),
            Err(StoreError::ReservedActionType(_))
        ));

        assert_eq!(store.get_state(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // still usable afterwards
        assert_eq!(store.dispatch(Action::new("INCREMENT")).unwrap(), 4);
    }

    #[test]
    fn test_reducer_failure_does_not_commit() {
        let reducer: SharedReducer<i64> = shared(TryReducer(|state: &i64, action: &Action| {
            if action.action_type() == "EXPLODE" {
                Err(StoreError::InvalidAction("boom".to_string()))
            } else {
                Ok(state + 1)
            }
        }));
        let store = MinimalStore::new(reducer, 0).unwrap();
        assert_eq!(store.get_state(), 1);

        assert!(store.dispatch(Action::new("EXPLODE")).is_err());
        assert_eq!(store.get_state(), 1);

        // the in-reducer marker was cleared by the failure
        assert_eq!(store.dispatch(Action::new("GROW")).unwrap(), 2);
    }

    #[test]
    fn test_undefined_result_on_bootstrap_fails_construction() {
        let reducer: SharedReducer<i64> = shared(|_: &i64, _: &Action| None);
        assert!(matches!(
            MinimalStore::new(reducer, 0),
            Err(StoreError::UndefinedReducerResult { .. })
        ));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = MinimalStore::new(counter(), 0).unwrap();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let listener = counting_listener(&first);
        let unsubscribe = store.subscribe(Arc::clone(&listener));
        store.subscribe(listener);
        store.subscribe(counting_listener(&second));

        assert!(unsubscribe.call());
        assert!(!unsubscribe.call());
        assert_eq!(store.listener_count(), 2);

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_fan_out_still_delivers() {
        let store = Arc::new(MinimalStore::new(counter(), 0).unwrap());
        let late = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Unsubscribe>>> = Arc::new(Mutex::new(None));

        {
            let slot = Arc::clone(&slot);
            store.subscribe(Arc::new(move |_: &i64| {
                if let Some(unsubscribe) = slot.lock().as_ref() {
                    unsubscribe.call();
                }
            }));
        }
        *slot.lock() = Some(store.subscribe(counting_listener(&late)));

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(late.load(Ordering::SeqCst), 1);

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_during_fan_out_waits_for_next_dispatch() {
        let store = Arc::new(MinimalStore::new(counter(), 0).unwrap());
        let added = Arc::new(AtomicUsize::new(0));

        {
            let weak = Arc::downgrade(&store);
            let added = Arc::clone(&added);
            store.subscribe(Arc::new(move |_: &i64| {
                if let Some(store) = weak.upgrade() {
                    store.subscribe(counting_listener(&added));
                }
            }));
        }

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(added.load(Ordering::SeqCst), 0);

        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(added.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_dispatch() {
        let store = Arc::new(MinimalStore::new(counter(), 0).unwrap());
        {
            let weak = Arc::downgrade(&store);
            store.subscribe(Arc::new(move |state: &i64| {
                if *state == 1 {
                    if let Some(store) = weak.upgrade() {
                        store.dispatch(Action::new("INCREMENT")).unwrap();
                    }
                }
            }));
        }
        store.dispatch(Action::new("INCREMENT")).unwrap();
        assert_eq!(store.get_state(), 2);
    }

    #[test]
    fn test_reducer_may_not_dispatch() {
        let slot: Arc<Mutex<Weak<MinimalStore<i64>>>> = Arc::new(Mutex::new(Weak::new()));
        let outcome = Arc::new(Mutex::new(None));
        let reducer = {
            let slot = Arc::clone(&slot);
            let outcome = Arc::clone(&outcome);
            shared(move |state: &i64, action: &Action| {
                if action.action_type() == "NESTED" {
                    if let Some(store) = slot.lock().upgrade() {
                        *outcome.lock() = Some(store.dispatch(Action::new("INNER")).is_err());
                    }
                }
                Some(*state)
            })
        };
        let store = Arc::new(MinimalStore::new(reducer, 0).unwrap());
        *slot.lock() = Arc::downgrade(&store);

        store.dispatch(Action::new("NESTED")).unwrap();
        assert_eq!(*outcome.lock(), Some(true));
    }

    #[test]
    fn test_concurrent_dispatches_all_commit() {
        let store = Arc::new(MinimalStore::new(counter(), 0).unwrap());
        let count = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting_listener(&count));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.dispatch(Action::new("INCREMENT")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_state(), 400);
        assert_eq!(count.load(Ordering::SeqCst), 400);
    }

    #[test]
    fn test_create_store_delegates_to_enhancer() {
        let canned: SharedStore<i64> = Arc::new(MinimalStore::new(counter(), 99).unwrap());
        let enhancer: StoreEnhancer<i64> = {
            let canned = Arc::clone(&canned);
            Arc::new(move |_creator: StoreCreator<i64>| {
                let canned = Arc::clone(&canned);
                let creator: StoreCreator<i64> =
                    Arc::new(move |_reducer: SharedReducer<i64>, _initial: i64| {
                        Ok(Arc::clone(&canned))
                    });
                creator
            })
        };

        let store = create_store(counter(), 0, Some(enhancer)).unwrap();
        assert!(Arc::ptr_eq(&store, &canned));
        assert_eq!(store.get_state(), 99);
    }

    #[test]
    fn test_create_store_without_enhancer() {
        let store = create_store(counter(), 7, None).unwrap();
        assert_eq!(store.get_state(), 7);
        assert_eq!(store.dispatch(Action::new("INCREMENT")).unwrap(), 8);
    }
}
