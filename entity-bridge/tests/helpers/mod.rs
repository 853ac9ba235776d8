//! Shared fixtures for bridge integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use entity_bridge::{create_bridge, BridgeBuilder, BridgeState};
use entity_model::{Collection, Model};
use state_store::{
    Action, Listeners, SharedReducer, SharedStore, Store, StoreConstructor, StoreCreator,
    StoreEnhancer, StoreListener, Unsubscribe,
};

// ============================================================================
// Entities
// ============================================================================

/// Model with `num`, reacting to `INCREMENT` and `DECREMENT`
pub fn counter_model(num: i64) -> Model {
    let model = Model::new(json!({ "num": num })).unwrap();
    for (event, step) in [("INCREMENT", 1), ("DECREMENT", -1)] {
        model.react(event, move |model, _| {
            let num = model.get("num").and_then(|n| n.as_i64()).unwrap_or(0);
            model.set("num", json!(num + step))?;
            Ok(())
        });
    }
    model
}

/// Collection of `size` empty models, reacting to `PUSH` and `POP`
pub fn growing_collection(size: usize) -> Collection {
    let collection = Collection::from_attributes(vec![json!({}); size]).unwrap();
    collection.react("PUSH", |collection, event| {
        collection.push(event.payload.clone())?;
        Ok(())
    });
    collection.react("POP", |collection, _| {
        collection.pop()?;
        Ok(())
    });
    collection
}

/// Subscribe a counter to `store`
pub fn count_notifications(store: &dyn Store<BridgeState>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    store.subscribe(Arc::new(move |_: &BridgeState| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    count
}

// ============================================================================
// External store
// ============================================================================

/// A store written outside the store crate, recording every dispatch
pub struct RecordingStore {
    reducer: SharedReducer<BridgeState>,
    state: Mutex<BridgeState>,
    listeners: Listeners<BridgeState>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Store<BridgeState> for RecordingStore {
    fn get_state(&self) -> BridgeState {
        self.state.lock().clone()
    }

    fn dispatch(&self, action: Action) -> state_store::Result<BridgeState> {
        action.validate()?;
        let current = self.get_state();
        let next = self.reducer.reduce(&current, &action)?;
        *self.state.lock() = next.clone();
        self.log.lock().push(action.action_type().to_string());
        self.listeners.notify(&next);
        Ok(next)
    }

    fn subscribe(&self, listener: StoreListener<BridgeState>) -> Unsubscribe {
        self.listeners.subscribe(listener)
    }
}

/// Constructor for [`RecordingStore`] that honours enhancers
pub fn recording_constructor(log: Arc<Mutex<Vec<String>>>) -> StoreConstructor<BridgeState> {
    Arc::new(
        move |reducer: SharedReducer<BridgeState>,
              initial_state: BridgeState,
              enhancer: Option<StoreEnhancer<BridgeState>>| {
            let log = Arc::clone(&log);
            let creator: StoreCreator<BridgeState> = Arc::new(
                move |reducer: SharedReducer<BridgeState>, initial_state: BridgeState| {
                    let store: SharedStore<BridgeState> = Arc::new(RecordingStore {
                        reducer,
                        state: Mutex::new(initial_state),
                        listeners: Listeners::new(),
                        log: Arc::clone(&log),
                    });
                    Ok(store)
                },
            );
            match enhancer {
                Some(enhancer) => enhancer(creator)(reducer, initial_state),
                None => creator(reducer, initial_state),
            }
        },
    )
}

/// Store implementation a bridge is built on
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Minimal,
    Recording,
}

impl Backend {
    pub fn bridge(self) -> BridgeBuilder {
        match self {
            Backend::Minimal => create_bridge(None),
            Backend::Recording => {
                create_bridge(Some(recording_constructor(Arc::new(Mutex::new(Vec::new())))))
            }
        }
    }
}

// ============================================================================
// Enhancers
// ============================================================================

/// Enhancer appending `tag` to `log` on every dispatch it sees
pub fn tap_enhancer(tag: &'static str, log: Arc<Mutex<Vec<String>>>) -> StoreEnhancer<BridgeState> {
    Arc::new(move |creator: StoreCreator<BridgeState>| {
        let log = Arc::clone(&log);
        Arc::new(
            move |reducer: SharedReducer<BridgeState>, initial_state: BridgeState| {
                let inner = creator(reducer, initial_state)?;
                let store: SharedStore<BridgeState> = Arc::new(Tap {
                    inner,
                    tag,
                    log: Arc::clone(&log),
                });
                Ok(store)
            },
        )
    })
}

struct Tap {
    inner: SharedStore<BridgeState>,
    tag: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Store<BridgeState> for Tap {
    fn get_state(&self) -> BridgeState {
        self.inner.get_state()
    }

    fn dispatch(&self, action: Action) -> state_store::Result<BridgeState> {
        self.log
            .lock()
            .push(format!("{}:{}", self.tag, action.action_type()));
        self.inner.dispatch(action)
    }

    fn subscribe(&self, listener: StoreListener<BridgeState>) -> Unsubscribe {
        self.inner.subscribe(listener)
    }
}
