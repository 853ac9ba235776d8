//! Sample wiring: a counter model and a todo collection behind one store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use entity_bridge::prelude::*;
use entity_model::{shared, Collection, EntityMap, Model};
use state_store::{compose, logging_enhancer};

use crate::{Origin, Side, Step};

/// Counter reacting to `INCREMENT` / `DECREMENT`
pub fn counter(start: i64) -> Result<Model> {
    let model = Model::new(json!({ "num": start })).context("Failed to create counter model")?;
    for (event, step) in [("INCREMENT", 1), ("DECREMENT", -1)] {
        model.react(event, move |model, _| {
            let num = model.get("num").and_then(|n| n.as_i64()).unwrap_or(0);
            model.set("num", json!(num + step))?;
            Ok(())
        });
    }
    Ok(model)
}

/// List reacting to `PUSH` (payload becomes the new item) / `POP`
pub fn todos(items: usize) -> Result<Collection> {
    let seed = (0..items).map(|index| json!({ "id": index }));
    let collection = Collection::from_attributes(seed).context("Failed to create todo list")?;
    collection.react("PUSH", |collection, event| {
        collection.push(event.payload.clone())?;
        Ok(())
    });
    collection.react("POP", |collection, _| {
        collection.pop()?;
        Ok(())
    });
    Ok(collection)
}

pub struct App {
    counter: Model,
    todos: Collection,
    bridge: Bridge,
    notifications: Arc<AtomicUsize>,
}

impl App {
    pub fn new(start: i64, items: usize, state_access: StateAccess) -> Result<Self> {
        let counter = counter(start)?;
        let todos = todos(items)?;

        let bridge = create_bridge(None)
            .entities(
                EntityMap::new()
                    .with("counter", shared(counter.clone()))
                    .with("todos", shared(todos.clone())),
            )
            .with_enhancer(compose(vec![logging_enhancer("counter-sample")]))
            .with_config(BridgeConfig::default().with_state_access(state_access))
            .build()
            .context("Failed to create bridge")?;

        let notifications = Arc::new(AtomicUsize::new(0));
        {
            let notifications = Arc::clone(&notifications);
            bridge.subscribe(Arc::new(move |state: &BridgeState| {
                let seen = notifications.fetch_add(1, Ordering::SeqCst) + 1;
                info!(notification = seen, state = %state.to_json(), "store updated");
            }));
        }

        Ok(Self {
            counter,
            todos,
            bridge,
            notifications,
        })
    }

    /// Apply one step from the given side
    pub fn apply(&self, step: &Step, origin: Origin) -> Result<()> {
        match origin {
            Origin::Store => {
                let action = match &step.payload {
                    Some(payload) => Action::with_payload(&step.action_type, payload.clone()),
                    None => Action::new(&step.action_type),
                };
                self.bridge
                    .dispatch(action)
                    .with_context(|| format!("Store dispatch of '{}' failed", step.action_type))?;
            }
            Origin::Entity => {
                let payload = step.payload.clone();
                let result = match step.action_type.as_str() {
                    "PUSH" | "POP" => entity_dispatch(&self.todos, &step.action_type, payload),
                    _ => entity_dispatch(&self.counter, &step.action_type, payload),
                };
                result.with_context(|| format!("Entity dispatch of '{}' failed", step.action_type))?;
            }
        }
        Ok(())
    }

    /// Run the script, returning the final plain snapshot
    pub fn run(&self, script: &[Step], side: Side) -> Result<Value> {
        for (index, step) in script.iter().enumerate() {
            let origin = side.origin(index);
            info!(step = index + 1, action = %step.action_type, ?origin, "applying");
            self.apply(step, origin)?;
        }
        Ok(self.bridge.snapshot())
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn counter_value(&self) -> Option<i64> {
        self.counter.get("num").and_then(|n| n.as_i64())
    }

    pub fn todo_count(&self) -> usize {
        self.todos.len()
    }
}
