//! Listener registry shared by the reference entities

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use crate::entity::{Event, EventListener, ListenerId, ALL_EVENTS};
use crate::error::Result;

struct Registration {
    id: ListenerId,
    event: String,
    listener: EventListener,
}

/// Event listener registry with `"all"` wildcard support
///
/// `trigger` snapshots the matching listeners before calling any of them,
/// so listeners are free to register, remove or trigger re-entrantly.
#[derive(Default)]
pub struct Events {
    registrations: Mutex<Vec<Registration>>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&self, event: &str, id: ListenerId, listener: EventListener) {
        self.registrations.lock().push(Registration {
            id,
            event: event.to_string(),
            listener,
        });
    }

    pub fn on(&self, event: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId::next();
        self.listen(event, id, listener);
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.lock();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Run listeners for `name`, then the `"all"` listeners
    ///
    /// Stops at the first failing listener and returns its error.
    pub fn trigger(&self, name: &str, payload: &Value) -> Result<()> {
        self.run(name, payload, None)
    }

    /// Run listeners whose id is not yet in `delivered`, recording each one
    pub fn trigger_tracked(
        &self,
        name: &str,
        payload: &Value,
        delivered: &mut HashSet<ListenerId>,
    ) -> Result<()> {
        self.run(name, payload, Some(delivered))
    }

    fn run(
        &self,
        name: &str,
        payload: &Value,
        mut delivered: Option<&mut HashSet<ListenerId>>,
    ) -> Result<()> {
        let snapshot: Vec<(ListenerId, EventListener)> = {
            let registrations = self.registrations.lock();
            let named = registrations
                .iter()
                .filter(|r| name != ALL_EVENTS && r.event == name);
            let wildcard = registrations.iter().filter(|r| r.event == ALL_EVENTS);
            named
                .chain(wildcard)
                .map(|r| (r.id, Arc::clone(&r.listener)))
                .collect()
        };

        trace!(event = name, listeners = snapshot.len(), "trigger");
        let event = Event { name, payload };
        for (id, listener) in snapshot {
            if let Some(delivered) = delivered.as_deref_mut() {
                if !delivered.insert(id) {
                    continue;
                }
            }
            listener(&event)?;
        }
        Ok(())
    }

    /// Number of registrations for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.registrations
            .lock()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.lock().is_empty()
    }
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Events")
            .field("registrations", &self.registrations.lock().len())
            .finish()
    }
}
