//! Entity-side dispatch

use serde_json::Value;
use tracing::trace;

use entity_model::ObservableEntity;
use state_store::{Action, Reserved};

/// Dispatch an action from the entity side
///
/// Triggers the reserved bridge event on `entity` with `{ type, payload }`.
/// A bridge bound to `entity` forwards it to its store, which in turn
/// echoes the action back onto the entity. Without a bound bridge this is a
/// plain trigger nobody listens to.
///
/// Listener failures, including store errors raised by the bridge, are
/// returned as `EntityError::Listener`.
pub fn entity_dispatch<E>(
    entity: &E,
    action_type: &str,
    payload: Option<Value>,
) -> entity_model::Result<()>
where
    E: ObservableEntity + ?Sized,
{
    let action = match payload {
        Some(payload) => Action::with_payload(action_type, payload),
        None => Action::new(action_type),
    };
    trace!(action = action_type, "entity dispatch");
    entity.trigger(Reserved::BridgeDispatch.as_str(), &action.to_value())
}
