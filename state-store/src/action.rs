//! Actions and reserved action types
//!
//! An `Action` is the unit of change a store understands: a non-empty `type`
//! plus an optional JSON payload. The wire shape is the familiar
//! `{ "type": "...", "payload": ... }` object, so actions can travel through
//! entity events and back without a custom codec.
//!
//! # Example
//!
//! ```rust
//! use state_store::Action;
//! use serde_json::json;
//!
//! let action = Action::with_payload("PUSH", json!({ "id": 1 }));
//! assert_eq!(action.action_type(), "PUSH");
//!
//! let parsed = Action::try_from(json!({ "type": "POP" })).unwrap();
//! assert_eq!(parsed, Action::new("POP"));
//!
//! assert!(Action::try_from(json!(null)).is_err());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Action types owned by the bridge machinery
///
/// User code must never dispatch these; `Store::dispatch` rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reserved {
    /// Dispatched once by a store at construction time
    Bootstrap,
    /// Entity event carrying an action from the entity side into the store
    BridgeDispatch,
}

impl Reserved {
    pub const ALL: [Reserved; 2] = [Reserved::Bootstrap, Reserved::BridgeDispatch];

    pub const fn as_str(self) -> &'static str {
        match self {
            Reserved::Bootstrap => "@@entity-bridge/INIT",
            Reserved::BridgeDispatch => "__BRIDGE_DISPATCH__",
        }
    }

    /// Look up the reserved sentinel matching `action_type`, if any
    pub fn matching(action_type: &str) -> Option<Reserved> {
        Self::ALL.into_iter().find(|r| r.as_str() == action_type)
    }
}

impl std::fmt::Display for Reserved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatched action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Action {
    /// Create an action without payload
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
        }
    }

    /// Create an action carrying a payload
    pub fn with_payload(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Some(payload),
        }
    }

    /// The reserved bootstrap action stores dispatch on construction
    pub fn bootstrap() -> Self {
        Self::new(Reserved::Bootstrap.as_str())
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Payload as a JSON value, `null` when absent
    pub fn payload_or_null(&self) -> Value {
        self.payload.clone().unwrap_or(Value::Null)
    }

    /// The reserved sentinel this action uses, if any
    pub fn reserved(&self) -> Option<Reserved> {
        Reserved::matching(&self.action_type)
    }

    pub fn is_bootstrap(&self) -> bool {
        self.reserved() == Some(Reserved::Bootstrap)
    }

    /// Check the action is acceptable for a user-facing `dispatch`
    ///
    /// Fails with `InvalidAction` for an empty type and with
    /// `ReservedActionType` for a reserved sentinel.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.action_type.is_empty() {
            return Err(StoreError::InvalidAction(
                "action.type must be a non-empty string".to_string(),
            ));
        }
        if let Some(reserved) = self.reserved() {
            return Err(StoreError::ReservedActionType(reserved));
        }
        Ok(())
    }

    /// Wire form: `{ "type": ..., "payload": ... }`
    pub fn to_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("type".to_string(), Value::String(self.action_type.clone()));
        object.insert("payload".to_string(), self.payload_or_null());
        Value::Object(object)
    }
}

impl TryFrom<Value> for Action {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut object = match value {
            Value::Object(object) => object,
            Value::Null => {
                return Err(StoreError::InvalidAction("action is required".to_string()));
            }
            other => {
                return Err(StoreError::InvalidAction(format!(
                    "action must be an object, got {}",
                    other
                )));
            }
        };

        let action_type = match object.remove("type") {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(StoreError::InvalidAction(
                    "action.type is required".to_string(),
                ));
            }
            Some(other) => {
                return Err(StoreError::InvalidAction(format!(
                    "action.type must be a string, got {}",
                    other
                )));
            }
        };

        let payload = match object.remove("payload") {
            None | Some(Value::Null) => None,
            Some(payload) => Some(payload),
        };

        Ok(Self {
            action_type,
            payload,
        })
    }
}
