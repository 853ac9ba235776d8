//! Error types for state-store

use thiserror::Error;

use crate::action::Reserved;

/// Boxed error raised by a collaborator wrapped around a store
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while creating a store or dispatching into one
///
/// Every variant is raised synchronously at the call site. A failed
/// `dispatch` never commits the reducer's output.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The action is missing or has no usable `type`
    #[error("dispatch(action) - invalid action: {0}")]
    InvalidAction(String),

    /// User code tried to dispatch a reserved action type
    #[error("dispatch(action) - action type {0} is reserved")]
    ReservedActionType(Reserved),

    /// The reducer produced no next state
    #[error("reducer returned no state for action {action_type}")]
    UndefinedReducerResult { action_type: String },

    /// The reducer swapped the bound entity for one of a different type
    #[error("reducer returned {found} where {expected} was bound{}", key_suffix(.key))]
    TypeMismatch {
        expected: String,
        found: String,
        key: Option<String>,
    },

    /// `dispatch` was called from inside the reducer
    #[error("reducers may not dispatch actions (while handling {action_type})")]
    DispatchInReducer { action_type: String },

    /// An enhancer layered around the store failed
    #[error("store enhancer failed: {0}")]
    Enhancer(#[source] BoxError),
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(key) => format!(" at key '{}'", key),
        None => String::new(),
    }
}

impl StoreError {
    /// Wrap any error raised by an enhancer layer
    pub fn enhancer<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Enhancer(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = StoreError::TypeMismatch {
            expected: "Collection".to_string(),
            found: "Model".to_string(),
            key: Some("items".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "reducer returned Model where Collection was bound at key 'items'"
        );

        let err = StoreError::TypeMismatch {
            expected: "Collection".to_string(),
            found: "plain JSON".to_string(),
            key: None,
        };
        assert_eq!(err.to_string(), "reducer returned plain JSON where Collection was bound");
    }

    #[test]
    fn test_reserved_message() {
        let err = StoreError::ReservedActionType(Reserved::BridgeDispatch);
        assert!(err.to_string().contains("__BRIDGE_DISPATCH__"));
    }
}
