//! Error types for entity-bridge

use thiserror::Error;

use entity_model::EntityError;
use state_store::StoreError;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised while building a bridge or forwarding through one
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Neither an entity, an entity map nor a reducer was given
    #[error("create_bridge() - must give an entity, an entity map or a reducer")]
    MissingReducer,

    /// A reducer was given but nothing it produces can be bound for forwarding
    #[error("create_bridge() - must give an entity or a reducer which returns one")]
    MissingDefaultState,

    /// A dispatch re-entered the echo of its own action type, or the chain
    /// of nested echoes grew past `MAX_FORWARD_DEPTH`
    ///
    /// `in_flight` lists the echoes in progress, outermost first.
    #[error("dispatch of '{action_type}' cycles back into entity forwarding ({in_flight})")]
    ForwardCycle {
        in_flight: String,
        action_type: String,
    },

    /// Bridge options were inconsistent or could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),
}

impl BridgeError {
    /// Whether `err`, or anything in its source chain, is a `ForwardCycle`
    ///
    /// Cycle errors travel through entity listeners and store enhancers
    /// before surfacing, so they usually arrive wrapped.
    pub fn is_forward_cycle(err: &(dyn std::error::Error + 'static)) -> bool {
        find_in_chain::<BridgeError>(err)
            .is_some_and(|found| matches!(found, BridgeError::ForwardCycle { .. }))
    }
}

/// First error of type `T` in the source chain of `err`, `err` included
pub fn find_in_chain<'a, T>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a T>
where
    T: std::error::Error + 'static,
{
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<T>() {
            return Some(found);
        }
        current = err.source();
    }
    None
}
