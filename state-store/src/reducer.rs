//! Reducer trait for state transitions
//!
//! A reducer computes the next state from the current state and an action.
//! Plain closures returning `Option<S>` are reducers out of the box; `None`
//! surfaces as `StoreError::UndefinedReducerResult`. Reducers that need to
//! report their own failures can be wrapped in [`TryReducer`].
//!
//! # Example
//!
//! ```rust
//! use state_store::{Action, Reducer};
//!
//! let counter = |state: &i64, action: &Action| match action.action_type() {
//!     "INCREMENT" => Some(state + 1),
//!     _ => Some(*state),
//! };
//!
//! assert_eq!(counter.reduce(&1, &Action::new("INCREMENT")).unwrap(), 2);
//! ```

use std::sync::Arc;

use crate::action::Action;
use crate::error::{Result, StoreError};

/// State transition function `(state, action) -> next state`
///
/// Reducers must tolerate the reserved bootstrap action and should return
/// the state they were given for it.
pub trait Reducer<S>: Send + Sync {
    fn reduce(&self, state: &S, action: &Action) -> Result<S>;
}

/// Shared, type-erased reducer handed to store constructors
pub type SharedReducer<S> = Arc<dyn Reducer<S>>;

impl<S, F> Reducer<S> for F
where
    F: Fn(&S, &Action) -> Option<S> + Send + Sync,
{
    fn reduce(&self, state: &S, action: &Action) -> Result<S> {
        self(state, action).ok_or_else(|| StoreError::UndefinedReducerResult {
            action_type: action.action_type().to_string(),
        })
    }
}

/// Adapter for reducers that return `Result` directly
pub struct TryReducer<F>(pub F);

impl<S, F> Reducer<S> for TryReducer<F>
where
    F: Fn(&S, &Action) -> Result<S> + Send + Sync,
{
    fn reduce(&self, state: &S, action: &Action) -> Result<S> {
        (self.0)(state, action)
    }
}

/// Box a reducer for use with a store constructor
pub fn shared<S, R>(reducer: R) -> SharedReducer<S>
where
    R: Reducer<S> + 'static,
{
    Arc::new(reducer)
}
