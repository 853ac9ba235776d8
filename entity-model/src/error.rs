//! Error types for entity-model

use thiserror::Error;

/// Boxed error raised by an event listener
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for entity operations
pub type Result<T> = std::result::Result<T, EntityError>;

/// Errors that can occur while mutating or triggering an entity
#[derive(Error, Debug)]
pub enum EntityError {
    /// A listener failed while handling an event
    #[error("listener for '{event}' failed: {source}")]
    Listener {
        event: String,
        #[source]
        source: BoxError,
    },

    /// Model attributes must be a JSON object
    #[error("attributes must be a JSON object, got {0}")]
    InvalidAttributes(String),
}

impl EntityError {
    /// Wrap a foreign error raised by a listener for `event`
    pub fn listener<E>(event: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EntityError::Listener {
            event: event.into(),
            source: Box::new(err),
        }
    }
}
